//! Protocol module for agent service request/response structures
//!
//! These types mirror the service's JSON: camelCase on the wire, lenient
//! defaults on the way in.

pub mod types;

pub use types::{
    AbilityInfo, AgentInfo, AgentMode, BotInfo, CreateAgentRequest, CreatePersonaRequest,
    EntityReference, EventType, InvokeRequest, InvokeResponse, KnowledgeScope, Page, Paging,
    PersonaInfo, StreamEvent, Usage,
};
