//! Agent-facing API: handles, sessions and the continuation orchestrator

pub mod continuation;
pub mod handle;
pub mod session;

pub use continuation::{
    Completeness, ContinuationOrchestrator, ContinuationPolicy, OrchestratedResponse,
};
pub use handle::AgentHandle;
pub use session::ChatSession;
