//! Top-level client

use crate::agent::handle::AGENTS_PATH;
use crate::agent::{AgentHandle, ChatSession, ContinuationOrchestrator};
use crate::config::ClientConfig;
use crate::error::{AiSdkResult, EntityKind};
use crate::http::{HttpClient, HttpExecutor, RequestContext, RequestOptions};
use crate::mcp::McpClient;
use crate::protocol::{
    AbilityInfo, AgentInfo, BotInfo, CreateAgentRequest, CreatePersonaRequest, EntityReference,
    Page, PersonaInfo,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

const PAGE_SIZE: usize = 100;
const BOTS_PATH: [&str; 3] = ["api", "v1", "bots"];
const PERSONAS_PATH: [&str; 4] = ["api", "v1", "agents", "personas"];
const ABILITIES_PATH: [&str; 4] = ["api", "v1", "agents", "abilities"];

/// Entry point of the SDK
///
/// Owns one transport; every handle it gives out shares it.
///
/// ```no_run
/// use metadata_ai_core::{ClientConfig, MetadataAI};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let client = MetadataAI::new(ClientConfig::new("https://metadata.example.com", "token"))?;
/// let reply = client.agent("DataQualityPlannerAgent").call("What can you do?").await?;
/// println!("{}", reply.response);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MetadataAI {
    config: ClientConfig,
    http: Arc<dyn HttpExecutor>,
}

impl fmt::Debug for MetadataAI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataAI")
            .field("host", &self.config.host)
            .finish_non_exhaustive()
    }
}

impl MetadataAI {
    /// Build a client with the reqwest transport
    pub fn new(config: ClientConfig) -> AiSdkResult<Self> {
        let http = HttpClient::new(&config)?;
        info!("Created client for {}", config.host);
        Ok(Self {
            config,
            http: Arc::new(http),
        })
    }

    /// Build a client over any transport
    pub fn with_executor(config: ClientConfig, http: Arc<dyn HttpExecutor>) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn executor(&self) -> Arc<dyn HttpExecutor> {
        Arc::clone(&self.http)
    }

    pub fn agent(&self, name: impl Into<String>) -> AgentHandle {
        AgentHandle::new(self.executor(), name)
    }

    /// Orchestrator for `name` using the configured continuation policy
    pub fn orchestrator(&self, name: impl Into<String>) -> ContinuationOrchestrator {
        ContinuationOrchestrator::new(self.agent(name), self.config.continuation.clone())
    }

    pub fn chat(&self, name: impl Into<String>) -> ChatSession {
        ChatSession::new(self.agent(name))
    }

    pub fn mcp(&self) -> McpClient {
        McpClient::new(self.executor())
    }

    /// List API-enabled agents, following cursors until `limit` is reached
    pub async fn list_agents(&self, limit: Option<usize>) -> AiSdkResult<Vec<AgentInfo>> {
        self.paginate(&AGENTS_PATH, limit, true).await
    }

    pub async fn list_bots(&self, limit: Option<usize>) -> AiSdkResult<Vec<BotInfo>> {
        self.paginate(&BOTS_PATH, limit, false).await
    }

    pub async fn list_personas(&self, limit: Option<usize>) -> AiSdkResult<Vec<PersonaInfo>> {
        self.paginate(&PERSONAS_PATH, limit, false).await
    }

    pub async fn list_abilities(&self, limit: Option<usize>) -> AiSdkResult<Vec<AbilityInfo>> {
        self.paginate(&ABILITIES_PATH, limit, false).await
    }

    pub async fn get_agent(&self, name: &str) -> AiSdkResult<AgentInfo> {
        self.agent(name).get_info().await
    }

    pub async fn get_bot(&self, name: &str) -> AiSdkResult<BotInfo> {
        self.get_by_name(&BOTS_PATH, EntityKind::Bot, name).await
    }

    pub async fn get_persona(&self, name: &str) -> AiSdkResult<PersonaInfo> {
        self.get_by_name(&PERSONAS_PATH, EntityKind::Persona, name).await
    }

    pub async fn get_ability(&self, name: &str) -> AiSdkResult<AbilityInfo> {
        self.get_by_name(&ABILITIES_PATH, EntityKind::Ability, name).await
    }

    /// Create a dynamic agent
    ///
    /// The persona and every ability are looked up by name first, so an
    /// unknown one fails with `NotFound` before anything is created.
    pub async fn create_agent(&self, request: &CreateAgentRequest) -> AiSdkResult<AgentInfo> {
        let persona = self.get_persona(&request.persona).await?;
        let mut abilities = Vec::with_capacity(request.abilities.len());
        for name in &request.abilities {
            let ability = self.get_ability(name).await?;
            abilities.push(EntityReference::new(ability.id, "ability"));
        }

        let mut body = serde_json::to_value(request)?;
        if let Value::Object(fields) = &mut body {
            fields.insert(
                "persona".to_string(),
                serde_json::to_value(EntityReference::new(persona.id, "persona"))?,
            );
            if !abilities.is_empty() {
                fields.insert("abilities".to_string(), serde_json::to_value(abilities)?);
            }
        }

        let options = RequestOptions::post(AGENTS_PATH)
            .with_body(body)
            .with_context(RequestContext::new(EntityKind::Agent, request.name.as_str()));
        let value = self.http.execute_json(options).await?;
        info!("Created agent '{}'", request.name);
        Ok(serde_json::from_value(value)?)
    }

    pub async fn create_persona(&self, request: &CreatePersonaRequest) -> AiSdkResult<PersonaInfo> {
        let options = RequestOptions::post(PERSONAS_PATH)
            .with_body(serde_json::to_value(request)?)
            .with_context(RequestContext::new(EntityKind::Persona, request.name.as_str()));
        let value = self.http.execute_json(options).await?;
        info!("Created persona '{}'", request.name);
        Ok(serde_json::from_value(value)?)
    }

    async fn get_by_name<T: DeserializeOwned>(
        &self,
        base: &[&str],
        entity: EntityKind,
        name: &str,
    ) -> AiSdkResult<T> {
        let mut path: Vec<String> = base.iter().map(|s| s.to_string()).collect();
        path.push("name".to_string());
        path.push(name.to_string());

        let options = RequestOptions::get(path).with_context(RequestContext::new(entity, name));
        let value = self.http.execute_json(options).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn paginate<T: DeserializeOwned>(
        &self,
        base: &[&str],
        limit: Option<usize>,
        api_enabled_only: bool,
    ) -> AiSdkResult<Vec<T>> {
        let mut results = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut options = RequestOptions::get(base.iter().copied()).with_query("limit", PAGE_SIZE);
            if api_enabled_only {
                options = options.with_query("apiEnabled", "true");
            }
            if let Some(cursor) = &after {
                options = options.with_query("after", cursor);
            }

            let page: Page<T> = serde_json::from_value(self.http.execute_json(options).await?)?;
            after = page.next_cursor().map(str::to_string);
            results.extend(page.data);

            if let Some(limit) = limit {
                if results.len() >= limit {
                    results.truncate(limit);
                    break;
                }
            }
            if after.is_none() {
                break;
            }
            debug!("Fetching next page after {} item(s)", results.len());
        }

        Ok(results)
    }
}
