//! Conversation continuation
//!
//! Some agents narrate ("Let me check the lineage...") and end their turn
//! before giving an answer. [`ContinuationOrchestrator`] re-invokes the same
//! conversation until the accumulated answer looks finished or the turn cap
//! is reached.
//!
//! The completeness heuristic is sample-tuned; every threshold lives in
//! [`ContinuationPolicy`] so deployments can adjust it.

use super::AgentHandle;
use crate::config::ValidationError;
use crate::error::{AiSdkError, AiSdkResult};
use crate::protocol::{InvokeRequest, StreamEvent};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

const TERMINAL_CHARS: &[char] = &[
    '.', '!', '?', ')', ']', '}', '"', '\'', '`', '*', '|', '\u{2026}',
];

/// Tunable thresholds of the completeness heuristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ContinuationPolicy {
    /// Hard cap on turns, the first one included
    pub max_turns: u32,

    /// Answers shorter than this (in characters) count as incomplete
    pub min_chars: usize,

    /// Lowercase phrases that mark the final sentence as narration
    pub narration_phrases: Vec<String>,

    /// Lowercase phrases that look like narration but are not
    pub narration_exemptions: Vec<String>,

    /// Sent when the answer is incomplete
    pub nudge_message: String,

    /// Sent when the answer was cut off mid-sentence
    pub continue_message: String,
}

impl Default for ContinuationPolicy {
    fn default() -> Self {
        Self {
            max_turns: 6,
            min_chars: 40,
            narration_phrases: [
                "let me",
                "i'll now",
                "i will now",
                "next, i",
                "now i'll",
                "now let me",
                "i'm going to",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            narration_exemptions: vec!["let me know".to_string()],
            nudge_message: "Please stop searching and compile your final answer now, \
                            using the information you have already gathered."
                .to_string(),
            continue_message: "Continue exactly where you left off.".to_string(),
        }
    }
}

/// Outcome of the completeness heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
    Complete,
    Empty,
    /// About to enumerate something
    EndsWithColon,
    /// The last sentence announces more work
    Narrating,
    TooShort,
    /// Cut off mid-sentence
    Unterminated,
}

impl Completeness {
    pub fn is_complete(self) -> bool {
        self == Self::Complete
    }

    /// Only cut-off output is continued rather than nudged
    pub fn is_truncated(self) -> bool {
        self == Self::Unterminated
    }
}

impl ContinuationPolicy {
    /// Classify an answer
    pub fn classify(&self, text: &str) -> Completeness {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Completeness::Empty;
        }

        if trimmed.ends_with(':') {
            return Completeness::EndsWithColon;
        }

        if self.is_narrating(trimmed) {
            return Completeness::Narrating;
        }

        if trimmed.chars().count() < self.min_chars {
            return Completeness::TooShort;
        }

        let ends_with_newline = text.trim_end_matches([' ', '\t']).ends_with('\n');
        if !ends_with_newline && !trimmed.ends_with(TERMINAL_CHARS) {
            return Completeness::Unterminated;
        }

        Completeness::Complete
    }

    fn is_narrating(&self, trimmed: &str) -> bool {
        let mut sentence = last_sentence(trimmed).to_lowercase();
        for exemption in &self.narration_exemptions {
            sentence = sentence.replace(exemption.as_str(), " ");
        }
        self.narration_phrases
            .iter()
            .any(|phrase| !phrase.is_empty() && sentence.contains(phrase.as_str()))
    }

    /// Message for the next turn after an answer of the given class
    pub fn follow_up_message(&self, class: Completeness) -> &str {
        if class.is_truncated() {
            &self.continue_message
        } else {
            &self.nudge_message
        }
    }

    /// Validate continuation thresholds
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.max_turns == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_turns", path),
                "Must be at least 1",
            ));
        }

        if self.nudge_message.trim().is_empty() {
            return Err(ValidationError::required(format!("{}.nudge_message", path)));
        }

        if self.continue_message.trim().is_empty() {
            return Err(ValidationError::required(format!("{}.continue_message", path)));
        }

        Ok(())
    }
}

/// Text after the last sentence boundary, ignoring trailing punctuation
fn last_sentence(trimmed: &str) -> &str {
    let body = trimmed.trim_end_matches(|c: char| TERMINAL_CHARS.contains(&c) || c.is_whitespace());
    match body.rfind(['.', '!', '?', '\n']) {
        Some(pos) => &body[pos + 1..],
        None => body,
    }
}

/// Final result of an orchestrated run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratedResponse {
    /// Last conversation id returned by the service
    pub conversation_id: Option<String>,
    /// Best answer observed across turns
    pub response: String,
    /// Every tool used, deduplicated, in first-use order
    pub tools_used: Vec<String>,
    /// Turns issued, the first one included
    pub turns: u32,
    /// Whether the answer passed the completeness check
    pub complete: bool,
    pub last_classification: Completeness,
}

/// What one streamed turn produced
#[derive(Debug, Default)]
struct TurnOutcome {
    text: String,
    tools: Vec<String>,
    conversation_id: Option<String>,
}

/// Accumulator owned by one run
#[derive(Debug)]
struct Conversation {
    best: String,
    class: Completeness,
    /// Class of what the latest turn produced, continuation included
    last: Completeness,
    tools: Vec<String>,
    conversation_id: Option<String>,
    turns: u32,
}

impl Conversation {
    fn new() -> Self {
        Self {
            best: String::new(),
            class: Completeness::Empty,
            last: Completeness::Empty,
            tools: Vec::new(),
            conversation_id: None,
            turns: 0,
        }
    }

    fn add_tools(&mut self, tools: Vec<String>) {
        for tool in tools {
            if !self.tools.contains(&tool) {
                self.tools.push(tool);
            }
        }
    }

    /// Fold a new turn's text into the best known answer
    ///
    /// Only a turn that picks up the text is joined onto cut-off output;
    /// narration or a bare lead-in is judged on its own.
    fn absorb(&mut self, policy: &ContinuationPolicy, text: String) {
        let continues = self.class.is_truncated()
            && !matches!(
                policy.classify(&text),
                Completeness::Empty | Completeness::EndsWithColon | Completeness::Narrating
            );
        let candidate = if continues {
            format!("{}{}", self.best, text)
        } else {
            text
        };

        let class = policy.classify(&candidate);
        self.last = class;
        let longer = candidate.chars().count() >= self.best.chars().count();
        if class.is_complete() || (longer && !self.class.is_complete()) {
            self.best = candidate;
            self.class = class;
        }
    }
}

/// Drives one agent until its answer is complete
#[derive(Debug, Clone)]
pub struct ContinuationOrchestrator {
    agent: AgentHandle,
    policy: ContinuationPolicy,
}

impl ContinuationOrchestrator {
    pub fn new(agent: AgentHandle, policy: ContinuationPolicy) -> Self {
        Self { agent, policy }
    }

    pub fn policy(&self) -> &ContinuationPolicy {
        &self.policy
    }

    pub fn agent(&self) -> &AgentHandle {
        &self.agent
    }

    /// Send `message` in a new conversation and keep going until done
    ///
    /// Any transport error, or an `error` event on any turn, aborts the run.
    pub async fn run(
        &self,
        message: impl Into<String>,
        parameters: Map<String, Value>,
    ) -> AiSdkResult<OrchestratedResponse> {
        let max_turns = self.policy.max_turns.max(1);
        let mut conversation = Conversation::new();
        let mut request = InvokeRequest::new()
            .with_message(message)
            .with_parameters(parameters);

        loop {
            let outcome = self.run_turn(request).await?;
            conversation.turns += 1;
            conversation.add_tools(outcome.tools);
            let returned_id = outcome.conversation_id.is_some();
            if outcome.conversation_id.is_some() {
                conversation.conversation_id = outcome.conversation_id;
            }
            conversation.absorb(&self.policy, outcome.text);

            info!(
                "Agent '{}' turn {}/{} classified as {:?} (best answer {:?})",
                self.agent.name(),
                conversation.turns,
                max_turns,
                conversation.last,
                conversation.class
            );

            if conversation.class.is_complete() {
                break;
            }
            if conversation.turns >= max_turns {
                debug!("Turn cap reached for agent '{}'", self.agent.name());
                break;
            }
            let conversation_id = match (&conversation.conversation_id, returned_id) {
                (Some(id), true) => id.clone(),
                _ => {
                    debug!("No conversation id returned; cannot continue");
                    break;
                }
            };

            request = InvokeRequest::new()
                .with_message(self.policy.follow_up_message(conversation.last))
                .with_conversation_id(conversation_id);
        }

        Ok(OrchestratedResponse {
            conversation_id: conversation.conversation_id,
            response: conversation.best,
            tools_used: conversation.tools,
            turns: conversation.turns,
            complete: conversation.class.is_complete(),
            last_classification: conversation.class,
        })
    }

    /// Stream one turn to completion
    ///
    /// Text before a `tool_use` event was narration about that tool and is
    /// dropped.
    async fn run_turn(&self, request: InvokeRequest) -> AiSdkResult<TurnOutcome> {
        let mut events = self.agent.stream(request).await?;
        let mut outcome = TurnOutcome::default();

        while let Some(event) = events.next().await {
            let event = event?;
            if let Some(id) = event.conversation_id() {
                outcome.conversation_id = Some(id.to_string());
            }

            match event {
                StreamEvent::Content { text, .. } => outcome.text.push_str(&text),
                StreamEvent::ToolUse { tool_name, .. } => {
                    outcome.text.clear();
                    if !tool_name.is_empty() {
                        outcome.tools.push(tool_name);
                    }
                }
                StreamEvent::Error { message, .. } => return Err(AiSdkError::Stream(message)),
                StreamEvent::Start { .. } | StreamEvent::End { .. } => {}
            }
        }

        Ok(outcome)
    }
}
