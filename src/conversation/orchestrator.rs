//! Conversation orchestrator — picks the brief, builds the transcript, calls the LLM.

use std::sync::Arc;

use tracing::{info, warn};

use super::model::{ConversationInput, ConversationMode, ConversationRequest};
use super::prompts::{CONVERSATION_BRIEF, DISCOVERY_BRIEF};
use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::safety;

/// Stateless driver for discovery and chat turns.
///
/// All conversation state arrives with each request; nothing is kept between
/// calls.
pub struct ConversationOrchestrator {
    llm: Arc<dyn LlmProvider>,
}

impl ConversationOrchestrator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Build the outgoing transcript for a request.
    ///
    /// - discover: `[DISCOVERY_BRIEF, user]`, where the user turn is the prompt
    ///   or the first supplied message's content
    /// - chat with history: `[CONVERSATION_BRIEF, ...history]`, unmodified
    /// - chat with a prompt: `[CONVERSATION_BRIEF, user]`
    pub fn build_transcript(request: &ConversationRequest) -> Vec<ChatMessage> {
        match (request.mode, &request.input) {
            (ConversationMode::Discover, input) => {
                let enquiry = match input {
                    ConversationInput::Prompt(prompt) => prompt.clone(),
                    ConversationInput::History(messages) => messages
                        .first()
                        .map(|m| m.content.clone())
                        .unwrap_or_default(),
                };
                vec![ChatMessage::system(DISCOVERY_BRIEF), ChatMessage::user(enquiry)]
            }
            (ConversationMode::Chat, ConversationInput::History(messages)) => {
                let mut transcript = Vec::with_capacity(messages.len() + 1);
                transcript.push(ChatMessage::system(CONVERSATION_BRIEF));
                transcript.extend(messages.iter().cloned());
                transcript
            }
            (ConversationMode::Chat, ConversationInput::Prompt(prompt)) => vec![
                ChatMessage::system(CONVERSATION_BRIEF),
                ChatMessage::user(prompt.clone()),
            ],
        }
    }

    /// Run one conversational turn and return the reply text.
    ///
    /// A response without reply content yields an empty string, not an error.
    pub async fn respond(&self, request: ConversationRequest) -> Result<String, LlmError> {
        let transcript = Self::build_transcript(&request);

        let hazards = safety::detect_in_transcript(&transcript);
        if !hazards.is_empty() {
            let names: Vec<&str> = hazards.iter().map(|h| h.as_str()).collect();
            warn!(hazards = ?names, "Safety hazard mentioned in conversation");
        }

        info!(
            stage = ?request.stage(),
            mode = ?request.mode,
            messages = transcript.len(),
            model = request.model.as_deref().unwrap_or(self.llm.model_name()),
            "Running conversation turn"
        );

        let completion = CompletionRequest::new(transcript)
            .with_model(request.model)
            .with_temperature(request.mode.temperature())
            .with_max_tokens(request.mode.max_tokens());

        let response = self.llm.complete(completion).await?;
        if response.content.is_empty() {
            warn!(finish_reason = ?response.finish_reason, "Completion returned no reply content");
        }
        Ok(response.content)
    }
}
