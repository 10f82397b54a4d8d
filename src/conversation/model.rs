//! Conversation request types and boundary validation.

use serde::Deserialize;

use crate::error::ValidationError;
use crate::llm::ChatMessage;

/// Which brief drives a completion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationMode {
    /// First exchange: produce clarifying questions.
    Discover,
    /// Ongoing intake dialogue.
    #[default]
    Chat,
}

impl ConversationMode {
    /// Unrecognised values fall back to chat.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(m) if m.eq_ignore_ascii_case("discover") => ConversationMode::Discover,
            _ => ConversationMode::Chat,
        }
    }

    /// Sampling temperature: tighter for discovery, moderate for chat.
    pub fn temperature(self) -> f32 {
        match self {
            ConversationMode::Discover => 0.2,
            ConversationMode::Chat => 0.5,
        }
    }

    pub fn max_tokens(self) -> u32 {
        match self {
            ConversationMode::Discover => 200,
            ConversationMode::Chat => 400,
        }
    }
}

/// Where a conversation stands. Tracked by the caller, never stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationStage {
    New,
    Discovering,
    Chatting,
    Submitted,
}

/// What the caller supplied as conversation content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationInput {
    /// A single free-text prompt.
    Prompt(String),
    /// Accumulated history, oldest first. Never empty.
    History(Vec<ChatMessage>),
}

/// A validated conversation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationRequest {
    pub mode: ConversationMode,
    pub input: ConversationInput,
    pub model: Option<String>,
}

impl ConversationRequest {
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            mode: ConversationMode::Chat,
            input: ConversationInput::Prompt(text.into()),
            model: None,
        }
    }

    pub fn with_mode(mut self, mode: ConversationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Stage this request moves the conversation into.
    pub fn stage(&self) -> ConversationStage {
        match (self.mode, &self.input) {
            (ConversationMode::Discover, _) => ConversationStage::Discovering,
            (ConversationMode::Chat, ConversationInput::History(_)) => ConversationStage::Chatting,
            (ConversationMode::Chat, ConversationInput::Prompt(_)) => ConversationStage::New,
        }
    }
}

/// Raw JSON body of the conversation endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ConversationBody {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl ConversationBody {
    /// Validate into a typed request.
    ///
    /// Discovery always resolves to a single prompt: the free text if present,
    /// otherwise the first supplied message's content. Chat prefers a non-empty
    /// history over the prompt.
    pub fn validate(self) -> Result<ConversationRequest, ValidationError> {
        let mode = ConversationMode::parse(self.mode.as_deref());
        let prompt = self
            .prompt
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        let messages = self.messages.filter(|m| !m.is_empty());
        let model = self
            .model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        let input = match (mode, prompt, messages) {
            (ConversationMode::Discover, Some(prompt), _) => ConversationInput::Prompt(prompt),
            (ConversationMode::Discover, None, Some(messages)) => {
                let first = messages[0].content.trim();
                if first.is_empty() {
                    return Err(ValidationError::MissingInput);
                }
                ConversationInput::Prompt(first.to_string())
            }
            (ConversationMode::Chat, _, Some(messages)) => ConversationInput::History(messages),
            (ConversationMode::Chat, Some(prompt), None) => ConversationInput::Prompt(prompt),
            (_, None, None) => return Err(ValidationError::MissingInput),
        };

        Ok(ConversationRequest { mode, input, model })
    }
}
