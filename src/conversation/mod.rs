//! Conversational intake — discovery questions, then the guided dialogue.
//!
//! Each call carries its own history; the caller owns the conversation and
//! moves it through `New → Discovering → Chatting → Submitted`.

pub mod model;
pub mod orchestrator;
pub mod prompts;
pub mod routes;

pub use model::{
    ConversationBody, ConversationInput, ConversationMode, ConversationRequest, ConversationStage,
};
pub use orchestrator::ConversationOrchestrator;
pub use routes::{ConversationRouteState, conversation_routes};
