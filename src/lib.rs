//! Trades intake — conversational enquiry capture and lead logging.

pub mod config;
pub mod conversation;
pub mod error;
pub mod leads;
pub mod llm;
pub mod safety;
pub mod server;
pub mod storage;
