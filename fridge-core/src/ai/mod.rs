//! Gateway-side AI tasks.
//!
//! Each task renders a prompt from [`prompts`], runs it through an
//! [`LlmProvider`](crate::llm::LlmProvider), and turns the model's text into
//! the gateway's response type. The server crate calls these from its
//! handlers.

mod classify;
mod enrich;
pub mod prompts;
mod smart_search;

pub use classify::classify_vegan;
pub use enrich::enrich_recipe;
pub use smart_search::interpret_search;

use thiserror::Error;

use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum AiError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Failed to parse model response: {0}")]
    ParseError(String),
}
