//! Provider seam: one non-streaming call and one streaming chat call.
//!
//! Stream items are text increments. Errors before the stream opens come
//! back through `Result`; errors after that arrive as `Err` items.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::stream::Stream;

use crate::error::GatewayError;
use crate::state::ChatTurn;

pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, GatewayError>> + Send>>;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub contents: String,
    pub system_instruction: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub history: Vec<ChatTurn>,
    pub system_instruction: String,
    pub message: String,
    /// Extended reasoning budget, only present in deep-thinking mode
    pub thinking_budget: Option<u32>,
}

#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String, GatewayError>;

    async fn stream_chat(&self, request: ChatRequest) -> Result<TextStream, GatewayError>;
}
