//! Model gateway: the four operations the tools are built on.
//!
//! Owns model selection and request configuration. Which failures are
//! swallowed and which propagate is part of each operation's contract.

use std::pin::Pin;
use std::sync::Arc;

use futures_util::stream::Stream;
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::ai::{ChatRequest, GenerateRequest, ModelBackend};
use crate::error::GatewayError;
use crate::generator::PromptInputs;
use crate::model::{ModelSelection, ModelTier};
use crate::prompts;
use crate::state::{ChatTurn, Message};

/// Prior messages forwarded with each chat request
pub const HISTORY_LIMIT: usize = 20;
/// Reasoning token budget in deep-thinking mode
pub const THINKING_BUDGET: u32 = 32768;
pub const STRUCTURE_TEMPERATURE: f32 = 0.7;

pub const REFINE_EMPTY: &str = "Could not refine the prompt.";
pub const REFINE_FAILED: &str = "Something went wrong while refining. Please try again.";
pub const STREAM_APOLOGY: &str = "Sorry, something went wrong while contacting the AI.";

/// Lazy, single-reader sequence of text increments. Ends when the provider
/// finishes; a mid-stream failure shows up as a final apology chunk.
pub type ChunkStream = Pin<Box<dyn Stream<Item = String> + Send>>;

pub struct ModelGateway {
    backend: Arc<dyn ModelBackend>,
    models: ModelSelection,
}

impl ModelGateway {
    pub fn new(backend: Arc<dyn ModelBackend>, models: ModelSelection) -> Self {
        Self { backend, models }
    }

    pub fn models(&self) -> &ModelSelection {
        &self.models
    }

    /// Polish a draft prompt. Never fails and never returns an empty string.
    pub async fn refine(&self, draft: &str) -> String {
        let request = GenerateRequest {
            model: self.models.name(ModelTier::FlashLite).to_string(),
            contents: prompts::refine_contents(draft),
            system_instruction: Some(prompts::REFINE_SYSTEM.to_string()),
            temperature: None,
        };

        match self.backend.generate(request).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) | Err(GatewayError::EmptyResponse) => REFINE_EMPTY.to_string(),
            Err(e) => {
                warn!(error = %e, "Refinement failed");
                REFINE_FAILED.to_string()
            }
        }
    }

    /// Raw strategy + prompt response for the builder. Errors propagate.
    pub async fn structured_generate(&self, inputs: &PromptInputs) -> Result<String, GatewayError> {
        let request = GenerateRequest {
            model: self.models.name(ModelTier::Pro).to_string(),
            contents: prompts::structure_instruction(inputs),
            system_instruction: None,
            temperature: Some(STRUCTURE_TEMPERATURE),
        };

        self.backend.generate(request).await.map_err(|e| {
            warn!(error = %e, "Structured generation failed");
            e
        })
    }

    /// Open a streaming tutor reply.
    ///
    /// `history` is the log before `new_message`; only the last
    /// [`HISTORY_LIMIT`] entries are sent. An error here means the stream
    /// never opened.
    pub async fn streaming_chat(
        &self,
        history: &[Message],
        new_message: &str,
        enable_thinking: bool,
    ) -> Result<ChunkStream, GatewayError> {
        let system_instruction = if enable_thinking {
            prompts::DEEP_THINKING_SYSTEM
        } else {
            prompts::TUTOR_SYSTEM
        };

        let request = ChatRequest {
            model: self.models.name(ModelTier::Pro).to_string(),
            history: truncate_history(history),
            system_instruction: system_instruction.to_string(),
            message: new_message.to_string(),
            thinking_budget: enable_thinking.then_some(THINKING_BUDGET),
        };

        let mut inner = self.backend.stream_chat(request).await.map_err(|e| {
            warn!(error = %e, "Could not open chat stream");
            e
        })?;

        let stream = async_stream::stream! {
            while let Some(item) = inner.next().await {
                match item {
                    Ok(text) => {
                        if !text.is_empty() {
                            yield text;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Chat stream failed mid-response");
                        yield STREAM_APOLOGY.to_string();
                        break;
                    }
                }
            }
            debug!("Chat stream ended");
        };

        Ok(Box::pin(stream))
    }

    /// Run a prompt once, with optional test input appended
    pub async fn execute(&self, prompt: &str, test_input: &str) -> Result<String, GatewayError> {
        let request = GenerateRequest {
            model: self.models.name(ModelTier::Pro).to_string(),
            contents: prompts::playground_contents(prompt, test_input),
            system_instruction: None,
            temperature: None,
        };

        self.backend.generate(request).await
    }
}

/// The most recent [`HISTORY_LIMIT`] messages that carry text, oldest first.
/// Empty model turns are rejected by the provider, so they are never sent.
pub fn truncate_history(history: &[Message]) -> Vec<ChatTurn> {
    let turns: Vec<ChatTurn> = history
        .iter()
        .filter(|m| !m.text.trim().is_empty())
        .map(ChatTurn::from)
        .collect();
    let start = turns.len().saturating_sub(HISTORY_LIMIT);
    turns[start..].to_vec()
}
