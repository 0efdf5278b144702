pub mod ai;
pub mod config;
pub mod conversation;
pub mod error;
pub mod gateway;
pub mod generator;
pub mod model;
pub mod orchestrator;
pub mod playground;
pub mod prompts;
pub mod state;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use ai::{GeminiClient, ModelBackend};
pub use config::Config;
pub use conversation::Conversation;
pub use error::{GatewayError, GeneratorError};
pub use gateway::{ChunkStream, ModelGateway};
pub use generator::{GeneratedResult, PromptBuilder, PromptInputs};
pub use model::{ModelSelection, ModelTier};
pub use orchestrator::{ChatOrchestrator, PendingTurn, TurnEvent, TurnState};
pub use state::{ChatTurn, Message, Role};
