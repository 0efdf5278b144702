pub mod backend;
pub mod gemini;
pub mod sse;

pub use backend::{ChatRequest, GenerateRequest, ModelBackend, TextStream};
pub use gemini::GeminiClient;
