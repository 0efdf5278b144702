//! Error types shared by the gateway and the prompt generator.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Gemini API key not configured. Set GEMINI_API_KEY or add api_key to the config file")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to decode Gemini response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Gemini returned an empty response")]
    EmptyResponse,
}

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("A task is required to build a prompt")]
    MissingTask,

    #[error("A generation is already in progress")]
    Busy,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
