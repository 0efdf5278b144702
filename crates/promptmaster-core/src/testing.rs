//! Scripted backend for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ai::{ChatRequest, GenerateRequest, ModelBackend, TextStream};
use crate::error::GatewayError;
use crate::gateway::ModelGateway;
use crate::model::ModelSelection;

pub(crate) enum StreamScript {
    Chunks(Vec<Result<String, GatewayError>>),
    OpenFails,
}

#[derive(Default)]
pub(crate) struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    streams: Mutex<VecDeque<StreamScript>>,
    pub generate_requests: Mutex<Vec<GenerateRequest>>,
    pub chat_requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, reply: Result<&str, GatewayError>) -> Self {
        self.replies.lock().unwrap().push_back(reply.map(str::to_string));
        self
    }

    pub fn stream(self, chunks: &[&str]) -> Self {
        let chunks = chunks.iter().map(|c| Ok(c.to_string())).collect();
        self.streams.lock().unwrap().push_back(StreamScript::Chunks(chunks));
        self
    }

    pub fn stream_script(self, script: StreamScript) -> Self {
        self.streams.lock().unwrap().push_back(script);
        self
    }

    pub fn last_chat_request(&self) -> ChatRequest {
        self.chat_requests.lock().unwrap().last().cloned().unwrap()
    }

    pub fn last_generate_request(&self) -> GenerateRequest {
        self.generate_requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn generate(&self, request: GenerateRequest) -> Result<String, GatewayError> {
        self.generate_requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GatewayError::EmptyResponse))
    }

    async fn stream_chat(&self, request: ChatRequest) -> Result<TextStream, GatewayError> {
        self.chat_requests.lock().unwrap().push(request);
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(StreamScript::Chunks(Vec::new()));
        match script {
            StreamScript::Chunks(chunks) => Ok(Box::pin(futures_util::stream::iter(chunks))),
            StreamScript::OpenFails => Err(GatewayError::Api {
                status: 503,
                body: "unavailable".to_string(),
            }),
        }
    }
}

pub(crate) fn gateway(backend: ScriptedBackend) -> (ModelGateway, Arc<ScriptedBackend>) {
    let backend = Arc::new(backend);
    let gateway = ModelGateway::new(backend.clone(), ModelSelection::default());
    (gateway, backend)
}
