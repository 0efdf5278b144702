//! Chat turn state machine.
//!
//! ```text
//! Idle --begin_turn--> Sending --Opened--> Streaming --Completed--> Idle
//!                         \--Failed--> Idle (error message appended)
//! ```
//!
//! The orchestrator never touches the network itself. [`stream_turn`] turns a
//! gateway stream into [`TurnEvent`]s, so a front end can run it on a
//! background task and feed the events back in order.

use tracing::{debug, info, warn};

use crate::conversation::Conversation;
use crate::gateway::ModelGateway;
use crate::state::Message;

pub const TUTOR_UNREACHABLE: &str = "Error: could not connect to the tutor.";
/// Fills the placeholder when a stream ends without any text
pub const EMPTY_REPLY: &str = "The tutor did not return an answer. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Sending,
    Streaming,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// The gateway returned a chunk stream
    Opened,
    Chunk(String),
    Completed,
    /// The stream could not be obtained
    Failed(String),
}

/// One outgoing message and the context it is sent with
#[derive(Debug, Clone)]
pub struct PendingTurn {
    /// Log as it was before this turn's user message
    pub history: Vec<Message>,
    pub message: String,
    pub thinking: bool,
}

#[derive(Debug)]
pub struct ChatOrchestrator {
    conversation: Conversation,
    state: TurnState,
    thinking_mode: bool,
    accumulator: String,
}

impl ChatOrchestrator {
    pub fn new() -> Self {
        Self::with_conversation(Conversation::new())
    }

    pub fn with_conversation(conversation: Conversation) -> Self {
        Self {
            conversation,
            state: TurnState::Idle,
            thinking_mode: false,
            accumulator: String::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state != TurnState::Idle
    }

    pub fn thinking_mode(&self) -> bool {
        self.thinking_mode
    }

    /// Flip deep-thinking mode for the next turn
    pub fn toggle_thinking(&mut self) -> bool {
        self.thinking_mode = !self.thinking_mode;
        self.thinking_mode
    }

    /// Start a turn from the input buffer.
    ///
    /// Returns `None` (and leaves `input` alone) when the input is blank or a
    /// turn is already in flight. On success the input is cleared and the
    /// user message plus an empty placeholder are in the log.
    pub fn begin_turn(&mut self, input: &mut String) -> Option<PendingTurn> {
        if self.is_loading() {
            debug!("Send ignored, a turn is already in flight");
            return None;
        }
        if input.trim().is_empty() {
            return None;
        }

        let message = std::mem::take(input);
        let history = self.conversation.messages().to_vec();

        self.conversation.append(Message::user(message.clone()));
        self.conversation.append(Message::placeholder(self.thinking_mode));
        self.accumulator.clear();
        self.state = TurnState::Sending;

        info!(thinking = self.thinking_mode, history = history.len(), "Chat turn started");

        Some(PendingTurn {
            history,
            message,
            thinking: self.thinking_mode,
        })
    }

    pub fn apply(&mut self, event: TurnEvent) {
        if self.state == TurnState::Idle {
            debug!(?event, "Turn event ignored while idle");
            return;
        }

        match event {
            TurnEvent::Opened => self.state = TurnState::Streaming,
            TurnEvent::Chunk(text) => {
                self.state = TurnState::Streaming;
                self.accumulator.push_str(&text);
                self.conversation.update_last(&self.accumulator);
            }
            TurnEvent::Completed => {
                if self.accumulator.is_empty() {
                    warn!("Chat stream ended without text");
                    self.conversation.update_last(EMPTY_REPLY);
                }
                info!(chars = self.accumulator.chars().count(), "Chat turn finished");
                self.state = TurnState::Idle;
            }
            TurnEvent::Failed(reason) => {
                warn!(%reason, "Chat turn failed before streaming");
                // The placeholder never received text; the error takes its place
                self.conversation.discard_placeholder();
                self.conversation.append(Message::model(TUTOR_UNREACHABLE));
                self.state = TurnState::Idle;
            }
        }
    }

    /// Run a whole turn inline. Returns false if the send was rejected.
    pub async fn send(&mut self, gateway: &ModelGateway, input: &mut String) -> bool {
        let Some(turn) = self.begin_turn(input) else {
            return false;
        };
        stream_turn(gateway, turn, |event| self.apply(event)).await;
        true
    }

    pub fn reset(&mut self) {
        if self.is_loading() {
            return;
        }
        self.conversation.reset();
        self.accumulator.clear();
    }
}

impl Default for ChatOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive one turn against the gateway, emitting events in arrival order
pub async fn stream_turn<F>(gateway: &ModelGateway, turn: PendingTurn, mut emit: F)
where
    F: FnMut(TurnEvent),
{
    use futures_util::StreamExt;

    let mut stream = match gateway
        .streaming_chat(&turn.history, &turn.message, turn.thinking)
        .await
    {
        Ok(stream) => stream,
        Err(e) => {
            emit(TurnEvent::Failed(e.to_string()));
            return;
        }
    };

    emit(TurnEvent::Opened);
    while let Some(chunk) = stream.next().await {
        emit(TurnEvent::Chunk(chunk));
    }
    emit(TurnEvent::Completed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::STREAM_APOLOGY;
    use crate::state::Role;
    use crate::testing::{gateway, ScriptedBackend, StreamScript};

    #[test]
    fn test_begin_turn_appends_user_and_placeholder() {
        let mut chat = ChatOrchestrator::new();
        chat.toggle_thinking();
        let mut input = "What is few-shot prompting?".to_string();

        let turn = chat.begin_turn(&mut input).unwrap();
        assert!(input.is_empty());
        assert_eq!(turn.history.len(), 1);
        assert_eq!(turn.message, "What is few-shot prompting?");
        assert!(turn.thinking);
        assert_eq!(chat.state(), TurnState::Sending);

        let messages = chat.conversation().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[2].is_placeholder());
        assert!(messages[2].is_thinking);
    }

    #[test]
    fn test_blank_input_is_rejected() {
        let mut chat = ChatOrchestrator::new();
        let mut input = "   \n".to_string();
        assert!(chat.begin_turn(&mut input).is_none());
        assert_eq!(input, "   \n");
        assert_eq!(chat.conversation().len(), 1);
    }

    #[test]
    fn test_send_while_loading_is_ignored() {
        let mut chat = ChatOrchestrator::new();
        let mut first = "first".to_string();
        chat.begin_turn(&mut first).unwrap();

        let mut second = "second".to_string();
        assert!(chat.begin_turn(&mut second).is_none());
        assert_eq!(second, "second");
        assert_eq!(chat.conversation().placeholder_count(), 1);
    }

    #[test]
    fn test_chunks_accumulate_in_order() {
        let mut chat = ChatOrchestrator::new();
        let mut input = "hi".to_string();
        chat.begin_turn(&mut input).unwrap();

        chat.apply(TurnEvent::Opened);
        assert_eq!(chat.state(), TurnState::Streaming);

        let mut seen = Vec::new();
        for chunk in ["Hel", "lo", " world"] {
            chat.apply(TurnEvent::Chunk(chunk.to_string()));
            seen.push(chat.conversation().last().unwrap().text.clone());
        }
        assert_eq!(seen, vec!["Hel", "Hello", "Hello world"]);

        chat.apply(TurnEvent::Completed);
        assert_eq!(chat.state(), TurnState::Idle);
        assert_eq!(chat.conversation().last().unwrap().text, "Hello world");
    }

    #[test]
    fn test_failure_appends_error_message() {
        let mut chat = ChatOrchestrator::new();
        let mut input = "hi".to_string();
        chat.begin_turn(&mut input).unwrap();

        chat.apply(TurnEvent::Failed("network down".to_string()));
        assert!(!chat.is_loading());
        let last = chat.conversation().last().unwrap();
        assert_eq!(last.role, Role::Model);
        assert_eq!(last.text, TUTOR_UNREACHABLE);
    }

    #[test]
    fn test_events_after_turn_are_ignored() {
        let mut chat = ChatOrchestrator::new();
        chat.apply(TurnEvent::Chunk("stray".to_string()));
        assert_eq!(chat.conversation(), &Conversation::new());
    }

    #[tokio::test]
    async fn test_stream_turn_emits_in_arrival_order() {
        let (gateway, _) = gateway(ScriptedBackend::new().stream(&["Hel", "lo", " world"]));
        let turn = PendingTurn {
            history: Vec::new(),
            message: "hi".to_string(),
            thinking: false,
        };

        let mut events = Vec::new();
        stream_turn(&gateway, turn, |event| events.push(event)).await;

        assert_eq!(events, vec![
            TurnEvent::Opened,
            TurnEvent::Chunk("Hel".to_string()),
            TurnEvent::Chunk("lo".to_string()),
            TurnEvent::Chunk(" world".to_string()),
            TurnEvent::Completed,
        ]);
    }

    #[tokio::test]
    async fn test_conversation_length_after_cycles() {
        let backend = (0..4).fold(ScriptedBackend::new(), |b, _| b.stream(&["answer"]));
        let (gateway, _) = gateway(backend);
        let mut chat = ChatOrchestrator::new();

        for i in 0..4 {
            let mut input = format!("question {}", i);
            assert!(chat.send(&gateway, &mut input).await);
        }

        assert_eq!(chat.conversation().len(), 2 * 4 + 1);
        assert_eq!(chat.conversation().placeholder_count(), 0);
        assert!(!chat.is_loading());
    }

    #[tokio::test]
    async fn test_history_excludes_current_message() {
        let (gateway, backend) = gateway(ScriptedBackend::new().stream(&["a"]).stream(&["b"]));
        let mut chat = ChatOrchestrator::new();

        let mut input = "one".to_string();
        chat.send(&gateway, &mut input).await;
        let mut input = "two".to_string();
        chat.send(&gateway, &mut input).await;

        let request = backend.last_chat_request();
        let texts: Vec<&str> = request.history.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts.len(), 3);
        assert_eq!(&texts[1..], &["one", "a"]);
        assert_eq!(request.message, "two");
    }

    #[tokio::test]
    async fn test_mid_stream_error_ends_turn_with_apology() {
        let script = StreamScript::Chunks(vec![Ok("Part".to_string()), Err(crate::error::GatewayError::EmptyResponse)]);
        let (gateway, _) = gateway(ScriptedBackend::new().stream_script(script));
        let mut chat = ChatOrchestrator::new();

        let mut input = "hi".to_string();
        chat.send(&gateway, &mut input).await;

        assert_eq!(chat.conversation().len(), 3);
        assert_eq!(
            chat.conversation().last().unwrap().text,
            format!("Part{}", STREAM_APOLOGY)
        );
        assert!(!chat.is_loading());
    }

    #[tokio::test]
    async fn test_open_failure_appends_terminal_error() {
        let (gateway, _) = gateway(ScriptedBackend::new().stream_script(StreamScript::OpenFails));
        let mut chat = ChatOrchestrator::new();

        let mut input = "hi".to_string();
        chat.send(&gateway, &mut input).await;

        let messages = chat.conversation().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].text, "hi");
        assert_eq!(messages[2].text, TUTOR_UNREACHABLE);
        assert_eq!(chat.conversation().placeholder_count(), 0);
        assert!(!chat.is_loading());
    }

    #[tokio::test]
    async fn test_empty_stream_resolves_placeholder() {
        let (gateway, _) = gateway(ScriptedBackend::new().stream(&[]));
        let mut chat = ChatOrchestrator::new();

        let mut input = "hi".to_string();
        chat.send(&gateway, &mut input).await;

        assert_eq!(chat.conversation().len(), 3);
        assert_eq!(chat.conversation().last().unwrap().text, EMPTY_REPLY);
        assert_eq!(chat.conversation().placeholder_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_turns_leave_no_empty_history() {
        let backend = ScriptedBackend::new()
            .stream_script(StreamScript::OpenFails)
            .stream(&[])
            .stream(&["ok"]);
        let (gateway, backend) = gateway(backend);
        let mut chat = ChatOrchestrator::new();

        for question in ["first", "second", "third"] {
            let mut input = question.to_string();
            assert!(chat.send(&gateway, &mut input).await);
        }

        assert_eq!(chat.conversation().placeholder_count(), 0);
        assert_eq!(chat.conversation().last().unwrap().text, "ok");
        let request = backend.last_chat_request();
        assert!(request.history.iter().all(|turn| !turn.text.is_empty()));
        assert_eq!(request.message, "third");
    }
}
