use crate::state::{Message, Role};

pub const GREETING: &str = "Hi! I'm your AI prompt-engineering tutor. I can help you master \
prompt engineering, or use deep thinking to work through hard questions. What can I help you with today?";

/// Ordered tutor log. The greeting is always first; only the last message
/// changes after it is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_greeting(GREETING)
    }

    pub fn with_greeting(greeting: &str) -> Self {
        Self {
            messages: vec![Message::model(greeting)],
        }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replace the text of the last message if it is a model message.
    /// Returns false (and leaves the log alone) otherwise.
    pub fn update_last(&mut self, text: &str) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Model => {
                last.text.clear();
                last.text.push_str(text);
                true
            }
            _ => false,
        }
    }

    /// Drop the last message if it is a still-empty placeholder
    pub fn discard_placeholder(&mut self) -> bool {
        if self.messages.len() > 1 && self.messages.last().is_some_and(Message::is_placeholder) {
            self.messages.pop();
            return true;
        }
        false
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn placeholder_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_placeholder()).count()
    }

    /// Drop everything but the greeting
    pub fn reset(&mut self) {
        self.messages.truncate(1);
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
