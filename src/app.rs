use std::sync::Arc;

use anyhow::Result;
use promptmaster_core::{
    ChatOrchestrator, Config, GeminiClient, ModelGateway, ModelTier, PromptBuilder, Role,
};
use tokio::sync::mpsc;

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Tutor,
    Builder,
    Refine,
}

impl Screen {
    pub fn all() -> [Screen; 3] {
        [Screen::Tutor, Screen::Builder, Screen::Refine]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Tutor => "Chat Tutor",
            Screen::Builder => "Prompt Builder",
            Screen::Refine => "Quick Refine",
        }
    }

    pub fn next(&self) -> Screen {
        match self {
            Screen::Tutor => Screen::Builder,
            Screen::Builder => Screen::Refine,
            Screen::Refine => Screen::Tutor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Editable fields on the builder screen, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderField {
    Role,
    Task,
    Context,
    Format,
    Constraints,
    Prompt,
    TestInput,
}

impl BuilderField {
    pub fn all() -> [BuilderField; 7] {
        [
            BuilderField::Role,
            BuilderField::Task,
            BuilderField::Context,
            BuilderField::Format,
            BuilderField::Constraints,
            BuilderField::Prompt,
            BuilderField::TestInput,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            BuilderField::Role => "Role / persona",
            BuilderField::Task => "Task (required)",
            BuilderField::Context => "Context",
            BuilderField::Format => "Output format",
            BuilderField::Constraints => "Constraints",
            BuilderField::Prompt => "Generated prompt",
            BuilderField::TestInput => "Test input",
        }
    }

    fn index(&self) -> usize {
        Self::all().iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn next(&self) -> BuilderField {
        let all = Self::all();
        all[(self.index() + 1) % all.len()]
    }

    pub fn prev(&self) -> BuilderField {
        let all = Self::all();
        all[(self.index() + all.len() - 1) % all.len()]
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Chat tutor state
    pub chat: ChatOrchestrator,
    pub chat_input: String,
    pub chat_cursor: usize, // cursor position in chat_input, in chars
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Prompt builder state
    pub builder: PromptBuilder,
    pub builder_field: BuilderField,
    pub builder_error: Option<String>,

    // Quick refine state
    pub refine_input: String,
    pub refine_output: Option<String>,
    pub refine_loading: bool,
    pub refine_elapsed_ms: Option<u128>,

    // API key input state
    pub show_api_key_input: bool,
    pub api_key_input: String,
    pub api_key_source: Option<&'static str>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Services
    pub config: Config,
    pub gateway: Arc<ModelGateway>,
    pub events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(config: Config, gateway: Arc<ModelGateway>, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        let api_key_source = config.api_key_source();

        Self {
            should_quit: false,
            screen: Screen::Tutor,
            input_mode: InputMode::Normal,

            chat: ChatOrchestrator::new(),
            chat_input: String::new(),
            chat_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            builder: PromptBuilder::new(),
            builder_field: BuilderField::Task,
            builder_error: None,

            refine_input: String::new(),
            refine_output: None,
            refine_loading: false,
            refine_elapsed_ms: None,

            show_api_key_input: false,
            api_key_input: String::new(),
            api_key_source,

            animation_frame: 0,

            config,
            gateway,
            events,
        }
    }

    /// Model tier the current screen talks to
    pub fn model_tier(&self) -> ModelTier {
        match self.screen {
            Screen::Refine => ModelTier::FlashLite,
            Screen::Tutor | Screen::Builder => ModelTier::Pro,
        }
    }

    pub fn model_name(&self) -> &str {
        self.gateway.models().name(self.model_tier())
    }

    /// Text of a builder field, if it currently exists
    pub fn builder_value(&self, field: BuilderField) -> Option<&str> {
        let inputs = &self.builder.inputs;
        match field {
            BuilderField::Role => Some(&inputs.role),
            BuilderField::Task => Some(&inputs.task),
            BuilderField::Context => Some(&inputs.context),
            BuilderField::Format => Some(&inputs.format),
            BuilderField::Constraints => Some(&inputs.constraints),
            BuilderField::Prompt => self.builder.result().map(|r| r.prompt.as_str()),
            BuilderField::TestInput => Some(&self.builder.test_input),
        }
    }

    pub fn builder_value_mut(&mut self, field: BuilderField) -> Option<&mut String> {
        match field {
            BuilderField::Role => Some(&mut self.builder.inputs.role),
            BuilderField::Task => Some(&mut self.builder.inputs.task),
            BuilderField::Context => Some(&mut self.builder.inputs.context),
            BuilderField::Format => Some(&mut self.builder.inputs.format),
            BuilderField::Constraints => Some(&mut self.builder.inputs.constraints),
            BuilderField::Prompt => self.builder.prompt_mut(),
            BuilderField::TestInput => Some(&mut self.builder.test_input),
        }
    }

    pub fn is_busy(&self) -> bool {
        match self.screen {
            Screen::Tutor => self.chat.is_loading(),
            Screen::Builder => self.builder.is_generating() || self.builder.is_executing(),
            Screen::Refine => self.refine_loading,
        }
    }

    pub fn tick_animation(&mut self) {
        self.animation_frame = (self.animation_frame + 1) % 3;
    }

    pub fn scroll_chat_down(&mut self) {
        let max_scroll = self.chat_line_count().saturating_sub(self.chat_height);
        self.chat_scroll = (self.chat_scroll + 1).min(max_scroll);
    }

    pub fn scroll_chat_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.chat_line_count().saturating_sub(self.chat_height);
    }

    /// Rendered height of the chat log after wrapping
    fn chat_line_count(&self) -> u16 {
        let width = self.chat_width.max(1) as usize;
        let lines: usize = self
            .chat
            .conversation()
            .messages()
            .iter()
            .map(|msg| {
                let body: usize = msg
                    .text
                    .lines()
                    .map(|line| line.chars().count().max(1).div_ceil(width))
                    .sum();
                // label + body (at least one line) + spacer, plus the badge on thinking replies
                let badge = usize::from(msg.is_thinking && msg.role == Role::Model);
                2 + body.max(1) + badge
            })
            .sum();
        u16::try_from(lines).unwrap_or(u16::MAX)
    }

    /// Store a new key and rebuild the gateway around it
    pub fn apply_api_key(&mut self) -> Result<()> {
        let key = self.api_key_input.trim().to_string();
        if key.is_empty() {
            return Ok(());
        }

        Config::save_api_key(&key)?;
        self.config.api_key = Some(key);

        let client = GeminiClient::new(self.config.resolved_api_key(), self.config.base_url())?;
        self.gateway = Arc::new(ModelGateway::new(Arc::new(client), self.config.models()));
        self.api_key_source = self.config.api_key_source();

        self.api_key_input.clear();
        self.show_api_key_input = false;
        tracing::info!("API key updated");
        Ok(())
    }
}
