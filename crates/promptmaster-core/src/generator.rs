//! Two-phase prompt generator.
//!
//! One request returns a strategy note and a final prompt separated by
//! [`SEPARATOR`]; the split happens locally.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{GatewayError, GeneratorError};
use crate::gateway::ModelGateway;
use crate::playground;

pub const SEPARATOR: &str = "---SEPARATOR---";
pub const NO_STRATEGY_NOTE: &str = "No architecture notes provided.";

/// Builder form fields. Only `task` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptInputs {
    pub role: String,
    pub task: String,
    pub context: String,
    pub format: String,
    pub constraints: String,
}

impl PromptInputs {
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.task.trim().is_empty() {
            return Err(GeneratorError::MissingTask);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedResult {
    pub strategy: String,
    pub prompt: String,
}

impl GeneratedResult {
    /// Split a raw response on the first separator. Later separators stay in
    /// the prompt; a missing separator makes the whole response the prompt.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(SEPARATOR) {
            Some((strategy, prompt)) => Self {
                strategy: strategy.trim().to_string(),
                prompt: prompt.trim().to_string(),
            },
            None => Self {
                strategy: NO_STRATEGY_NOTE.to_string(),
                prompt: raw.trim().to_string(),
            },
        }
    }
}

/// Builder view state: inputs, the latest result and the playground
#[derive(Debug, Default)]
pub struct PromptBuilder {
    pub inputs: PromptInputs,
    pub test_input: String,
    result: Option<GeneratedResult>,
    test_output: Option<String>,
    generating: bool,
    executing: bool,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result(&self) -> Option<&GeneratedResult> {
        self.result.as_ref()
    }

    pub fn test_output(&self) -> Option<&str> {
        self.test_output.as_deref()
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn is_executing(&self) -> bool {
        self.executing
    }

    /// Validate and mark a generation as in flight
    pub fn begin_generate(&mut self) -> Result<PromptInputs, GeneratorError> {
        if self.generating || self.executing {
            return Err(GeneratorError::Busy);
        }
        self.inputs.validate()?;
        self.generating = true;
        Ok(self.inputs.clone())
    }

    /// Store a generation outcome. On failure the previous result is kept.
    pub fn finish_generate(&mut self, outcome: Result<String, GatewayError>) -> Result<(), GeneratorError> {
        self.generating = false;
        let raw = outcome?;

        let result = GeneratedResult::parse(&raw);
        if result.strategy == NO_STRATEGY_NOTE {
            warn!("Generator response had no separator");
        }
        info!(prompt_chars = result.prompt.chars().count(), "Prompt generated");

        self.result = Some(result);
        self.test_output = None;
        Ok(())
    }

    pub async fn generate(&mut self, gateway: &ModelGateway) -> Result<&GeneratedResult, GeneratorError> {
        let inputs = self.begin_generate()?;
        let outcome = gateway.structured_generate(&inputs).await;
        self.finish_generate(outcome)?;
        self.result.as_ref().ok_or(GeneratorError::Gateway(GatewayError::EmptyResponse))
    }

    /// Hand-edit the generated prompt. The strategy note is untouched.
    pub fn edit_prompt(&mut self, text: impl Into<String>) -> bool {
        match self.result.as_mut() {
            Some(result) => {
                result.prompt = text.into();
                true
            }
            None => false,
        }
    }

    pub fn prompt_mut(&mut self) -> Option<&mut String> {
        self.result.as_mut().map(|r| &mut r.prompt)
    }

    /// Prompt and test input for a playground run, if one can start
    pub fn begin_execute(&mut self) -> Option<(String, String)> {
        if self.executing || self.generating {
            return None;
        }
        let prompt = self.result.as_ref()?.prompt.clone();
        self.executing = true;
        Some((prompt, self.test_input.clone()))
    }

    pub fn finish_execute(&mut self, output: String) {
        self.executing = false;
        self.test_output = Some(output);
    }

    pub async fn run_playground(&mut self, gateway: &ModelGateway) -> Option<&str> {
        let (prompt, test_input) = self.begin_execute()?;
        let output = playground::execute(gateway, &prompt, &test_input).await;
        self.finish_execute(output);
        self.test_output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{gateway, ScriptedBackend};

    fn builder_with_task(task: &str) -> PromptBuilder {
        let mut builder = PromptBuilder::new();
        builder.inputs.task = task.to_string();
        builder
    }

    #[test]
    fn test_parse_single_separator() {
        let raw = "  Used CO-STAR and a Python persona.\n---SEPARATOR---\n# Role\nYou are a senior engineer.  \n";
        let result = GeneratedResult::parse(raw);
        assert_eq!(result.strategy, "Used CO-STAR and a Python persona.");
        assert_eq!(result.prompt, "# Role\nYou are a senior engineer.");

        let rebuilt = format!("{}{}{}", result.strategy, SEPARATOR, result.prompt);
        let (before, after) = raw.split_once(SEPARATOR).unwrap();
        assert_eq!(rebuilt, format!("{}{}{}", before.trim(), SEPARATOR, after.trim()));
    }

    #[test]
    fn test_parse_keeps_later_separators_in_prompt() {
        let raw = "notes ---SEPARATOR--- part one ---SEPARATOR--- part two";
        let result = GeneratedResult::parse(raw);
        assert_eq!(result.strategy, "notes");
        assert_eq!(result.prompt, "part one ---SEPARATOR--- part two");
    }

    #[test]
    fn test_parse_without_separator() {
        let result = GeneratedResult::parse("\n  Just a prompt.  \n");
        assert_eq!(result.strategy, NO_STRATEGY_NOTE);
        assert_eq!(result.prompt, "Just a prompt.");
    }

    #[test]
    fn test_parse_empty_strategy() {
        let result = GeneratedResult::parse("---SEPARATOR---prompt only");
        assert_eq!(result.strategy, "");
        assert_eq!(result.prompt, "prompt only");
    }

    #[test]
    fn test_blank_task_is_rejected() {
        let mut builder = builder_with_task("   ");
        builder.inputs.role = "Marketer".to_string();
        assert!(matches!(builder.begin_generate(), Err(GeneratorError::MissingTask)));
        assert!(!builder.is_generating());
    }

    #[test]
    fn test_second_generation_while_busy() {
        let mut builder = builder_with_task("write a script");
        builder.begin_generate().unwrap();
        assert!(matches!(builder.begin_generate(), Err(GeneratorError::Busy)));
    }

    #[test]
    fn test_edit_prompt_keeps_strategy() {
        let mut builder = builder_with_task("t");
        builder.begin_generate().unwrap();
        builder.finish_generate(Ok("why---SEPARATOR---what".to_string())).unwrap();

        assert!(builder.edit_prompt("what, edited"));
        let result = builder.result().unwrap();
        assert_eq!(result.strategy, "why");
        assert_eq!(result.prompt, "what, edited");
    }

    #[test]
    fn test_edit_without_result() {
        let mut builder = PromptBuilder::new();
        assert!(!builder.edit_prompt("x"));
        assert!(builder.prompt_mut().is_none());
    }

    #[test]
    fn test_failed_generation_keeps_previous_result() {
        let mut builder = builder_with_task("t");
        builder.begin_generate().unwrap();
        builder.finish_generate(Ok("a---SEPARATOR---b".to_string())).unwrap();

        builder.begin_generate().unwrap();
        let outcome = builder.finish_generate(Err(GatewayError::MissingApiKey));
        assert!(matches!(outcome, Err(GeneratorError::Gateway(GatewayError::MissingApiKey))));
        assert!(!builder.is_generating());
        assert_eq!(builder.result().unwrap().prompt, "b");
    }

    #[tokio::test]
    async fn test_regeneration_clears_playground_output() {
        let backend = ScriptedBackend::new()
            .reply(Ok("first---SEPARATOR---prompt one"))
            .reply(Ok("trial output"))
            .reply(Ok("second---SEPARATOR---prompt two"));
        let (gateway, _) = gateway(backend);
        let mut builder = builder_with_task("summarise");

        builder.generate(&gateway).await.unwrap();
        assert_eq!(builder.run_playground(&gateway).await, Some("trial output"));

        let result = builder.generate(&gateway).await.unwrap().clone();
        assert_eq!(result.strategy, "second");
        assert_eq!(result.prompt, "prompt two");
        assert_eq!(builder.test_output(), None);
    }

    #[tokio::test]
    async fn test_generate_without_task_makes_no_request() {
        let (gateway, backend) = gateway(ScriptedBackend::new());
        let mut builder = PromptBuilder::new();
        assert!(builder.generate(&gateway).await.is_err());
        assert!(backend.generate_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_playground_uses_edited_prompt() {
        let backend = ScriptedBackend::new()
            .reply(Ok("s---SEPARATOR---original"))
            .reply(Ok("ran"));
        let (gateway, backend) = gateway(backend);
        let mut builder = builder_with_task("t");
        builder.generate(&gateway).await.unwrap();

        builder.edit_prompt("edited prompt");
        builder.test_input = "sample".to_string();
        builder.run_playground(&gateway).await;

        assert_eq!(
            backend.last_generate_request().contents,
            "edited prompt\n\nTest input:\nsample"
        );
    }

    #[tokio::test]
    async fn test_playground_needs_a_prompt() {
        let (gateway, _) = gateway(ScriptedBackend::new());
        let mut builder = PromptBuilder::new();
        assert_eq!(builder.run_playground(&gateway).await, None);
        assert!(!builder.is_executing());
    }
}
