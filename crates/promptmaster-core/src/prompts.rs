//! Framing text sent to the model.
//!
//! The structure instruction and [`crate::generator::GeneratedResult::parse`]
//! share the separator token; change them together.

use crate::generator::{PromptInputs, SEPARATOR};

pub const NOT_SPECIFIED: &str = "Not specified";

pub const REFINE_SYSTEM: &str = "You are a helpful editor. Briefly polish the prompt you are given \
so that it is clear and grammatically correct. Do not add any explanation; return only the \
improved version.";

pub const TUTOR_SYSTEM: &str = "You are an expert AI tutor. Your goal is to teach the user how to \
use AI effectively. Guide them towards writing better prompts and explain concepts such as \
zero-shot prompting, chain-of-thought and the limitations of large language models. Be helpful, \
patient and insightful.";

pub const DEEP_THINKING_SYSTEM: &str = "You are a deep-thinking entity and an expert AI tutor. \
Before answering, reason carefully through the problem, consider alternative interpretations and \
check your conclusions. Then give the user a clear, well-structured answer that teaches them how \
to prompt AI systems effectively.";

pub const TEST_INPUT_HEADER: &str = "Test input:";

pub fn refine_contents(draft: &str) -> String {
    format!("Prompt: \"{}\"", draft)
}

fn or_not_specified(field: &str) -> &str {
    let field = field.trim();
    if field.is_empty() {
        NOT_SPECIFIED
    } else {
        field
    }
}

/// Meta-instruction asking for a strategy note and a final prompt
pub fn structure_instruction(inputs: &PromptInputs) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are a prompt engineering expert. ");
    prompt.push_str("Build a highly effective prompt from the user's components below.\n\n");

    prompt.push_str(&format!("- Role / persona: {}\n", or_not_specified(&inputs.role)));
    prompt.push_str(&format!("- Task: {}\n", inputs.task.trim()));
    prompt.push_str(&format!("- Context: {}\n", or_not_specified(&inputs.context)));
    prompt.push_str(&format!("- Output format: {}\n", or_not_specified(&inputs.format)));
    prompt.push_str(&format!("- Constraints: {}\n\n", or_not_specified(&inputs.constraints)));

    prompt.push_str("While building it:\n");
    prompt.push_str("1. If the role is not specified, infer the most suitable expert persona for the task.\n");
    prompt.push_str("2. Add defensive constraints that prevent hallucination, vague answers and scope creep.\n");
    prompt.push_str("3. Organise the prompt with the CO-STAR framework (Context, Objective, Style, Tone, Audience, Response).\n");
    prompt.push_str("4. Include an explicit instruction to think step by step before answering.\n\n");

    prompt.push_str("Respond with exactly two sections and nothing else:\n");
    prompt.push_str("First, a short strategy note explaining the design choices you made.\n");
    prompt.push_str(&format!("Then a line containing only {}\n", SEPARATOR));
    prompt.push_str("Then the final prompt, ready to copy and paste, with no preamble or closing remarks.");

    prompt
}

pub fn playground_contents(prompt: &str, test_input: &str) -> String {
    if test_input.trim().is_empty() {
        prompt.to_string()
    } else {
        format!("{}\n\n{}\n{}", prompt, TEST_INPUT_HEADER, test_input)
    }
}
