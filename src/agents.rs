//! Agent profiles and prompt composition.
//!
//! Each pipeline stage talks to the language model as a distinct "agent". An agent
//! is configuration only: a role, a goal, a backstory and the tools it is allowed to
//! mention. The stage supplies a [`TaskSpec`] and the accumulated pipeline context,
//! and [`compose_prompt`] turns the three into the text sent to the model.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Free-text persona handed to the language model for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AgentProfile {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    #[serde(default)]
    pub tools: Vec<String>,
}

impl AgentProfile {
    fn new(role: &str, goal: &str, backstory: &str, tools: &[&str]) -> Self {
        Self {
            role: role.to_string(),
            goal: goal.to_string(),
            backstory: backstory.to_string(),
            tools: tools.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// A stage's task: what to do and what the answer must look like.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    pub description: &'static str,
    pub expected_output: &'static str,
}

/// The full set of agent profiles used by the pipeline.
///
/// Loaded from the `agents` section of the settings file; any profile left out
/// keeps its default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentRoster {
    pub claim_identifier: AgentProfile,
    pub claim_verifier: AgentProfile,
    pub credibility_summarizer: AgentProfile,
}

impl Default for AgentRoster {
    fn default() -> Self {
        Self {
            claim_identifier: AgentProfile::new(
                "Claim Identification Expert",
                "Identify and extract factual claims from text that can be verified",
                "You are a linguistic specialist who can identify factual assertions within text. \
                 You are trained to distinguish between opinions, predictions, and verifiable factual \
                 claims. Your expertise helps separate what can be fact-checked from what cannot.",
                &[],
            ),
            claim_verifier: AgentProfile::new(
                "Claim Verification Analyst",
                "Analyze claims against research to determine their accuracy",
                "You are an analytical expert who specializes in comparing claims against evidence. \
                 You can identify inconsistencies, confirm accuracies, and determine the truthfulness \
                 of statements based on the available evidence.",
                &[],
            ),
            credibility_summarizer: AgentProfile::new(
                "Credibility Assessment Summarizer",
                "Create a clear, comprehensive summary of the fact-checking results",
                "You are a communication specialist who can clearly explain complex fact-checking \
                 results. You are skilled at creating summaries that highlight key findings and their \
                 implications for the overall credibility of content.",
                &[],
            ),
        }
    }
}

/// Render the prompt for one model call.
///
/// Context entries are emitted in the given order under their key, so later stages
/// see earlier stage outputs exactly as they were recorded.
pub fn compose_prompt(profile: &AgentProfile, task: &TaskSpec, context: &[(&str, String)]) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Role: {}", profile.role);
    let _ = writeln!(prompt, "Goal: {}", profile.goal);
    let _ = writeln!(prompt, "Backstory: {}", profile.backstory);
    if !profile.tools.is_empty() {
        let _ = writeln!(prompt, "Tools: {}", profile.tools.join(", "));
    }
    let _ = writeln!(prompt, "\nTask:\n{}", task.description.trim());
    let _ = writeln!(prompt, "\nExpected output:\n{}", task.expected_output.trim());

    if !context.is_empty() {
        let _ = writeln!(prompt, "\nContext:");
        for (key, value) in context {
            let _ = writeln!(prompt, "[{key}]\n{}\n", value.trim());
        }
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    const TASK: TaskSpec = TaskSpec {
        description: "Do the thing.",
        expected_output: "A thing.",
    };

    #[test]
    fn test_prompt_contains_profile_task_and_context() {
        let profile = AgentProfile::new("Fact Research Specialist", "Find facts", "Thorough.", &["Web Search"]);
        let prompt = compose_prompt(
            &profile,
            &TASK,
            &[("claim", "Water boils at 100C".to_string())],
        );
        assert!(prompt.starts_with("Role: Fact Research Specialist"));
        assert!(prompt.contains("Tools: Web Search"));
        assert!(prompt.contains("Task:\nDo the thing."));
        assert!(prompt.contains("Expected output:\nA thing."));
        assert!(prompt.contains("[claim]\nWater boils at 100C"));
    }

    #[test]
    fn test_prompt_omits_empty_sections() {
        let roster = AgentRoster::default();
        let prompt = compose_prompt(&roster.claim_verifier, &TASK, &[]);
        assert!(!prompt.contains("Tools:"));
        assert!(!prompt.contains("Context:"));
    }

    #[test]
    fn test_roster_partial_yaml_keeps_defaults() {
        let yaml = r#"
claim_verifier:
  role: Strict Verifier
  goal: Be strict
  backstory: Very strict.
"#;
        let roster: AgentRoster = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(roster.claim_verifier.role, "Strict Verifier");
        assert!(roster.claim_verifier.tools.is_empty());
        assert_eq!(roster.claim_identifier, AgentRoster::default().claim_identifier);
    }
}
