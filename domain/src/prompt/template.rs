//! Prompt templates for query orchestration

use crate::dialogue::{DialogueKind, TurnRole};

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Phrase a consensus participant emits once it fully agrees.
    pub const CONSENSUS_MARKER: &'static str = "CONSENSUS REACHED";

    /// Phrase the moderator's reasoner emits when it has nothing to add.
    pub const ANALYSIS_DONE_MARKER: &'static str = "ANALYSIS COMPLETE";

    // ==================== Single-model stages ====================

    /// Prompt for a direct answer (Simple mode and benchmark candidates).
    pub fn answer_prompt(question: &str, context: Option<&str>) -> String {
        let mut prompt = String::new();
        if let Some(context) = context {
            prompt.push_str(context);
            prompt.push_str("\n\n");
        }
        prompt.push_str(&format!(
            r#"Please answer the following question:

{}

Provide a clear, well-structured response."#,
            question
        ));
        prompt
    }

    /// Stage 1 of Two-Stage: a quick draft grounded in retrieved context.
    pub fn draft_prompt(question: &str, context: Option<&str>) -> String {
        let mut prompt = String::new();
        if let Some(context) = context {
            prompt.push_str(context);
            prompt.push_str("\n\n");
        }
        prompt.push_str(&format!(
            r#"Write a concise first draft answering the question below.
Use the context above where it is relevant and say so when it is not.

Question: {}"#,
            question
        ));
        prompt
    }

    /// Stage 2 of Two-Stage: refine the draft, or answer from scratch without one.
    pub fn refine_prompt(question: &str, draft: Option<&str>, context: Option<&str>) -> String {
        let mut prompt = String::new();
        if let Some(context) = context {
            prompt.push_str(context);
            prompt.push_str("\n\n");
        }
        prompt.push_str(&format!("Question: {}\n\n", question));
        match draft {
            Some(draft) => prompt.push_str(&format!(
                r#"A faster model produced this draft:

--- Draft ---
{}
--- End of draft ---

Correct any mistakes, fill in what is missing and return the improved final answer.
Do not mention the draft itself."#,
                draft
            )),
            None => prompt.push_str("Provide a thorough, well-structured final answer."),
        }
        prompt
    }

    // ==================== Dialogue ====================

    /// Instruction attached to every turn of the given role.
    pub fn role_instruction(role: TurnRole) -> &'static str {
        match role {
            TurnRole::ArgueFor => {
                "You argue IN FAVOR of the position implied by the question. Build the strongest case for it and rebut the opposing arguments made so far."
            }
            TurnRole::ArgueAgainst => {
                "You argue AGAINST the position implied by the question. Build the strongest case against it and rebut the supporting arguments made so far."
            }
            TurnRole::SeekCommonGround => {
                "You are one of several experts working toward a shared answer. Build on points of agreement, resolve disagreements with reasoning, and state clearly where you still differ."
            }
        }
    }

    /// Prompt for one dialogue turn, carrying the full prior transcript.
    pub fn turn_prompt(question: &str, role: TurnRole, transcript: &str, round: usize) -> String {
        let mut prompt = format!(
            "{}\n\nQuestion: {}\n",
            Self::role_instruction(role),
            question
        );

        if transcript.is_empty() {
            prompt.push_str("\nYou speak first. Give your opening statement.");
        } else {
            prompt.push_str(&format!(
                "\nDiscussion so far:\n\n{}\n\nThis is round {}. Respond to the points above.",
                transcript, round
            ));
        }

        if role == TurnRole::SeekCommonGround {
            prompt.push_str(&format!(
                "\nIf you fully agree with the current shared answer, end your reply with \"{}\".",
                Self::CONSENSUS_MARKER
            ));
        }
        prompt
    }

    /// Prompt for the participant that consolidates the final answer.
    pub fn synthesis_prompt(kind: DialogueKind, question: &str, transcript: &str) -> String {
        let task = match kind {
            DialogueKind::Debate => {
                "You took part in the debate below. Step out of your assigned side and write a balanced final answer: weigh the strongest arguments from both sides and state which conclusion is better supported."
            }
            DialogueKind::Consensus => {
                "You took part in the discussion below. Write the consolidated final answer the group converged on, noting any point that remained disputed."
            }
        };
        format!(
            "{}\n\nQuestion: {}\n\nTranscript:\n\n{}\n\nFinal answer:",
            task, question, transcript
        )
    }

    // ==================== Moderator ====================

    /// Task handed to the moderator's iterative reasoner.
    pub fn moderator_prompt(kind: DialogueKind, question: &str, transcript: &str) -> String {
        format!(
            r#"You are moderating a completed {} about the question:

{}

Transcript:

{}

Analyze the dialogue one observation at a time. Start every observation with one tag:
STRENGTH (PRO|CON): a strong argument
WEAKNESS (PRO|CON): a weak or unsupported argument
FALLACY: a logical fallacy, naming the turn
RHETORIC: a rhetorical device used instead of evidence
GAP: something relevant nobody addressed
VERDICT: PRO, CON or DRAW, followed by a short rationale

Give your running VERDICT whenever your judgment changes."#,
            kind, question, transcript
        )
    }

    /// Prompt for one reasoning step given the thoughts produced so far.
    pub fn reasoning_step_prompt(task: &str, prior_steps: &[String]) -> String {
        let mut prompt = task.to_string();
        if !prior_steps.is_empty() {
            prompt.push_str("\n\nYour observations so far:\n");
            for (i, step) in prior_steps.iter().enumerate() {
                prompt.push_str(&format!("{}. {}\n", i + 1, step));
            }
        }
        prompt.push_str(&format!(
            "\nGive exactly one new observation. If nothing important remains, reply with \"{}\" alone.",
            Self::ANALYSIS_DONE_MARKER
        ));
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_prompt_with_context() {
        let prompt = PromptTemplate::answer_prompt("What is Rust?", Some("Relevant context:\nx"));
        assert!(prompt.starts_with("Relevant context:"));
        assert!(prompt.contains("What is Rust?"));
    }

    #[test]
    fn test_refine_prompt_without_draft() {
        let prompt = PromptTemplate::refine_prompt("Why?", None, None);
        assert!(prompt.contains("Question: Why?"));
        assert!(!prompt.contains("Draft"));

        let prompt = PromptTemplate::refine_prompt("Why?", Some("because"), None);
        assert!(prompt.contains("because"));
    }

    #[test]
    fn test_turn_prompt_opening_and_followup() {
        let opening = PromptTemplate::turn_prompt("Tabs?", TurnRole::ArgueFor, "", 1);
        assert!(opening.contains("IN FAVOR"));
        assert!(opening.contains("opening statement"));

        let followup = PromptTemplate::turn_prompt(
            "Tabs?",
            TurnRole::SeekCommonGround,
            "[Turn 1 | a | seek-common-ground]\nyes",
            2,
        );
        assert!(followup.contains("round 2"));
        assert!(followup.contains(PromptTemplate::CONSENSUS_MARKER));
    }

    #[test]
    fn test_moderator_prompt_lists_tags() {
        let prompt = PromptTemplate::moderator_prompt(DialogueKind::Debate, "Tabs?", "...");
        for tag in ["STRENGTH", "WEAKNESS", "FALLACY", "RHETORIC", "GAP", "VERDICT"] {
            assert!(prompt.contains(tag));
        }
        assert!(prompt.contains("completed debate"));
    }

    #[test]
    fn test_reasoning_step_prompt_numbers_prior_steps() {
        let prompt = PromptTemplate::reasoning_step_prompt(
            "task",
            &["GAP: cost".to_string(), "VERDICT: PRO".to_string()],
        );
        assert!(prompt.contains("1. GAP: cost"));
        assert!(prompt.contains("2. VERDICT: PRO"));
        assert!(prompt.contains(PromptTemplate::ANALYSIS_DONE_MARKER));
    }
}
