//! Evaluation step: grades the latest answer against the success criteria

use gutcheck_ai::Message;
use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::error::{Error, Result};
use crate::state::AuditState;

/// Function name the extraction capability is forced to call
pub const VERDICT_FN: &str = "record_verdict";

/// Structured verdict produced fresh on each evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Evaluation of the ingredient analysis
    pub feedback: String,
    /// True if math and formatting are correct
    pub success_criteria_met: bool,
    /// True if the agent needs human help
    pub user_input_needed: bool,
}

/// JSON schema the extraction capability is constrained to
pub fn verdict_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "feedback": {
                "type": "string",
                "description": "Evaluation of the ingredient analysis."
            },
            "success_criteria_met": {
                "type": "boolean",
                "description": "True if math and formatting are correct."
            },
            "user_input_needed": {
                "type": "boolean",
                "description": "True if the agent needs human help."
            }
        },
        "required": ["feedback", "success_criteria_met", "user_input_needed"]
    })
}

/// Pure stopping decision: terminal iff the criteria are met or the loop
/// must hand control back to a human
pub fn should_stop(state: &AuditState) -> bool {
    state.success_criteria_met || state.user_input_needed
}

/// Render the conversation for the grading prompt.
///
/// Only user and assistant turns appear; an assistant turn that carries
/// tool calls and no text renders as a placeholder rather than its
/// structured payload. Tool results are excluded entirely.
pub fn render_history(history: &[Message]) -> String {
    let mut convo = String::from("History:\n\n");
    for m in history {
        match m {
            Message::User { .. } => {
                convo.push_str(&format!("User: {}\n", m.text()));
            }
            Message::Assistant { .. } => {
                let text = m.text();
                if text.is_empty() {
                    convo.push_str("Assistant: [Tools]\n");
                } else {
                    convo.push_str(&format!("Assistant: {}\n", text));
                }
            }
            Message::ToolResult { .. } => {}
        }
    }
    convo
}

fn grading_prompt(state: &AuditState, last_response: &str) -> String {
    let mut prompt = format!(
        "History: {}\nCriteria: {}\nFinal Response to Grade: {}\n\n\
         INSTRUCTIONS: Decide if criteria are met. If summary is > 1 sentence, reject it. \
         If math is wrong, reject it.",
        render_history(&state.history),
        state.success_criteria,
        last_response,
    );
    if let Some(feedback) = &state.feedback_on_work {
        prompt.push_str(&format!(
            " Previous Feedback ignored: {feedback}. Ask for user input if stuck."
        ));
    }
    prompt
}

/// Run one Evaluation step: grade the latest assistant entry, append the
/// feedback restatement, and fold the verdict into the state. Extraction
/// failures are fatal for the turn.
pub async fn run(capability: &dyn Capability, state: &mut AuditState) -> Result<Verdict> {
    let last_response = state.last().map(|m| m.text()).unwrap_or_default();
    let system = "You determine if the Assistant followed all formatting, math, and strictness rules.";
    let prompt = grading_prompt(state, &last_response);

    let raw = capability
        .extract(system, &prompt, VERDICT_FN, &verdict_schema())
        .await
        .map_err(Error::Extraction)?;
    let verdict: Verdict = serde_json::from_value(raw)
        .map_err(|e| Error::Extraction(gutcheck_ai::Error::Schema(e.to_string())))?;

    state
        .history
        .push(Message::assistant(format!("Evaluator Feedback: {}", verdict.feedback)));
    state.feedback_on_work = Some(verdict.feedback.clone());
    state.success_criteria_met = verdict.success_criteria_met;
    state.user_input_needed = verdict.user_input_needed;

    Ok(verdict)
}
