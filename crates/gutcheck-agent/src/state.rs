//! Per-session conversation state

use gutcheck_ai::Message;
use serde::{Deserialize, Serialize};

/// Criteria applied when the caller supplies none
pub const DEFAULT_CRITERIA: &str =
    "Analyze product safety. Calculate average score. Keep summary under 1 sentence.";

/// The unit of persistence for one audit session.
///
/// `history` is append-only within a turn. The Worker's instruction entry is
/// not stored here: it is derived from `success_criteria` and
/// `feedback_on_work` on every generation call, so the history can never
/// accumulate stale or duplicate instruction entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditState {
    /// Appended message entries (user, assistant, tool results)
    pub history: Vec<Message>,
    /// Acceptance bar for this session, set once per user turn
    pub success_criteria: String,
    /// Critique from the most recent Evaluator run, if any
    pub feedback_on_work: Option<String>,
    /// Whether the Evaluator accepted the latest answer
    pub success_criteria_met: bool,
    /// Whether the loop must hand control back to a human
    pub user_input_needed: bool,
}

impl AuditState {
    /// Start a new turn: append the user entry, set the criteria, and reset
    /// the verdict fields so a verdict from a previous turn never carries
    /// into this turn's stopping decision.
    pub fn begin_turn(&mut self, user_text: &str, criteria: Option<&str>) {
        self.history.push(Message::user(user_text));
        self.success_criteria = criteria
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_CRITERIA)
            .to_string();
        self.feedback_on_work = None;
        self.success_criteria_met = false;
        self.user_input_needed = false;
    }

    /// The most recently appended entry
    pub fn last(&self) -> Option<&Message> {
        self.history.last()
    }
}
