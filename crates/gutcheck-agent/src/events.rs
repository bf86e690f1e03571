//! Audit event types

use gutcheck_ai::Message;
use serde::{Deserialize, Serialize};

/// Events emitted while a turn runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A turn started processing
    TurnStart,

    /// The Worker produced an entry (answer or tool request)
    WorkerEnd { message: Message },

    /// Tool execution started
    ToolExecutionStart {
        tool_call_id: String,
        tool_name: String,
        arguments: serde_json::Value,
    },

    /// Tool execution completed
    ToolExecutionEnd {
        tool_call_id: String,
        tool_name: String,
        result: String,
        is_error: bool,
    },

    /// The Evaluator produced a verdict
    EvaluationEnd {
        feedback: String,
        success_criteria_met: bool,
        user_input_needed: bool,
    },

    /// The turn reached its terminal state
    TurnEnd { eval_rounds: u32 },

    /// The turn aborted with an error
    Error { message: String },
}
