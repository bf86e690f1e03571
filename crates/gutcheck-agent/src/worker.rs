//! Generation step: drafts the audit answer or requests a tool

use gutcheck_ai::{Message, Tool};

use crate::capability::Capability;
use crate::error::{Error, Result};
use crate::state::AuditState;

/// Where the loop goes after a Worker step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The latest entry requests tool invocations
    Tools,
    /// The latest entry is an answer ready for grading
    Evaluator,
}

/// Pure routing decision on the latest entry
pub fn route_after_worker(message: &Message) -> Route {
    if message.tool_calls().is_empty() {
        Route::Evaluator
    } else {
        Route::Tools
    }
}

/// Build the instruction entry for one generation call.
///
/// Rebuilt from scratch every invocation, parameterized by the session's
/// success criteria and the latest evaluator feedback, so exactly one
/// instruction exists per request and it is never stale.
pub fn instruction(success_criteria: &str, feedback: Option<&str>) -> String {
    let mut prompt = format!(
        "### CORE MISSION ###
You are 'GutCheck', a blunt Health Auditor. Your goal is to expose the metabolic reality of products.
Success Criteria: {success_criteria}

### MANDATORY AUDIT RULES ###
1. **The \"Sugar-First\" Rule:** If sugar, syrup, or caloric sweeteners are in the top 3 ingredients, it is a 'Metabolic Tax' (Max score 3/10).
2. **Industrial Oil Flagging:** Specifically identify and penalize refined oils: Palm, Soybean, Canola, Corn, Safflower, and Sunflower.
3. **Macronutrient Research:** You MUST use 'ingredient_researcher' to find the 'Added Sugar' and 'Saturated Fat' grams per serving.
   - If added sugar > 10g: Automatic -3 penalty to the final score.

### SCORING MATH ###
- Start with a Base of 10.
- Subtract points for high sugar, industrial oils, and harmful additives.
- Show the subtraction math clearly.

### RESPONSE FORMAT (STRICT) ###
- Flagged Ingredients: List offenders + 1-word reason (e.g., \"Palm Oil: Inflammatory\").
- Macro Audit: Grams of Sugar and Fat found.
- Score Calculation: Show the deduction math.
- Bottom Line: One sentence maximum."
    );

    if let Some(feedback) = feedback {
        prompt.push_str(&format!(
            "\n\n### PRIOR FEEDBACK ###\nFix these issues: {feedback}"
        ));
    }

    prompt
}

/// Run one Worker step: invoke the generation capability with the derived
/// instruction, the full history, and the available tools, then append the
/// single returned entry. Generation failures are fatal for the turn.
pub async fn run(
    capability: &dyn Capability,
    state: &mut AuditState,
    tools: &[Tool],
) -> Result<Message> {
    let system = instruction(&state.success_criteria, state.feedback_on_work.as_deref());
    let message = capability
        .generate(&system, &state.history, tools)
        .await
        .map_err(Error::Generation)?;
    state.history.push(message.clone());
    Ok(message)
}
