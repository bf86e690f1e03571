//! Auditor session and control loop

use std::collections::HashMap;
use std::sync::Arc;

use gutcheck_ai::Message;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    capability::Capability,
    error::{Error, Result},
    evaluator::{self, should_stop},
    events::AuditEvent,
    resource::SessionResource,
    state::AuditState,
    store::SessionStore,
    tool::{BoxedTool, ToolResult, to_api_tool},
    worker::{self, Route, route_after_worker},
};

/// Auditor configuration
#[derive(Debug, Clone)]
pub struct AuditorConfig {
    /// Worker steps per turn before the loop forces a hand-back to the
    /// human. Every loop iteration runs the worker exactly once, so this
    /// bounds the tool cycle and the evaluation cycle alike.
    pub max_steps: u32,
}

impl Default for AuditorConfig {
    fn default() -> Self {
        Self { max_steps: 8 }
    }
}

/// What one completed turn hands back to the UI: the submitted user text and
/// the last graded answer (not the evaluator's commentary).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub user: String,
    pub reply: String,
}

/// One audit session: owns its token, tools, and automation handle, and runs
/// the worker/evaluator state machine turn by turn.
pub struct Auditor {
    config: AuditorConfig,
    session: Uuid,
    store: SessionStore,
    capability: Arc<dyn Capability>,
    tools: Vec<BoxedTool>,
    event_tx: broadcast::Sender<AuditEvent>,
    resource: Option<Box<dyn SessionResource>>,
    cancel: CancellationToken,

    /// Cached compiled JSON schema validators keyed by tool name
    schema_cache: HashMap<String, Arc<jsonschema::Validator>>,
}

impl Auditor {
    /// Create a new session with a fresh token registered in the store
    pub fn new(config: AuditorConfig, capability: Arc<dyn Capability>, store: SessionStore) -> Self {
        let session = Uuid::new_v4();
        store.create(session);
        let (event_tx, _) = broadcast::channel(256);
        Self {
            config,
            session,
            store,
            capability,
            tools: vec![],
            event_tx,
            resource: None,
            cancel: CancellationToken::new(),
            schema_cache: HashMap::new(),
        }
    }

    /// The opaque token identifying this session
    pub fn session_token(&self) -> Uuid {
        self.session
    }

    /// Subscribe to turn events
    pub fn subscribe(&self) -> broadcast::Receiver<AuditEvent> {
        self.event_tx.subscribe()
    }

    /// Add a tool
    pub fn add_tool(&mut self, tool: BoxedTool) {
        self.cache_tool_schema(&tool);
        self.tools.push(tool);
    }

    /// Set tools (replaces existing)
    pub fn set_tools(&mut self, tools: Vec<BoxedTool>) {
        self.schema_cache.clear();
        for tool in &tools {
            self.cache_tool_schema(tool);
        }
        self.tools = tools;
    }

    /// Get tool names
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Attach the session-held automation handle
    pub fn set_resource(&mut self, resource: Box<dyn SessionResource>) {
        self.resource = Some(resource);
    }

    /// End the session: release the automation handle (at most once) and
    /// discard the persisted state. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(resource) = self.resource.take() {
            tracing::debug!(name = resource.name(), "releasing session resource");
            resource.release();
        }
        self.store.remove(&self.session);
    }

    /// Compile and cache the JSON schema validator for a tool.
    fn cache_tool_schema(&mut self, tool: &BoxedTool) {
        let schema = tool.parameters_schema();
        match jsonschema::validator_for(&schema) {
            Ok(validator) => {
                self.schema_cache
                    .insert(tool.name().to_string(), Arc::new(validator));
            }
            Err(e) => {
                tracing::warn!(
                    "Invalid tool parameter schema for '{}', skipping validation: {}",
                    tool.name(),
                    e
                );
            }
        }
    }

    /// Run one turn of the state machine to completion.
    ///
    /// The persisted state is written back whether the turn ends in `END` or
    /// in a fatal generation/extraction error, so the session stays
    /// resumable either way.
    pub async fn run_turn(&mut self, user_text: &str, criteria: Option<&str>) -> Result<Exchange> {
        let mut state = self.store.load(&self.session).unwrap_or_default();
        state.begin_turn(user_text, criteria);
        let _ = self.event_tx.send(AuditEvent::TurnStart);

        let api_tools: Vec<gutcheck_ai::Tool> =
            self.tools.iter().map(|t| to_api_tool(t.as_ref())).collect();

        let mut steps = 0u32;
        let mut eval_rounds = 0u32;
        let result = loop {
            steps += 1;
            let message = match worker::run(&*self.capability, &mut state, &api_tools).await {
                Ok(m) => m,
                Err(e) => break Err(e),
            };
            let _ = self.event_tx.send(AuditEvent::WorkerEnd {
                message: message.clone(),
            });

            // Tool requests are always dispatched so every tool-call entry
            // has its results in the history, but the worker only runs again
            // while the step cap allows it; at the cap the turn is graded
            // as-is so it still ends with an evaluator verdict.
            if route_after_worker(&message) == Route::Tools {
                let results = self.dispatch_tool_calls(&message).await;
                state.history.extend(results);
                if steps < self.config.max_steps {
                    continue;
                }
                tracing::warn!(
                    session = %self.session,
                    steps,
                    "step cap reached while requesting tools, grading as-is"
                );
            }

            let verdict = match evaluator::run(&*self.capability, &mut state).await {
                Ok(v) => v,
                Err(e) => break Err(e),
            };
            let _ = self.event_tx.send(AuditEvent::EvaluationEnd {
                feedback: verdict.feedback,
                success_criteria_met: verdict.success_criteria_met,
                user_input_needed: verdict.user_input_needed,
            });

            eval_rounds += 1;
            if !should_stop(&state) && steps >= self.config.max_steps {
                tracing::warn!(
                    session = %self.session,
                    steps,
                    "step cap reached, handing back to the user"
                );
                state.user_input_needed = true;
            }
            if should_stop(&state) {
                break Ok(());
            }
        };

        self.store.save(self.session, state.clone());

        match result {
            Ok(()) => {
                let _ = self.event_tx.send(AuditEvent::TurnEnd { eval_rounds });

                // The final entry of a completed turn is always the
                // evaluator's feedback restatement; the graded answer sits
                // immediately before it.
                debug_assert!(
                    state
                        .last()
                        .map(|m| m.text().starts_with("Evaluator Feedback:"))
                        .unwrap_or(false)
                );
                let reply = state
                    .history
                    .len()
                    .checked_sub(2)
                    .and_then(|i| state.history.get(i))
                    .map(|m| m.text())
                    .unwrap_or_default();

                Ok(Exchange {
                    user: user_text.to_string(),
                    reply,
                })
            }
            Err(e) => {
                let _ = self.event_tx.send(AuditEvent::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Execute every tool call on the given assistant entry, yielding exactly
    /// one tool-result entry per call. Unknown tools, invalid arguments, and
    /// execution failures all become error-flagged results; dispatch itself
    /// never fails.
    async fn dispatch_tool_calls(&self, message: &Message) -> Vec<Message> {
        let calls: Vec<(String, String, serde_json::Value)> = message
            .tool_calls()
            .into_iter()
            .map(|(id, name, args)| (id.to_string(), name.to_string(), args.clone()))
            .collect();

        let mut results = Vec::with_capacity(calls.len());
        for (id, name, args) in calls {
            let _ = self.event_tx.send(AuditEvent::ToolExecutionStart {
                tool_call_id: id.clone(),
                tool_name: name.clone(),
                arguments: args.clone(),
            });

            let tool = self.tools.iter().find(|t| t.name() == name);
            let result = if let Some(tool) = tool {
                let validation_error = self
                    .schema_cache
                    .get(&name)
                    .and_then(|validator| validate_with_validator(&args, validator));

                if let Some(err) = validation_error {
                    ToolResult::error(err)
                } else {
                    tool.execute(&id, args, self.cancel.clone()).await
                }
            } else {
                ToolResult::error(format!("Tool not found: {}", name))
            };

            let _ = self.event_tx.send(AuditEvent::ToolExecutionEnd {
                tool_call_id: id.clone(),
                tool_name: name.clone(),
                result: result.content.clone(),
                is_error: result.is_error,
            });

            results.push(Message::tool_result(
                id,
                name,
                result.content,
                result.is_error,
            ));
        }
        results
    }
}

impl Drop for Auditor {
    fn drop(&mut self) {
        // Safety net: a dropped session must not leak its handle. The take()
        // in shutdown() keeps release at-most-once.
        if let Some(resource) = self.resource.take() {
            resource.release();
        }
    }
}

/// Validate tool arguments using a pre-compiled validator.
/// Returns `Some(error_message)` if validation fails, `None` if valid.
fn validate_with_validator(
    args: &serde_json::Value,
    validator: &jsonschema::Validator,
) -> Option<String> {
    let errors: Vec<String> = validator
        .iter_errors(args)
        .map(|e| {
            let path = e.instance_path.to_string();
            if path.is_empty() {
                e.to_string()
            } else {
                format!("{}: {}", path, e)
            }
        })
        .collect();

    if errors.is_empty() {
        None
    } else {
        Some(format!(
            "Tool argument validation failed:\n{}",
            errors.join("\n")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::VERDICT_FN;
    use crate::tool::Tool;
    use async_trait::async_trait;
    use gutcheck_ai::{AssistantMetadata, Content};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted capability: pops canned worker responses and verdicts, and
    /// records every instruction it was handed.
    struct MockCapability {
        responses: Mutex<Vec<Message>>,
        verdicts: Mutex<Vec<serde_json::Value>>,
        instructions: Mutex<Vec<String>>,
        fail_generation: bool,
    }

    impl MockCapability {
        fn new(responses: Vec<Message>, verdicts: Vec<serde_json::Value>) -> Self {
            Self {
                responses: Mutex::new(responses),
                verdicts: Mutex::new(verdicts),
                instructions: Mutex::new(vec![]),
                fail_generation: false,
            }
        }

        fn failing() -> Self {
            Self {
                responses: Mutex::new(vec![]),
                verdicts: Mutex::new(vec![]),
                instructions: Mutex::new(vec![]),
                fail_generation: true,
            }
        }

        fn accept() -> serde_json::Value {
            serde_json::json!({
                "feedback": "Looks correct.",
                "success_criteria_met": true,
                "user_input_needed": false
            })
        }

        fn reject(feedback: &str) -> serde_json::Value {
            serde_json::json!({
                "feedback": feedback,
                "success_criteria_met": false,
                "user_input_needed": false
            })
        }
    }

    #[async_trait]
    impl Capability for MockCapability {
        async fn generate(
            &self,
            system: &str,
            _history: &[Message],
            _tools: &[gutcheck_ai::Tool],
        ) -> gutcheck_ai::Result<Message> {
            if self.fail_generation {
                return Err(gutcheck_ai::Error::api("server_error", "boom"));
            }
            self.instructions.lock().push(system.to_string());
            let mut responses = self.responses.lock();
            if responses.is_empty() {
                Ok(Message::assistant("Final Score: 7/10. Bottom Line: fine."))
            } else {
                Ok(responses.remove(0))
            }
        }

        async fn extract(
            &self,
            _system: &str,
            _prompt: &str,
            name: &str,
            _schema: &serde_json::Value,
        ) -> gutcheck_ai::Result<serde_json::Value> {
            assert_eq!(name, VERDICT_FN);
            let mut verdicts = self.verdicts.lock();
            if verdicts.is_empty() {
                Ok(Self::reject("Still not acceptable."))
            } else {
                Ok(verdicts.remove(0))
            }
        }
    }

    /// A counting no-op tool
    struct CountingTool {
        tool_name: String,
        call_count: Arc<AtomicU32>,
    }

    impl CountingTool {
        fn new(name: &str) -> (Self, Arc<AtomicU32>) {
            let count = Arc::new(AtomicU32::new(0));
            (
                Self {
                    tool_name: name.to_string(),
                    call_count: count.clone(),
                },
                count,
            )
        }
    }

    #[async_trait]
    impl Tool for CountingTool {
        fn name(&self) -> &str {
            &self.tool_name
        }
        fn description(&self) -> &str {
            "A counting no-op tool"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string" }
                },
                "required": ["query"]
            })
        }
        async fn execute(
            &self,
            _tool_call_id: &str,
            _arguments: serde_json::Value,
            _cancel: CancellationToken,
        ) -> ToolResult {
            self.call_count.fetch_add(1, Ordering::Relaxed);
            ToolResult::text("39g added sugar per serving")
        }
    }

    /// A session resource that counts releases
    struct CountingResource {
        releases: Arc<AtomicU32>,
    }

    impl SessionResource for CountingResource {
        fn name(&self) -> &str {
            "counting"
        }
        fn release(&self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn tool_call_message(name: &str, args: serde_json::Value) -> Message {
        Message::Assistant {
            content: vec![Content::tool_call("call_1", name, args)],
            metadata: AssistantMetadata::default(),
        }
    }

    fn make_auditor(capability: MockCapability) -> Auditor {
        Auditor::new(
            AuditorConfig::default(),
            Arc::new(capability),
            SessionStore::new(),
        )
    }

    #[tokio::test]
    async fn test_simple_turn_returns_graded_answer_not_feedback() {
        let capability = MockCapability::new(
            vec![Message::assistant("Final Score: 3/10. Bottom Line: skip it.")],
            vec![MockCapability::accept()],
        );
        let mut auditor = make_auditor(capability);

        let exchange = auditor.run_turn("Cola ingredients", None).await.unwrap();
        assert_eq!(exchange.user, "Cola ingredients");
        assert_eq!(exchange.reply, "Final Score: 3/10. Bottom Line: skip it.");

        let state = auditor.store.load(&auditor.session_token()).unwrap();
        assert_eq!(
            state.last().unwrap().text(),
            "Evaluator Feedback: Looks correct."
        );
        assert!(state.success_criteria_met);
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let capability = MockCapability::new(
            vec![
                tool_call_message(
                    "ingredient_researcher",
                    serde_json::json!({"query": "cola added sugar"}),
                ),
                Message::assistant("Score: 10 - 3 = 7/10. Bottom Line: ok."),
            ],
            vec![MockCapability::accept()],
        );
        let mut auditor = make_auditor(capability);
        let (tool, count) = CountingTool::new("ingredient_researcher");
        auditor.add_tool(Arc::new(tool));

        let exchange = auditor.run_turn("Cola", None).await.unwrap();
        assert_eq!(count.load(Ordering::Relaxed), 1);
        assert_eq!(exchange.reply, "Score: 10 - 3 = 7/10. Bottom Line: ok.");

        let state = auditor.store.load(&auditor.session_token()).unwrap();
        let tool_results: Vec<_> = state
            .history
            .iter()
            .filter(|m| m.role() == "tool_result")
            .collect();
        assert_eq!(tool_results.len(), 1);
        assert_eq!(tool_results[0].text(), "39g added sugar per serving");
    }

    #[tokio::test]
    async fn test_unknown_tool_yields_error_entry_and_loop_continues() {
        let capability = MockCapability::new(
            vec![
                tool_call_message("navigate_browser", serde_json::json!({"url": "x"})),
                Message::assistant("Recovered answer."),
            ],
            vec![MockCapability::accept()],
        );
        let mut auditor = make_auditor(capability);

        let exchange = auditor.run_turn("Cola", None).await.unwrap();
        assert_eq!(exchange.reply, "Recovered answer.");

        let state = auditor.store.load(&auditor.session_token()).unwrap();
        let error_entry = state
            .history
            .iter()
            .find(|m| matches!(m, Message::ToolResult { is_error: true, .. }))
            .expect("error tool-result entry");
        assert!(error_entry.text().contains("Tool not found: navigate_browser"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_rejected_before_execution() {
        let capability = MockCapability::new(
            vec![
                tool_call_message("ingredient_researcher", serde_json::json!({"query": 42})),
                Message::assistant("Answer without research."),
            ],
            vec![MockCapability::accept()],
        );
        let mut auditor = make_auditor(capability);
        let (tool, count) = CountingTool::new("ingredient_researcher");
        auditor.add_tool(Arc::new(tool));

        auditor.run_turn("Cola", None).await.unwrap();
        assert_eq!(count.load(Ordering::Relaxed), 0, "tool must not run");

        let state = auditor.store.load(&auditor.session_token()).unwrap();
        let error_entry = state
            .history
            .iter()
            .find(|m| matches!(m, Message::ToolResult { is_error: true, .. }))
            .unwrap();
        assert!(error_entry.text().contains("validation failed"));
    }

    #[tokio::test]
    async fn test_rejection_feedback_visible_to_second_worker_call() {
        let capability = Arc::new(MockCapability::new(
            vec![
                Message::assistant("Draft one."),
                Message::assistant("Draft two. Bottom Line: fine."),
            ],
            vec![
                MockCapability::reject("Show the deduction math."),
                MockCapability::accept(),
            ],
        ));
        let mut auditor = Auditor::new(
            AuditorConfig::default(),
            capability.clone(),
            SessionStore::new(),
        );

        auditor.run_turn("Cola", None).await.unwrap();

        let instructions = capability.instructions.lock();
        assert_eq!(instructions.len(), 2);
        assert!(!instructions[0].contains("PRIOR FEEDBACK"));
        assert!(instructions[1].contains("Fix these issues: Show the deduction math."));
    }

    #[tokio::test]
    async fn test_step_cap_forces_user_input_needed() {
        // The mock rejects forever with unchanging feedback; the cap must
        // stop the loop long before 50 rounds.
        let capability = Arc::new(MockCapability::new(vec![], vec![]));
        let mut auditor = Auditor::new(
            AuditorConfig { max_steps: 3 },
            capability.clone(),
            SessionStore::new(),
        );

        let exchange = auditor.run_turn("Cola", None).await.unwrap();
        assert!(!exchange.reply.is_empty());

        assert_eq!(capability.instructions.lock().len(), 3);
        let state = auditor.store.load(&auditor.session_token()).unwrap();
        assert!(state.user_input_needed);
        assert!(!state.success_criteria_met);
    }

    #[tokio::test]
    async fn test_endless_tool_requests_bounded_by_step_cap() {
        // A model that answers every prompt with another tool call must not
        // keep the loop alive: the cap counts worker steps, not verdicts.
        let tool_requests: Vec<Message> = (0..10)
            .map(|_| {
                tool_call_message(
                    "ingredient_researcher",
                    serde_json::json!({"query": "added sugar"}),
                )
            })
            .collect();
        let capability = Arc::new(MockCapability::new(tool_requests, vec![]));
        let mut auditor = Auditor::new(
            AuditorConfig { max_steps: 2 },
            capability.clone(),
            SessionStore::new(),
        );
        let (tool, count) = CountingTool::new("ingredient_researcher");
        auditor.add_tool(Arc::new(tool));

        let exchange = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            auditor.run_turn("Cola", None),
        )
        .await
        .expect("turn must terminate")
        .unwrap();

        // Two worker steps, both tool requests dispatched, then graded as-is.
        assert_eq!(capability.instructions.lock().len(), 2);
        assert_eq!(count.load(Ordering::Relaxed), 2);
        assert_eq!(exchange.reply, "39g added sugar per serving");

        let state = auditor.store.load(&auditor.session_token()).unwrap();
        assert!(state.user_input_needed);
        assert!(
            state
                .last()
                .unwrap()
                .text()
                .starts_with("Evaluator Feedback:")
        );
    }

    #[tokio::test]
    async fn test_loop_continues_while_both_flags_false() {
        let capability = Arc::new(MockCapability::new(
            vec![],
            vec![MockCapability::reject("no"), MockCapability::accept()],
        ));
        let mut auditor = Auditor::new(
            AuditorConfig::default(),
            capability.clone(),
            SessionStore::new(),
        );

        auditor.run_turn("Cola", None).await.unwrap();
        // Rejected once with both flags false, so the worker ran again.
        assert_eq!(capability.instructions.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_generation_failure_persists_state_and_surfaces_error() {
        let mut auditor = make_auditor(MockCapability::failing());

        let err = auditor.run_turn("Cola", None).await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));

        // The user entry appended before the failure survives.
        let state = auditor.store.load(&auditor.session_token()).unwrap();
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].role(), "user");
    }

    #[tokio::test]
    async fn test_malformed_verdict_is_extraction_error() {
        let capability = MockCapability::new(
            vec![Message::assistant("answer")],
            vec![serde_json::json!({"feedback": "only one field"})],
        );
        let mut auditor = make_auditor(capability);

        let err = auditor.run_turn("Cola", None).await.unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[tokio::test]
    async fn test_history_never_contains_instruction_entries() {
        let capability = MockCapability::new(
            vec![
                tool_call_message("ingredient_researcher", serde_json::json!({"query": "q"})),
                Message::assistant("a1"),
                Message::assistant("a2"),
            ],
            vec![MockCapability::reject("again"), MockCapability::accept()],
        );
        let mut auditor = make_auditor(capability);
        let (tool, _count) = CountingTool::new("ingredient_researcher");
        auditor.add_tool(Arc::new(tool));

        auditor.run_turn("Cola", None).await.unwrap();
        let state = auditor.store.load(&auditor.session_token()).unwrap();
        assert!(state.history.iter().all(|m| m.role() != "system"));
    }

    #[tokio::test]
    async fn test_shutdown_releases_resource_exactly_once() {
        let releases = Arc::new(AtomicU32::new(0));
        let mut auditor = make_auditor(MockCapability::new(vec![], vec![]));
        auditor.set_resource(Box::new(CountingResource {
            releases: releases.clone(),
        }));

        auditor.shutdown();
        auditor.shutdown();
        drop(auditor);

        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_drop_without_shutdown_still_releases_once() {
        let releases = Arc::new(AtomicU32::new(0));
        {
            let mut auditor = make_auditor(MockCapability::new(vec![], vec![]));
            auditor.set_resource(Box::new(CountingResource {
                releases: releases.clone(),
            }));
        }
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_discards_persisted_state() {
        let store = SessionStore::new();
        let mut auditor = Auditor::new(
            AuditorConfig::default(),
            Arc::new(MockCapability::new(vec![], vec![MockCapability::accept()])),
            store.clone(),
        );
        let token = auditor.session_token();

        auditor.run_turn("Cola", None).await.unwrap();
        assert!(store.load(&token).is_some());

        auditor.shutdown();
        assert!(store.load(&token).is_none());
    }

    #[tokio::test]
    async fn test_events_cover_tool_and_evaluation() {
        let capability = MockCapability::new(
            vec![
                tool_call_message("ingredient_researcher", serde_json::json!({"query": "q"})),
                Message::assistant("answer"),
            ],
            vec![MockCapability::accept()],
        );
        let mut auditor = make_auditor(capability);
        let (tool, _count) = CountingTool::new("ingredient_researcher");
        auditor.add_tool(Arc::new(tool));
        let mut rx = auditor.subscribe();

        auditor.run_turn("Cola", None).await.unwrap();

        let mut saw_tool_start = false;
        let mut saw_tool_end = false;
        let mut saw_eval = false;
        let mut saw_turn_end = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                AuditEvent::ToolExecutionStart { ref tool_name, .. } => {
                    assert_eq!(tool_name, "ingredient_researcher");
                    saw_tool_start = true;
                }
                AuditEvent::ToolExecutionEnd { is_error, .. } => {
                    assert!(!is_error);
                    saw_tool_end = true;
                }
                AuditEvent::EvaluationEnd {
                    success_criteria_met,
                    ..
                } => {
                    assert!(success_criteria_met);
                    saw_eval = true;
                }
                AuditEvent::TurnEnd { eval_rounds } => {
                    assert_eq!(eval_rounds, 1);
                    saw_turn_end = true;
                }
                _ => {}
            }
        }
        assert!(saw_tool_start && saw_tool_end && saw_eval && saw_turn_end);
    }

    #[test]
    fn test_validate_with_validator_reports_paths() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": { "query": { "type": "string" } },
            "required": ["query"]
        });
        let validator = jsonschema::validator_for(&schema).unwrap();

        assert!(validate_with_validator(&serde_json::json!({"query": "ok"}), &validator).is_none());

        let err = validate_with_validator(&serde_json::json!({}), &validator).unwrap();
        assert!(err.contains("validation failed"));
        assert!(err.contains("query"));
    }
}
