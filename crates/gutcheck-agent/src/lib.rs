//! gutcheck-agent: worker/evaluator audit loop
//!
//! This crate implements the stateful control loop behind an ingredient
//! audit session: a Worker step that drafts the analysis (invoking tools
//! as needed), an Evaluator step that grades it against the session's
//! success criteria, and the state machine that alternates between them
//! until the criteria are met, human input is needed, or the evaluation
//! cap trips.

pub mod auditor;
pub mod capability;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod resource;
pub mod state;
pub mod store;
pub mod tool;
pub mod worker;

pub use auditor::{Auditor, AuditorConfig, Exchange};
pub use capability::{Capability, OpenAiCapability};
pub use error::Error;
pub use evaluator::{Verdict, should_stop};
pub use events::AuditEvent;
pub use resource::SessionResource;
pub use state::{AuditState, DEFAULT_CRITERIA};
pub use store::SessionStore;
pub use tool::{BoxedTool, Tool, ToolResult};
pub use worker::{Route, route_after_worker};
