//! Built-in tools for the audit agent

mod fetch;
mod flag;
mod research;

pub use fetch::{FetchHandle, FetchPageTool};
pub use flag::FlagIngredientTool;
pub use research::ResearchTool;

use gutcheck_agent::{BoxedTool, Error};
use std::sync::Arc;

/// Build the tool set for one session, plus the automation handle the
/// session must release when it ends. A handle acquisition failure aborts
/// session creation.
pub fn provide_tools(serper_key: Option<String>) -> Result<(Vec<BoxedTool>, FetchHandle), Error> {
    let handle = FetchHandle::acquire().map_err(Error::Setup)?;
    let tools: Vec<BoxedTool> = vec![
        Arc::new(FetchPageTool::new(handle.clone())),
        Arc::new(ResearchTool::new(serper_key)),
        Arc::new(FlagIngredientTool::new()),
    ];
    Ok((tools, handle))
}
