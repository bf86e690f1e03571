//! Page-content fetching behind a session-held handle

use async_trait::async_trait;
use gutcheck_agent::{SessionResource, Tool, ToolResult};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Cap on returned page text
const MAX_CONTENT_CHARS: usize = 8_000;

/// The automation handle behind `fetch_page_content`.
///
/// Acquired once at session setup and held for the session's lifetime; the
/// session releases it exactly once on reset or shutdown. Clones share the
/// underlying client and release state, so the tool and the session can hold
/// the same handle.
#[derive(Clone)]
pub struct FetchHandle {
    client: reqwest::Client,
    released: Arc<AtomicBool>,
    live: Arc<AtomicUsize>,
}

impl FetchHandle {
    /// Acquire a handle. Fails if the HTTP client cannot be built.
    pub fn acquire() -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent("gutcheck/0.1")
            .build()
            .map_err(|e| format!("failed to build fetch client: {}", e))?;
        Ok(Self {
            client,
            released: Arc::new(AtomicBool::new(false)),
            live: Arc::new(AtomicUsize::new(1)),
        })
    }

    /// Whether the session has released this handle
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Number of live (unreleased) acquisitions; 0 or 1
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

impl SessionResource for FetchHandle {
    fn name(&self) -> &str {
        "fetch-handle"
    }

    /// Best-effort, at-most-once release. Never panics.
    fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.live.fetch_sub(1, Ordering::AcqRel);
            tracing::debug!("fetch handle released");
        }
    }
}

/// Tool that fetches a page and returns its visible text
pub struct FetchPageTool {
    handle: FetchHandle,
}

impl FetchPageTool {
    pub fn new(handle: FetchHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl Tool for FetchPageTool {
    fn name(&self) -> &str {
        "fetch_page_content"
    }

    fn description(&self) -> &str {
        "Fetch a product page by URL and return its visible text, for reading ingredient lists."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Full URL of the page to fetch"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(
        &self,
        _tool_call_id: &str,
        arguments: serde_json::Value,
        cancel: CancellationToken,
    ) -> ToolResult {
        let url = match arguments.get("url").and_then(|v| v.as_str()) {
            Some(u) => u,
            None => return ToolResult::error("Missing 'url' argument"),
        };

        if self.handle.is_released() {
            return ToolResult::error("Fetch handle has been released; session is closed");
        }
        if cancel.is_cancelled() {
            return ToolResult::error("Operation cancelled");
        }

        let response = match self.handle.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return ToolResult::error(format!("Failed to fetch {}: {}", url, e)),
        };
        if !response.status().is_success() {
            return ToolResult::error(format!(
                "Failed to fetch {}: HTTP {}",
                url,
                response.status()
            ));
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => return ToolResult::error(format!("Failed to read body of {}: {}", url, e)),
        };

        let mut text = strip_tags(&body);
        if text.len() > MAX_CONTENT_CHARS {
            let mut end = MAX_CONTENT_CHARS;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text.truncate(end);
            text.push_str("\n[truncated]");
        }
        ToolResult::text(text)
    }
}

/// Reduce an HTML document to its visible text: script/style bodies dropped,
/// tags removed, whitespace collapsed.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 4);
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        rest = &rest[open..];

        // Skip script/style elements wholesale
        let mut skipped = false;
        for (tag, close) in [("<script", "</script"), ("<style", "</style")] {
            if starts_with_ci(rest, tag) {
                rest = match find_ci(rest, close) {
                    Some(end) => match rest[end..].find('>') {
                        Some(gt) => &rest[end + gt + 1..],
                        None => "",
                    },
                    None => "",
                };
                skipped = true;
                break;
            }
        }
        if skipped {
            continue;
        }

        match rest.find('>') {
            Some(close) => {
                rest = &rest[close + 1..];
                out.push(' ');
            }
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);

    // Collapse runs of whitespace
    let mut collapsed = String::with_capacity(out.len());
    let mut last_was_space = true;
    for c in out.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                collapsed.push(' ');
                last_was_space = true;
            }
        } else {
            collapsed.push(c);
            last_was_space = false;
        }
    }
    collapsed.trim().to_string()
}

fn starts_with_ci(haystack: &str, prefix: &str) -> bool {
    haystack.len() >= prefix.len()
        && haystack.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Byte offset of an ASCII-case-insensitive match. Safe to slice at: every
/// needle used here begins with '<', so a match starts on a char boundary.
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}
