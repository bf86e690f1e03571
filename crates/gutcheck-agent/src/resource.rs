//! Session-held external resources

/// A resource acquired at session setup and held for the session's lifetime,
/// such as the page-fetch handle.
///
/// Release is best-effort: implementations log failures and never panic or
/// propagate them. Callers guarantee at-most-once release; implementations
/// should still tolerate a second call.
pub trait SessionResource: Send + Sync {
    /// Human-readable name for log lines
    fn name(&self) -> &str;

    /// Release the underlying resource
    fn release(&self);
}
