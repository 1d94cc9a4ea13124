use crate::domains::logger::DomainLogger;
use std::sync::Arc;

/// Forwards domain log lines to `tracing`, so they land in whatever subscriber the binary installed.
struct TracingBridge;

impl DomainLogger for TracingBridge {
    fn info(&self, msg: &str) { tracing::info!(target: "turn_path", "{}", msg); }
    fn warn(&self, msg: &str) { tracing::warn!(target: "turn_path", "{}", msg); }
    fn error(&self, msg: &str) { tracing::error!(target: "turn_path", "{}", msg); }
}

/// Console-backed DomainLogger (used as the fallback when no log file is configured)
pub fn init_console_logger() -> Arc<dyn DomainLogger> {
    Arc::new(TracingBridge {})
}
