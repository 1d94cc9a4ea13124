use crate::domains::logger::{DomainLogger, FileLogger};
use std::sync::Arc;

/// Sets up the fast_log file appender and returns the logger to inject into the workflow.
pub fn init_file_logger(path: &str, level: log::LevelFilter) -> Result<Arc<dyn DomainLogger>, String> {
    FileLogger::init(path, level).map_err(|e| format!("Failed to initialize fast_log at {}: {}", path, e))?;
    Ok(Arc::new(FileLogger))
}
