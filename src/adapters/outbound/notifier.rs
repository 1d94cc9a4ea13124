use crate::domains::logger::DynLogger;
use crate::domains::turn_path::ports::UserNotifier;

/// Routes dialog messages into the domain log; used when no UI surface is attached.
pub struct LoggingNotifier {
    logger: DynLogger,
}

impl LoggingNotifier {
    pub fn new(logger: DynLogger) -> Self {
        Self { logger }
    }
}

impl UserNotifier for LoggingNotifier {
    fn info(&self, msg: &str) {
        self.logger.info(&format!("[dialog] {}", msg));
    }

    fn alert(&self, msg: &str) {
        self.logger.warn(&format!("[alert] {}", msg));
    }

    fn prompt_profile(&self, msg: &str) {
        self.logger.warn(&format!("[profile] {}", msg));
    }
}
