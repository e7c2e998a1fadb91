mod generator;
mod scheduler;

pub use generator::FakeMessageGenerator;
pub use scheduler::{MessageScheduler, ScheduleError};

use serde::Serialize;

pub const FAKE_ERROR_TYPE: &str = "fake_error";
pub const DEFAULT_SEVERITY: &str = "error";
/// Returned when no templates are configured anywhere; generation never fails.
pub const DEFAULT_FALLBACK_TEXT: &str = "An error has occurred";
/// Category used when the requested one has no templates.
pub const GENERIC_CATEGORY: &str = "generic";

/// A fabricated error message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FakeMessage {
    pub message_type: String,
    pub text: String,
    pub severity: String,
}

impl FakeMessage {
    /// Severity defaults to `"error"`.
    pub fn new(message_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
            text: text.into(),
            severity: DEFAULT_SEVERITY.to_string(),
        }
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = severity.into();
        self
    }

    pub(crate) fn fallback() -> Self {
        Self::new(FAKE_ERROR_TYPE, DEFAULT_FALLBACK_TEXT)
    }
}
