use thiserror::Error;

/// Why an incoming request was rejected at the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectionReason {
    TooShort,
    Blacklisted,
    Implausible,
    NoProfessionalSignal,
    UnclassifiableSector,
}

/// Soft-terminal outcome of the pipeline. Never thrown: `generate_quote`
/// returns it as the `Err` arm of a plain `Result` so callers can surface
/// an actionable message without touching a stack trace.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("request rejected: {message}")]
pub struct Rejection {
    pub reason: RejectionReason,
    pub message: String,
}

impl Rejection {
    pub fn new(reason: RejectionReason, message: impl Into<String>) -> Self {
        Self { reason, message: message.into() }
    }

    pub fn user_message(&self) -> &str {
        &self.message
    }
}

/// Failure of an external text/embedding capability. Always absorbed by a
/// local fallback tier; recorded in audit metadata, never surfaced.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("capability unavailable: {0}")]
    Unavailable(String),
    #[error("capability call timed out after {0}s")]
    Timeout(u64),
    #[error("capability returned unusable output: {0}")]
    Malformed(String),
}

/// History-store failure. Writes are fire-and-forget (logged, swallowed);
/// reads degrade to an empty suggestion.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("history store unavailable: {0}")]
    Unavailable(String),
    #[error("history row could not be decoded: {0}")]
    Corrupt(String),
}
