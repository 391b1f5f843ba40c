use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown conversation stage `{0}`")]
    UnknownStage(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session store lock was poisoned")]
    Poisoned,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Failure of one step of a conversation turn.
///
/// Quote API transport and HTTP failures are not represented here: the client
/// folds them into an unsuccessful `QuoteApiResult` instead.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("payload agent failure: {0}")]
    PayloadAgent(String),
    #[error("integration failure: {0}")]
    Integration(String),
}

impl ApplicationError {
    /// Short machine-readable label used in structured log fields.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(_) => "domain",
            Self::Session(_) => "session_store",
            Self::PayloadAgent(_) => "payload_agent",
            Self::Integration(_) => "integration",
        }
    }
}
