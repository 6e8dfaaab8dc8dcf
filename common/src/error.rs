use thiserror::Error;

/// Application-level failures surfaced by every marketplace operation.
///
/// All variants carry a human-readable message; the core never retries a
/// failed transition on its own. Transport failures are a different layer
/// and must not be conflated with these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    /// Malformed or out-of-range input (non-positive quantity, unknown grade, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Action attempted from a state that does not permit it.
    #[error("cannot {action} a record in state '{from}'")]
    InvalidTransition { from: String, action: String },

    /// The record has reached a terminal state and cannot advance.
    #[error("order is already terminal ({status})")]
    AlreadyTerminal { status: String },

    /// Referenced supply/product/order id does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// Caller's role lacks authority over the target record.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A concurrent transition won the race (version mismatch).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl MarketError {
    pub fn invalid_transition(from: impl Into<String>, action: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from: from.into(),
            action: action.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Stable machine-readable code for the API envelope's error map.
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::Validation(_) => "validation_error",
            MarketError::InvalidTransition { .. } => "invalid_transition",
            MarketError::AlreadyTerminal { .. } => "already_terminal",
            MarketError::NotFound { .. } => "not_found",
            MarketError::Unauthorized(_) => "unauthorized",
            MarketError::Conflict(_) => "conflict",
        }
    }
}
