//! Engine error taxonomy.
//!
//! Every failure an engine operation can report is one of five kinds, none
//! of them fatal: the engine remains usable after any single failed
//! operation. Side-effect guarantees per kind:
//!
//! | Error | Side effects |
//! |---|---|
//! | `PermissionDenied` | none — no optimistic patch, no remote call |
//! | `Validation` | none — rejected before any write |
//! | `RemoteRejected` | mirror rolled back to pre-patch state |
//! | `Subscription` | mirror frozen at last good state, status reports it |
//! | `NotFound` | none — benign no-op on a vanished id |
//!
//! Each variant maps to a stable machine-readable code (`E####`) for host
//! surfaces and agents.

use std::fmt;

use crate::model::draft::InvalidDraft;
use crate::model::item::{InvalidCoordinates, InvalidPriceLevel, InvalidRating};

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// The error type for all engine operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The session lacks the capability the operation requires.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Malformed local input, rejected before any write.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The remote store refused a write; the mirror has been rolled back.
    #[error("remote store rejected the write: {0}")]
    RemoteRejected(String),

    /// The inbound change stream failed; the mirror is frozen at its last
    /// good state.
    #[error("subscription failed: {0}")]
    Subscription(String),

    /// The mutation targeted an id no longer present in the mirror.
    #[error("item not found: {0}")]
    NotFound(String),
}

impl EngineError {
    /// The stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::RemoteRejected(_) => ErrorCode::RemoteRejected,
            Self::Subscription(_) => ErrorCode::SubscriptionError,
            Self::NotFound(_) => ErrorCode::NotFound,
        }
    }
}

impl From<InvalidRating> for EngineError {
    fn from(err: InvalidRating) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<InvalidPriceLevel> for EngineError {
    fn from(err: InvalidPriceLevel) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<InvalidCoordinates> for EngineError {
    fn from(err: InvalidCoordinates) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<InvalidDraft> for EngineError {
    fn from(err: InvalidDraft) -> Self {
        Self::Validation(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable error codes for host-surface decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    PermissionDenied,
    ValidationError,
    RemoteRejected,
    SubscriptionError,
    NotFound,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::PermissionDenied => "E2001",
            Self::ValidationError => "E2002",
            Self::NotFound => "E2003",
            Self::RemoteRejected => "E3001",
            Self::SubscriptionError => "E3002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::PermissionDenied => "Permission denied",
            Self::ValidationError => "Invalid input",
            Self::NotFound => "Item not found",
            Self::RemoteRejected => "Remote store rejected the write",
            Self::SubscriptionError => "Live subscription failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::PermissionDenied => {
                Some("Sign in, or switch to a view you own; shared items belong to their creator.")
            }
            Self::ValidationError => None,
            Self::NotFound => Some("The item may have been deleted by another writer; refresh the list."),
            Self::RemoteRejected => Some("The change was reverted locally. Retry the edit."),
            Self::SubscriptionError => Some("Re-open the view to re-subscribe."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const ALL: [ErrorCode; 5] = [
        ErrorCode::PermissionDenied,
        ErrorCode::ValidationError,
        ErrorCode::NotFound,
        ErrorCode::RemoteRejected,
        ErrorCode::SubscriptionError,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let s = code.code();
            assert_eq!(s.len(), 5);
            assert!(s.starts_with('E'));
            assert!(s.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn engine_errors_map_to_codes() {
        assert_eq!(
            EngineError::PermissionDenied("x".into()).code(),
            ErrorCode::PermissionDenied
        );
        assert_eq!(
            EngineError::Validation("x".into()).code(),
            ErrorCode::ValidationError
        );
        assert_eq!(
            EngineError::RemoteRejected("x".into()).code(),
            ErrorCode::RemoteRejected
        );
        assert_eq!(
            EngineError::Subscription("x".into()).code(),
            ErrorCode::SubscriptionError
        );
        assert_eq!(
            EngineError::NotFound("x".into()).code(),
            ErrorCode::NotFound
        );
    }

    #[test]
    fn validation_sources_convert() {
        let err: EngineError = InvalidRating { value: 3.3 }.into();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert!(err.to_string().contains("3.3"));
    }
}
