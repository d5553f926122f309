//! Error types for the ladder service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application. Domain failures are expressed as [`LadderError`]
//! variants and recovered by callers with `downcast_ref`.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for match resolution and ladder reads
#[derive(Debug, thiserror::Error)]
pub enum LadderError {
    #[error("Invalid team composition: {reason}")]
    InvalidComposition { reason: String },

    #[error("Participant(s) not found: {}", ids.join(", "))]
    ParticipantNotFound { ids: Vec<String> },

    #[error("Concurrent match resolution conflict: {message}")]
    ConcurrencyConflict { message: String },

    #[error(
        "Rating history inconsistent for {participant_id}: stored {stored_rating}, replayed {replayed_rating}"
    )]
    Inconsistency {
        participant_id: String,
        stored_rating: i64,
        replayed_rating: i64,
    },

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Principal {principal_id} is not allowed to perform this operation")]
    Forbidden { principal_id: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Storage failure: {message}")]
    StorageFailure { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

impl LadderError {
    /// Short machine-readable name used in metrics labels and error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            LadderError::InvalidComposition { .. } => "invalid_composition",
            LadderError::ParticipantNotFound { .. } => "participant_not_found",
            LadderError::ConcurrencyConflict { .. } => "concurrency_conflict",
            LadderError::Inconsistency { .. } => "inconsistency",
            LadderError::Unauthenticated => "unauthenticated",
            LadderError::Forbidden { .. } => "forbidden",
            LadderError::InvalidRequest { .. } => "invalid_request",
            LadderError::StorageFailure { .. } => "storage_failure",
            LadderError::ConfigurationError { .. } => "configuration_error",
        }
    }
}

/// Classify an anyhow error by its ladder kind, if it carries one
pub fn error_kind(error: &anyhow::Error) -> &'static str {
    error
        .downcast_ref::<LadderError>()
        .map(LadderError::kind)
        .unwrap_or("internal")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_all_ids() {
        let err = LadderError::ParticipantNotFound {
            ids: vec!["ghost".to_string(), "phantom".to_string()],
        };
        assert_eq!(err.to_string(), "Participant(s) not found: ghost, phantom");
    }

    #[test]
    fn test_error_kind_through_anyhow() {
        let err: anyhow::Error = LadderError::ConcurrencyConflict {
            message: "lock timeout".to_string(),
        }
        .into();
        assert_eq!(error_kind(&err), "concurrency_conflict");

        let other = anyhow::anyhow!("boom");
        assert_eq!(error_kind(&other), "internal");
    }
}
