use thiserror::Error;

/// Fatal, calculation-aborting failures.
///
/// Component-level data problems are deliberately *not* errors: they are
/// recovered in place and reported as warnings on the bill (see
/// `domain::billing::EstimateWarning`). An error here means no bill at all.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Schedule not found: {0}")]
    ScheduleNotFound(String),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Malformed schedule data: {0}")]
    MalformedData(String),
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
