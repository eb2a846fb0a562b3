use thiserror::Error;

/// Failures the attendance engine reports to its callers.
///
/// `NotFound` and `AlreadyClosed` are expected outcomes the HTTP layer turns
/// into 404/400 responses; `Store` carries the underlying sqlx failure
/// unchanged so the caller decides what to do with it.
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("attendance record not found")]
    NotFound,

    #[error("attendance record is already closed")]
    AlreadyClosed,

    #[error("store unavailable: {0}")]
    Store(#[from] sqlx::Error),
}
