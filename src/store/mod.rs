use chrono::{DateTime, Utc};

use crate::{error::AttendanceError, model::attendance::AttendanceRecord};

#[cfg(test)]
pub mod memory;
pub mod mysql;

/// Fields the tracker persists when a session opens. The store assigns `id`;
/// `out_time` and `duration` start empty.
#[derive(Debug, Clone)]
pub struct NewAttendanceRecord {
    pub roll_number: String,
    pub card_id: String,
    pub name: String,
    pub branch: String,
    pub in_time: DateTime<Utc>,
    pub date: String,
}

/// Durable keyed storage for attendance records. No business logic lives
/// here. The one non-obvious contract is `close`: it must succeed only while
/// the record is still open, so two concurrent closers can never both win.
pub trait AttendanceStore {
    async fn create(
        &self,
        record: NewAttendanceRecord,
    ) -> Result<AttendanceRecord, AttendanceError>;

    /// Most recent record for a card, open or closed.
    async fn find_latest_by_card(
        &self,
        card_id: &str,
    ) -> Result<Option<AttendanceRecord>, AttendanceError>;

    async fn find_all_open(&self) -> Result<Vec<AttendanceRecord>, AttendanceError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, AttendanceError>;

    /// All records whose session opened on the given "YYYY-MM-DD" day.
    async fn find_by_date(&self, date: &str) -> Result<Vec<AttendanceRecord>, AttendanceError>;

    /// Conditional close: sets `out_time`/`duration` if and only if the
    /// record exists and is still open. Fails with `NotFound` or
    /// `AlreadyClosed` otherwise.
    async fn close(
        &self,
        id: u64,
        out_time: DateTime<Utc>,
        duration: &str,
    ) -> Result<AttendanceRecord, AttendanceError>;
}
