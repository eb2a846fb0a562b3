use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::{error::AttendanceError, model::attendance::AttendanceRecord};

use super::{AttendanceStore, NewAttendanceRecord};

/// In-memory store for engine tests. Same contract as the MySQL store,
/// including the conditional-close semantics.
#[derive(Clone, Default)]
pub struct MemoryAttendanceStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    records: Vec<AttendanceRecord>,
    next_id: u64,
}

impl MemoryAttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<AttendanceRecord> {
        self.inner.lock().expect("memory store poisoned").records.clone()
    }
}

impl AttendanceStore for MemoryAttendanceStore {
    async fn create(
        &self,
        record: NewAttendanceRecord,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        inner.next_id += 1;
        let created = AttendanceRecord {
            id: inner.next_id,
            roll_number: record.roll_number,
            card_id: record.card_id,
            name: record.name,
            branch: record.branch,
            in_time: record.in_time,
            out_time: None,
            duration: None,
            date: record.date,
        };
        inner.records.push(created.clone());
        Ok(created)
    }

    async fn find_latest_by_card(
        &self,
        card_id: &str,
    ) -> Result<Option<AttendanceRecord>, AttendanceError> {
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner
            .records
            .iter()
            .rev()
            .find(|r| r.card_id == card_id)
            .cloned())
    }

    async fn find_all_open(&self) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner
            .records
            .iter()
            .filter(|r| r.is_open())
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, AttendanceError> {
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner.records.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_date(&self, date: &str) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner
            .records
            .iter()
            .filter(|r| r.date == date)
            .cloned()
            .collect())
    }

    async fn close(
        &self,
        id: u64,
        out_time: DateTime<Utc>,
        duration: &str,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        let record = inner
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(AttendanceError::NotFound)?;

        if record.out_time.is_some() {
            return Err(AttendanceError::AlreadyClosed);
        }

        record.out_time = Some(out_time);
        record.duration = Some(duration.to_string());
        Ok(record.clone())
    }
}
