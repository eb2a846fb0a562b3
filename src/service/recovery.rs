use crate::{error::AttendanceError, model::attendance::AttendanceRecord, store::AttendanceStore};

use super::{clock::Clock, duration::duration_label};

/// End-of-day safety valve: closes every open session at once when swipe-outs
/// were missed.
pub struct BulkRecovery<S, C> {
    store: S,
    clock: C,
}

impl<S: AttendanceStore, C: Clock> BulkRecovery<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Closes all open records with a single captured instant, so every
    /// resulting duration is measured against the same "now". Sessions
    /// opened after the scan snapshot are untouched; a session a swipe
    /// closed while this loop was running is skipped, not double-written.
    /// Returns how many records this invocation actually closed.
    pub async fn force_close_all_open(&self) -> Result<u64, AttendanceError> {
        let now = self.clock.now();
        let open = self.store.find_all_open().await?;

        let mut closed = 0u64;
        for record in open {
            let label = duration_label(record.in_time, Some(now), now);
            match self.store.close(record.id, now, &label).await {
                Ok(_) => closed += 1,
                // Lost the race to a concurrent swipe-out, or the record was
                // deleted out from under us. Either way it is no longer ours
                // to close.
                Err(AttendanceError::AlreadyClosed) | Err(AttendanceError::NotFound) => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(closed)
    }
}

/// Closes one named open session by record id, bypassing the swipe toggle.
/// Used from the admin screen against a stale row, hence the explicit
/// AlreadyClosed failure instead of a silent no-op.
pub struct ManualCloseOperator<S, C> {
    store: S,
    clock: C,
}

impl<S: AttendanceStore, C: Clock> ManualCloseOperator<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub async fn close_by_id(&self, id: u64) -> Result<AttendanceRecord, AttendanceError> {
        let record = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(AttendanceError::NotFound)?;

        if !record.is_open() {
            return Err(AttendanceError::AlreadyClosed);
        }

        let now = self.clock.now();
        let label = duration_label(record.in_time, Some(now), now);
        self.store.close(record.id, now, &label).await
    }
}
