use crate::{
    error::AttendanceError,
    model::{attendance::AttendanceRecord, student::Student},
    store::{AttendanceStore, NewAttendanceRecord},
};

use super::{
    card_locks::CardLocks,
    clock::Clock,
    duration::{date_key, duration_label},
};

/// Swipe-toggle state machine. The toggle state is implicit in the data:
/// whatever the latest record for a card says. No record yet, or latest
/// closed, means the swipe opens a session; latest open means it closes it.
pub struct SessionTracker<S, C> {
    store: S,
    clock: C,
    locks: CardLocks,
}

impl<S: AttendanceStore, C: Clock> SessionTracker<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            locks: CardLocks::new(),
        }
    }

    /// One swipe: opens a new session or closes the open one for this card.
    /// Exactly one record is created or mutated per call.
    pub async fn handle_swipe(
        &self,
        student: &Student,
    ) -> Result<AttendanceRecord, AttendanceError> {
        // Read-then-write must be atomic per card: without this, two swipes
        // of one card could both see "closed" and both open a session.
        let lock = self.locks.mutex_for(&student.card_id);
        let _guard = lock.lock().await;

        let now = self.clock.now();
        match self.store.find_latest_by_card(&student.card_id).await? {
            Some(latest) if latest.is_open() => {
                let label = duration_label(latest.in_time, Some(now), now);
                self.store.close(latest.id, now, &label).await
            }
            _ => {
                self.store
                    .create(NewAttendanceRecord {
                        roll_number: student.roll_number.clone(),
                        card_id: student.card_id.clone(),
                        name: student.name.clone(),
                        branch: student.branch.clone(),
                        in_time: now,
                        date: date_key(now),
                    })
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use crate::{service::clock::manual::ManualClock, store::memory::MemoryAttendanceStore};

    use super::*;

    fn student(roll: &str, card: &str) -> Student {
        Student {
            id: 0,
            roll_number: roll.to_string(),
            card_id: card.to_string(),
            name: format!("Student {roll}"),
            branch: "CSE".to_string(),
            email: None,
            mobile: None,
        }
    }

    fn tracker() -> (
        SessionTracker<MemoryAttendanceStore, Arc<ManualClock>>,
        MemoryAttendanceStore,
        Arc<ManualClock>,
    ) {
        let store = MemoryAttendanceStore::new();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap(),
        ));
        (
            SessionTracker::new(store.clone(), clock.clone()),
            store,
            clock,
        )
    }

    fn open_count(store: &MemoryAttendanceStore, card: &str) -> usize {
        store
            .all()
            .iter()
            .filter(|r| r.card_id == card && r.is_open())
            .count()
    }

    #[actix_web::test]
    async fn first_swipe_opens_a_session() {
        let (tracker, store, _clock) = tracker();

        let record = tracker.handle_swipe(&student("101", "C-1")).await.unwrap();

        assert!(record.is_open());
        assert_eq!(record.roll_number, "101");
        assert_eq!(record.name, "Student 101");
        assert_eq!(record.branch, "CSE");
        assert_eq!(record.date, "2025-01-06");
        assert!(record.duration.is_none());
        assert_eq!(open_count(&store, "C-1"), 1);
    }

    #[actix_web::test]
    async fn second_swipe_closes_third_reopens() {
        let (tracker, store, clock) = tracker();
        let s = student("101", "C-1");

        let opened = tracker.handle_swipe(&s).await.unwrap();
        clock.advance(Duration::minutes(90));
        let closed = tracker.handle_swipe(&s).await.unwrap();

        assert_eq!(closed.id, opened.id);
        assert!(!closed.is_open());
        assert_eq!(closed.duration.as_deref(), Some("1h 30m"));
        assert_eq!(open_count(&store, "C-1"), 0);

        clock.advance(Duration::minutes(10));
        let reopened = tracker.handle_swipe(&s).await.unwrap();

        assert_ne!(reopened.id, opened.id);
        assert!(reopened.is_open());
        assert_eq!(open_count(&store, "C-1"), 1);
        assert_eq!(store.all().len(), 2);
    }

    #[actix_web::test]
    async fn at_most_one_open_record_per_card() {
        let (tracker, store, clock) = tracker();
        let s = student("101", "C-1");

        for _ in 0..7 {
            tracker.handle_swipe(&s).await.unwrap();
            clock.advance(Duration::minutes(5));
            assert!(open_count(&store, "C-1") <= 1);
        }
    }

    #[actix_web::test]
    async fn cards_toggle_independently() {
        let (tracker, store, clock) = tracker();
        let a = student("101", "C-1");
        let b = student("102", "C-2");

        tracker.handle_swipe(&a).await.unwrap();
        tracker.handle_swipe(&b).await.unwrap();
        assert_eq!(open_count(&store, "C-1"), 1);
        assert_eq!(open_count(&store, "C-2"), 1);

        clock.advance(Duration::minutes(30));
        tracker.handle_swipe(&a).await.unwrap();
        assert_eq!(open_count(&store, "C-1"), 0);
        assert_eq!(open_count(&store, "C-2"), 1);
    }

    #[actix_web::test]
    async fn closing_keeps_the_snapshot_taken_at_swipe_in() {
        let (tracker, _store, clock) = tracker();
        let mut s = student("101", "C-1");

        tracker.handle_swipe(&s).await.unwrap();

        // Roster edit between swipe-in and swipe-out.
        s.name = "Renamed".to_string();
        s.branch = "ECE".to_string();
        clock.advance(Duration::minutes(15));
        let closed = tracker.handle_swipe(&s).await.unwrap();

        assert_eq!(closed.name, "Student 101");
        assert_eq!(closed.branch, "CSE");
    }

    #[actix_web::test]
    async fn swipe_out_after_midnight_keeps_start_day() {
        let (tracker, _store, clock) = tracker();
        let s = student("101", "C-1");

        clock.set(Utc.with_ymd_and_hms(2025, 1, 6, 23, 30, 0).unwrap());
        tracker.handle_swipe(&s).await.unwrap();
        clock.advance(Duration::hours(2));
        let closed = tracker.handle_swipe(&s).await.unwrap();

        assert_eq!(closed.date, "2025-01-06");
        assert_eq!(closed.duration.as_deref(), Some("2h 0m"));
    }
}
