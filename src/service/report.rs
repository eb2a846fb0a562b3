use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AttendanceError, model::attendance::AttendanceRecord, store::AttendanceStore};

use super::{clock::Clock, duration::elapsed_minutes};

/// One person's roll-up for a report day, with the raw visits kept alongside
/// so the caller can drill into detail without a second query.
#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "roll_number": "101",
    "card_id": "CARD-0042",
    "name": "Asha Verma",
    "branch": "CSE",
    "total_minutes": 75,
    "records": []
}))]
pub struct PersonDaySummary {
    #[schema(example = "101")]
    pub roll_number: String,
    #[schema(example = "CARD-0042")]
    pub card_id: String,
    #[schema(example = "Asha Verma")]
    pub name: String,
    #[schema(example = "CSE")]
    pub branch: String,
    #[schema(example = 75)]
    pub total_minutes: i64,
    pub records: Vec<AttendanceRecord>,
}

/// Read-side consumer of the store: turns one day's raw records into
/// per-person totals.
pub struct ReportAggregator<S, C> {
    store: S,
    clock: C,
}

impl<S: AttendanceStore, C: Clock> ReportAggregator<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Groups the day's records by roll number and sums elapsed minutes.
    ///
    /// Records are partitioned by the day the session OPENED; a visit that
    /// crosses midnight counts entirely against its start day (known
    /// limitation, carried over deliberately). Open records are measured
    /// against one `now` captured per invocation. A record with out_time
    /// earlier than in_time stays listed in `records` but contributes 0 to
    /// the total, so one anomaly never corrupts the day's sums. Output is
    /// ordered by roll number, so unchanged data always aggregates to the
    /// identical result.
    pub async fn aggregate_by_date(
        &self,
        date: &str,
    ) -> Result<Vec<PersonDaySummary>, AttendanceError> {
        let records = self.store.find_by_date(date).await?;
        let now = self.clock.now();

        let mut groups: BTreeMap<String, PersonDaySummary> = BTreeMap::new();
        for record in records {
            let entry = groups
                .entry(record.roll_number.clone())
                .or_insert_with(|| PersonDaySummary {
                    // First record encountered wins the snapshot fields; if
                    // records for one roll number disagree, that mismatch is
                    // a roster-history artifact we surface as-is.
                    roll_number: record.roll_number.clone(),
                    card_id: record.card_id.clone(),
                    name: record.name.clone(),
                    branch: record.branch.clone(),
                    total_minutes: 0,
                    records: Vec::new(),
                });

            let end = record.out_time.unwrap_or(now);
            entry.total_minutes += elapsed_minutes(record.in_time, end).max(0);
            entry.records.push(record);
        }

        Ok(groups.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::{
        service::{clock::manual::ManualClock, duration::date_key},
        store::{memory::MemoryAttendanceStore, NewAttendanceRecord},
    };

    use super::*;

    const DAY: &str = "2025-01-06";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap()
    }

    fn new_record(roll: &str, card: &str, in_time: DateTime<Utc>) -> NewAttendanceRecord {
        NewAttendanceRecord {
            roll_number: roll.to_string(),
            card_id: card.to_string(),
            name: format!("Student {roll}"),
            branch: "CSE".to_string(),
            in_time,
            date: date_key(in_time),
        }
    }

    async fn closed_visit(
        store: &MemoryAttendanceStore,
        roll: &str,
        card: &str,
        in_time: DateTime<Utc>,
        minutes: i64,
    ) {
        let record = store.create(new_record(roll, card, in_time)).await.unwrap();
        store
            .close(record.id, in_time + Duration::minutes(minutes), "x")
            .await
            .unwrap();
    }

    fn aggregator(
        store: &MemoryAttendanceStore,
        now: DateTime<Utc>,
    ) -> ReportAggregator<MemoryAttendanceStore, Arc<ManualClock>> {
        ReportAggregator::new(store.clone(), Arc::new(ManualClock::new(now)))
    }

    #[actix_web::test]
    async fn sums_two_closed_visits_for_one_person() {
        let store = MemoryAttendanceStore::new();
        closed_visit(&store, "101", "C-1", t0(), 30).await;
        closed_visit(&store, "101", "C-1", t0() + Duration::hours(3), 45).await;

        let summaries = aggregator(&store, t0() + Duration::hours(8))
            .aggregate_by_date(DAY)
            .await
            .unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].roll_number, "101");
        assert_eq!(summaries[0].total_minutes, 75);
        assert_eq!(summaries[0].records.len(), 2);
    }

    #[actix_web::test]
    async fn open_records_measure_against_now() {
        let store = MemoryAttendanceStore::new();
        store.create(new_record("101", "C-1", t0())).await.unwrap();

        let summaries = aggregator(&store, t0() + Duration::minutes(50))
            .aggregate_by_date(DAY)
            .await
            .unwrap();

        assert_eq!(summaries[0].total_minutes, 50);
        assert!(summaries[0].records[0].is_open());
    }

    #[actix_web::test]
    async fn negative_duration_contributes_zero_but_stays_listed() {
        let store = MemoryAttendanceStore::new();
        let record = store.create(new_record("101", "C-1", t0())).await.unwrap();
        store
            .close(record.id, t0() - Duration::minutes(5), "Invalid Timestamps")
            .await
            .unwrap();
        closed_visit(&store, "101", "C-1", t0() + Duration::hours(2), 40).await;

        let summaries = aggregator(&store, t0() + Duration::hours(8))
            .aggregate_by_date(DAY)
            .await
            .unwrap();

        assert_eq!(summaries[0].total_minutes, 40);
        assert_eq!(summaries[0].records.len(), 2);
        assert_eq!(
            summaries[0].records[0].duration.as_deref(),
            Some("Invalid Timestamps")
        );
    }

    #[actix_web::test]
    async fn groups_are_ordered_and_deterministic() {
        let store = MemoryAttendanceStore::new();
        closed_visit(&store, "205", "C-2", t0(), 20).await;
        closed_visit(&store, "101", "C-1", t0(), 30).await;
        closed_visit(&store, "150", "C-3", t0(), 10).await;

        let aggregator = aggregator(&store, t0() + Duration::hours(8));
        let first = aggregator.aggregate_by_date(DAY).await.unwrap();
        let second = aggregator.aggregate_by_date(DAY).await.unwrap();

        let rolls: Vec<_> = first.iter().map(|s| s.roll_number.clone()).collect();
        assert_eq!(rolls, vec!["101", "150", "205"]);
        assert_eq!(
            second.iter().map(|s| s.total_minutes).collect::<Vec<_>>(),
            first.iter().map(|s| s.total_minutes).collect::<Vec<_>>()
        );
    }

    #[actix_web::test]
    async fn first_snapshot_wins_when_records_disagree() {
        let store = MemoryAttendanceStore::new();
        closed_visit(&store, "101", "C-1", t0(), 30).await;
        // Same roll number, different snapshot (card was re-issued mid-day).
        store
            .create(NewAttendanceRecord {
                name: "Re-registered".to_string(),
                ..new_record("101", "C-9", t0() + Duration::hours(1))
            })
            .await
            .unwrap();

        let summaries = aggregator(&store, t0() + Duration::hours(8))
            .aggregate_by_date(DAY)
            .await
            .unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].card_id, "C-1");
        assert_eq!(summaries[0].name, "Student 101");
    }

    #[actix_web::test]
    async fn other_days_are_excluded() {
        let store = MemoryAttendanceStore::new();
        closed_visit(&store, "101", "C-1", t0(), 30).await;
        closed_visit(&store, "101", "C-1", t0() + Duration::days(1), 45).await;

        let summaries = aggregator(&store, t0() + Duration::days(2))
            .aggregate_by_date(DAY)
            .await
            .unwrap();

        assert_eq!(summaries[0].total_minutes, 30);
        assert_eq!(summaries[0].records.len(), 1);
    }
}
