pub mod card_locks;
pub mod clock;
pub mod duration;
pub mod recovery;
pub mod report;
pub mod tracker;

use crate::store::mysql::MySqlAttendanceStore;

use clock::SystemClock;

// Concrete service types the HTTP layer shares via app data.
pub type LiveSessionTracker = tracker::SessionTracker<MySqlAttendanceStore, SystemClock>;
pub type LiveBulkRecovery = recovery::BulkRecovery<MySqlAttendanceStore, SystemClock>;
pub type LiveManualClose = recovery::ManualCloseOperator<MySqlAttendanceStore, SystemClock>;
pub type LiveReportAggregator = report::ReportAggregator<MySqlAttendanceStore, SystemClock>;
