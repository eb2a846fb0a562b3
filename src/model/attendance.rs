use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One library visit. `out_time` missing means the student is still inside.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "roll_number": "101",
        "card_id": "CARD-0042",
        "name": "Asha Verma",
        "branch": "CSE",
        "in_time": "2025-01-06T09:15:00Z",
        "out_time": "2025-01-06T11:45:00Z",
        "duration": "2h 30m",
        "date": "2025-01-06"
    })
)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "101")]
    pub roll_number: String,

    #[schema(example = "CARD-0042")]
    pub card_id: String,

    #[schema(example = "Asha Verma")]
    pub name: String,

    #[schema(example = "CSE")]
    pub branch: String,

    #[schema(example = "2025-01-06T09:15:00Z", format = "date-time", value_type = String)]
    pub in_time: DateTime<Utc>,

    #[schema(example = "2025-01-06T11:45:00Z", format = "date-time", value_type = String, nullable = true)]
    pub out_time: Option<DateTime<Utc>>,

    #[schema(example = "2h 30m", nullable = true)]
    pub duration: Option<String>,

    #[schema(example = "2025-01-06")]
    pub date: String,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.out_time.is_none()
    }
}
