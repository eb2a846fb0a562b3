use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Roster row. Attendance records copy roll_number/card_id/name/branch at
/// swipe time; editing a student later never rewrites past records.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "roll_number": "101",
        "card_id": "CARD-0042",
        "name": "Asha Verma",
        "branch": "CSE",
        "email": "asha.verma@college.edu",
        "mobile": "+919812345678"
    })
)]
pub struct Student {
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

    #[schema(example = "asha.verma@college.edu", nullable = true)]
    pub email: Option<String>,

    #[schema(example = "+919812345678", nullable = true)]
    pub mobile: Option<String>,
}
