use crate::api::attendance::{
    AttendanceListResponse, AttendanceQuery, DateReportResponse, SwipeRequest,
};
use crate::api::student::{CreateStudent, StudentListResponse, StudentQuery};
use crate::model::attendance::AttendanceRecord;
use crate::model::student::Student;
use crate::service::report::PersonDaySummary;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Attendance API",
        version = "1.0.0",
        description = r#"
## Library Attendance System

This API powers a **card-swipe attendance system** for a college library.

### 🔹 Key Features
- **Swipe Tracking**
  - One endpoint toggles a card between checked-in and checked-out
- **Live Occupancy**
  - List everyone currently inside the library
- **Recovery Actions**
  - Force out all open sessions at closing time, or clock out one record manually
- **Daily Reports**
  - Per-student time totals for any calendar day, with visit-level detail
- **Roster Management**
  - Add, bulk-import, update, and remove students

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::swipe,
        crate::api::attendance::list_attendance,
        crate::api::attendance::active_attendance,
        crate::api::attendance::force_out,
        crate::api::attendance::clock_out,
        crate::api::attendance::update_attendance,
        crate::api::attendance::date_report,

        crate::api::student::list_students,
        crate::api::student::add_student,
        crate::api::student::add_many_students,
        crate::api::student::update_student,
        crate::api::student::delete_student
    ),
    components(
        schemas(
            AttendanceRecord,
            Student,
            PersonDaySummary,
            SwipeRequest,
            AttendanceQuery,
            AttendanceListResponse,
            DateReportResponse,
            CreateStudent,
            StudentQuery,
            StudentListResponse
        )
    ),
    tags(
        (name = "Attendance", description = "Swipe tracking, recovery and reporting APIs"),
        (name = "Students", description = "Roster management APIs"),
    )
)]
pub struct ApiDoc;
