use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AttendanceError,
    model::{attendance::AttendanceRecord, student::Student},
    service::{
        LiveBulkRecovery, LiveManualClose, LiveReportAggregator, LiveSessionTracker,
        report::PersonDaySummary,
    },
    store::{AttendanceStore, mysql::MySqlAttendanceStore},
    utils::{
        card_filter,
        db_utils::{build_update_sql, execute_update},
        student_cache,
    },
};

/// Fields the admin edit screen may touch. Identity fields (roll_number,
/// card_id, in_time, date) are write-once.
const ATTENDANCE_UPDATABLE: &[&str] = &["name", "branch", "out_time", "duration"];

#[derive(Deserialize, ToSchema)]
pub struct SwipeRequest {
    #[schema(example = "CARD-0042")]
    pub card_id: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 20)]
    /// Pagination per page number
    pub per_page: Option<u64>,
    #[schema(example = "101")]
    /// Filter by roll number
    pub roll_number: Option<String>,
    #[schema(example = "2025-01-06")]
    /// Filter by the day the session opened
    pub date: Option<String>,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    Str(&'a str),
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct DateReportResponse {
    #[schema(example = "2025-01-06")]
    pub date: String,
    pub data: Vec<PersonDaySummary>,
    #[schema(example = 12)]
    pub total_students: usize,
    #[schema(example = 1260)]
    pub total_minutes: i64,
}

/* =========================
Card swipe (toggle in/out)
========================= */
/// Swagger doc for swipe endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/swipe",
    request_body = SwipeRequest,
    responses(
        (status = 200, description = "Swipe processed", body = Object, example = json!({
            "message": "Checked in",
            "record": { "id": 1, "roll_number": "101", "in_time": "2025-01-06T09:15:00Z" }
        })),
        (status = 400, description = "Missing card id"),
        (status = 404, description = "Card not registered", body = Object, example = json!({
            "message": "Card not registered"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn swipe(
    pool: web::Data<MySqlPool>,
    tracker: web::Data<LiveSessionTracker>,
    payload: web::Json<SwipeRequest>,
) -> actix_web::Result<impl Responder> {
    let card_id = card_filter::normalize(&payload.card_id);

    if card_id.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "card_id is required"
        })));
    }

    // Unknown cards bounce off the filter without a DB round trip.
    if !card_filter::might_exist(&card_id) {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Card not registered"
        })));
    }

    let student = match student_cache::get(&card_id).await {
        Some(student) => student,
        None => {
            let found =
                sqlx::query_as::<_, Student>("SELECT * FROM students WHERE card_id = ?")
                    .bind(&card_id)
                    .fetch_optional(pool.get_ref())
                    .await
                    .map_err(|e| {
                        tracing::error!(error = %e, %card_id, "Failed to look up card");
                        ErrorInternalServerError("Internal Server Error")
                    })?;

            match found {
                Some(student) => {
                    student_cache::put(&student).await;
                    student
                }
                // Filter false positive; the roster stays authoritative.
                None => {
                    return Ok(HttpResponse::NotFound().json(json!({
                        "message": "Card not registered"
                    })));
                }
            }
        }
    };

    match tracker.handle_swipe(&student).await {
        Ok(record) => {
            let message = if record.is_open() {
                "Checked in"
            } else {
                "Checked out"
            };
            Ok(HttpResponse::Ok().json(json!({
                "message": message,
                "record": record
            })))
        }
        Err(e) => {
            tracing::error!(error = %e, %card_id, "Swipe failed");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}

/* =========================
Attendance list (paginated)
========================= */
/// Swagger doc for list_attendance endpoint
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendanceListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(roll) = query.roll_number.as_deref() {
        where_sql.push_str(" AND roll_number = ?");
        args.push(FilterValue::Str(roll));
    }

    if let Some(date) = query.date.as_deref() {
        where_sql.push_str(" AND date = ?");
        args.push(FilterValue::Str(date));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM attendance{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count attendance records");
        ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT *
        FROM attendance
        {}
        ORDER BY id DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, AttendanceRecord>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let records = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch attendance list");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data: records,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/* =========================
Currently inside (open records)
========================= */
/// Swagger doc for active_attendance endpoint
#[utoipa::path(
    get,
    path = "/api/attendance/active",
    responses(
        (status = 200, description = "Open sessions", body = Object, example = json!({
            "active_records": [],
            "count": 0
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn active_attendance(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let store = MySqlAttendanceStore::new(pool.get_ref().clone());

    match store.find_all_open().await {
        Ok(records) => {
            let count = records.len();
            Ok(HttpResponse::Ok().json(json!({
                "active_records": records,
                "count": count
            })))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch open sessions");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}

/* =========================
Force OUT all (recovery)
========================= */
/// Swagger doc for force_out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance/force-out",
    responses(
        (status = 200, description = "All open sessions closed", body = Object, example = json!({
            "message": "All students forced out",
            "closed": 17
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn force_out(recovery: web::Data<LiveBulkRecovery>) -> actix_web::Result<impl Responder> {
    match recovery.force_close_all_open().await {
        Ok(closed) => Ok(HttpResponse::Ok().json(json!({
            "message": "All students forced out",
            "closed": closed
        }))),
        Err(e) => {
            tracing::error!(error = %e, "Force-out failed");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}

/* =========================
Manual clock-out by record id
========================= */
/// Swagger doc for clock_out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance/{record_id}/clock-out",
    params(
        ("record_id" = u64, Path, description = "Attendance record to close")
    ),
    responses(
        (status = 200, description = "Record closed", body = Object, example = json!({
            "message": "Student clocked out"
        })),
        (status = 400, description = "Already clocked out", body = Object, example = json!({
            "message": "Student is already clocked out"
        })),
        (status = 404, description = "Record not found", body = Object, example = json!({
            "message": "Attendance record not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn clock_out(
    operator: web::Data<LiveManualClose>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let record_id = path.into_inner();

    match operator.close_by_id(record_id).await {
        Ok(record) => Ok(HttpResponse::Ok().json(json!({
            "message": "Student clocked out",
            "record": record
        }))),
        Err(AttendanceError::NotFound) => Ok(HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        }))),
        Err(AttendanceError::AlreadyClosed) => Ok(HttpResponse::BadRequest().json(json!({
            "message": "Student is already clocked out"
        }))),
        Err(e) => {
            tracing::error!(error = %e, record_id, "Manual clock-out failed");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}

/* =========================
Admin field-level record update
========================= */
/// Swagger doc for update_attendance endpoint
#[utoipa::path(
    put,
    path = "/api/attendance/{record_id}",
    params(
        ("record_id" = u64, Path, description = "Attendance record ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Record updated", body = Object, example = json!({
            "message": "Attendance record updated"
        })),
        (status = 400, description = "Bad payload or non-updatable field"),
        (status = 404, description = "Record not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn update_attendance(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<serde_json::Value>,
) -> actix_web::Result<impl Responder> {
    let record_id = path.into_inner();

    let update = build_update_sql("attendance", &body, ATTENDANCE_UPDATABLE, "id", record_id)?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        tracing::error!(error = %e, record_id, "Failed to update attendance record");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance record updated"
    })))
}

/* =========================
Per-day report
========================= */
/// Swagger doc for date_report endpoint
#[utoipa::path(
    get,
    path = "/api/attendance/date/{date}",
    params(
        ("date" = String, Path, description = "Report day, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Per-person totals for the day", body = DateReportResponse),
        (status = 400, description = "Malformed date", body = Object, example = json!({
            "message": "Date must be YYYY-MM-DD"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn date_report(
    aggregator: web::Data<LiveReportAggregator>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let date = path.into_inner();

    if NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_err() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Date must be YYYY-MM-DD"
        })));
    }

    match aggregator.aggregate_by_date(&date).await {
        Ok(data) => {
            let total_students = data.len();
            let total_minutes = data.iter().map(|s| s.total_minutes).sum();
            Ok(HttpResponse::Ok().json(DateReportResponse {
                date,
                data,
                total_students,
                total_minutes,
            }))
        }
        Err(e) => {
            tracing::error!(error = %e, %date, "Failed to build date report");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}
