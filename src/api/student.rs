use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::{
    model::student::Student,
    utils::{
        card_filter,
        db_utils::{build_update_sql, execute_update},
        student_cache,
    },
};

const STUDENT_UPDATABLE: &[&str] = &["roll_number", "card_id", "name", "branch", "email", "mobile"];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateStudent {
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

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct StudentQuery {
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 20)]
    /// Pagination per page number
    pub per_page: Option<u64>,
    #[schema(example = "CSE")]
    /// Filter by branch
    pub branch: Option<String>,
    #[schema(example = "asha")]
    /// Search by name, roll number or card id
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct StudentListResponse {
    pub data: Vec<Student>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 250)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    Str(&'a str),
}

/* =========================
List students (paginated)
========================= */
/// Swagger doc for list_students endpoint
#[utoipa::path(
    get,
    path = "/api/students",
    params(StudentQuery),
    responses(
        (status = 200, description = "Paginated student list", body = StudentListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Students"
)]
pub async fn list_students(
    pool: web::Data<MySqlPool>,
    query: web::Query<StudentQuery>,
) -> actix_web::Result<impl Responder> {
    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let like = query.search.as_deref().map(|s| format!("%{}%", s));

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(branch) = query.branch.as_deref() {
        where_sql.push_str(" AND branch = ?");
        args.push(FilterValue::Str(branch));
    }

    if let Some(like) = like.as_deref() {
        where_sql.push_str(" AND (name LIKE ? OR roll_number LIKE ? OR card_id LIKE ?)");
        args.push(FilterValue::Str(like));
        args.push(FilterValue::Str(like));
        args.push(FilterValue::Str(like));
    }

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM students{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count students");
        ErrorInternalServerError("Internal Server Error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT * FROM students{} ORDER BY roll_number ASC LIMIT ? OFFSET ?",
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Student>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let students = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch students");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(StudentListResponse {
        data: students,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

async fn insert_student(pool: &MySqlPool, payload: &CreateStudent) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO students
            (roll_number, card_id, name, branch, email, mobile)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.roll_number)
    .bind(card_filter::normalize(&payload.card_id))
    .bind(&payload.name)
    .bind(&payload.branch)
    .bind(&payload.email)
    .bind(&payload.mobile)
    .execute(pool)
    .await?;

    Ok(result.last_insert_id())
}

fn is_duplicate(e: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        return db_err.code().as_deref() == Some("23000");
    }
    false
}

/* =========================
Add student
========================= */
/// Swagger doc for add_student endpoint
#[utoipa::path(
    post,
    path = "/api/students/add",
    request_body = CreateStudent,
    responses(
        (status = 200, description = "Student added", body = Object, example = json!({
            "message": "Student added successfully",
            "id": 1
        })),
        (status = 400, description = "Duplicate roll number or card", body = Object, example = json!({
            "message": "Roll number or card already registered"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Students"
)]
pub async fn add_student(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateStudent>,
) -> actix_web::Result<impl Responder> {
    match insert_student(pool.get_ref(), &payload).await {
        Ok(id) => {
            let card_id = card_filter::normalize(&payload.card_id);
            card_filter::insert(&card_id);
            student_cache::put(&Student {
                id,
                roll_number: payload.roll_number.clone(),
                card_id,
                name: payload.name.clone(),
                branch: payload.branch.clone(),
                email: payload.email.clone(),
                mobile: payload.mobile.clone(),
            })
            .await;

            Ok(HttpResponse::Ok().json(json!({
                "message": "Student added successfully",
                "id": id
            })))
        }
        Err(e) if is_duplicate(&e) => Ok(HttpResponse::BadRequest().json(json!({
            "message": "Roll number or card already registered"
        }))),
        Err(e) => {
            error!(error = %e, "Failed to add student");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}

/* =========================
Add many students (bulk import)
========================= */
/// Swagger doc for add_many_students endpoint
#[utoipa::path(
    post,
    path = "/api/students/addMany",
    request_body = Vec<CreateStudent>,
    responses(
        (status = 200, description = "Bulk import finished", body = Object, example = json!({
            "message": "Import finished",
            "inserted": 48,
            "skipped": 2
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Students"
)]
pub async fn add_many_students(
    pool: web::Data<MySqlPool>,
    payload: web::Json<Vec<CreateStudent>>,
) -> actix_web::Result<impl Responder> {
    let mut inserted = 0usize;
    let mut skipped = 0usize;

    for student in payload.iter() {
        match insert_student(pool.get_ref(), student).await {
            Ok(_) => {
                card_filter::insert(&card_filter::normalize(&student.card_id));
                inserted += 1;
            }
            // Duplicates are expected in re-imported sheets; keep going.
            Err(e) if is_duplicate(&e) => skipped += 1,
            Err(e) => {
                error!(error = %e, inserted, "Bulk student import failed");
                return Err(ErrorInternalServerError("Internal Server Error"));
            }
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Import finished",
        "inserted": inserted,
        "skipped": skipped
    })))
}

/* =========================
Update student
========================= */
/// Swagger doc for update_student endpoint
#[utoipa::path(
    put,
    path = "/api/students/{student_id}",
    params(
        ("student_id" = u64, Path, description = "Student ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Student updated", body = Object, example = json!({
            "message": "Student updated successfully"
        })),
        (status = 400, description = "Bad payload or non-updatable field"),
        (status = 404, description = "Student not found", body = Object, example = json!({
            "message": "Student not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Students"
)]
pub async fn update_student(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<serde_json::Value>,
) -> actix_web::Result<impl Responder> {
    let student_id = path.into_inner();

    let existing = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = ?")
        .bind(student_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, student_id, "Failed to fetch student");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(existing) = existing else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Student not found"
        })));
    };

    let update = build_update_sql("students", &body, STUDENT_UPDATABLE, "id", student_id)?;

    execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, student_id, "Failed to update student");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let updated = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = ?")
        .bind(student_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, student_id, "Failed to re-fetch student");
            ErrorInternalServerError("Internal Server Error")
        })?;

    // Keep the swipe fast path coherent with the roster.
    if updated.card_id != existing.card_id {
        card_filter::remove(&existing.card_id);
        card_filter::insert(&updated.card_id);
        student_cache::invalidate(&existing.card_id).await;
    }
    student_cache::put(&updated).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Student updated successfully",
        "student": updated
    })))
}

/* =========================
Delete student
========================= */
/// Swagger doc for delete_student endpoint
#[utoipa::path(
    delete,
    path = "/api/students/{student_id}",
    params(
        ("student_id" = u64, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 404, description = "Student not found", body = Object, example = json!({
            "message": "Student not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Students"
)]
pub async fn delete_student(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let student_id = path.into_inner();

    let existing = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = ?")
        .bind(student_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, student_id, "Failed to fetch student");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(existing) = existing else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Student not found"
        })));
    };

    let result = sqlx::query("DELETE FROM students WHERE id = ?")
        .bind(student_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(_) => {
            // Past attendance records keep their snapshot; only the live
            // swipe path forgets this card.
            card_filter::remove(&existing.card_id);
            student_cache::invalidate(&existing.card_id).await;

            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }
        Err(e) => {
            error!(error = %e, student_id, "Failed to delete student");

            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}
