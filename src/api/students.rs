use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::{Value, json};

use crate::api::{AppState, required};
use crate::error::AppError;
use crate::models::{CreateStudent, NewStudent, Student, StudentChangeset, StudentPatch};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route("/students/{id}", put(update_student).delete(delete_student))
        .route("/students/search/{roll_number}", get(search_student))
}

/// Turns a unique violation into a conflict that names the duplicated roll number.
fn roll_number_taken(roll_number: &str) -> impl FnOnce(DieselError) -> AppError + '_ {
    move |err| match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            AppError::Conflict(format!("Roll number {roll_number} already exists"))
        }
        other => other.into(),
    }
}

/// A patched column that may not be cleared: absent keeps it, `null` or empty is rejected.
fn non_nullable<'a>(
    field: &'a Option<Option<String>>,
    label: &str,
) -> Result<Option<&'a str>, AppError> {
    match field {
        None => Ok(None),
        Some(Some(value)) if !value.is_empty() => Ok(Some(value.as_str())),
        Some(_) => Err(AppError::Validation(format!("{label} cannot be empty"))),
    }
}

async fn create_student(
    State(state): State<AppState>,
    payload: Result<Json<CreateStudent>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(input) = payload?;

    let (Some(name), Some(roll_number)) = (required(input.name), required(input.roll_number))
    else {
        return Err(AppError::Validation(
            "Name and Roll Number are required".to_string(),
        ));
    };
    let department = input.department;

    let student = state
        .run(move |manager| {
            let new_student = NewStudent {
                name: &name,
                roll_number: &roll_number,
                department: department.as_deref(),
            };
            manager
                .insert_student(&new_student)
                .map_err(roll_number_taken(&roll_number))
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Student added successfully!",
            "student": student,
        })),
    ))
}

async fn list_students(State(state): State<AppState>) -> Result<Json<Vec<Student>>, AppError> {
    let roster = state.run(|manager| Ok(manager.get_roster()?)).await?;
    Ok(Json(roster))
}

async fn update_student(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<StudentPatch>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = id?;
    let Json(patch) = payload?;

    let student = state
        .run(move |manager| {
            if manager.get_student(id)?.is_none() {
                return Err(AppError::student_not_found());
            }

            let changes = StudentChangeset {
                name: non_nullable(&patch.name, "name")?,
                roll_number: non_nullable(&patch.roll_number, "roll_number")?,
                department: patch.department.as_ref().map(Option::as_deref),
            };

            let roll_number = changes.roll_number.unwrap_or_default();
            manager
                .update_student(id, &changes)
                .map_err(roll_number_taken(roll_number))?
                .ok_or_else(AppError::student_not_found)
        })
        .await?;

    Ok(Json(json!({
        "message": "Student updated successfully!",
        "student": student,
    })))
}

async fn delete_student(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = id?;

    state
        .run(move |manager| {
            manager
                .delete_student(id)?
                .ok_or_else(AppError::student_not_found)
        })
        .await?;

    Ok(Json(json!({ "message": "Student deleted successfully!" })))
}

/// Unlike update and delete, an unknown roll number here is a normal `200` answer with
/// `"found": false`.
async fn search_student(
    State(state): State<AppState>,
    Path(roll_number): Path<String>,
) -> Result<Json<Value>, AppError> {
    let found = state
        .run(move |manager| Ok(manager.find_by_roll_number(&roll_number)?))
        .await?;

    let body = match found {
        Some(student) => json!({
            "found": true,
            "id": student.id,
            "name": student.name,
            "roll_number": student.roll_number,
            "department": student.department,
        }),
        None => json!({
            "found": false,
            "error": "Student not found",
        }),
    };

    Ok(Json(body))
}
