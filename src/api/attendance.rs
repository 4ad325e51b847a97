use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{Value, json};
use tracing::info;

use crate::api::{AppState, required};
use crate::error::AppError;
use crate::models::{MarkAttendance, Status};
use crate::report::{self, MonthlyReport, ReportPeriod};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/attendance/mark", post(mark_attendance))
        .route("/attendance/summary", get(current_summary))
        .route("/attendance/summary/{year}/{month}", get(monthly_summary))
}

async fn mark_attendance(
    State(state): State<AppState>,
    payload: Result<Json<MarkAttendance>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(input) = payload?;

    let (Some(roll_number), Some(date)) = (required(input.roll_number), required(input.date))
    else {
        return Err(AppError::Validation(
            "Roll number and date are required".to_string(),
        ));
    };

    let lookup = roll_number.clone();
    let (status, date) = state
        .run(move |manager| {
            let student = manager
                .find_by_roll_number(&lookup)?
                .ok_or_else(AppError::student_not_found)?;

            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|_| AppError::Validation("Invalid date format".to_string()))?;

            let status = match input.status {
                Some(status) => status
                    .parse::<Status>()
                    .map_err(|err| AppError::Validation(err.to_string()))?,
                None => Status::default(),
            };

            manager.mark(student.id, date, status)?;
            Ok((status, date))
        })
        .await?;
    info!(%roll_number, %date, %status, "attendance marked");

    Ok(Json(json!({
        "message": format!("Attendance marked as {status} for {roll_number} on {date}."),
    })))
}

async fn summary(state: &AppState, period: ReportPeriod) -> Result<Json<MonthlyReport>, AppError> {
    let report = state
        .run(move |manager| Ok(report::generate(manager, period)?))
        .await?;
    Ok(Json(report))
}

async fn current_summary(State(state): State<AppState>) -> Result<Json<MonthlyReport>, AppError> {
    summary(&state, ReportPeriod::current()).await
}

async fn monthly_summary(
    State(state): State<AppState>,
    period: Result<Path<(i32, u32)>, PathRejection>,
) -> Result<Json<MonthlyReport>, AppError> {
    let Path((year, month)) = period?;
    let period = ReportPeriod::new(year, month)
        .ok_or_else(|| AppError::Validation(format!("Invalid month {year}/{month}")))?;

    summary(&state, period).await
}
