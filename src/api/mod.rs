//! The HTTP surface: routes, shared state and middleware.

mod attendance;
mod middleware;
mod students;

use std::sync::{Arc, Mutex};

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::config::Settings;
use crate::error::AppError;
use crate::manager::AttendanceManager;

/// Shared by every request: the one database connection, and the settings it was opened with.
#[derive(Clone)]
pub struct AppState {
    manager: Arc<Mutex<AttendanceManager>>,
    settings: Arc<Settings>,
}

impl AppState {
    pub fn new(manager: AttendanceManager, settings: Settings) -> Self {
        Self {
            manager: Arc::new(Mutex::new(manager)),
            settings: Arc::new(settings),
        }
    }

    /// Runs `work` against the database on the blocking thread pool, holding the connection lock
    /// for its whole duration.
    pub async fn run<T, F>(&self, work: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&mut AttendanceManager) -> Result<T, AppError> + Send + 'static,
    {
        let manager = Arc::clone(&self.manager);
        tokio::task::spawn_blocking(move || {
            let mut manager = manager.lock().map_err(|_| AppError::Unavailable)?;
            work(&mut *manager)
        })
        .await?
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// Treats a missing or empty string as absent.
pub(crate) fn required(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

async fn home() -> Json<Value> {
    Json(json!({ "message": "Attendance backend is live!" }))
}

/// Builds the complete API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .merge(students::routes())
        .merge(attendance::routes())
        .layer(from_fn_with_state(state.clone(), middleware::cors_middleware))
        .layer(from_fn(middleware::trace_middleware))
        .with_state(state)
}
