use tracing_subscriber::EnvFilter;

pub mod api;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod manager;
pub mod models;
pub mod report;
pub mod schema;

pub use crate::manager::AttendanceManager;

/// Installs the global `tracing` subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}
