use anyhow::Context;
use clap::Parser;
use class_attendance::api::{self, AppState};
use class_attendance::cli::{Cli, Command};
use class_attendance::config::Settings;
use class_attendance::report::{self, ReportPeriod};
use class_attendance::{AttendanceManager, display};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    class_attendance::init_tracing();

    let cli = Cli::parse();
    let settings = cli.settings().context("failed to load settings")?;

    let mut manager = AttendanceManager::connect(&settings.database_url)
        .with_context(|| format!("failed to open database {}", settings.database_url))?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(manager, settings).await,
        Command::Report { year, month } => {
            let period = match (year, month) {
                (Some(year), Some(month)) => ReportPeriod::new(year, month)
                    .with_context(|| format!("invalid month {year}/{month}"))?,
                _ => ReportPeriod::current(),
            };

            let report = report::generate(&mut manager, period)?;
            println!("{}", display::report_table(&report));
            Ok(())
        }
    }
}

async fn serve(manager: AttendanceManager, settings: Settings) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&settings.listen)
        .await
        .with_context(|| format!("failed to bind {}", settings.listen))?;
    info!("Listening on {}", settings.listen);

    let app = api::build_router(AppState::new(manager, settings));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
