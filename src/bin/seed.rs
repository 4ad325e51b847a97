//! Seeds the database with randomised attendance.
//!
//! For every day in the requested range, every student on the roster is marked either present or
//! absent at random. Marking upserts, so running this twice overwrites the earlier run instead of
//! duplicating it. The report for the first seeded month is printed at the end.

use anyhow::{Context, ensure};
use chrono::{Days, NaiveDate};
use clap::Parser;
use class_attendance::config::Settings;
use class_attendance::models::Status;
use class_attendance::report::{self, ReportPeriod};
use class_attendance::{AttendanceManager, display};
use rand::Rng;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "seed", about = "Fill the database with random attendance")]
struct Args {
    /// Path of the config file, without its extension.
    #[arg(short, long, default_value = "config")]
    config: String,

    /// The first day to seed.
    #[arg(long, default_value = "2025-09-01")]
    start: NaiveDate,

    /// How many consecutive days to seed.
    #[arg(long, default_value_t = 30)]
    days: u64,

    /// The probability of a student being marked present on a given day.
    #[arg(long, default_value_t = 0.7)]
    present_ratio: f64,
}

fn main() -> anyhow::Result<()> {
    class_attendance::init_tracing();

    let args = Args::parse();
    ensure!(
        (0.0..=1.0).contains(&args.present_ratio),
        "--present-ratio must be between 0 and 1"
    );

    let settings = Settings::load(&args.config)?;
    let mut manager = AttendanceManager::connect(&settings.database_url)?;

    let roster = manager.get_roster()?;
    info!(
        students = roster.len(),
        days = args.days,
        start = %args.start,
        "seeding attendance"
    );

    let mut rng = rand::thread_rng();
    for offset in 0..args.days {
        let date = args
            .start
            .checked_add_days(Days::new(offset))
            .context("seeding ran past the end of the calendar")?;

        for student in &roster {
            let status = if rng.gen_bool(args.present_ratio) {
                Status::Present
            } else {
                Status::Absent
            };
            manager.mark(student.id, date, status)?;
        }
    }

    let report = report::generate(&mut manager, ReportPeriod::containing(args.start))?;
    println!("{}", display::report_table(&report));

    Ok(())
}
