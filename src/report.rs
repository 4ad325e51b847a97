//! The monthly attendance report.
//!
//! A month's *working days* are the distinct dates on which anyone in the class has a record, so
//! every student is measured against the same denominator whether or not they have records of
//! their own.

use crate::manager::AttendanceManager;
use crate::models::Student;
use chrono::{Datelike, Days, Local, Months, NaiveDate};
use diesel::result::QueryResult;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Students at or above this percentage count towards `students_above_75_count`.
pub const ATTENDANCE_THRESHOLD: f64 = 75.0;

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    start: NaiveDate,
}

impl ReportPeriod {
    /// Returns `None` if `month` is not in `1..=12` or the year is out of range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|start| Self { start })
    }

    /// The month that `date` falls in.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            start: date - Days::new(u64::from(date.day0())),
        }
    }

    /// The current month in local time.
    pub fn current() -> Self {
        Self::containing(Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn month(&self) -> u32 {
        self.start.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.start
    }

    /// The first day of the following month (exclusive upper bound).
    pub fn end(&self) -> NaiveDate {
        self.start
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// One row of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub name: String,
    pub roll_number: String,
    pub days_present: i64,
    pub total_days: i64,
    pub attendance_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub month: u32,
    pub year: i32,
    pub total_working_days: i64,
    pub class_average_attendance: f64,
    pub students_above_75_count: usize,
    pub students: Vec<StudentSummary>,
}

/// Rounds to two decimals on the exact binary value, ties to even: `3.125` becomes `3.12`.
fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// `present / total` as a percentage rounded to two decimals, or `0` when there were no working
/// days.
pub fn percentage(present: i64, total: i64) -> f64 {
    if total > 0 {
        round2(present as f64 / total as f64 * 100.0)
    } else {
        0.0
    }
}

impl MonthlyReport {
    /// Builds the report from the month's working-day count and the per-student present counts.
    /// Every student on the roster gets a row, in roster order.
    pub fn build(
        period: ReportPeriod,
        total_days: i64,
        roster: Vec<Student>,
        present_days: &HashMap<i32, i64>,
    ) -> Self {
        let students: Vec<StudentSummary> = roster
            .into_iter()
            .map(|student| {
                let days_present = present_days.get(&student.id).copied().unwrap_or(0);

                StudentSummary {
                    name: student.name,
                    roll_number: student.roll_number,
                    days_present,
                    total_days,
                    attendance_percentage: percentage(days_present, total_days),
                }
            })
            .collect();

        let students_above_75_count = students
            .iter()
            .filter(|s| s.attendance_percentage >= ATTENDANCE_THRESHOLD)
            .count();

        let class_average_attendance = if students.is_empty() {
            0.0
        } else {
            let sum: f64 = students.iter().map(|s| s.attendance_percentage).sum();
            round2(sum / students.len() as f64)
        };

        Self {
            month: period.month(),
            year: period.year(),
            total_working_days: total_days,
            class_average_attendance,
            students_above_75_count,
            students,
        }
    }
}

/// Computes the report for `period` from the current contents of the database.
pub fn generate(manager: &mut AttendanceManager, period: ReportPeriod) -> QueryResult<MonthlyReport> {
    let (start, end) = (period.first_day(), period.end());

    let total_days = manager.count_working_days(start, end)?;
    let present_days = manager.count_present_days(start, end)?;
    let roster = manager.get_roster()?;

    debug!(
        year = period.year(),
        month = period.month(),
        total_days,
        students = roster.len(),
        "generating monthly report"
    );

    Ok(MonthlyReport::build(period, total_days, roster, &present_days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewStudent, Status};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn student(id: i32, roll_number: &str) -> Student {
        Student {
            id,
            name: format!("Student {id}"),
            roll_number: roll_number.to_string(),
            department: None,
        }
    }

    #[test]
    fn period_bounds() {
        let period = ReportPeriod::new(2025, 12).unwrap();
        assert_eq!(period.first_day(), date("2025-12-01"));
        assert_eq!(period.end(), date("2026-01-01"));

        assert_eq!(
            ReportPeriod::containing(date("2024-02-29")),
            ReportPeriod::new(2024, 2).unwrap()
        );
        assert_eq!(ReportPeriod::new(2025, 13), None);
        assert_eq!(ReportPeriod::new(2025, 0), None);
    }

    #[test]
    fn percentage_rounds_to_two_places() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(3, 3), 100.0);
        assert_eq!(percentage(5, 0), 0.0);
    }

    #[test]
    fn class_average_rounds_ties_to_even() {
        let period = ReportPeriod::new(2025, 9).unwrap();
        let roster = vec![student(1, "R1"), student(2, "R2")];
        let present = HashMap::from([(1, 1)]);

        let report = MonthlyReport::build(period, 16, roster, &present);

        assert_eq!(report.students[0].attendance_percentage, 6.25);
        assert_eq!(report.students[1].attendance_percentage, 0.0);
        assert_eq!(report.class_average_attendance, 3.12);
    }

    #[test]
    fn rounding_uses_the_exact_value() {
        assert_eq!(round2(1.615), 1.61);
        assert_eq!(round2(2.675), 2.67);
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(66.666), 66.67);
    }

    #[test]
    fn zero_working_days_gives_zero_everywhere() {
        let period = ReportPeriod::new(2025, 9).unwrap();
        let roster = vec![student(1, "R1"), student(2, "R2")];

        let report = MonthlyReport::build(period, 0, roster, &HashMap::new());

        assert_eq!(report.total_working_days, 0);
        assert_eq!(report.class_average_attendance, 0.0);
        assert_eq!(report.students_above_75_count, 0);
        assert!(
            report
                .students
                .iter()
                .all(|s| s.attendance_percentage == 0.0 && s.total_days == 0)
        );
    }

    #[test]
    fn empty_roster_has_zero_average() {
        let period = ReportPeriod::new(2025, 9).unwrap();
        let report = MonthlyReport::build(period, 4, Vec::new(), &HashMap::new());

        assert_eq!(report.class_average_attendance, 0.0);
        assert!(report.students.is_empty());
    }

    #[test]
    fn threshold_is_inclusive() {
        let period = ReportPeriod::new(2025, 9).unwrap();
        let roster = vec![student(1, "R1"), student(2, "R2")];
        let present = HashMap::from([(1, 3), (2, 2)]);

        let report = MonthlyReport::build(period, 4, roster, &present);

        assert_eq!(report.students[0].attendance_percentage, 75.0);
        assert_eq!(report.students[1].attendance_percentage, 50.0);
        assert_eq!(report.students_above_75_count, 1);
        assert_eq!(report.class_average_attendance, 62.5);
    }

    #[test]
    fn generate_from_database() {
        let mut manager = AttendanceManager::connect(":memory:").unwrap();
        let a = manager
            .insert_student(&NewStudent {
                name: "A",
                roll_number: "R1",
                department: None,
            })
            .unwrap();
        let b = manager
            .insert_student(&NewStudent {
                name: "B",
                roll_number: "R2",
                department: None,
            })
            .unwrap();
        manager
            .insert_student(&NewStudent {
                name: "C",
                roll_number: "R3",
                department: None,
            })
            .unwrap();

        manager.mark(a.id, date("2025-09-01"), Status::Present).unwrap();
        manager.mark(a.id, date("2025-09-02"), Status::Present).unwrap();
        manager.mark(b.id, date("2025-09-01"), Status::Present).unwrap();
        manager.mark(b.id, date("2025-09-02"), Status::Absent).unwrap();
        manager.mark(b.id, date("2025-10-01"), Status::Present).unwrap();

        let report = generate(&mut manager, ReportPeriod::new(2025, 9).unwrap()).unwrap();

        assert_eq!(report.month, 9);
        assert_eq!(report.year, 2025);
        assert_eq!(report.total_working_days, 2);
        let percentages: Vec<f64> = report
            .students
            .iter()
            .map(|s| s.attendance_percentage)
            .collect();
        assert_eq!(percentages, vec![100.0, 50.0, 0.0]);
        assert_eq!(report.students[2].days_present, 0);
        assert_eq!(report.students[2].total_days, 2);
        assert_eq!(report.class_average_attendance, 50.0);
        assert_eq!(report.students_above_75_count, 1);
    }
}
