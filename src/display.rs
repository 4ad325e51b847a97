use crate::report::MonthlyReport;
use tabled::{Table, Tabled, settings::Style};

#[derive(Tabled)]
struct ReportRow<'a> {
    #[tabled(rename = "roll number")]
    roll_number: &'a str,
    name: &'a str,
    present: i64,
    #[tabled(rename = "working days")]
    working_days: i64,
    #[tabled(rename = "%")]
    percentage: f64,
}

/// Renders a monthly report as a table followed by the class-wide figures.
pub fn report_table(report: &MonthlyReport) -> String {
    let rows = report.students.iter().map(|s| ReportRow {
        roll_number: &s.roll_number,
        name: &s.name,
        present: s.days_present,
        working_days: s.total_days,
        percentage: s.attendance_percentage,
    });

    let mut table = Table::new(rows);
    table.with(Style::modern());

    format!(
        "Attendance for {}-{:02}:\n{table}\nClass average: {}%\nStudents at or above 75%: {}",
        report.year, report.month, report.class_average_attendance, report.students_above_75_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::StudentSummary;

    #[test]
    fn table_lists_every_student() {
        let report = MonthlyReport {
            month: 9,
            year: 2025,
            total_working_days: 2,
            class_average_attendance: 75.0,
            students_above_75_count: 1,
            students: vec![
                StudentSummary {
                    name: "Ada".to_string(),
                    roll_number: "R1".to_string(),
                    days_present: 2,
                    total_days: 2,
                    attendance_percentage: 100.0,
                },
                StudentSummary {
                    name: "Grace".to_string(),
                    roll_number: "R2".to_string(),
                    days_present: 1,
                    total_days: 2,
                    attendance_percentage: 50.0,
                },
            ],
        };

        let rendered = report_table(&report);
        assert!(rendered.starts_with("Attendance for 2025-09:"));
        assert!(rendered.contains("Ada"));
        assert!(rendered.contains("R2"));
        assert!(rendered.contains("Class average: 75%"));
        assert!(rendered.contains("Students at or above 75%: 1"));
    }
}
