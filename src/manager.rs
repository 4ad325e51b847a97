#[cfg(test)]
use crate::models::Attendance;
use crate::models::{NewAttendance, NewStudent, Status, Student, StudentChangeset};
use crate::schema::{attendance, students};
use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::dsl::count;
use diesel::prelude::*;
use diesel::result::QueryResult;
use std::collections::HashMap;
use tracing::{debug, info};

/// Creates both tables if they are missing. There is no migration step: an existing database is
/// used as-is.
pub const SCHEMA_SQL: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    name TEXT NOT NULL,
    roll_number TEXT NOT NULL UNIQUE,
    department TEXT
);

CREATE TABLE IF NOT EXISTS attendance (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    student_id INTEGER NOT NULL REFERENCES students (id),
    date DATE NOT NULL DEFAULT (date('now', 'localtime')),
    status TEXT NOT NULL,
    UNIQUE (student_id, date)
);
"#;

/// The manager for recording, modifying, and retrieving students and their attendance.
///
/// Owns a single `sqlite3` connection. The server wraps one of these in a mutex and hands it to
/// every request; tests build their own with [`AttendanceManager::in_memory`].
pub struct AttendanceManager {
    db: SqliteConnection,
}

impl AttendanceManager {
    /// Connects to the `sqlite3` database at `database_url` and makes sure the schema exists.
    pub fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = SqliteConnection::establish(database_url)?;

        let mut manager = Self { db };
        manager.init_schema()?;

        info!(database_url, "connected to attendance database");
        Ok(manager)
    }

    /// A fresh, private database that lives as long as the returned manager.
    pub fn in_memory() -> anyhow::Result<Self> {
        Self::connect(":memory:")
    }

    fn init_schema(&mut self) -> QueryResult<()> {
        self.db.batch_execute(SCHEMA_SQL)
    }

    /// Retrieves all students on the roster, oldest first.
    pub fn get_roster(&mut self) -> QueryResult<Vec<Student>> {
        students::table
            .order(students::id)
            .select(Student::as_select())
            .load(&mut self.db)
    }

    /// Retrieves a student by their ID.
    pub fn get_student(&mut self, student_id: i32) -> QueryResult<Option<Student>> {
        students::table
            .find(student_id)
            .select(Student::as_select())
            .first(&mut self.db)
            .optional()
    }

    /// Retrieves a student by their roll number. Roll numbers are unique, so there is at most one.
    pub fn find_by_roll_number(&mut self, roll_number: &str) -> QueryResult<Option<Student>> {
        students::table
            .filter(students::roll_number.eq(roll_number))
            .select(Student::as_select())
            .first(&mut self.db)
            .optional()
    }

    /// Inserts a student and returns the stored row, including its generated ID.
    ///
    /// Fails with a unique violation if the roll number is already taken.
    pub fn insert_student(&mut self, new_student: &NewStudent<'_>) -> QueryResult<Student> {
        let student = diesel::insert_into(students::table)
            .values(new_student)
            .returning(Student::as_returning())
            .get_result(&mut self.db)?;

        info!(id = student.id, roll_number = %student.roll_number, "student added");
        Ok(student)
    }

    /// Applies `changes` to the student with the given ID and returns the updated row, or `None` if
    /// there is no such student.
    pub fn update_student(
        &mut self,
        student_id: i32,
        changes: &StudentChangeset<'_>,
    ) -> QueryResult<Option<Student>> {
        if changes.is_empty() {
            return self.get_student(student_id);
        }

        let updated = diesel::update(students::table.find(student_id))
            .set(changes)
            .returning(Student::as_returning())
            .get_result(&mut self.db)
            .optional()?;

        if updated.is_some() {
            info!(id = student_id, "student updated");
        }
        Ok(updated)
    }

    /// Removes and returns a student given their ID, together with all of their attendance
    /// records. Returns `None` if there is no such student.
    pub fn delete_student(&mut self, student_id: i32) -> QueryResult<Option<Student>> {
        self.db.transaction(|conn| {
            let records_removed =
                diesel::delete(attendance::table.filter(attendance::student_id.eq(student_id)))
                    .execute(conn)?;

            let deleted = diesel::delete(students::table.find(student_id))
                .returning(Student::as_returning())
                .get_result(conn)
                .optional()?;

            if deleted.is_some() {
                info!(id = student_id, records_removed, "student deleted");
            }
            Ok(deleted)
        })
    }

    /// Records `status` for a student on `date`. If that record already exists, this simply
    /// updates the [`Status`].
    pub fn mark(&mut self, student_id: i32, date: NaiveDate, status: Status) -> QueryResult<()> {
        let record = NewAttendance {
            student_id,
            date,
            status,
        };

        diesel::insert_into(attendance::table)
            .values(&record)
            .on_conflict((attendance::student_id, attendance::date))
            .do_update()
            .set(attendance::status.eq(status))
            .execute(&mut self.db)?;

        debug!(student_id, %date, %status, "attendance marked");
        Ok(())
    }

    /// Retrieves every attendance record of a student, in date order. Only tests read individual
    /// records; the API exposes attendance through the monthly report.
    #[cfg(test)]
    pub fn get_student_attendance(&mut self, student_id: i32) -> QueryResult<Vec<Attendance>> {
        attendance::table
            .filter(attendance::student_id.eq(student_id))
            .order(attendance::date)
            .select(Attendance::as_select())
            .load(&mut self.db)
    }

    /// Counts the distinct dates in `[start, end)` on which anyone has an attendance record.
    pub fn count_working_days(&mut self, start: NaiveDate, end: NaiveDate) -> QueryResult<i64> {
        attendance::table
            .filter(attendance::date.ge(start))
            .filter(attendance::date.lt(end))
            .select(count(attendance::date).aggregate_distinct())
            .get_result(&mut self.db)
    }

    /// Counts, per student ID, the days in `[start, end)` marked [`Status::Present`]. Students
    /// with no such days are missing from the map.
    pub fn count_present_days(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> QueryResult<HashMap<i32, i64>> {
        let counts = attendance::table
            .filter(attendance::status.eq(Status::Present))
            .filter(attendance::date.ge(start))
            .filter(attendance::date.lt(end))
            .group_by(attendance::student_id)
            .select((attendance::student_id, count(attendance::id)))
            .load::<(i32, i64)>(&mut self.db)?;

        Ok(counts.into_iter().collect())
    }
}
