//! Row types for the `students` and `attendance` tables, plus the request-side shapes that feed
//! them.

use crate::schema::{attendance, students};
use chrono::NaiveDate;
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A student on the roster.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Student {
    pub id: i32,
    pub name: String,
    pub roll_number: String,
    pub department: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = students)]
pub struct NewStudent<'a> {
    pub name: &'a str,
    pub roll_number: &'a str,
    pub department: Option<&'a str>,
}

/// The set of columns an update touches.
///
/// `None` leaves a column alone. For `department`, `Some(None)` clears it.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = students)]
pub struct StudentChangeset<'a> {
    pub name: Option<&'a str>,
    pub roll_number: Option<&'a str>,
    pub department: Option<Option<&'a str>>,
}

impl StudentChangeset<'_> {
    /// Diesel refuses to build an `UPDATE` with no columns, so callers check this first.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.roll_number.is_none() && self.department.is_none()
    }
}

/// The status of a student on a given day.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = Text)]
pub enum Status {
    #[default]
    Present,
    Absent,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Present => "Present",
            Status::Absent => "Absent",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid status '{0}', expected 'Present' or 'Absent'")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Present" => Ok(Status::Present),
            "Absent" => Ok(Status::Absent),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl ToSql<Text, Sqlite> for Status {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for Status {
    fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        Ok(text.parse()?)
    }
}

/// One attendance record: a student's status on one date.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = attendance)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Attendance {
    pub id: i32,
    pub student_id: i32,
    pub date: NaiveDate,
    pub status: Status,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = attendance)]
pub struct NewAttendance {
    pub student_id: i32,
    pub date: NaiveDate,
    pub status: Status,
}

/// Body of `POST /students`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateStudent {
    pub name: Option<String>,
    pub roll_number: Option<String>,
    pub department: Option<String>,
}

/// Body of `PUT /students/{id}`.
///
/// The outer `Option` records whether the key was present at all, the inner one whether it was
/// `null`.
#[derive(Debug, Default, Deserialize)]
pub struct StudentPatch {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub roll_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub department: Option<Option<String>>,
}

/// Maps a key that is present in the JSON (even as `null`) to `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Body of `POST /attendance/mark`.
#[derive(Debug, Default, Deserialize)]
pub struct MarkAttendance {
    pub roll_number: Option<String>,
    pub date: Option<String>,
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_only_known_values() {
        assert_eq!("Present".parse::<Status>(), Ok(Status::Present));
        assert_eq!("Absent".parse::<Status>(), Ok(Status::Absent));
        assert_eq!(
            "Late".parse::<Status>(),
            Err(UnknownStatus("Late".to_string()))
        );
        assert!("present".parse::<Status>().is_err());
    }

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let patch: StudentPatch =
            serde_json::from_str(r#"{"name": "Ada", "department": null}"#).unwrap();

        assert_eq!(patch.name, Some(Some("Ada".to_string())));
        assert_eq!(patch.roll_number, None);
        assert_eq!(patch.department, Some(None));
    }

    #[test]
    fn empty_changeset_is_detected() {
        assert!(StudentChangeset::default().is_empty());
        assert!(
            !StudentChangeset {
                department: Some(None),
                ..Default::default()
            }
            .is_empty()
        );
    }
}
