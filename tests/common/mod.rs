// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use schola::application::App;
use schola::domain::{GroupId, Month, PersonId, Role};
use tempfile::TempDir;

/// Helper to create a test app with a temporary database
pub async fn test_app() -> Result<(App, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let app = App::init(db_path.to_str().unwrap()).await?;
    Ok((app, temp_dir))
}

/// Helper to parse a date string into NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Helper to parse a month string into Month
pub fn parse_month(month_str: &str) -> Month {
    month_str.parse().unwrap()
}

/// Helper to parse a time string into NaiveTime
pub fn parse_time(time_str: &str) -> NaiveTime {
    NaiveTime::parse_from_str(time_str, "%H:%M").unwrap()
}

/// Test fixture: a teacher with one group and two enrolled students
pub struct StandardRoster {
    pub teacher_id: PersonId,
    pub group_id: GroupId,
    pub student_a: PersonId,
    pub student_b: PersonId,
}

impl StandardRoster {
    /// Teacher on a 50% cut, a Mon/Wed/Fri group priced at 800000.00
    /// and two enrolled students.
    pub async fn create(app: &App) -> Result<Self> {
        let teacher = app
            .roster
            .create_person(
                "Nodira Karimova".into(),
                "+998901112233".into(),
                Role::Teacher,
                Some(50),
            )
            .await?;

        let group = app
            .roster
            .create_group(
                "English B2".into(),
                80_000_000,
                vec!["monday".into(), "wednesday".into(), "friday".into()],
                parse_time("14:00"),
                teacher.id,
            )
            .await?;

        let student_a = app
            .roster
            .create_person(
                "Aziz Toirov".into(),
                "+998901234567".into(),
                Role::Student,
                None,
            )
            .await?;
        let student_b = app
            .roster
            .create_person(
                "Malika Usmonova".into(),
                "+998907654321".into(),
                Role::Student,
                None,
            )
            .await?;

        app.roster.enroll(group.id, student_a.id).await?;
        app.roster.enroll(group.id, student_b.id).await?;

        Ok(Self {
            teacher_id: teacher.id,
            group_id: group.id,
            student_a: student_a.id,
            student_b: student_b.id,
        })
    }
}
