use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::domain::{
    Attendance, AttendanceMark, GroupId, Month, MonthlyPivot, PersonId, build_monthly_pivot,
};
use crate::storage::Repository;

use super::AppError;
use super::reporting::{AttendanceSheet, SheetEntry};

/// Attendance recording and monthly roll-up.
#[derive(Clone)]
pub struct AttendanceService {
    repo: Repository,
}

impl AttendanceService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Roll call for a group on one date: every enrolled student with their
    /// balance and presence. Unmarked students are assumed present until
    /// told otherwise.
    pub async fn sheet(&self, group_id: GroupId, date: NaiveDate) -> Result<AttendanceSheet, AppError> {
        let group = self
            .repo
            .get_group(group_id)
            .await?
            .ok_or_else(|| AppError::GroupNotFound(group_id.to_string()))?;

        let students = self.repo.list_group_students(group_id).await?;
        let recorded: HashMap<PersonId, bool> = self
            .repo
            .list_day_attendance(group_id, date)
            .await?
            .into_iter()
            .map(|record| (record.student_id, record.is_present))
            .collect();

        let paid_students_count = students
            .iter()
            .filter(|student| student.balance_cents > 0)
            .count();

        let entries = students
            .iter()
            .map(|student| SheetEntry {
                student_id: student.id,
                student_name: student.full_name.clone(),
                balance_cents: student.balance_cents,
                is_present: recorded.get(&student.id).copied().unwrap_or(true),
            })
            .collect();

        Ok(AttendanceSheet {
            group_id: group.id,
            group_name: group.name,
            date,
            total_students: students.len(),
            paid_students_count,
            entries,
        })
    }

    /// Record a whole day's roll call in one shot, replacing whatever was
    /// stored for that group and date before. Duplicate marks for the same
    /// student collapse into one row. Returns the number of rows written.
    pub async fn mark_bulk(
        &self,
        group_id: GroupId,
        date: NaiveDate,
        marks: Vec<AttendanceMark>,
    ) -> Result<usize, AppError> {
        if self.repo.get_group(group_id).await?.is_none() {
            return Err(AppError::GroupNotFound(group_id.to_string()));
        }

        // Validate each distinct student once
        let mut seen = HashSet::new();
        for mark in &marks {
            if seen.insert(mark.student_id)
                && self.repo.get_person(mark.student_id).await?.is_none()
            {
                return Err(AppError::StudentNotFound(mark.student_id.to_string()));
            }
        }

        // Later duplicates win, matching a teacher correcting a mark mid-entry
        let mut by_student: HashMap<PersonId, bool> = HashMap::new();
        for mark in &marks {
            by_student.insert(mark.student_id, mark.is_present);
        }

        let records: Vec<Attendance> = by_student
            .into_iter()
            .map(|(student_id, is_present)| {
                Attendance::new(group_id, student_id, date, is_present)
            })
            .collect();

        self.repo
            .replace_day_attendance(group_id, date, &records)
            .await?;

        tracing::debug!(%group_id, %date, count = records.len(), "attendance recorded");
        Ok(records.len())
    }

    /// Set one student's presence for a date, inserting or overwriting the
    /// single record.
    pub async fn update_single(
        &self,
        group_id: GroupId,
        date: NaiveDate,
        student_id: PersonId,
        is_present: bool,
    ) -> Result<Attendance, AppError> {
        if self.repo.get_group(group_id).await?.is_none() {
            return Err(AppError::GroupNotFound(group_id.to_string()));
        }
        if self.repo.get_person(student_id).await?.is_none() {
            return Err(AppError::StudentNotFound(student_id.to_string()));
        }

        let record = Attendance::new(group_id, student_id, date, is_present);
        Ok(self.repo.upsert_attendance(&record).await?)
    }

    /// Month-by-lesson attendance matrix for a group.
    pub async fn monthly_pivot(&self, group_id: GroupId, month: Month) -> Result<MonthlyPivot, AppError> {
        let group = self
            .repo
            .get_group(group_id)
            .await?
            .ok_or_else(|| AppError::GroupNotFound(group_id.to_string()))?;

        let students = self.repo.list_group_students(group_id).await?;
        let records = self.repo.list_month_attendance(group_id, month).await?;

        Ok(build_monthly_pivot(&group, month, &students, &records))
    }

    /// Number of present marks for a group within a month.
    pub async fn present_count(&self, group_id: GroupId, month: Month) -> Result<u32, AppError> {
        Ok(self.repo.count_present_in_month(group_id, month).await? as u32)
    }
}
