use chrono::NaiveTime;

use crate::domain::{Cents, Group, GroupId, Person, PersonId, Role, resolve_weekdays, slots_clash};
use crate::storage::Repository;

use super::AppError;

/// People and group administration.
#[derive(Clone)]
pub struct RosterService {
    repo: Repository,
}

impl RosterService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    // ========================
    // People
    // ========================

    /// Register a person. Phone numbers are unique across the center.
    pub async fn create_person(
        &self,
        full_name: String,
        phone: String,
        role: Role,
        salary_percentage: Option<u8>,
    ) -> Result<Person, AppError> {
        if let Some(percentage) = salary_percentage {
            if percentage > 100 {
                return Err(AppError::InvalidPercentage(percentage));
            }
            if role != Role::Teacher {
                return Err(AppError::PercentageForNonTeacher);
            }
        }

        if self.repo.get_person_by_phone(&phone).await?.is_some() {
            return Err(AppError::PhoneAlreadyRegistered(phone));
        }

        let mut person = Person::new(full_name, phone, role);
        if let Some(percentage) = salary_percentage {
            person = person.with_salary_percentage(percentage);
        }

        self.repo.save_person(&person).await?;
        tracing::debug!(person_id = %person.id, role = %person.role, "person registered");
        Ok(person)
    }

    /// Get a person by ID.
    pub async fn get_person(&self, id: PersonId) -> Result<Person, AppError> {
        self.repo
            .get_person(id)
            .await?
            .ok_or_else(|| AppError::PersonNotFound(id.to_string()))
    }

    /// List people, optionally filtered by role.
    pub async fn list_people(
        &self,
        role: Option<Role>,
        include_archived: bool,
    ) -> Result<Vec<Person>, AppError> {
        Ok(self.repo.list_people(role, include_archived).await?)
    }

    /// Archive a person (soft delete). Their history stays intact.
    pub async fn archive_person(&self, id: PersonId) -> Result<(), AppError> {
        if !self.repo.archive_person(id).await? {
            return Err(AppError::PersonNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Delete a person along with their attendance, payments, enrollment
    /// and payout history. A teacher still assigned to groups cannot be
    /// deleted.
    pub async fn delete_person(&self, id: PersonId) -> Result<(), AppError> {
        let person = self.get_person(id).await?;

        if person.role == Role::Teacher {
            let groups = self.repo.list_groups(Some(id)).await?;
            if !groups.is_empty() {
                return Err(AppError::TeacherHasGroups(person.full_name));
            }
        }

        if !self.repo.delete_person(id).await? {
            return Err(AppError::PersonNotFound(id.to_string()));
        }
        tracing::debug!(person_id = %id, "person deleted");
        Ok(())
    }

    // ========================
    // Groups
    // ========================

    /// Open a group. The assigned teacher must exist and must not already
    /// hold a lesson within two hours of the new slot on a shared weekday.
    pub async fn create_group(
        &self,
        name: String,
        price_cents: Cents,
        schedule_days: Vec<String>,
        start_time: NaiveTime,
        teacher_id: PersonId,
    ) -> Result<Group, AppError> {
        if price_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Price must not be negative".to_string(),
            ));
        }

        let teacher = self
            .repo
            .get_person(teacher_id)
            .await?
            .filter(|person| person.role == Role::Teacher)
            .ok_or_else(|| AppError::TeacherNotFound(teacher_id.to_string()))?;

        if resolve_weekdays(&schedule_days).is_empty() {
            tracing::warn!(group = %name, "schedule resolves to no weekdays");
        }

        for existing in self.repo.list_groups(Some(teacher_id)).await? {
            if slots_clash(
                &schedule_days,
                start_time,
                &existing.schedule_days,
                existing.start_time,
            ) {
                return Err(AppError::TeacherScheduleClash {
                    teacher: teacher.full_name,
                    existing_group: existing.name,
                });
            }
        }

        let group = Group::new(name, price_cents, schedule_days, start_time, teacher_id);
        self.repo.save_group(&group).await?;
        tracing::debug!(group_id = %group.id, "group opened");
        Ok(group)
    }

    /// Get a group by ID.
    pub async fn get_group(&self, id: GroupId) -> Result<Group, AppError> {
        self.repo
            .get_group(id)
            .await?
            .ok_or_else(|| AppError::GroupNotFound(id.to_string()))
    }

    /// List groups, optionally restricted to one teacher.
    pub async fn list_groups(&self, teacher_id: Option<PersonId>) -> Result<Vec<Group>, AppError> {
        Ok(self.repo.list_groups(teacher_id).await?)
    }

    /// Change a group's monthly price. Debt figures follow the new price
    /// from now on; recorded payments are untouched.
    pub async fn update_group_price(
        &self,
        id: GroupId,
        price_cents: Cents,
    ) -> Result<(), AppError> {
        if price_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Price must not be negative".to_string(),
            ));
        }
        if !self.repo.update_group_price(id, price_cents).await? {
            return Err(AppError::GroupNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Close a group. Attendance and enrollment rows are removed; payments
    /// stay as history with their group reference cleared.
    pub async fn delete_group(&self, id: GroupId) -> Result<(), AppError> {
        if !self.repo.delete_group(id).await? {
            return Err(AppError::GroupNotFound(id.to_string()));
        }
        tracing::debug!(group_id = %id, "group closed");
        Ok(())
    }

    // ========================
    // Enrollment
    // ========================

    /// Enroll a student into a group. Enrolling twice is a no-op.
    pub async fn enroll(&self, group_id: GroupId, student_id: PersonId) -> Result<(), AppError> {
        if self.repo.get_group(group_id).await?.is_none() {
            return Err(AppError::GroupNotFound(group_id.to_string()));
        }
        let student = self
            .repo
            .get_person(student_id)
            .await?
            .filter(|person| person.role == Role::Student)
            .ok_or_else(|| AppError::StudentNotFound(student_id.to_string()))?;

        self.repo.enroll_student(group_id, student.id).await?;
        Ok(())
    }

    /// Remove a student from a group. Their attendance and payment history
    /// for the group is kept.
    pub async fn unenroll(&self, group_id: GroupId, student_id: PersonId) -> Result<(), AppError> {
        if self.repo.get_group(group_id).await?.is_none() {
            return Err(AppError::GroupNotFound(group_id.to_string()));
        }
        if !self.repo.unenroll_student(group_id, student_id).await? {
            return Err(AppError::StudentNotFound(student_id.to_string()));
        }
        Ok(())
    }

    /// List a group's enrolled students.
    pub async fn list_students(&self, group_id: GroupId) -> Result<Vec<Person>, AppError> {
        if self.repo.get_group(group_id).await?.is_none() {
            return Err(AppError::GroupNotFound(group_id.to_string()));
        }
        Ok(self.repo.list_group_students(group_id).await?)
    }
}
