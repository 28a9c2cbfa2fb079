use crate::domain::{
    Cents, Month, PayoutId, PersonId, Role, SalaryPayout, count_lesson_days, group_earned,
    per_lesson_rate, resolve_weekdays,
};
use crate::storage::{PayoutWithTeacher, Repository};

use super::AppError;
use super::attendance::AttendanceService;
use super::reporting::{GroupSalaryDetail, SalaryBreakdown, SalaryEstimate};

/// Salary calculation and payout bookkeeping.
#[derive(Clone)]
pub struct PayrollService {
    repo: Repository,
    attendance: AttendanceService,
}

impl PayrollService {
    pub fn new(repo: Repository, attendance: AttendanceService) -> Self {
        Self { repo, attendance }
    }

    /// Compute a teacher's salary for one month from attendance.
    ///
    /// Each group contributes attended lessons times its per-lesson rate,
    /// where the rate is the monthly price spread over the lesson days the
    /// schedule yields for that month. The teacher keeps their percentage
    /// of the total. Groups whose schedule resolves to no weekdays are
    /// skipped.
    pub async fn calculate_salary(
        &self,
        teacher_id: PersonId,
        month: Month,
    ) -> Result<SalaryBreakdown, AppError> {
        let teacher = self
            .repo
            .get_person(teacher_id)
            .await?
            .filter(|person| person.role == Role::Teacher)
            .ok_or_else(|| AppError::TeacherNotFound(teacher_id.to_string()))?;

        let percentage = match teacher.salary_percentage {
            Some(percentage) if percentage > 0 => percentage,
            _ => return Err(AppError::MissingSalaryPercentage(teacher.full_name)),
        };

        let mut details = Vec::new();
        let mut total_salary: Cents = 0;

        for group in self.repo.list_groups(Some(teacher_id)).await? {
            let weekdays = resolve_weekdays(&group.schedule_days);
            if weekdays.is_empty() {
                tracing::warn!(group = %group.name, "schedule resolves to no weekdays, skipping");
                continue;
            }

            let lesson_days = count_lesson_days(month, &weekdays);
            let rate = per_lesson_rate(group.price_cents, lesson_days);
            let attended_count = self.attendance.present_count(group.id, month).await?;
            let earned = group_earned(attended_count, rate, percentage);

            total_salary += earned;
            details.push(GroupSalaryDetail {
                group_id: group.id,
                group_name: group.name,
                lesson_days,
                per_lesson_rate: rate,
                attended_count,
                earned,
            });
        }

        Ok(SalaryBreakdown {
            teacher_id: teacher.id,
            teacher_name: teacher.full_name,
            month,
            salary_percentage: percentage,
            total_salary,
            details,
        })
    }

    /// Salary totals for every active teacher. A teacher whose salary
    /// cannot be computed is reported with zero rather than failing the
    /// whole estimate.
    pub async fn estimate_all(&self, month: Month) -> Result<Vec<SalaryEstimate>, AppError> {
        let teachers = self.repo.list_people(Some(Role::Teacher), false).await?;

        let mut estimates = Vec::with_capacity(teachers.len());
        for teacher in teachers {
            let total_salary = match self.calculate_salary(teacher.id, month).await {
                Ok(breakdown) => breakdown.total_salary,
                Err(err) => {
                    tracing::debug!(teacher = %teacher.full_name, %err, "salary estimate fell back to zero");
                    0
                }
            };
            estimates.push(SalaryEstimate {
                teacher_id: teacher.id,
                teacher_name: teacher.full_name,
                month,
                total_salary,
            });
        }

        Ok(estimates)
    }

    /// Record a salary payout. The amount is taken as given; comparing it
    /// against the calculated salary is left to the operator. Only one
    /// payout may exist per teacher and month.
    pub async fn payout(
        &self,
        teacher_id: PersonId,
        month: Month,
        amount_cents: Cents,
    ) -> Result<SalaryPayout, AppError> {
        if amount_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Payout amount must not be negative".to_string(),
            ));
        }

        let teacher = self
            .repo
            .get_person(teacher_id)
            .await?
            .filter(|person| person.role == Role::Teacher)
            .ok_or_else(|| AppError::TeacherNotFound(teacher_id.to_string()))?;

        let payout = SalaryPayout::new(teacher.id, month, amount_cents);
        if !self.repo.insert_payout_unique(&payout).await? {
            return Err(AppError::PayoutAlreadyExists {
                teacher: teacher.full_name,
                month,
            });
        }

        tracing::debug!(payout_id = %payout.id, teacher = %teacher.full_name, %month, "salary paid");
        Ok(payout)
    }

    /// List payouts, optionally restricted to one month.
    pub async fn list_payouts(&self, month: Option<Month>) -> Result<Vec<PayoutWithTeacher>, AppError> {
        Ok(self.repo.list_payouts(month).await?)
    }

    /// Get a payout by ID.
    pub async fn get_payout(&self, payout_id: PayoutId) -> Result<SalaryPayout, AppError> {
        self.repo
            .get_payout(payout_id)
            .await?
            .ok_or_else(|| AppError::PayoutNotFound(payout_id.to_string()))
    }

    /// Change a payout's amount.
    pub async fn update_payout_amount(
        &self,
        payout_id: PayoutId,
        amount_cents: Cents,
    ) -> Result<SalaryPayout, AppError> {
        if amount_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Payout amount must not be negative".to_string(),
            ));
        }

        let mut payout = self.get_payout(payout_id).await?;
        if !self.repo.update_payout_amount(payout_id, amount_cents).await? {
            return Err(AppError::PayoutNotFound(payout_id.to_string()));
        }

        payout.amount_cents = amount_cents;
        Ok(payout)
    }

    /// Remove a payout, reopening the month for that teacher.
    pub async fn delete_payout(&self, payout_id: PayoutId) -> Result<(), AppError> {
        if !self.repo.delete_payout(payout_id).await? {
            return Err(AppError::PayoutNotFound(payout_id.to_string()));
        }
        Ok(())
    }
}
