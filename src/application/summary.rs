use std::time::Duration;

use chrono::NaiveDate;

use crate::domain::{Cents, Month, Role};
use crate::storage::{DebtorRow, Repository, TtlCache};

use super::AppError;
use super::payroll::PayrollService;
use super::reporting::FinancialOverview;

/// Overview results stay valid this long before being recomputed.
const OVERVIEW_TTL: Duration = Duration::from_secs(15 * 60);

/// Center-wide financial reporting.
#[derive(Clone)]
pub struct SummaryService {
    repo: Repository,
    payroll: PayrollService,
    cache: TtlCache,
}

fn overview_cache_key(start: NaiveDate, end: NaiveDate) -> String {
    format!("finance_overview_{}_{}", start, end)
}

impl SummaryService {
    pub fn new(repo: Repository, payroll: PayrollService, cache: TtlCache) -> Self {
        Self {
            repo,
            payroll,
            cache,
        }
    }

    /// Income, pending tuition, salary cost and net profit over a date
    /// range. Results are cached per range; a recomputation is forced only
    /// after the cache entry expires.
    pub async fn overview(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<FinancialOverview, AppError> {
        if end_date < start_date {
            return Err(AppError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }

        let key = overview_cache_key(start_date, end_date);
        if let Some(cached) = self.cache.get::<FinancialOverview>(&key) {
            tracing::debug!(%key, "overview served from cache");
            return Ok(cached);
        }

        let overview = self.compute_overview(start_date, end_date).await?;
        self.cache.set(&key, &overview, OVERVIEW_TTL);
        Ok(overview)
    }

    async fn compute_overview(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<FinancialOverview, AppError> {
        let total_income = self.repo.sum_payments_in_range(start_date, end_date).await?;
        let total_pending = self.repo.sum_pending_in_range(start_date, end_date).await?;

        // Salaries are attributed to the month the range starts in
        let month = Month::from_date(start_date);
        let teachers = self.repo.list_people(Some(Role::Teacher), false).await?;

        let mut handles = Vec::with_capacity(teachers.len());
        for teacher in teachers {
            let payroll = self.payroll.clone();
            handles.push(tokio::spawn(async move {
                (teacher.id, payroll.calculate_salary(teacher.id, month).await)
            }));
        }

        // A teacher whose salary cannot be computed counts as zero
        let mut total_teacher_salaries: Cents = 0;
        for handle in handles {
            match handle.await {
                Ok((_, Ok(breakdown))) => total_teacher_salaries += breakdown.total_salary,
                Ok((teacher_id, Err(err))) => {
                    tracing::warn!(%teacher_id, %err, "salary calculation failed, counting zero");
                }
                Err(err) => {
                    tracing::warn!(%err, "salary task failed, counting zero");
                }
            }
        }

        Ok(FinancialOverview {
            start_date,
            end_date,
            total_income,
            total_pending,
            total_teacher_salaries,
            net_profit: total_income - total_teacher_salaries,
        })
    }

    /// Active students whose balance sits below the threshold.
    pub async fn debtors(&self, threshold_cents: Cents) -> Result<Vec<DebtorRow>, AppError> {
        Ok(self.repo.list_debtors(threshold_cents).await?)
    }
}
