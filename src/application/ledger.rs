use chrono::NaiveDate;

use crate::domain::{Cents, GroupId, Payment, PaymentId, PersonId, Role};
use crate::storage::{PaymentWithDebt, Repository};

use super::AppError;
use super::reporting::Receipt;

/// Filter for querying payments
pub struct PaymentFilter {
    pub student_id: Option<PersonId>,
    pub group_id: Option<GroupId>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub limit: Option<usize>,
}

/// Tuition payment operations. Every mutation keeps the student's running
/// balance in step with the payment rows.
#[derive(Clone)]
pub struct LedgerService {
    repo: Repository,
}

impl LedgerService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Record a payment and credit the student's balance.
    pub async fn record(
        &self,
        student_id: PersonId,
        group_id: GroupId,
        amount_cents: Cents,
        payment_date: NaiveDate,
    ) -> Result<Payment, AppError> {
        // Validate amount
        if amount_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Amount must not be negative".to_string(),
            ));
        }

        // The payer must be a known student
        let student = self
            .repo
            .get_person(student_id)
            .await?
            .filter(|person| person.role == Role::Student)
            .ok_or_else(|| AppError::StudentNotFound(student_id.to_string()))?;

        if self.repo.get_group(group_id).await?.is_none() {
            return Err(AppError::GroupNotFound(group_id.to_string()));
        }

        let payment = Payment::new(student.id, group_id, amount_cents, payment_date);
        self.repo.record_payment(&payment).await?;

        tracing::debug!(payment_id = %payment.id, student = %student.full_name, "payment recorded");
        Ok(payment)
    }

    /// Change a payment's amount. The student's balance moves by the
    /// difference, so amending twice to the same amount changes nothing.
    pub async fn amend(
        &self,
        payment_id: PaymentId,
        new_amount_cents: Cents,
    ) -> Result<Payment, AppError> {
        if new_amount_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Amount must not be negative".to_string(),
            ));
        }

        let payment = self
            .repo
            .amend_payment(payment_id, new_amount_cents)
            .await?
            .ok_or_else(|| AppError::PaymentNotFound(payment_id.to_string()))?;

        tracing::debug!(payment_id = %payment.id, "payment amended");
        Ok(payment)
    }

    /// Remove a payment and debit the student's balance by its amount.
    /// Returns the removed payment.
    pub async fn void(&self, payment_id: PaymentId) -> Result<Payment, AppError> {
        let payment = self
            .repo
            .void_payment(payment_id)
            .await?
            .ok_or_else(|| AppError::PaymentNotFound(payment_id.to_string()))?;

        tracing::debug!(payment_id = %payment.id, "payment voided");
        Ok(payment)
    }

    /// List payments with student and group context, newest first.
    pub async fn list(&self, filter: PaymentFilter) -> Result<Vec<PaymentWithDebt>, AppError> {
        Ok(self
            .repo
            .list_payments_filtered(
                filter.student_id,
                filter.group_id,
                filter.from_date,
                filter.to_date,
                filter.limit,
            )
            .await?)
    }

    /// Build a printable receipt for a payment.
    pub async fn receipt(&self, payment_id: PaymentId) -> Result<Receipt, AppError> {
        let payment = self
            .repo
            .get_payment(payment_id)
            .await?
            .ok_or_else(|| AppError::PaymentNotFound(payment_id.to_string()))?;

        let student = self
            .repo
            .get_person(payment.student_id)
            .await?
            .ok_or_else(|| AppError::StudentNotFound(payment.student_id.to_string()))?;

        // The group may have been deleted since the payment was taken
        let group = match payment.group_id {
            Some(group_id) => self.repo.get_group(group_id).await?,
            None => None,
        };
        let price_cents = group.as_ref().map(|g| g.price_cents);

        Ok(Receipt {
            receipt_number: payment.receipt_number(),
            payment_id: payment.id,
            student_name: student.full_name,
            group_name: group.map(|g| g.name),
            amount_cents: payment.amount_cents,
            price_cents,
            debt_cents: price_cents
                .map(|price| payment.debt_against(price))
                .unwrap_or(0),
            overpaid_cents: price_cents
                .map(|price| payment.overpaid_against(price))
                .unwrap_or(0),
            payment_date: payment.payment_date,
        })
    }
}
