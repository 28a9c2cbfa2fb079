use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, GroupId, PersonId};

pub type PaymentId = Uuid;

/// A tuition payment by a student toward a group's monthly price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub student_id: PersonId,
    /// Becomes None when the group is later deleted; the payment itself
    /// is kept as financial history.
    pub group_id: Option<GroupId>,
    pub amount_cents: Cents,
    pub payment_date: NaiveDate,
    pub recorded_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        student_id: PersonId,
        group_id: GroupId,
        amount_cents: Cents,
        payment_date: NaiveDate,
    ) -> Self {
        assert!(amount_cents >= 0, "Payment amount cannot be negative");
        Self {
            id: Uuid::new_v4(),
            student_id,
            group_id: Some(group_id),
            amount_cents,
            payment_date,
            recorded_at: Utc::now(),
        }
    }

    /// Short human-readable receipt reference derived from the payment id.
    pub fn receipt_number(&self) -> String {
        let id = self.id.to_string();
        id.split('-').next().unwrap_or(&id).to_uppercase()
    }

    /// How far this payment falls short of the group price, never negative.
    pub fn debt_against(&self, price_cents: Cents) -> Cents {
        (price_cents - self.amount_cents).max(0)
    }

    /// How far this payment exceeds the group price, never negative.
    pub fn overpaid_against(&self, price_cents: Cents) -> Cents {
        (self.amount_cents - price_cents).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payment(amount: Cents) -> Payment {
        Payment::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            amount,
            NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
        )
    }

    #[test]
    fn test_receipt_number_is_first_uuid_segment() {
        let payment = sample_payment(5_000_000);
        let expected = payment.id.to_string()[..8].to_uppercase();
        assert_eq!(payment.receipt_number(), expected);
        assert_eq!(payment.receipt_number().len(), 8);
    }

    #[test]
    fn test_debt_against_price() {
        let payment = sample_payment(30_000_000);
        assert_eq!(payment.debt_against(80_000_000), 50_000_000);
        assert_eq!(payment.debt_against(30_000_000), 0);
        assert_eq!(payment.debt_against(10_000_000), 0);
    }

    #[test]
    fn test_overpaid_against_price() {
        let payment = sample_payment(90_000_000);
        assert_eq!(payment.overpaid_against(80_000_000), 10_000_000);
        assert_eq!(payment.overpaid_against(90_000_000), 0);
        assert_eq!(payment.overpaid_against(100_000_000), 0);
    }
}
