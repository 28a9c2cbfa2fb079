use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, Month, PersonId};

pub type PayoutId = Uuid;

/// A salary disbursement to a teacher for one calendar month.
/// At most one payout exists per (teacher, month).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryPayout {
    pub id: PayoutId,
    pub teacher_id: PersonId,
    pub for_month: Month,
    /// The amount actually paid out. Recorded as given, independent of
    /// what the salary calculation suggests for the month.
    pub amount_cents: Cents,
    pub paid_at: DateTime<Utc>,
}

impl SalaryPayout {
    pub fn new(teacher_id: PersonId, for_month: Month, amount_cents: Cents) -> Self {
        assert!(amount_cents >= 0, "Payout amount cannot be negative");
        Self {
            id: Uuid::new_v4(),
            teacher_id,
            for_month,
            amount_cents,
            paid_at: Utc::now(),
        }
    }
}
