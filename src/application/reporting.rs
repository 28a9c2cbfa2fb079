use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Cents, GroupId, Month, PaymentId, PersonId};

/// Income, pending tuition and salary costs over a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialOverview {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_income: Cents,
    pub total_pending: Cents,
    pub total_teacher_salaries: Cents,
    pub net_profit: Cents,
}

/// Full salary calculation for one teacher and month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryBreakdown {
    pub teacher_id: PersonId,
    pub teacher_name: String,
    pub month: Month,
    pub salary_percentage: u8,
    pub total_salary: Cents,
    pub details: Vec<GroupSalaryDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSalaryDetail {
    pub group_id: GroupId,
    pub group_name: String,
    pub lesson_days: u32,
    pub per_lesson_rate: f64,
    pub attended_count: u32,
    pub earned: Cents,
}

/// Salary total per teacher, without the per-group detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryEstimate {
    pub teacher_id: PersonId,
    pub teacher_name: String,
    pub month: Month,
    pub total_salary: Cents,
}

/// Printable receipt for a single payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub receipt_number: String,
    pub payment_id: PaymentId,
    pub student_name: String,
    pub group_name: Option<String>,
    pub amount_cents: Cents,
    pub price_cents: Option<Cents>,
    pub debt_cents: Cents,
    pub overpaid_cents: Cents,
    pub payment_date: NaiveDate,
}

/// A group's roll call for one lesson date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceSheet {
    pub group_id: GroupId,
    pub group_name: String,
    pub date: NaiveDate,
    pub total_students: usize,
    pub paid_students_count: usize,
    pub entries: Vec<SheetEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetEntry {
    pub student_id: PersonId,
    pub student_name: String,
    pub balance_cents: Cents,
    pub is_present: bool,
}
