use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{Month, Role};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Student not found: {0}")]
    StudentNotFound(String),

    #[error("Teacher not found: {0}")]
    TeacherNotFound(String),

    #[error("Person not found: {0}")]
    PersonNotFound(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    #[error("Payout not found: {0}")]
    PayoutNotFound(String),

    #[error("Salary for {teacher} has already been paid for {month}")]
    PayoutAlreadyExists { teacher: String, month: Month },

    #[error("Phone number already registered: {0}")]
    PhoneAlreadyRegistered(String),

    #[error("Teacher {teacher} already holds a lesson near that slot: {existing_group}")]
    TeacherScheduleClash {
        teacher: String,
        existing_group: String,
    },

    #[error("Teacher {0} still has groups assigned and cannot be deleted")]
    TeacherHasGroups(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Salary percentage must be between 0 and 100, got {0}")]
    InvalidPercentage(u8),

    #[error("Salary percentage only applies to teachers")]
    PercentageForNonTeacher,

    #[error("Salary percentage is not set for teacher {0}")]
    MissingSalaryPercentage(String),

    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Role {actor} is not allowed to perform {operation}")]
    PermissionDenied { operation: String, actor: Role },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
