use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type PersonId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "teacher" => Some(Role::Teacher),
            "student" => Some(Role::Student),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A person known to the center: staff member, teacher or student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub full_name: String,
    /// Unique contact number, used as the natural key for duplicate checks.
    pub phone: String,
    pub role: Role,
    /// Running credit in cents. Only meaningful for students; mutated
    /// exclusively by payment operations.
    pub balance_cents: Cents,
    /// Share of per-lesson revenue a teacher earns, 0-100.
    pub salary_percentage: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl Person {
    pub fn new(full_name: String, phone: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name,
            phone,
            role,
            balance_cents: 0,
            salary_percentage: None,
            created_at: Utc::now(),
            archived_at: None,
        }
    }

    pub fn with_salary_percentage(mut self, percentage: u8) -> Self {
        assert!(percentage <= 100, "Salary percentage cannot exceed 100");
        self.salary_percentage = Some(percentage);
        self
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}
