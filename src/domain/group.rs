use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, PersonId};

pub type GroupId = Uuid;

/// A course group: a set of enrolled students taught by one teacher
/// on a fixed weekly schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    /// Monthly course price in cents.
    pub price_cents: Cents,
    /// Weekday names like "monday". Unrecognized entries are tolerated
    /// in storage and ignored by schedule arithmetic.
    pub schedule_days: Vec<String>,
    pub start_time: NaiveTime,
    pub teacher_id: PersonId,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn new(
        name: String,
        price_cents: Cents,
        schedule_days: Vec<String>,
        start_time: NaiveTime,
        teacher_id: PersonId,
    ) -> Self {
        assert!(price_cents >= 0, "Group price cannot be negative");
        Self {
            id: Uuid::new_v4(),
            name,
            price_cents,
            schedule_days,
            start_time,
            teacher_id,
            created_at: Utc::now(),
        }
    }

    /// Storage form of the schedule, a comma-separated day list.
    pub fn schedule_days_joined(&self) -> String {
        self.schedule_days.join(",")
    }

    pub fn split_schedule_days(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|day| day.trim().to_string())
            .filter(|day| !day.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_days_joined() {
        let group = Group::new(
            "English B2".to_string(),
            80_000_000,
            vec!["monday".to_string(), "wednesday".to_string(), "friday".to_string()],
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            Uuid::new_v4(),
        );
        assert_eq!(group.schedule_days_joined(), "monday,wednesday,friday");
    }

    #[test]
    fn test_split_schedule_days() {
        assert_eq!(
            Group::split_schedule_days("monday, wednesday ,friday"),
            vec!["monday", "wednesday", "friday"]
        );
        assert_eq!(Group::split_schedule_days(""), Vec::<String>::new());
        assert_eq!(Group::split_schedule_days("tuesday,,"), vec!["tuesday"]);
    }
}
