use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Group, GroupId, Month, Person, PersonId};

pub type AttendanceId = Uuid;

/// One recorded attendance fact: a student's presence in a group on a date.
/// At most one row exists per (group, student, date).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendance {
    pub id: AttendanceId,
    pub group_id: GroupId,
    pub student_id: PersonId,
    pub date: NaiveDate,
    pub is_present: bool,
    pub recorded_at: DateTime<Utc>,
}

impl Attendance {
    pub fn new(group_id: GroupId, student_id: PersonId, date: NaiveDate, is_present: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            student_id,
            date,
            is_present,
            recorded_at: Utc::now(),
        }
    }
}

/// One entry of a bulk attendance submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttendanceMark {
    pub student_id: PersonId,
    pub is_present: bool,
}

/// Month-by-lesson attendance matrix for a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyPivot {
    pub group_id: GroupId,
    pub group_name: String,
    pub month: Month,
    /// Lesson column labels, "YYYY-MM-DD HH:MM", in date order.
    pub columns: Vec<String>,
    pub rows: Vec<PivotRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PivotRow {
    pub student_id: PersonId,
    pub student_name: String,
    pub total_present: u32,
    /// Cell per column label: Some(true) present, Some(false) absent,
    /// None when nothing was recorded for that student on that date.
    pub cells: BTreeMap<String, Option<bool>>,
}

/// Build the monthly attendance matrix from raw records. Columns are the
/// distinct dates that have any record at all, so untracked lesson days
/// simply do not appear.
pub fn build_monthly_pivot(
    group: &Group,
    month: Month,
    students: &[Person],
    records: &[Attendance],
) -> MonthlyPivot {
    let dates: Vec<NaiveDate> = records
        .iter()
        .map(|record| record.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let time_label = group.start_time.format("%H:%M").to_string();
    let columns: Vec<String> = dates
        .iter()
        .map(|date| format!("{} {}", date, time_label))
        .collect();

    let by_key: HashMap<(PersonId, NaiveDate), bool> = records
        .iter()
        .map(|record| ((record.student_id, record.date), record.is_present))
        .collect();

    let rows = students
        .iter()
        .map(|student| {
            let mut total_present = 0;
            let mut cells = BTreeMap::new();
            for (date, column) in dates.iter().zip(&columns) {
                let cell = by_key.get(&(student.id, *date)).copied();
                if cell == Some(true) {
                    total_present += 1;
                }
                cells.insert(column.clone(), cell);
            }
            PivotRow {
                student_id: student.id,
                student_name: student.full_name.clone(),
                total_present,
                cells,
            }
        })
        .collect();

    MonthlyPivot {
        group_id: group.id,
        group_name: group.name.clone(),
        month,
        columns,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use chrono::NaiveTime;

    fn sample_group() -> Group {
        Group::new(
            "Math A1".to_string(),
            50_000_000,
            vec!["tuesday".to_string(), "thursday".to_string()],
            NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            Uuid::new_v4(),
        )
    }

    fn student(name: &str) -> Person {
        Person::new(name.to_string(), format!("+99890{}", name.len()), Role::Student)
    }

    #[test]
    fn test_pivot_columns_sorted_and_labeled() {
        let group = sample_group();
        let alice = student("Alice");
        let later = NaiveDate::from_ymd_opt(2026, 2, 5).unwrap();
        let earlier = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
        let records = vec![
            Attendance::new(group.id, alice.id, later, true),
            Attendance::new(group.id, alice.id, earlier, false),
        ];

        let pivot = build_monthly_pivot(
            &group,
            Month::new(2026, 2).unwrap(),
            &[alice],
            &records,
        );

        assert_eq!(
            pivot.columns,
            vec!["2026-02-03 10:30".to_string(), "2026-02-05 10:30".to_string()]
        );
    }

    #[test]
    fn test_pivot_cells_and_totals() {
        let group = sample_group();
        let alice = student("Alice");
        let bob = student("Robert");
        let day_one = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
        let day_two = NaiveDate::from_ymd_opt(2026, 2, 5).unwrap();
        let records = vec![
            Attendance::new(group.id, alice.id, day_one, true),
            Attendance::new(group.id, alice.id, day_two, true),
            Attendance::new(group.id, bob.id, day_one, false),
            // Bob has no record on day_two at all
        ];

        let pivot = build_monthly_pivot(
            &group,
            Month::new(2026, 2).unwrap(),
            &[alice.clone(), bob.clone()],
            &records,
        );

        let alice_row = &pivot.rows[0];
        assert_eq!(alice_row.total_present, 2);
        assert_eq!(alice_row.cells["2026-02-03 10:30"], Some(true));
        assert_eq!(alice_row.cells["2026-02-05 10:30"], Some(true));

        let bob_row = &pivot.rows[1];
        assert_eq!(bob_row.total_present, 0);
        assert_eq!(bob_row.cells["2026-02-03 10:30"], Some(false));
        assert_eq!(bob_row.cells["2026-02-05 10:30"], None);
    }

    #[test]
    fn test_pivot_empty_records() {
        let group = sample_group();
        let alice = student("Alice");
        let pivot = build_monthly_pivot(&group, Month::new(2026, 2).unwrap(), &[alice], &[]);
        assert!(pivot.columns.is_empty());
        assert_eq!(pivot.rows.len(), 1);
        assert_eq!(pivot.rows[0].total_present, 0);
    }
}
