use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Attendance, Cents, Group, GroupId, Month, Payment, PaymentId, PayoutId, Person, PersonId,
    Role, SalaryPayout,
};

use super::MIGRATION_001_INITIAL;

/// Payment joined with the student and group it belongs to.
/// Debt is derived against the group price at read time; payments whose
/// group was deleted carry no price and therefore no debt.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentWithDebt {
    pub payment: Payment,
    pub student_name: String,
    pub group_name: Option<String>,
    pub price_cents: Option<Cents>,
    pub debt_cents: Cents,
}

/// Payout joined with the receiving teacher's name.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutWithTeacher {
    pub payout: SalaryPayout,
    pub teacher_name: String,
}

/// An active student whose balance fell below a threshold.
#[derive(Debug, Clone, Serialize)]
pub struct DebtorRow {
    pub student_id: PersonId,
    pub student_name: String,
    pub phone: String,
    pub balance_cents: Cents,
}

/// Repository for persisting and querying people, groups, payments,
/// attendance and payouts.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    /// Creates the database file if it doesn't exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // People operations
    // ========================

    /// Save a new person to the database.
    pub async fn save_person(&self, person: &Person) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO people (id, full_name, phone, role, balance_cents, salary_percentage, created_at, archived_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(person.id.to_string())
        .bind(&person.full_name)
        .bind(&person.phone)
        .bind(person.role.as_str())
        .bind(person.balance_cents)
        .bind(person.salary_percentage.map(|p| p as i64))
        .bind(person.created_at.to_rfc3339())
        .bind(person.archived_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .context("Failed to save person")?;
        Ok(())
    }

    /// Get a person by ID.
    pub async fn get_person(&self, id: PersonId) -> Result<Option<Person>> {
        let row = sqlx::query(
            r#"
            SELECT id, full_name, phone, role, balance_cents, salary_percentage, created_at, archived_at
            FROM people
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch person")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_person(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a person by phone number.
    pub async fn get_person_by_phone(&self, phone: &str) -> Result<Option<Person>> {
        let row = sqlx::query(
            r#"
            SELECT id, full_name, phone, role, balance_cents, salary_percentage, created_at, archived_at
            FROM people
            WHERE phone = ?
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch person by phone")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_person(&row)?)),
            None => Ok(None),
        }
    }

    /// List people, optionally filtered by role (and optionally including archived).
    pub async fn list_people(
        &self,
        role: Option<Role>,
        include_archived: bool,
    ) -> Result<Vec<Person>> {
        let mut query = String::from(
            "SELECT id, full_name, phone, role, balance_cents, salary_percentage, created_at, archived_at FROM people WHERE 1=1",
        );

        if role.is_some() {
            query.push_str(" AND role = ?");
        }
        if !include_archived {
            query.push_str(" AND archived_at IS NULL");
        }
        query.push_str(" ORDER BY full_name");

        let mut sql_query = sqlx::query(&query);
        if let Some(role) = role {
            sql_query = sql_query.bind(role.as_str());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list people")?;

        rows.iter().map(Self::row_to_person).collect()
    }

    /// Archive a person (soft delete). Returns false if no such person.
    pub async fn archive_person(&self, id: PersonId) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query("UPDATE people SET archived_at = ? WHERE id = ?")
            .bind(&now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to archive person")?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a person together with their attendance, payments, enrollment
    /// and payout rows, all in one transaction. Returns false if no such person.
    pub async fn delete_person(&self, id: PersonId) -> Result<bool> {
        let id_str = id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM attendance WHERE student_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete attendance records")?;

        sqlx::query("DELETE FROM payments WHERE student_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete payments")?;

        sqlx::query("DELETE FROM group_students WHERE student_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete enrollments")?;

        sqlx::query("DELETE FROM salary_payouts WHERE teacher_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete payouts")?;

        let result = sqlx::query("DELETE FROM people WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete person")?;

        tx.commit().await.context("Failed to commit transaction")?;
        Ok(result.rows_affected() > 0)
    }

    // ========================
    // Group operations
    // ========================

    /// Save a new group to the database.
    pub async fn save_group(&self, group: &Group) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO groups (id, name, price_cents, schedule_days, start_time, teacher_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(group.id.to_string())
        .bind(&group.name)
        .bind(group.price_cents)
        .bind(group.schedule_days_joined())
        .bind(group.start_time.format("%H:%M").to_string())
        .bind(group.teacher_id.to_string())
        .bind(group.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save group")?;
        Ok(())
    }

    /// Get a group by ID.
    pub async fn get_group(&self, id: GroupId) -> Result<Option<Group>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, price_cents, schedule_days, start_time, teacher_id, created_at
            FROM groups
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch group")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_group(&row)?)),
            None => Ok(None),
        }
    }

    /// List groups, optionally restricted to one teacher.
    pub async fn list_groups(&self, teacher_id: Option<PersonId>) -> Result<Vec<Group>> {
        let mut query = String::from(
            "SELECT id, name, price_cents, schedule_days, start_time, teacher_id, created_at FROM groups WHERE 1=1",
        );

        let teacher_id_str = teacher_id.map(|id| id.to_string());
        if teacher_id.is_some() {
            query.push_str(" AND teacher_id = ?");
        }
        query.push_str(" ORDER BY name");

        let mut sql_query = sqlx::query(&query);
        if let Some(ref tid_str) = teacher_id_str {
            sql_query = sql_query.bind(tid_str);
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list groups")?;

        rows.iter().map(Self::row_to_group).collect()
    }

    /// Change a group's monthly price. Returns false if no such group.
    pub async fn update_group_price(&self, id: GroupId, price_cents: Cents) -> Result<bool> {
        let result = sqlx::query("UPDATE groups SET price_cents = ? WHERE id = ?")
            .bind(price_cents)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update group price")?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a group. Attendance and enrollment rows go with it; payments
    /// are kept as history with their group reference cleared. Returns false
    /// if no such group.
    pub async fn delete_group(&self, id: GroupId) -> Result<bool> {
        let id_str = id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM attendance WHERE group_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete attendance records")?;

        sqlx::query("DELETE FROM group_students WHERE group_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete enrollments")?;

        sqlx::query("UPDATE payments SET group_id = NULL WHERE group_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to detach payments")?;

        let result = sqlx::query("DELETE FROM groups WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete group")?;

        tx.commit().await.context("Failed to commit transaction")?;
        Ok(result.rows_affected() > 0)
    }

    // ========================
    // Enrollment operations
    // ========================

    /// Enroll a student into a group. Enrolling twice is a no-op.
    pub async fn enroll_student(&self, group_id: GroupId, student_id: PersonId) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO group_students (group_id, student_id)
            VALUES (?, ?)
            "#,
        )
        .bind(group_id.to_string())
        .bind(student_id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to enroll student")?;
        Ok(())
    }

    /// Remove a student from a group. Returns false if not enrolled.
    pub async fn unenroll_student(&self, group_id: GroupId, student_id: PersonId) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM group_students WHERE group_id = ? AND student_id = ?",
        )
        .bind(group_id.to_string())
        .bind(student_id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to unenroll student")?;
        Ok(result.rows_affected() > 0)
    }

    /// List the students enrolled in a group, ordered by name.
    pub async fn list_group_students(&self, group_id: GroupId) -> Result<Vec<Person>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.full_name, p.phone, p.role, p.balance_cents, p.salary_percentage, p.created_at, p.archived_at
            FROM people p
            JOIN group_students gs ON gs.student_id = p.id
            WHERE gs.group_id = ?
            ORDER BY p.full_name
            "#,
        )
        .bind(group_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list group students")?;

        rows.iter().map(Self::row_to_person).collect()
    }

    // ========================
    // Payment operations
    // ========================

    /// Insert a payment and apply its amount to the student's balance,
    /// both in one transaction.
    pub async fn record_payment(&self, payment: &Payment) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO payments (id, student_id, group_id, amount_cents, payment_date, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(payment.id.to_string())
        .bind(payment.student_id.to_string())
        .bind(payment.group_id.map(|id| id.to_string()))
        .bind(payment.amount_cents)
        .bind(payment.payment_date.to_string())
        .bind(payment.recorded_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to save payment")?;

        let result = sqlx::query(
            "UPDATE people SET balance_cents = balance_cents + ? WHERE id = ?",
        )
        .bind(payment.amount_cents)
        .bind(payment.student_id.to_string())
        .execute(&mut *tx)
        .await
        .context("Failed to apply balance change")?;
        if result.rows_affected() == 0 {
            anyhow::bail!("Student {} missing while applying balance change", payment.student_id);
        }

        tx.commit().await.context("Failed to commit transaction")?;
        Ok(())
    }

    /// Change a payment's amount and adjust the student's balance by the
    /// difference, both in one transaction. Returns the updated payment,
    /// or None if no such payment.
    pub async fn amend_payment(
        &self,
        id: PaymentId,
        new_amount_cents: Cents,
    ) -> Result<Option<Payment>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let row = sqlx::query(
            r#"
            SELECT id, student_id, group_id, amount_cents, payment_date, recorded_at
            FROM payments
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to fetch payment")?;

        let mut payment = match row {
            Some(row) => Self::row_to_payment(&row)?,
            None => return Ok(None),
        };

        let diff = new_amount_cents - payment.amount_cents;

        sqlx::query("UPDATE payments SET amount_cents = ? WHERE id = ?")
            .bind(new_amount_cents)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to update payment amount")?;

        if diff != 0 {
            let result = sqlx::query(
                "UPDATE people SET balance_cents = balance_cents + ? WHERE id = ?",
            )
            .bind(diff)
            .bind(payment.student_id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to apply balance change")?;
            if result.rows_affected() == 0 {
                anyhow::bail!(
                    "Student {} missing while applying balance change",
                    payment.student_id
                );
            }
        }

        tx.commit().await.context("Failed to commit transaction")?;

        payment.amount_cents = new_amount_cents;
        Ok(Some(payment))
    }

    /// Delete a payment and subtract its amount from the student's balance,
    /// both in one transaction. Returns the removed payment, or None if no
    /// such payment.
    pub async fn void_payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let row = sqlx::query(
            r#"
            SELECT id, student_id, group_id, amount_cents, payment_date, recorded_at
            FROM payments
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to fetch payment")?;

        let payment = match row {
            Some(row) => Self::row_to_payment(&row)?,
            None => return Ok(None),
        };

        sqlx::query("DELETE FROM payments WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete payment")?;

        let result = sqlx::query(
            "UPDATE people SET balance_cents = balance_cents - ? WHERE id = ?",
        )
        .bind(payment.amount_cents)
        .bind(payment.student_id.to_string())
        .execute(&mut *tx)
        .await
        .context("Failed to apply balance change")?;
        if result.rows_affected() == 0 {
            anyhow::bail!(
                "Student {} missing while applying balance change",
                payment.student_id
            );
        }

        tx.commit().await.context("Failed to commit transaction")?;
        Ok(Some(payment))
    }

    /// Get a payment by ID.
    pub async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        let row = sqlx::query(
            r#"
            SELECT id, student_id, group_id, amount_cents, payment_date, recorded_at
            FROM payments
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch payment")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_payment(&row)?)),
            None => Ok(None),
        }
    }

    /// List payments joined with student and group context, newest first.
    pub async fn list_payments_filtered(
        &self,
        student_id: Option<PersonId>,
        group_id: Option<GroupId>,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
        limit: Option<usize>,
    ) -> Result<Vec<PaymentWithDebt>> {
        // Build query dynamically based on filters
        let mut query = String::from(
            "SELECT p.id, p.student_id, p.group_id, p.amount_cents, p.payment_date, p.recorded_at, \
             s.full_name AS student_name, g.name AS group_name, g.price_cents \
             FROM payments p \
             JOIN people s ON s.id = p.student_id \
             LEFT JOIN groups g ON g.id = p.group_id \
             WHERE 1=1",
        );

        // Collect all string bindings first so they live long enough
        let student_id_str = student_id.map(|id| id.to_string());
        let group_id_str = group_id.map(|id| id.to_string());
        let from_date_str = from_date.map(|d| d.to_string());
        let to_date_str = to_date.map(|d| d.to_string());

        if student_id.is_some() {
            query.push_str(" AND p.student_id = ?");
        }
        if group_id.is_some() {
            query.push_str(" AND p.group_id = ?");
        }
        if from_date.is_some() {
            query.push_str(" AND p.payment_date >= ?");
        }
        if to_date.is_some() {
            query.push_str(" AND p.payment_date <= ?");
        }

        query.push_str(" ORDER BY p.recorded_at DESC");

        if let Some(lim) = limit {
            query.push_str(&format!(" LIMIT {}", lim));
        }

        let mut sql_query = sqlx::query(&query);

        if let Some(ref sid_str) = student_id_str {
            sql_query = sql_query.bind(sid_str);
        }
        if let Some(ref gid_str) = group_id_str {
            sql_query = sql_query.bind(gid_str);
        }
        if let Some(ref fd_str) = from_date_str {
            sql_query = sql_query.bind(fd_str);
        }
        if let Some(ref td_str) = to_date_str {
            sql_query = sql_query.bind(td_str);
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list payments")?;

        rows.iter()
            .map(|row| {
                let payment = Self::row_to_payment(row)?;
                let price_cents: Option<Cents> = row.get("price_cents");
                let debt_cents = price_cents
                    .map(|price| payment.debt_against(price))
                    .unwrap_or(0);
                Ok(PaymentWithDebt {
                    payment,
                    student_name: row.get("student_name"),
                    group_name: row.get("group_name"),
                    price_cents,
                    debt_cents,
                })
            })
            .collect()
    }

    // ========================
    // Attendance operations
    // ========================

    /// Replace a group's attendance for one date with the given records,
    /// all in one transaction. Records for other dates are untouched.
    pub async fn replace_day_attendance(
        &self,
        group_id: GroupId,
        date: NaiveDate,
        records: &[Attendance],
    ) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM attendance WHERE group_id = ? AND date = ?")
            .bind(group_id.to_string())
            .bind(date.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to clear day attendance")?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO attendance (id, group_id, student_id, date, is_present, recorded_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(group_id, student_id, date) DO UPDATE SET
                    is_present = excluded.is_present,
                    recorded_at = excluded.recorded_at
                "#,
            )
            .bind(record.id.to_string())
            .bind(record.group_id.to_string())
            .bind(record.student_id.to_string())
            .bind(record.date.to_string())
            .bind(record.is_present as i32)
            .bind(record.recorded_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .context("Failed to save attendance record")?;
        }

        tx.commit().await.context("Failed to commit transaction")?;
        Ok(())
    }

    /// Insert or update a single attendance record, returning the stored row.
    pub async fn upsert_attendance(&self, record: &Attendance) -> Result<Attendance> {
        let row = sqlx::query(
            r#"
            INSERT INTO attendance (id, group_id, student_id, date, is_present, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(group_id, student_id, date) DO UPDATE SET
                is_present = excluded.is_present,
                recorded_at = excluded.recorded_at
            RETURNING id, group_id, student_id, date, is_present, recorded_at
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.group_id.to_string())
        .bind(record.student_id.to_string())
        .bind(record.date.to_string())
        .bind(record.is_present as i32)
        .bind(record.recorded_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .context("Failed to upsert attendance record")?;

        Self::row_to_attendance(&row)
    }

    /// List a group's attendance records for one date.
    pub async fn list_day_attendance(
        &self,
        group_id: GroupId,
        date: NaiveDate,
    ) -> Result<Vec<Attendance>> {
        let rows = sqlx::query(
            r#"
            SELECT id, group_id, student_id, date, is_present, recorded_at
            FROM attendance
            WHERE group_id = ? AND date = ?
            ORDER BY student_id
            "#,
        )
        .bind(group_id.to_string())
        .bind(date.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list day attendance")?;

        rows.iter().map(Self::row_to_attendance).collect()
    }

    /// List a group's attendance records across a whole month.
    pub async fn list_month_attendance(
        &self,
        group_id: GroupId,
        month: Month,
    ) -> Result<Vec<Attendance>> {
        let rows = sqlx::query(
            r#"
            SELECT id, group_id, student_id, date, is_present, recorded_at
            FROM attendance
            WHERE group_id = ? AND date >= ? AND date <= ?
            ORDER BY date, student_id
            "#,
        )
        .bind(group_id.to_string())
        .bind(month.first_day().to_string())
        .bind(month.last_day().to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list month attendance")?;

        rows.iter().map(Self::row_to_attendance).collect()
    }

    /// Count present marks for a group within a month.
    pub async fn count_present_in_month(&self, group_id: GroupId, month: Month) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS present_count
            FROM attendance
            WHERE group_id = ? AND is_present = 1 AND date >= ? AND date <= ?
            "#,
        )
        .bind(group_id.to_string())
        .bind(month.first_day().to_string())
        .bind(month.last_day().to_string())
        .fetch_one(&self.pool)
        .await
        .context("Failed to count present marks")?;

        Ok(row.get("present_count"))
    }

    // ========================
    // Payout operations
    // ========================

    /// Insert a payout unless one already exists for the same teacher and
    /// month. Returns false when the slot is already taken.
    pub async fn insert_payout_unique(&self, payout: &SalaryPayout) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let existing = sqlx::query(
            "SELECT id FROM salary_payouts WHERE teacher_id = ? AND for_month = ?",
        )
        .bind(payout.teacher_id.to_string())
        .bind(payout.for_month.to_string())
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to check for existing payout")?;

        if existing.is_some() {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO salary_payouts (id, teacher_id, for_month, amount_cents, paid_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(payout.id.to_string())
        .bind(payout.teacher_id.to_string())
        .bind(payout.for_month.to_string())
        .bind(payout.amount_cents)
        .bind(payout.paid_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to save payout")?;

        tx.commit().await.context("Failed to commit transaction")?;
        Ok(true)
    }

    /// Get a payout by ID.
    pub async fn get_payout(&self, id: PayoutId) -> Result<Option<SalaryPayout>> {
        let row = sqlx::query(
            r#"
            SELECT id, teacher_id, for_month, amount_cents, paid_at
            FROM salary_payouts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch payout")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_payout(&row)?)),
            None => Ok(None),
        }
    }

    /// List payouts joined with teacher names, newest first. Optionally
    /// restricted to one month.
    pub async fn list_payouts(&self, month: Option<Month>) -> Result<Vec<PayoutWithTeacher>> {
        let mut query = String::from(
            "SELECT sp.id, sp.teacher_id, sp.for_month, sp.amount_cents, sp.paid_at, \
             p.full_name AS teacher_name \
             FROM salary_payouts sp \
             JOIN people p ON p.id = sp.teacher_id \
             WHERE 1=1",
        );

        let month_str = month.map(|m| m.to_string());
        if month.is_some() {
            query.push_str(" AND sp.for_month = ?");
        }
        query.push_str(" ORDER BY sp.paid_at DESC");

        let mut sql_query = sqlx::query(&query);
        if let Some(ref m_str) = month_str {
            sql_query = sql_query.bind(m_str);
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list payouts")?;

        rows.iter()
            .map(|row| {
                Ok(PayoutWithTeacher {
                    payout: Self::row_to_payout(row)?,
                    teacher_name: row.get("teacher_name"),
                })
            })
            .collect()
    }

    /// Change a payout's amount. Returns false if no such payout.
    pub async fn update_payout_amount(&self, id: PayoutId, amount_cents: Cents) -> Result<bool> {
        let result = sqlx::query("UPDATE salary_payouts SET amount_cents = ? WHERE id = ?")
            .bind(amount_cents)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update payout amount")?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a payout. Returns false if no such payout.
    pub async fn delete_payout(&self, id: PayoutId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM salary_payouts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete payout")?;
        Ok(result.rows_affected() > 0)
    }

    // ========================
    // Aggregation operations
    // ========================

    /// Total of payment amounts dated inside the range, inclusive.
    pub async fn sum_payments_in_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Cents> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0) AS total
            FROM payments
            WHERE payment_date >= ? AND payment_date <= ?
            "#,
        )
        .bind(from.to_string())
        .bind(to.to_string())
        .fetch_one(&self.pool)
        .await
        .context("Failed to sum payments")?;

        let total: i64 = row.get("total");
        Ok(total)
    }

    /// Total shortfall of in-range payments against their group prices.
    /// Payments whose group was deleted contribute nothing.
    pub async fn sum_pending_in_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Cents> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(MAX(g.price_cents - p.amount_cents, 0)), 0) AS total
            FROM payments p
            JOIN groups g ON g.id = p.group_id
            WHERE p.payment_date >= ? AND p.payment_date <= ?
            "#,
        )
        .bind(from.to_string())
        .bind(to.to_string())
        .fetch_one(&self.pool)
        .await
        .context("Failed to sum pending amounts")?;

        let total: i64 = row.get("total");
        Ok(total)
    }

    /// Active students whose balance is below the threshold, most indebted
    /// first.
    pub async fn list_debtors(&self, threshold_cents: Cents) -> Result<Vec<DebtorRow>> {
        let rows = sqlx::query(
            r#"
            SELECT id, full_name, phone, balance_cents
            FROM people
            WHERE role = 'student' AND archived_at IS NULL AND balance_cents < ?
            ORDER BY balance_cents ASC
            "#,
        )
        .bind(threshold_cents)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list debtors")?;

        rows.iter()
            .map(|row| {
                let id_str: String = row.get("id");
                Ok(DebtorRow {
                    student_id: Uuid::parse_str(&id_str).context("Invalid person ID")?,
                    student_name: row.get("full_name"),
                    phone: row.get("phone"),
                    balance_cents: row.get("balance_cents"),
                })
            })
            .collect()
    }

    // ========================
    // Row mapping
    // ========================

    fn row_to_person(row: &sqlx::sqlite::SqliteRow) -> Result<Person> {
        let id_str: String = row.get("id");
        let role_str: String = row.get("role");
        let created_at_str: String = row.get("created_at");
        let archived_at_str: Option<String> = row.get("archived_at");

        Ok(Person {
            id: Uuid::parse_str(&id_str).context("Invalid person ID")?,
            full_name: row.get("full_name"),
            phone: row.get("phone"),
            role: Role::from_str(&role_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid role: {}", role_str))?,
            balance_cents: row.get("balance_cents"),
            salary_percentage: row
                .get::<Option<i64>, _>("salary_percentage")
                .map(|p| p as u8),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
            archived_at: archived_at_str
                .map(|s| DateTime::parse_from_rfc3339(&s))
                .transpose()
                .context("Invalid archived_at timestamp")?
                .map(|dt| dt.with_timezone(&Utc)),
        })
    }

    fn row_to_group(row: &sqlx::sqlite::SqliteRow) -> Result<Group> {
        let id_str: String = row.get("id");
        let schedule_days_str: String = row.get("schedule_days");
        let start_time_str: String = row.get("start_time");
        let teacher_id_str: String = row.get("teacher_id");
        let created_at_str: String = row.get("created_at");

        Ok(Group {
            id: Uuid::parse_str(&id_str).context("Invalid group ID")?,
            name: row.get("name"),
            price_cents: row.get("price_cents"),
            schedule_days: Group::split_schedule_days(&schedule_days_str),
            start_time: NaiveTime::parse_from_str(&start_time_str, "%H:%M")
                .context("Invalid start_time")?,
            teacher_id: Uuid::parse_str(&teacher_id_str).context("Invalid teacher ID")?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    fn row_to_payment(row: &sqlx::sqlite::SqliteRow) -> Result<Payment> {
        let id_str: String = row.get("id");
        let student_id_str: String = row.get("student_id");
        let group_id_str: Option<String> = row.get("group_id");
        let payment_date_str: String = row.get("payment_date");
        let recorded_at_str: String = row.get("recorded_at");

        Ok(Payment {
            id: Uuid::parse_str(&id_str).context("Invalid payment ID")?,
            student_id: Uuid::parse_str(&student_id_str).context("Invalid student ID")?,
            group_id: group_id_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid group ID")?,
            amount_cents: row.get("amount_cents"),
            payment_date: NaiveDate::parse_from_str(&payment_date_str, "%Y-%m-%d")
                .context("Invalid payment_date")?,
            recorded_at: DateTime::parse_from_rfc3339(&recorded_at_str)
                .context("Invalid recorded_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    fn row_to_attendance(row: &sqlx::sqlite::SqliteRow) -> Result<Attendance> {
        let id_str: String = row.get("id");
        let group_id_str: String = row.get("group_id");
        let student_id_str: String = row.get("student_id");
        let date_str: String = row.get("date");
        let recorded_at_str: String = row.get("recorded_at");

        Ok(Attendance {
            id: Uuid::parse_str(&id_str).context("Invalid attendance ID")?,
            group_id: Uuid::parse_str(&group_id_str).context("Invalid group ID")?,
            student_id: Uuid::parse_str(&student_id_str).context("Invalid student ID")?,
            date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").context("Invalid date")?,
            is_present: row.get::<i32, _>("is_present") != 0,
            recorded_at: DateTime::parse_from_rfc3339(&recorded_at_str)
                .context("Invalid recorded_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    fn row_to_payout(row: &sqlx::sqlite::SqliteRow) -> Result<SalaryPayout> {
        let id_str: String = row.get("id");
        let teacher_id_str: String = row.get("teacher_id");
        let for_month_str: String = row.get("for_month");
        let paid_at_str: String = row.get("paid_at");

        Ok(SalaryPayout {
            id: Uuid::parse_str(&id_str).context("Invalid payout ID")?,
            teacher_id: Uuid::parse_str(&teacher_id_str).context("Invalid teacher ID")?,
            for_month: for_month_str
                .parse::<Month>()
                .context("Invalid payout month")?,
            amount_cents: row.get("amount_cents"),
            paid_at: DateTime::parse_from_rfc3339(&paid_at_str)
                .context("Invalid paid_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}
