use anyhow::Result;
use std::io::Write;

use crate::application::{App, PaymentFilter};
use crate::domain::{Cents, Month, format_cents};

/// Exporter for turning center data into CSV reports
pub struct Exporter<'a> {
    app: &'a App,
}

impl<'a> Exporter<'a> {
    pub fn new(app: &'a App) -> Self {
        Self { app }
    }

    /// Export students below the balance threshold to CSV format
    pub async fn export_debtors_csv<W: Write>(
        &self,
        writer: W,
        threshold_cents: Cents,
    ) -> Result<usize> {
        let debtors = self.app.summary.debtors(threshold_cents).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record(["student", "phone", "balance"])?;

        let mut count = 0;
        for debtor in &debtors {
            csv_writer.write_record([
                debtor.student_name.clone(),
                debtor.phone.clone(),
                format_cents(debtor.balance_cents),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export filtered payments to CSV format
    pub async fn export_payments_csv<W: Write>(
        &self,
        writer: W,
        filter: PaymentFilter,
    ) -> Result<usize> {
        let payments = self.app.ledger.list(filter).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record([
            "id",
            "date",
            "student",
            "group",
            "amount",
            "debt",
        ])?;

        let mut count = 0;
        for entry in &payments {
            csv_writer.write_record([
                entry.payment.id.to_string(),
                entry.payment.payment_date.to_string(),
                entry.student_name.clone(),
                entry.group_name.clone().unwrap_or_default(),
                format_cents(entry.payment.amount_cents),
                format_cents(entry.debt_cents),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export salary payouts to CSV format
    pub async fn export_payouts_csv<W: Write>(
        &self,
        writer: W,
        month: Option<Month>,
    ) -> Result<usize> {
        let payouts = self.app.payroll.list_payouts(month).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record(["teacher", "month", "amount", "paid_at"])?;

        let mut count = 0;
        for entry in &payouts {
            csv_writer.write_record([
                entry.teacher_name.clone(),
                entry.payout.for_month.to_string(),
                format_cents(entry.payout.amount_cents),
                entry.payout.paid_at.to_rfc3339(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }
}
