use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::reporting::SalaryBreakdown;
use crate::application::{App, AppError, PaymentFilter};
use crate::domain::{
    AttendanceMark, Month, Operation, Role, can_perform, format_cents, parse_cents,
    required_roles,
};

/// Schola - Education Center Back Office
#[derive(Parser)]
#[command(name = "schola")]
#[command(about = "A local-first back office for an education center: tuition, attendance and payroll")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "SCHOLA_DB", default_value = "schola.db")]
    pub database: String,

    /// Act as this role: admin, teacher, student
    #[arg(long = "as", value_name = "ROLE", global = true, default_value = "admin")]
    pub acting_role: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// People management commands
    #[command(subcommand)]
    Person(PersonCommands),

    /// Group management commands
    #[command(subcommand)]
    Group(GroupCommands),

    /// Tuition payment commands
    #[command(subcommand)]
    Payment(PaymentCommands),

    /// Attendance commands
    #[command(subcommand)]
    Attendance(AttendanceCommands),

    /// Salary and payout commands
    #[command(subcommand)]
    Salary(SalaryCommands),

    /// Financial reports
    #[command(subcommand)]
    Finance(FinanceCommands),

    /// Export data to CSV
    Export {
        /// What to export: debtors, payments, payouts
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Balance threshold for the debtors export (e.g., "100")
        #[arg(long, default_value = "0.01")]
        threshold: String,

        /// Month filter for the payouts export (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PersonCommands {
    /// Register a new person
    Create {
        /// Full name
        name: String,

        /// Contact phone number (must be unique)
        #[arg(long)]
        phone: String,

        /// Role: admin, teacher, student
        #[arg(short, long, default_value = "student")]
        role: String,

        /// Salary percentage for teachers (0-100)
        #[arg(short, long)]
        percentage: Option<u8>,
    },

    /// List people
    List {
        /// Filter by role: admin, teacher, student
        #[arg(long)]
        role: Option<String>,

        /// Include archived people
        #[arg(long)]
        all: bool,
    },

    /// Show a person's details
    Show {
        /// Person ID
        id: String,
    },

    /// Archive a person (soft delete)
    Archive {
        /// Person ID
        id: String,
    },

    /// Delete a person and their history
    Delete {
        /// Person ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// Open a new group
    Create {
        /// Group name
        name: String,

        /// Monthly price (e.g., "800000" or "800000.00")
        #[arg(short, long)]
        price: String,

        /// Lesson days, comma-separated (e.g., "monday,wednesday,friday")
        #[arg(short, long)]
        days: String,

        /// Lesson start time (HH:MM)
        #[arg(short, long)]
        time: String,

        /// Teacher ID
        #[arg(long)]
        teacher: String,
    },

    /// List groups
    List {
        /// Filter by teacher ID
        #[arg(long)]
        teacher: Option<String>,
    },

    /// Show a group's details
    Show {
        /// Group ID
        id: String,
    },

    /// List a group's enrolled students
    Students {
        /// Group ID
        id: String,
    },

    /// Change a group's monthly price
    SetPrice {
        /// Group ID
        id: String,

        /// New monthly price
        price: String,
    },

    /// Close a group (payments are kept as history)
    Delete {
        /// Group ID
        id: String,
    },

    /// Enroll a student into a group
    Enroll {
        /// Group ID
        group: String,

        /// Student ID
        student: String,
    },

    /// Remove a student from a group
    Unenroll {
        /// Group ID
        group: String,

        /// Student ID
        student: String,
    },
}

#[derive(Subcommand)]
pub enum PaymentCommands {
    /// Record a tuition payment
    Record {
        /// Amount paid (e.g., "300000" or "300000.00")
        amount: String,

        /// Paying student ID
        #[arg(long)]
        student: String,

        /// Group the payment is for
        #[arg(long)]
        group: String,

        /// Payment date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Change a payment's amount
    Amend {
        /// Payment ID
        id: String,

        /// New amount
        amount: String,
    },

    /// Remove a payment and roll back its balance effect
    Void {
        /// Payment ID
        id: String,
    },

    /// List payments
    List {
        /// Filter by student ID
        #[arg(long)]
        student: Option<String>,

        /// Filter by group ID
        #[arg(long)]
        group: Option<String>,

        /// Filter from date (YYYY-MM-DD)
        #[arg(long)]
        from_date: Option<String>,

        /// Filter to date (YYYY-MM-DD)
        #[arg(long)]
        to_date: Option<String>,

        /// Maximum number of payments to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show a payment's receipt
    Receipt {
        /// Payment ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum AttendanceCommands {
    /// Roll call for a group on a date
    Sheet {
        /// Group ID
        group: String,

        /// Lesson date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Record a whole day's roll call at once
    Mark {
        /// Group ID
        group: String,

        /// Lesson date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Present student IDs, comma-separated
        #[arg(long)]
        present: Option<String>,

        /// Absent student IDs, comma-separated
        #[arg(long)]
        absent: Option<String>,
    },

    /// Set one student's presence for a date
    Set {
        /// Group ID
        group: String,

        /// Student ID
        student: String,

        /// Lesson date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Mark absent instead of present
        #[arg(long)]
        absent: bool,
    },

    /// Month-by-lesson attendance matrix
    Pivot {
        /// Group ID
        group: String,

        /// Month (YYYY-MM)
        month: String,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum SalaryCommands {
    /// Calculate a teacher's salary for a month
    Calculate {
        /// Teacher ID
        teacher: String,

        /// Month (YYYY-MM)
        month: String,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Estimate salaries for all teachers
    EstimateAll {
        /// Month (YYYY-MM)
        month: String,
    },

    /// Record a salary payout
    Pay {
        /// Teacher ID
        teacher: String,

        /// Month being paid (YYYY-MM)
        month: String,

        /// Amount to pay out
        amount: String,
    },

    /// List payouts
    Payouts {
        /// Filter by month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },

    /// Show a payout's details
    Show {
        /// Payout ID
        id: String,
    },

    /// Change a payout's amount
    Update {
        /// Payout ID
        id: String,

        /// New amount
        amount: String,
    },

    /// Delete a payout, reopening the month
    Delete {
        /// Payout ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum FinanceCommands {
    /// Income, pending tuition and salary overview
    Overview {
        /// Start date (YYYY-MM-DD, defaults to start of current month)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        to: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Students with balances below a threshold
    Debtors {
        /// Balance threshold (e.g., "100")
        #[arg(long, default_value = "0.01")]
        threshold: String,
    },
}

impl Commands {
    /// The operation a command maps to for permission checks.
    fn operation(&self) -> Option<Operation> {
        match self {
            Commands::Init => None,
            Commands::Person(cmd) => Some(match cmd {
                PersonCommands::Create { .. }
                | PersonCommands::Archive { .. }
                | PersonCommands::Delete { .. } => Operation::ManageRoster,
                PersonCommands::List { .. } | PersonCommands::Show { .. } => Operation::ViewRoster,
            }),
            Commands::Group(cmd) => Some(match cmd {
                GroupCommands::Create { .. }
                | GroupCommands::SetPrice { .. }
                | GroupCommands::Delete { .. }
                | GroupCommands::Enroll { .. }
                | GroupCommands::Unenroll { .. } => Operation::ManageRoster,
                GroupCommands::List { .. }
                | GroupCommands::Show { .. }
                | GroupCommands::Students { .. } => Operation::ViewRoster,
            }),
            Commands::Payment(cmd) => Some(match cmd {
                PaymentCommands::Record { .. } => Operation::RecordPayment,
                PaymentCommands::Amend { .. } => Operation::AmendPayment,
                PaymentCommands::Void { .. } => Operation::VoidPayment,
                PaymentCommands::List { .. } => Operation::ListPayments,
                PaymentCommands::Receipt { .. } => Operation::ViewReceipt,
            }),
            Commands::Attendance(cmd) => Some(match cmd {
                AttendanceCommands::Sheet { .. } => Operation::ViewAttendanceSheet,
                AttendanceCommands::Mark { .. } | AttendanceCommands::Set { .. } => {
                    Operation::MarkAttendance
                }
                AttendanceCommands::Pivot { .. } => Operation::ViewMonthlyPivot,
            }),
            Commands::Salary(cmd) => Some(match cmd {
                SalaryCommands::Calculate { .. } => Operation::CalculateSalary,
                SalaryCommands::EstimateAll { .. } => Operation::EstimateSalaries,
                SalaryCommands::Pay { .. } => Operation::PaySalary,
                SalaryCommands::Payouts { .. } => Operation::ListPayouts,
                SalaryCommands::Show { .. }
                | SalaryCommands::Update { .. }
                | SalaryCommands::Delete { .. } => Operation::ManagePayouts,
            }),
            Commands::Finance(cmd) => Some(match cmd {
                FinanceCommands::Overview { .. } | FinanceCommands::Debtors { .. } => {
                    Operation::ViewFinancialOverview
                }
            }),
            Commands::Export { .. } => Some(Operation::ExportReports),
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        // Authorize before touching the database
        if let Some(operation) = self.command.operation() {
            let actor = Role::from_str(&self.acting_role).ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid role '{}'. Valid roles: admin, teacher, student",
                    self.acting_role
                )
            })?;
            if !can_perform(actor, required_roles(operation)) {
                return Err(AppError::PermissionDenied {
                    operation: operation.to_string(),
                    actor,
                }
                .into());
            }
        }

        match self.command {
            Commands::Init => {
                App::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Person(person_cmd) => {
                let app = App::connect(&self.database).await?;
                run_person_command(&app, person_cmd).await?;
            }

            Commands::Group(group_cmd) => {
                let app = App::connect(&self.database).await?;
                run_group_command(&app, group_cmd).await?;
            }

            Commands::Payment(payment_cmd) => {
                let app = App::connect(&self.database).await?;
                run_payment_command(&app, payment_cmd).await?;
            }

            Commands::Attendance(attendance_cmd) => {
                let app = App::connect(&self.database).await?;
                run_attendance_command(&app, attendance_cmd).await?;
            }

            Commands::Salary(salary_cmd) => {
                let app = App::connect(&self.database).await?;
                run_salary_command(&app, salary_cmd).await?;
            }

            Commands::Finance(finance_cmd) => {
                let app = App::connect(&self.database).await?;
                run_finance_command(&app, finance_cmd).await?;
            }

            Commands::Export {
                export_type,
                output,
                threshold,
                month,
            } => {
                let app = App::connect(&self.database).await?;
                run_export_command(
                    &app,
                    &export_type,
                    output.as_deref(),
                    &threshold,
                    month.as_deref(),
                )
                .await?;
            }
        }

        Ok(())
    }
}

/// Route log output to stderr so tables on stdout stay clean.
pub fn init_logging(verbose: bool) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, fmt};

    let default_filter = if verbose { "schola=debug,info" } else { "warn" };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

async fn run_person_command(app: &App, cmd: PersonCommands) -> Result<()> {
    match cmd {
        PersonCommands::Create {
            name,
            phone,
            role,
            percentage,
        } => {
            let role = Role::from_str(&role).ok_or_else(|| {
                anyhow::anyhow!("Invalid role '{}'. Valid roles: admin, teacher, student", role)
            })?;

            let person = app
                .roster
                .create_person(name, phone, role, percentage)
                .await?;
            println!("Registered {}: {} ({})", person.role, person.full_name, person.id);
        }

        PersonCommands::List { role, all } => {
            let role_filter = role
                .map(|r| {
                    Role::from_str(&r).ok_or_else(|| {
                        anyhow::anyhow!("Invalid role '{}'. Valid roles: admin, teacher, student", r)
                    })
                })
                .transpose()?;

            let people = app.roster.list_people(role_filter, all).await?;
            if people.is_empty() {
                println!("No people found.");
            } else {
                println!(
                    "{:<25} {:<9} {:<16} {:>12}",
                    "NAME", "ROLE", "PHONE", "BALANCE"
                );
                println!("{}", "-".repeat(64));
                for person in people {
                    println!(
                        "{:<25} {:<9} {:<16} {:>12}",
                        truncate(&person.full_name, 25),
                        person.role,
                        truncate(&person.phone, 16),
                        format_cents(person.balance_cents)
                    );
                }
            }
        }

        PersonCommands::Show { id } => {
            let person = app.roster.get_person(parse_id(&id)?).await?;

            println!("Person: {}", person.full_name);
            println!("  ID:          {}", person.id);
            println!("  Role:        {}", person.role);
            println!("  Phone:       {}", person.phone);
            println!("  Balance:     {}", format_cents(person.balance_cents));
            if let Some(percentage) = person.salary_percentage {
                println!("  Percentage:  {}%", percentage);
            }
            println!(
                "  Created:     {}",
                person.created_at.format("%Y-%m-%d %H:%M:%S")
            );
            if let Some(archived) = person.archived_at {
                println!("  Archived:    {}", archived.format("%Y-%m-%d %H:%M:%S"));
            }
        }

        PersonCommands::Archive { id } => {
            let person_id = parse_id(&id)?;
            app.roster.archive_person(person_id).await?;
            println!("Archived person: {}", person_id);
        }

        PersonCommands::Delete { id } => {
            let person_id = parse_id(&id)?;
            app.roster.delete_person(person_id).await?;
            println!("Deleted person: {}", person_id);
        }
    }
    Ok(())
}

async fn run_group_command(app: &App, cmd: GroupCommands) -> Result<()> {
    match cmd {
        GroupCommands::Create {
            name,
            price,
            days,
            time,
            teacher,
        } => {
            let price_cents =
                parse_cents(&price).context("Invalid price format. Use '800000' or '800000.00'")?;
            let schedule_days: Vec<String> = days
                .split(',')
                .map(|day| day.trim().to_string())
                .filter(|day| !day.is_empty())
                .collect();
            let start_time = parse_time(&time)?;
            let teacher_id = parse_id(&teacher)?;

            let group = app
                .roster
                .create_group(name, price_cents, schedule_days, start_time, teacher_id)
                .await?;
            println!("Opened group: {} ({})", group.name, group.id);
        }

        GroupCommands::List { teacher } => {
            let teacher_filter = teacher.as_deref().map(parse_id).transpose()?;
            let groups = app.roster.list_groups(teacher_filter).await?;

            if groups.is_empty() {
                println!("No groups found.");
            } else {
                println!(
                    "{:<20} {:>12} {:<28} {:<6}",
                    "NAME", "PRICE", "DAYS", "TIME"
                );
                println!("{}", "-".repeat(68));
                for group in groups {
                    println!(
                        "{:<20} {:>12} {:<28} {:<6}",
                        truncate(&group.name, 20),
                        format_cents(group.price_cents),
                        truncate(&group.schedule_days_joined(), 28),
                        group.start_time.format("%H:%M")
                    );
                }
            }
        }

        GroupCommands::Show { id } => {
            let group = app.roster.get_group(parse_id(&id)?).await?;
            let teacher = app.roster.get_person(group.teacher_id).await?;
            let students = app.roster.list_students(group.id).await?;

            println!("Group: {}", group.name);
            println!("  ID:        {}", group.id);
            println!("  Price:     {}", format_cents(group.price_cents));
            println!(
                "  Schedule:  {} at {}",
                group.schedule_days_joined(),
                group.start_time.format("%H:%M")
            );
            println!("  Teacher:   {} ({})", teacher.full_name, teacher.id);
            println!("  Students:  {} enrolled", students.len());
            println!(
                "  Created:   {}",
                group.created_at.format("%Y-%m-%d %H:%M:%S")
            );
        }

        GroupCommands::Students { id } => {
            let group_id = parse_id(&id)?;
            let students = app.roster.list_students(group_id).await?;

            if students.is_empty() {
                println!("No students enrolled.");
            } else {
                println!("{:<25} {:<16} {:>12}", "NAME", "PHONE", "BALANCE");
                println!("{}", "-".repeat(55));
                for student in students {
                    println!(
                        "{:<25} {:<16} {:>12}",
                        truncate(&student.full_name, 25),
                        truncate(&student.phone, 16),
                        format_cents(student.balance_cents)
                    );
                }
            }
        }

        GroupCommands::SetPrice { id, price } => {
            let group_id = parse_id(&id)?;
            let price_cents =
                parse_cents(&price).context("Invalid price format. Use '800000' or '800000.00'")?;
            app.roster.update_group_price(group_id, price_cents).await?;
            println!("Updated price: {} -> {}", group_id, format_cents(price_cents));
        }

        GroupCommands::Delete { id } => {
            let group_id = parse_id(&id)?;
            app.roster.delete_group(group_id).await?;
            println!("Closed group: {}", group_id);
        }

        GroupCommands::Enroll { group, student } => {
            let group_id = parse_id(&group)?;
            let student_id = parse_id(&student)?;
            app.roster.enroll(group_id, student_id).await?;
            println!("Enrolled student {} into group {}", student_id, group_id);
        }

        GroupCommands::Unenroll { group, student } => {
            let group_id = parse_id(&group)?;
            let student_id = parse_id(&student)?;
            app.roster.unenroll(group_id, student_id).await?;
            println!("Removed student {} from group {}", student_id, group_id);
        }
    }
    Ok(())
}

async fn run_payment_command(app: &App, cmd: PaymentCommands) -> Result<()> {
    match cmd {
        PaymentCommands::Record {
            amount,
            student,
            group,
            date,
        } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '300000' or '300000.00'")?;
            let student_id = parse_id(&student)?;
            let group_id = parse_id(&group)?;
            let payment_date = match date {
                Some(date_str) => parse_date(&date_str)?,
                None => Utc::now().date_naive(),
            };

            let payment = app
                .ledger
                .record(student_id, group_id, amount_cents, payment_date)
                .await?;
            println!(
                "Recorded payment: {} ({})",
                format_cents(payment.amount_cents),
                payment.id
            );
            println!("Receipt: {}", payment.receipt_number());
        }

        PaymentCommands::Amend { id, amount } => {
            let payment_id = parse_id(&id)?;
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '300000' or '300000.00'")?;

            let payment = app.ledger.amend(payment_id, amount_cents).await?;
            println!(
                "Amended payment {}: now {}",
                payment.id,
                format_cents(payment.amount_cents)
            );
        }

        PaymentCommands::Void { id } => {
            let payment = app.ledger.void(parse_id(&id)?).await?;
            println!(
                "Voided payment {}: {} returned to the books",
                payment.id,
                format_cents(payment.amount_cents)
            );
        }

        PaymentCommands::List {
            student,
            group,
            from_date,
            to_date,
            limit,
        } => {
            let filter = PaymentFilter {
                student_id: student.as_deref().map(parse_id).transpose()?,
                group_id: group.as_deref().map(parse_id).transpose()?,
                from_date: from_date.as_deref().map(parse_date).transpose()?,
                to_date: to_date.as_deref().map(parse_date).transpose()?,
                limit,
            };

            let payments = app.ledger.list(filter).await?;
            if payments.is_empty() {
                println!("No payments found.");
            } else {
                println!(
                    "{:<12} {:<20} {:<16} {:>12} {:>12}",
                    "DATE", "STUDENT", "GROUP", "AMOUNT", "DEBT"
                );
                println!("{}", "-".repeat(76));
                for entry in payments {
                    println!(
                        "{:<12} {:<20} {:<16} {:>12} {:>12}",
                        entry.payment.payment_date,
                        truncate(&entry.student_name, 20),
                        truncate(entry.group_name.as_deref().unwrap_or("-"), 16),
                        format_cents(entry.payment.amount_cents),
                        format_cents(entry.debt_cents)
                    );
                }
            }
        }

        PaymentCommands::Receipt { id } => {
            let receipt = app.ledger.receipt(parse_id(&id)?).await?;

            println!("Receipt #{}", receipt.receipt_number);
            println!("  Payment:  {}", receipt.payment_id);
            println!("  Date:     {}", receipt.payment_date);
            println!("  Student:  {}", receipt.student_name);
            if let Some(group_name) = &receipt.group_name {
                println!("  Group:    {}", group_name);
            }
            println!("  Amount:   {}", format_cents(receipt.amount_cents));
            if let Some(price) = receipt.price_cents {
                println!("  Price:    {}", format_cents(price));
            }
            if receipt.debt_cents > 0 {
                println!("  Debt:     {}", format_cents(receipt.debt_cents));
            }
            if receipt.overpaid_cents > 0 {
                println!("  Overpaid: {}", format_cents(receipt.overpaid_cents));
            }
        }
    }
    Ok(())
}

async fn run_attendance_command(app: &App, cmd: AttendanceCommands) -> Result<()> {
    match cmd {
        AttendanceCommands::Sheet { group, date } => {
            let group_id = parse_id(&group)?;
            let date = match date {
                Some(date_str) => parse_date(&date_str)?,
                None => Utc::now().date_naive(),
            };

            let sheet = app.attendance.sheet(group_id, date).await?;
            println!("Attendance: {} on {}", sheet.group_name, sheet.date);
            println!(
                "Students: {} (paid up: {})",
                sheet.total_students, sheet.paid_students_count
            );

            if !sheet.entries.is_empty() {
                println!();
                println!("{:<25} {:>12} {:>8}", "STUDENT", "BALANCE", "PRESENT");
                println!("{}", "-".repeat(47));
                for entry in &sheet.entries {
                    println!(
                        "{:<25} {:>12} {:>8}",
                        truncate(&entry.student_name, 25),
                        format_cents(entry.balance_cents),
                        if entry.is_present { "yes" } else { "no" }
                    );
                }
            }
        }

        AttendanceCommands::Mark {
            group,
            date,
            present,
            absent,
        } => {
            let group_id = parse_id(&group)?;
            let date = match date {
                Some(date_str) => parse_date(&date_str)?,
                None => Utc::now().date_naive(),
            };

            let mut marks = Vec::new();
            if let Some(raw) = present {
                for student_id in parse_id_list(&raw)? {
                    marks.push(AttendanceMark {
                        student_id,
                        is_present: true,
                    });
                }
            }
            if let Some(raw) = absent {
                for student_id in parse_id_list(&raw)? {
                    marks.push(AttendanceMark {
                        student_id,
                        is_present: false,
                    });
                }
            }
            if marks.is_empty() {
                anyhow::bail!("Nothing to record. Pass --present and/or --absent student IDs");
            }

            let count = app.attendance.mark_bulk(group_id, date, marks).await?;
            println!("Recorded attendance for {} student(s) on {}", count, date);
        }

        AttendanceCommands::Set {
            group,
            student,
            date,
            absent,
        } => {
            let group_id = parse_id(&group)?;
            let student_id = parse_id(&student)?;
            let date = match date {
                Some(date_str) => parse_date(&date_str)?,
                None => Utc::now().date_naive(),
            };

            let record = app
                .attendance
                .update_single(group_id, date, student_id, !absent)
                .await?;
            println!(
                "Marked student {} {} on {}",
                record.student_id,
                if record.is_present { "present" } else { "absent" },
                record.date
            );
        }

        AttendanceCommands::Pivot {
            group,
            month,
            format,
        } => {
            let group_id = parse_id(&group)?;
            let month = parse_month(&month)?;
            let pivot = app.attendance.monthly_pivot(group_id, month).await?;

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&pivot)?);
                }
                _ => {
                    // Table format
                    println!("Attendance: {} in {}", pivot.group_name, pivot.month);

                    if pivot.columns.is_empty() {
                        println!("No attendance recorded this month.");
                        return Ok(());
                    }

                    println!();
                    print!("{:<25}", "STUDENT");
                    for column in &pivot.columns {
                        print!("{:>18}", column);
                    }
                    println!("{:>7}", "TOTAL");
                    println!("{}", "-".repeat(32 + pivot.columns.len() * 18));

                    for row in &pivot.rows {
                        print!("{:<25}", truncate(&row.student_name, 25));
                        for column in &pivot.columns {
                            let symbol = match row.cells.get(column) {
                                Some(Some(true)) => "1",
                                Some(Some(false)) => "0",
                                _ => "-",
                            };
                            print!("{:>18}", symbol);
                        }
                        println!("{:>7}", row.total_present);
                    }
                }
            }
        }
    }
    Ok(())
}

async fn run_salary_command(app: &App, cmd: SalaryCommands) -> Result<()> {
    match cmd {
        SalaryCommands::Calculate {
            teacher,
            month,
            format,
        } => {
            let teacher_id = parse_id(&teacher)?;
            let month = parse_month(&month)?;
            let breakdown = app.payroll.calculate_salary(teacher_id, month).await?;

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&breakdown)?);
                }
                _ => print_salary_breakdown(&breakdown),
            }
        }

        SalaryCommands::EstimateAll { month } => {
            let month = parse_month(&month)?;
            let estimates = app.payroll.estimate_all(month).await?;

            if estimates.is_empty() {
                println!("No teachers found.");
            } else {
                println!("{:<25} {:<8} {:>14}", "TEACHER", "MONTH", "SALARY");
                println!("{}", "-".repeat(49));
                for estimate in estimates {
                    println!(
                        "{:<25} {:<8} {:>14}",
                        truncate(&estimate.teacher_name, 25),
                        estimate.month,
                        format_cents(estimate.total_salary)
                    );
                }
            }
        }

        SalaryCommands::Pay {
            teacher,
            month,
            amount,
        } => {
            let teacher_id = parse_id(&teacher)?;
            let month = parse_month(&month)?;
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '400000' or '400000.00'")?;

            let payout = app.payroll.payout(teacher_id, month, amount_cents).await?;
            println!(
                "Paid salary for {}: {} ({})",
                payout.for_month,
                format_cents(payout.amount_cents),
                payout.id
            );
        }

        SalaryCommands::Payouts { month } => {
            let month_filter = month.as_deref().map(parse_month).transpose()?;
            let payouts = app.payroll.list_payouts(month_filter).await?;

            if payouts.is_empty() {
                println!("No payouts found.");
            } else {
                println!(
                    "{:<25} {:<8} {:>14} {:<17}",
                    "TEACHER", "MONTH", "AMOUNT", "PAID"
                );
                println!("{}", "-".repeat(67));
                for entry in payouts {
                    println!(
                        "{:<25} {:<8} {:>14} {:<17}",
                        truncate(&entry.teacher_name, 25),
                        entry.payout.for_month,
                        format_cents(entry.payout.amount_cents),
                        entry.payout.paid_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }

        SalaryCommands::Show { id } => {
            let payout = app.payroll.get_payout(parse_id(&id)?).await?;

            println!("Payout: {}", payout.id);
            println!("  Teacher: {}", payout.teacher_id);
            println!("  Month:   {}", payout.for_month);
            println!("  Amount:  {}", format_cents(payout.amount_cents));
            println!("  Paid:    {}", payout.paid_at.format("%Y-%m-%d %H:%M:%S"));
        }

        SalaryCommands::Update { id, amount } => {
            let payout_id = parse_id(&id)?;
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '400000' or '400000.00'")?;

            let payout = app
                .payroll
                .update_payout_amount(payout_id, amount_cents)
                .await?;
            println!(
                "Updated payout {}: now {}",
                payout.id,
                format_cents(payout.amount_cents)
            );
        }

        SalaryCommands::Delete { id } => {
            let payout_id = parse_id(&id)?;
            app.payroll.delete_payout(payout_id).await?;
            println!("Deleted payout: {}", payout_id);
        }
    }
    Ok(())
}

fn print_salary_breakdown(breakdown: &SalaryBreakdown) {
    println!(
        "Salary: {} for {} ({}%)",
        breakdown.teacher_name, breakdown.month, breakdown.salary_percentage
    );

    if breakdown.details.is_empty() {
        println!("No groups with a usable schedule this month.");
        return;
    }

    println!();
    println!(
        "{:<20} {:>8} {:>9} {:>13} {:>14}",
        "GROUP", "LESSONS", "ATTENDED", "RATE", "EARNED"
    );
    println!("{}", "-".repeat(67));
    for detail in &breakdown.details {
        println!(
            "{:<20} {:>8} {:>9} {:>13.2} {:>14}",
            truncate(&detail.group_name, 20),
            detail.lesson_days,
            detail.attended_count,
            detail.per_lesson_rate / 100.0,
            format_cents(detail.earned)
        );
    }
    println!("{}", "-".repeat(67));
    println!("{:<20} {:>53}", "TOTAL", format_cents(breakdown.total_salary));
}

async fn run_finance_command(app: &App, cmd: FinanceCommands) -> Result<()> {
    match cmd {
        FinanceCommands::Overview { from, to, format } => {
            let (from_date, to_date) = parse_date_range(from, to)?;
            let overview = app.summary.overview(from_date, to_date).await?;

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&overview)?);
                }
                _ => {
                    // Table format
                    println!("Financial Overview");
                    println!("Period: {} to {}", overview.start_date, overview.end_date);
                    println!();
                    println!("Income:     {:>15}", format_cents(overview.total_income));
                    println!("Pending:    {:>15}", format_cents(overview.total_pending));
                    println!(
                        "Salaries:   {:>15}",
                        format_cents(overview.total_teacher_salaries)
                    );
                    println!("{}", "-".repeat(28));
                    println!("Net profit: {:>15}", format_cents(overview.net_profit));
                }
            }
        }

        FinanceCommands::Debtors { threshold } => {
            let threshold_cents =
                parse_cents(&threshold).context("Invalid threshold format. Use '100' or '100.00'")?;
            let debtors = app.summary.debtors(threshold_cents).await?;

            if debtors.is_empty() {
                println!("No debtors below {}.", format_cents(threshold_cents));
            } else {
                println!("{:<25} {:<16} {:>12}", "STUDENT", "PHONE", "BALANCE");
                println!("{}", "-".repeat(55));
                for debtor in debtors {
                    println!(
                        "{:<25} {:<16} {:>12}",
                        truncate(&debtor.student_name, 25),
                        truncate(&debtor.phone, 16),
                        format_cents(debtor.balance_cents)
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_export_command(
    app: &App,
    export_type: &str,
    output: Option<&str>,
    threshold: &str,
    month: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(app);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "debtors" => {
            let threshold_cents = parse_cents(threshold)
                .context("Invalid threshold format. Use '100' or '100.00'")?;
            let count = exporter.export_debtors_csv(writer, threshold_cents).await?;
            if output.is_some() {
                eprintln!("Exported {} debtors", count);
            }
        }
        "payments" => {
            let filter = PaymentFilter {
                student_id: None,
                group_id: None,
                from_date: None,
                to_date: None,
                limit: None,
            };
            let count = exporter.export_payments_csv(writer, filter).await?;
            if output.is_some() {
                eprintln!("Exported {} payments", count);
            }
        }
        "payouts" => {
            let month_filter = month.map(parse_month).transpose()?;
            let count = exporter.export_payouts_csv(writer, month_filter).await?;
            if output.is_some() {
                eprintln!("Exported {} payouts", count);
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: debtors, payments, payouts",
                export_type
            );
        }
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}

fn parse_id(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).context("Invalid ID format (expected UUID)")
}

fn parse_id_list(raw: &str) -> Result<Vec<Uuid>> {
    raw.split(',')
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .map(|part| {
            Uuid::parse_str(part).with_context(|| format!("Invalid ID '{}' (expected UUID)", part))
        })
        .collect()
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").context("Date must be in YYYY-MM-DD format")
}

fn parse_time(time_str: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(time_str, "%H:%M").context("Time must be in HH:MM format")
}

fn parse_month(month_str: &str) -> Result<Month> {
    month_str
        .parse::<Month>()
        .with_context(|| format!("Invalid month '{}'. Use YYYY-MM", month_str))
}

fn parse_date_range(from: Option<String>, to: Option<String>) -> Result<(NaiveDate, NaiveDate)> {
    let today = Utc::now().date_naive();

    // Default to_date is today
    let to_date = match to {
        Some(date_str) => parse_date(&date_str)?,
        None => today,
    };

    // Default from_date is start of current month
    let from_date = match from {
        Some(date_str) => parse_date(&date_str)?,
        None => today.with_day(1).unwrap(),
    };

    Ok((from_date, to_date))
}
