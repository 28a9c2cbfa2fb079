mod common;

use anyhow::Result;
use common::{StandardRoster, parse_date, parse_month, test_app};
use schola::application::{App, AppError};
use schola::domain::{AttendanceMark, PersonId, Role};
use uuid::Uuid;

/// Mon/Wed/Fri lesson dates of February 2026.
const FEBRUARY_LESSONS: [&str; 12] = [
    "2026-02-02",
    "2026-02-04",
    "2026-02-06",
    "2026-02-09",
    "2026-02-11",
    "2026-02-13",
    "2026-02-16",
    "2026-02-18",
    "2026-02-20",
    "2026-02-23",
    "2026-02-25",
    "2026-02-27",
];

/// Mark every given student present on every February lesson date.
async fn mark_all_present(app: &App, roster: &StandardRoster, students: &[PersonId]) -> Result<()> {
    for date_str in FEBRUARY_LESSONS {
        let marks = students
            .iter()
            .map(|&student_id| AttendanceMark {
                student_id,
                is_present: true,
            })
            .collect();
        app.attendance
            .mark_bulk(roster.group_id, parse_date(date_str), marks)
            .await?;
    }
    Ok(())
}

#[tokio::test]
async fn test_salary_from_attendance() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let roster = StandardRoster::create(&app).await?;

    // Two more students to fill the group to four
    let student_c = app
        .roster
        .create_person(
            "Jasur Olimov".into(),
            "+998933334455".into(),
            Role::Student,
            None,
        )
        .await?;
    let student_d = app
        .roster
        .create_person(
            "Dilnoza Akbarova".into(),
            "+998935556677".into(),
            Role::Student,
            None,
        )
        .await?;
    app.roster.enroll(roster.group_id, student_c.id).await?;
    app.roster.enroll(roster.group_id, student_d.id).await?;

    // Full house on all 12 lessons, then three absences
    let students = [roster.student_a, roster.student_b, student_c.id, student_d.id];
    mark_all_present(&app, &roster, &students).await?;
    app.attendance
        .update_single(
            roster.group_id,
            parse_date("2026-02-02"),
            roster.student_a,
            false,
        )
        .await?;
    app.attendance
        .update_single(
            roster.group_id,
            parse_date("2026-02-09"),
            roster.student_b,
            false,
        )
        .await?;
    app.attendance
        .update_single(
            roster.group_id,
            parse_date("2026-02-20"),
            student_c.id,
            false,
        )
        .await?;

    let breakdown = app
        .payroll
        .calculate_salary(roster.teacher_id, parse_month("2026-02"))
        .await?;

    assert_eq!(breakdown.teacher_name, "Nodira Karimova");
    assert_eq!(breakdown.salary_percentage, 50);
    assert_eq!(breakdown.details.len(), 1);

    let detail = &breakdown.details[0];
    assert_eq!(detail.group_name, "English B2");
    assert_eq!(detail.lesson_days, 12, "Feb 2026 has 12 Mon/Wed/Fri dates");
    assert_eq!(detail.attended_count, 45, "48 marks minus 3 absences");

    // 45 attended at 800000.00 / 12 per lesson, teacher keeps half
    assert_eq!(detail.earned, 150_000_000);
    assert_eq!(breakdown.total_salary, 150_000_000);

    Ok(())
}

#[tokio::test]
async fn test_salary_needs_a_percentage() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let teacher = app
        .roster
        .create_person(
            "Bobur Rashidov".into(),
            "+998909998877".into(),
            Role::Teacher,
            None,
        )
        .await?;

    let result = app
        .payroll
        .calculate_salary(teacher.id, parse_month("2026-02"))
        .await;
    assert!(matches!(result, Err(AppError::MissingSalaryPercentage(_))));

    Ok(())
}

#[tokio::test]
async fn test_salary_only_for_teachers() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let roster = StandardRoster::create(&app).await?;

    let result = app
        .payroll
        .calculate_salary(roster.student_a, parse_month("2026-02"))
        .await;
    assert!(matches!(result, Err(AppError::TeacherNotFound(_))));

    let result = app
        .payroll
        .calculate_salary(Uuid::new_v4(), parse_month("2026-02"))
        .await;
    assert!(matches!(result, Err(AppError::TeacherNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_one_payout_per_teacher_and_month() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let roster = StandardRoster::create(&app).await?;

    let payout = app
        .payroll
        .payout(roster.teacher_id, parse_month("2026-02"), 150_000_000)
        .await?;
    assert_eq!(payout.amount_cents, 150_000_000);

    // Same month again is refused
    let result = app
        .payroll
        .payout(roster.teacher_id, parse_month("2026-02"), 1_000_000)
        .await;
    assert!(matches!(result, Err(AppError::PayoutAlreadyExists { .. })));

    // The next month is open
    app.payroll
        .payout(roster.teacher_id, parse_month("2026-03"), 140_000_000)
        .await?;

    let all = app.payroll.list_payouts(None).await?;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].teacher_name, "Nodira Karimova");

    let february_only = app
        .payroll
        .list_payouts(Some(parse_month("2026-02")))
        .await?;
    assert_eq!(february_only.len(), 1);
    assert_eq!(february_only[0].payout.amount_cents, 150_000_000);

    Ok(())
}

#[tokio::test]
async fn test_negative_payout_rejected() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let roster = StandardRoster::create(&app).await?;

    let result = app
        .payroll
        .payout(roster.teacher_id, parse_month("2026-02"), -1)
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    Ok(())
}

#[tokio::test]
async fn test_update_and_delete_payout() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let roster = StandardRoster::create(&app).await?;
    let month = parse_month("2026-02");

    let payout = app
        .payroll
        .payout(roster.teacher_id, month, 150_000_000)
        .await?;

    let updated = app
        .payroll
        .update_payout_amount(payout.id, 160_000_000)
        .await?;
    assert_eq!(updated.amount_cents, 160_000_000);

    let fetched = app.payroll.get_payout(payout.id).await?;
    assert_eq!(fetched.amount_cents, 160_000_000);

    // Deleting reopens the month
    app.payroll.delete_payout(payout.id).await?;
    let result = app.payroll.get_payout(payout.id).await;
    assert!(matches!(result, Err(AppError::PayoutNotFound(_))));

    app.payroll
        .payout(roster.teacher_id, month, 150_000_000)
        .await?;

    Ok(())
}

#[tokio::test]
async fn test_estimate_all_falls_back_to_zero() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let roster = StandardRoster::create(&app).await?;

    // A second teacher with no percentage configured
    app.roster
        .create_person(
            "Bobur Rashidov".into(),
            "+998909998877".into(),
            Role::Teacher,
            None,
        )
        .await?;

    // One attended lesson for the configured teacher
    app.attendance
        .mark_bulk(
            roster.group_id,
            parse_date("2026-02-02"),
            vec![AttendanceMark {
                student_id: roster.student_a,
                is_present: true,
            }],
        )
        .await?;

    let estimates = app.payroll.estimate_all(parse_month("2026-02")).await?;
    assert_eq!(estimates.len(), 2);

    // Teachers come back in name order
    assert_eq!(estimates[0].teacher_name, "Bobur Rashidov");
    assert_eq!(estimates[0].total_salary, 0, "Unconfigured teacher reports zero");
    assert_eq!(estimates[1].teacher_name, "Nodira Karimova");
    assert!(estimates[1].total_salary > 0);

    Ok(())
}
