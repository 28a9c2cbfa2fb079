mod common;

use anyhow::Result;
use common::{StandardRoster, parse_date, test_app};
use schola::application::AppError;
use schola::domain::{AttendanceMark, Role};

#[tokio::test]
async fn test_overview_totals() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let roster = StandardRoster::create(&app).await?;

    app.ledger
        .record(
            roster.student_a,
            roster.group_id,
            30_000_000,
            parse_date("2026-02-03"),
        )
        .await?;
    app.ledger
        .record(
            roster.student_b,
            roster.group_id,
            80_000_000,
            parse_date("2026-02-05"),
        )
        .await?;

    // One lesson attended by both students
    app.attendance
        .mark_bulk(
            roster.group_id,
            parse_date("2026-02-02"),
            vec![
                AttendanceMark {
                    student_id: roster.student_a,
                    is_present: true,
                },
                AttendanceMark {
                    student_id: roster.student_b,
                    is_present: true,
                },
            ],
        )
        .await?;

    let overview = app
        .summary
        .overview(parse_date("2026-02-01"), parse_date("2026-02-28"))
        .await?;

    assert_eq!(overview.total_income, 110_000_000);
    assert_eq!(
        overview.total_pending, 50_000_000,
        "Student A still owes 500000.00 against the group price"
    );

    // 2 attended lessons at 800000.00 / 12 per lesson, half to the teacher
    assert_eq!(overview.total_teacher_salaries, 6_666_667);
    assert_eq!(overview.net_profit, 110_000_000 - 6_666_667);

    Ok(())
}

#[tokio::test]
async fn test_overview_is_cached_per_range() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let roster = StandardRoster::create(&app).await?;

    app.ledger
        .record(
            roster.student_a,
            roster.group_id,
            30_000_000,
            parse_date("2026-02-03"),
        )
        .await?;

    let from = parse_date("2026-02-01");
    let to = parse_date("2026-02-28");

    let first = app.summary.overview(from, to).await?;
    assert_eq!(first.total_income, 30_000_000);
    let stats = app.cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 0);

    // Second call over the same range is served from cache
    let second = app.summary.overview(from, to).await?;
    assert_eq!(second.total_income, 30_000_000);
    let stats = app.cache.stats();
    assert_eq!(stats.hits, 1);

    // A payment recorded now is invisible until the entry expires
    app.ledger
        .record(
            roster.student_b,
            roster.group_id,
            80_000_000,
            parse_date("2026-02-05"),
        )
        .await?;
    let stale = app.summary.overview(from, to).await?;
    assert_eq!(stale.total_income, 30_000_000, "Cached totals stay fixed");

    // A different range is a fresh computation
    let fresh = app
        .summary
        .overview(from, parse_date("2026-02-27"))
        .await?;
    assert_eq!(fresh.total_income, 110_000_000);

    Ok(())
}

#[tokio::test]
async fn test_overview_rejects_inverted_range() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let result = app
        .summary
        .overview(parse_date("2026-02-28"), parse_date("2026-02-01"))
        .await;
    assert!(matches!(result, Err(AppError::InvalidDateRange { .. })));

    Ok(())
}

#[tokio::test]
async fn test_debtors_below_threshold() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let roster = StandardRoster::create(&app).await?;

    app.ledger
        .record(
            roster.student_a,
            roster.group_id,
            30_000_000,
            parse_date("2026-02-03"),
        )
        .await?;
    app.ledger
        .record(
            roster.student_b,
            roster.group_id,
            80_000_000,
            parse_date("2026-02-05"),
        )
        .await?;

    // An archived student never shows up, whatever their balance
    let dropout = app
        .roster
        .create_person(
            "Sardor Nazarov".into(),
            "+998936667788".into(),
            Role::Student,
            None,
        )
        .await?;
    app.roster.archive_person(dropout.id).await?;

    let none = app.summary.debtors(1_000).await?;
    assert!(none.is_empty(), "Everyone active is above the threshold");

    let below_fifty = app.summary.debtors(50_000_000).await?;
    assert_eq!(below_fifty.len(), 1);
    assert_eq!(below_fifty[0].student_name, "Aziz Toirov");
    assert_eq!(below_fifty[0].balance_cents, 30_000_000);

    // Lowest balance first
    let everyone = app.summary.debtors(100_000_001).await?;
    assert_eq!(everyone.len(), 2);
    assert_eq!(everyone[0].student_name, "Aziz Toirov");
    assert_eq!(everyone[1].student_name, "Malika Usmonova");

    Ok(())
}
