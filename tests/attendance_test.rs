mod common;

use anyhow::Result;
use common::{StandardRoster, parse_date, parse_month, test_app};
use schola::application::AppError;
use schola::domain::AttendanceMark;
use uuid::Uuid;

#[tokio::test]
async fn test_sheet_assumes_unmarked_students_present() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let roster = StandardRoster::create(&app).await?;

    // Only student B has paid anything
    app.ledger
        .record(
            roster.student_b,
            roster.group_id,
            80_000_000,
            parse_date("2026-02-02"),
        )
        .await?;

    let sheet = app
        .attendance
        .sheet(roster.group_id, parse_date("2026-02-02"))
        .await?;

    assert_eq!(sheet.group_name, "English B2");
    assert_eq!(sheet.total_students, 2);
    assert_eq!(sheet.paid_students_count, 1);

    // Entries come back in name order, all present by default
    assert_eq!(sheet.entries.len(), 2);
    assert_eq!(sheet.entries[0].student_name, "Aziz Toirov");
    assert_eq!(sheet.entries[1].student_name, "Malika Usmonova");
    assert!(sheet.entries.iter().all(|entry| entry.is_present));

    Ok(())
}

#[tokio::test]
async fn test_mark_bulk_round_trip() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let roster = StandardRoster::create(&app).await?;
    let date = parse_date("2026-02-02");

    let count = app
        .attendance
        .mark_bulk(
            roster.group_id,
            date,
            vec![
                AttendanceMark {
                    student_id: roster.student_a,
                    is_present: false,
                },
                AttendanceMark {
                    student_id: roster.student_b,
                    is_present: true,
                },
            ],
        )
        .await?;
    assert_eq!(count, 2);

    let sheet = app.attendance.sheet(roster.group_id, date).await?;
    assert!(!sheet.entries[0].is_present, "Aziz was marked absent");
    assert!(sheet.entries[1].is_present, "Malika was marked present");

    Ok(())
}

#[tokio::test]
async fn test_mark_bulk_replaces_the_whole_day() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let roster = StandardRoster::create(&app).await?;
    let date = parse_date("2026-02-02");

    // First pass: both absent
    app.attendance
        .mark_bulk(
            roster.group_id,
            date,
            vec![
                AttendanceMark {
                    student_id: roster.student_a,
                    is_present: false,
                },
                AttendanceMark {
                    student_id: roster.student_b,
                    is_present: false,
                },
            ],
        )
        .await?;

    // Second pass covers only student A, wiping B's record
    let count = app
        .attendance
        .mark_bulk(
            roster.group_id,
            date,
            vec![AttendanceMark {
                student_id: roster.student_a,
                is_present: true,
            }],
        )
        .await?;
    assert_eq!(count, 1);

    let sheet = app.attendance.sheet(roster.group_id, date).await?;
    assert!(sheet.entries[0].is_present, "Aziz re-marked present");
    assert!(
        sheet.entries[1].is_present,
        "Malika has no record left, so she defaults to present"
    );

    Ok(())
}

#[tokio::test]
async fn test_duplicate_marks_collapse_to_the_last_one() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let roster = StandardRoster::create(&app).await?;
    let date = parse_date("2026-02-02");

    let count = app
        .attendance
        .mark_bulk(
            roster.group_id,
            date,
            vec![
                AttendanceMark {
                    student_id: roster.student_a,
                    is_present: true,
                },
                AttendanceMark {
                    student_id: roster.student_a,
                    is_present: false,
                },
            ],
        )
        .await?;
    assert_eq!(count, 1, "Duplicates collapse into one row");

    let sheet = app.attendance.sheet(roster.group_id, date).await?;
    assert!(!sheet.entries[0].is_present, "The later mark wins");

    Ok(())
}

#[tokio::test]
async fn test_mark_bulk_validates_group_and_students() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let roster = StandardRoster::create(&app).await?;
    let date = parse_date("2026-02-02");

    let result = app
        .attendance
        .mark_bulk(
            Uuid::new_v4(),
            date,
            vec![AttendanceMark {
                student_id: roster.student_a,
                is_present: true,
            }],
        )
        .await;
    assert!(matches!(result, Err(AppError::GroupNotFound(_))));

    let result = app
        .attendance
        .mark_bulk(
            roster.group_id,
            date,
            vec![AttendanceMark {
                student_id: Uuid::new_v4(),
                is_present: true,
            }],
        )
        .await;
    assert!(matches!(result, Err(AppError::StudentNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_update_single_overwrites_one_mark() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let roster = StandardRoster::create(&app).await?;
    let date = parse_date("2026-02-02");

    app.attendance
        .mark_bulk(
            roster.group_id,
            date,
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

    let record = app
        .attendance
        .update_single(roster.group_id, date, roster.student_a, false)
        .await?;
    assert!(!record.is_present);

    let sheet = app.attendance.sheet(roster.group_id, date).await?;
    assert!(!sheet.entries[0].is_present, "Aziz flipped to absent");
    assert!(sheet.entries[1].is_present, "Malika untouched");

    Ok(())
}

#[tokio::test]
async fn test_monthly_pivot_from_recorded_days() -> Result<()> {
    let (app, _temp) = test_app().await?;
    let roster = StandardRoster::create(&app).await?;

    // Two lessons recorded in February; the second covers only student A
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
                    is_present: false,
                },
            ],
        )
        .await?;
    app.attendance
        .mark_bulk(
            roster.group_id,
            parse_date("2026-02-04"),
            vec![AttendanceMark {
                student_id: roster.student_a,
                is_present: true,
            }],
        )
        .await?;

    // Noise in another month must not leak in
    app.attendance
        .update_single(
            roster.group_id,
            parse_date("2026-03-02"),
            roster.student_a,
            true,
        )
        .await?;

    let pivot = app
        .attendance
        .monthly_pivot(roster.group_id, parse_month("2026-02"))
        .await?;

    assert_eq!(
        pivot.columns,
        vec!["2026-02-02 14:00".to_string(), "2026-02-04 14:00".to_string()]
    );

    let aziz = &pivot.rows[0];
    assert_eq!(aziz.student_name, "Aziz Toirov");
    assert_eq!(aziz.total_present, 2);
    assert_eq!(aziz.cells["2026-02-02 14:00"], Some(true));
    assert_eq!(aziz.cells["2026-02-04 14:00"], Some(true));

    let malika = &pivot.rows[1];
    assert_eq!(malika.total_present, 0);
    assert_eq!(malika.cells["2026-02-02 14:00"], Some(false));
    assert_eq!(malika.cells["2026-02-04 14:00"], None);

    Ok(())
}
