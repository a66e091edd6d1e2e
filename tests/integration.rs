//! End-to-end tests for the attendance engine.
//!
//! Each test builds an engine over the seed configuration in
//! `config/default` with an in-memory store and approval source, then
//! drives it through its public operations:
//! - Punch ingestion and de-duplication
//! - Pairing and shift matching
//! - Ambiguous cases and their review
//! - Manual corrections
//! - Approval hooks and monthly summaries
//! - Batch runs
//! - Failure isolation

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

use attendance_engine::config::ConfigLoader;
use attendance_engine::engine::AttendanceEngine;
use attendance_engine::error::{EngineError, EngineResult};
use attendance_engine::models::{
    AmbiguityReason, ApprovedLeave, ApprovedOd, ApprovedOvertime, ApprovedPermission,
    AttendanceStatus, CaseStatus, DeductionType, OdKind, PunchSource, RawPunch, RosterAssignment,
    RosterEntry, YearMonth,
};
use attendance_engine::sources::{ApprovalSource, InMemoryApprovals, StaticShiftCatalog};
use attendance_engine::store::{AttendanceStore, MemoryStore};

// =============================================================================
// Test Helpers
// =============================================================================

struct Harness {
    engine: AttendanceEngine,
    approvals: Arc<InMemoryApprovals>,
}

fn create_harness() -> Harness {
    let (config, catalog) = ConfigLoader::load("./config/default")
        .expect("Failed to load config")
        .into_parts();
    let approvals = Arc::new(InMemoryApprovals::new());
    let engine = AttendanceEngine::new(
        config,
        Arc::new(StaticShiftCatalog::from_config(catalog)),
        approvals.clone(),
        Arc::new(MemoryStore::new()),
    );
    Harness { engine, approvals }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
        .unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn january() -> YearMonth {
    YearMonth::new(2024, 1).unwrap()
}

fn punch_in(employee: &str, timestamp: &str) -> RawPunch {
    RawPunch::new(employee, timestamp, "IN", PunchSource::Device)
}

fn punch_out(employee: &str, timestamp: &str) -> RawPunch {
    RawPunch::new(employee, timestamp, "OUT", PunchSource::Device)
}

/// Ingests punches and runs the pipeline for a single day.
fn run_day(harness: &Harness, employee: &str, day: &str, punches: &[RawPunch]) {
    harness.engine.ingest_punches(punches).unwrap();
    harness
        .engine
        .pair_and_resolve(employee, date(day), date(day))
        .unwrap();
}

// =============================================================================
// SECTION 1: Ingestion
// =============================================================================

#[test]
fn test_ingest_counts_duplicates_and_rejections() {
    let harness = create_harness();

    let report = harness
        .engine
        .ingest_punches(&[
            punch_in("E001", "2024-01-15 09:03:00"),
            punch_out("E001", "2024-01-15 18:05:00"),
            punch_in("e001 ", "2024-01-15 09:03:00"),
            punch_in("E001", "15/01/2024 09:03"),
            punch_in("E001", "2019-12-31 09:00:00"),
        ])
        .unwrap();

    assert_eq!(report.accepted, 2);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.rejected, 2);
    assert_eq!(report.errors.len(), 2);
    assert_eq!(report.employees, vec!["E001".to_string()]);
}

#[test]
fn test_reingesting_same_batch_changes_nothing() {
    let harness = create_harness();
    let punches = [
        punch_in("E001", "2024-01-15 09:03:00"),
        punch_out("E001", "2024-01-15 18:05:00"),
    ];

    run_day(&harness, "E001", "2024-01-15", &punches);
    let first = harness
        .engine
        .store()
        .daily_record("E001", date("2024-01-15"))
        .unwrap();

    let report = harness.engine.ingest_punches(&punches).unwrap();
    assert_eq!(report.accepted, 0);
    assert_eq!(report.duplicates, 2);

    harness
        .engine
        .pair_and_resolve("E001", date("2024-01-15"), date("2024-01-15"))
        .unwrap();
    let second = harness
        .engine
        .store()
        .daily_record("E001", date("2024-01-15"))
        .unwrap();
    assert_eq!(first, second);
}

// =============================================================================
// SECTION 2: Pairing and Matching
// =============================================================================

#[test]
fn test_single_window_match_sets_shift_and_extra_hours() {
    let harness = create_harness();
    run_day(
        &harness,
        "E001",
        "2024-01-15",
        &[
            punch_in("E001", "2024-01-15 09:03:00"),
            punch_out("E001", "2024-01-15 18:05:00"),
        ],
    );

    let record = harness
        .engine
        .store()
        .daily_record("E001", date("2024-01-15"))
        .unwrap()
        .unwrap();

    // GEN_SHORT ends 65 minutes before the OUT, outside the tolerance
    assert_eq!(record.shift_id.as_deref(), Some("GEN"));
    assert_eq!(record.status, AttendanceStatus::Present);
    assert_eq!(record.late_in_minutes, 0);
    assert_eq!(record.early_out_minutes, 0);
    assert_eq!(record.total_hours, Some(dec("9.03")));
    assert_eq!(record.extra_hours, dec("0.08"));
    assert!(!record.locked);
}

#[test]
fn test_alternating_pairs_use_first_in_and_last_out() {
    let harness = create_harness();
    harness
        .engine
        .ingest_punches(&[
            punch_in("E001", "2024-01-16 09:00:00"),
            punch_out("E001", "2024-01-16 12:00:00"),
            punch_in("E001", "2024-01-16 13:00:00"),
            punch_out("E001", "2024-01-16 18:10:00"),
        ])
        .unwrap();

    let report = harness
        .engine
        .pair_and_resolve("E001", date("2024-01-16"), date("2024-01-16"))
        .unwrap();
    assert_eq!(report.records_written, 1);
    assert!(report.unmatched_outs.is_empty());

    let record = harness
        .engine
        .store()
        .daily_record("E001", date("2024-01-16"))
        .unwrap()
        .unwrap();
    assert_eq!(record.in_time, Some(make_datetime("2024-01-16", "09:00:00")));
    assert_eq!(record.out_time, Some(make_datetime("2024-01-16", "18:10:00")));
    assert_eq!(record.shift_id.as_deref(), Some("GEN"));
}

#[test]
fn test_overnight_pair_lands_on_in_date() {
    let harness = create_harness();
    run_day(
        &harness,
        "E002",
        "2024-01-10",
        &[
            punch_in("E002", "2024-01-10 22:05:00"),
            punch_out("E002", "2024-01-11 06:02:00"),
        ],
    );

    let record = harness
        .engine
        .store()
        .daily_record("E002", date("2024-01-10"))
        .unwrap()
        .unwrap();
    assert_eq!(record.shift_id.as_deref(), Some("NIGHT"));
    assert_eq!(record.total_hours, Some(dec("7.95")));
    assert_eq!(record.status, AttendanceStatus::Present);
    assert!(
        harness
            .engine
            .store()
            .daily_record("E002", date("2024-01-11"))
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_roster_week_off_keeps_status_and_notes_work() {
    let harness = create_harness();
    run_day(
        &harness,
        "E002",
        "2024-01-07",
        &[
            punch_in("E002", "2024-01-07 06:00:00"),
            punch_out("E002", "2024-01-07 14:00:00"),
        ],
    );

    let record = harness
        .engine
        .store()
        .daily_record("E002", date("2024-01-07"))
        .unwrap()
        .unwrap();
    assert_eq!(record.status, AttendanceStatus::WeekOff);
    assert!(record.shift_id.is_none());
    assert!(record.notes.contains(&"Worked on Week Off".to_string()));
    assert_eq!(record.total_hours, Some(dec("8")));
}

// =============================================================================
// SECTION 3: Ambiguous Cases
// =============================================================================

#[test]
fn test_overlapping_windows_without_out_raise_case() {
    let harness = create_harness();
    harness
        .engine
        .ingest_punches(&[punch_in("E001", "2024-01-17 09:05:00")])
        .unwrap();

    let report = harness
        .engine
        .pair_and_resolve("E001", date("2024-01-17"), date("2024-01-17"))
        .unwrap();
    assert_eq!(report.cases_raised, 1);

    let case = harness
        .engine
        .store()
        .pending_case("E001", date("2024-01-17"))
        .unwrap()
        .expect("Expected a pending case");
    assert_eq!(case.reason, AmbiguityReason::MissingOutTime);
    assert!(case.requires_manual_selection);
    assert_eq!(case.candidates.len(), 2);

    let record = harness
        .engine
        .store()
        .daily_record("E001", date("2024-01-17"))
        .unwrap()
        .unwrap();
    assert!(record.shift_id.is_none());
    assert_eq!(record.status, AttendanceStatus::Partial);
}

#[test]
fn test_rerun_refreshes_case_instead_of_duplicating() {
    let harness = create_harness();
    run_day(
        &harness,
        "E001",
        "2024-01-17",
        &[punch_in("E001", "2024-01-17 09:05:00")],
    );

    let report = harness
        .engine
        .pair_and_resolve("E001", date("2024-01-17"), date("2024-01-17"))
        .unwrap();
    assert_eq!(report.cases_raised, 0);
    assert_eq!(report.cases_updated, 1);
    assert_eq!(harness.engine.store().pending_cases().unwrap().len(), 1);
}

#[test]
fn test_late_out_punch_auto_resolves_case() {
    let harness = create_harness();
    run_day(
        &harness,
        "E001",
        "2024-01-17",
        &[punch_in("E001", "2024-01-17 09:05:00")],
    );
    let case_id = harness
        .engine
        .store()
        .pending_case("E001", date("2024-01-17"))
        .unwrap()
        .unwrap()
        .id;

    harness
        .engine
        .ingest_punches(&[punch_out("E001", "2024-01-17 17:02:00")])
        .unwrap();
    let report = harness
        .engine
        .pair_and_resolve("E001", date("2024-01-17"), date("2024-01-17"))
        .unwrap();
    assert_eq!(report.cases_auto_resolved, 1);

    let case = harness.engine.store().case(case_id).unwrap().unwrap();
    assert_eq!(case.status, CaseStatus::Resolved);
    assert_eq!(
        case.resolution.unwrap().shift_id.as_deref(),
        Some("GEN_SHORT")
    );
}

#[test]
fn test_equal_distance_survivors_assign_provisionally() {
    let harness = create_harness();
    run_day(
        &harness,
        "E001",
        "2024-01-19",
        &[
            punch_in("E001", "2024-01-19 09:00:00"),
            punch_out("E001", "2024-01-19 17:30:00"),
        ],
    );

    let case = harness
        .engine
        .store()
        .pending_case("E001", date("2024-01-19"))
        .unwrap()
        .unwrap();
    assert_eq!(case.reason, AmbiguityReason::MultipleEndTimesWithinTolerance);
    assert!(!case.requires_manual_selection);
    assert_eq!(case.provisional_shift_id.as_deref(), Some("GEN"));

    let record = harness
        .engine
        .store()
        .daily_record("E001", date("2024-01-19"))
        .unwrap()
        .unwrap();
    assert_eq!(record.shift_id.as_deref(), Some("GEN"));
    assert_eq!(record.early_out_minutes, 30);
}

#[test]
fn test_resolve_case_locks_and_rederives_record() {
    let harness = create_harness();
    run_day(
        &harness,
        "E001",
        "2024-01-22",
        &[
            punch_in("E001", "2024-01-22 09:05:00"),
            punch_out("E001", "2024-01-22 15:00:00"),
        ],
    );
    let case = harness
        .engine
        .store()
        .pending_case("E001", date("2024-01-22"))
        .unwrap()
        .unwrap();
    assert_eq!(case.reason, AmbiguityReason::NoEndTimeWithinTolerance);

    let record = harness
        .engine
        .resolve_ambiguous_case(case.id, "GEN_SHORT", "hr.lead", Some("Short day".to_string()))
        .unwrap();

    assert!(record.locked);
    assert_eq!(record.shift_id.as_deref(), Some("GEN_SHORT"));
    assert_eq!(record.early_out_minutes, 120);
    assert!(record.is_early_out);
    let deduction = record.early_out_deduction.expect("Expected an evaluation");
    assert!(deduction.deduction_applied);
    assert_eq!(deduction.deduction_type, Some(DeductionType::FullDay));

    let closed = harness.engine.store().case(case.id).unwrap().unwrap();
    assert_eq!(closed.status, CaseStatus::Resolved);
    let resolution = closed.resolution.unwrap();
    assert_eq!(resolution.reviewed_by, "hr.lead");
    assert_eq!(resolution.shift_id.as_deref(), Some("GEN_SHORT"));

    let summary = harness
        .engine
        .store()
        .summary("E001", january())
        .unwrap()
        .unwrap();
    assert_eq!(summary.early_out_count, 1);
    assert_eq!(summary.total_early_out_deduction_days, dec("1"));
}

#[test]
fn test_locked_record_survives_resync() {
    let harness = create_harness();
    run_day(
        &harness,
        "E001",
        "2024-01-22",
        &[
            punch_in("E001", "2024-01-22 09:05:00"),
            punch_out("E001", "2024-01-22 15:00:00"),
        ],
    );
    let case = harness
        .engine
        .store()
        .pending_case("E001", date("2024-01-22"))
        .unwrap()
        .unwrap();
    let resolved = harness
        .engine
        .resolve_ambiguous_case(case.id, "GEN_SHORT", "hr.lead", None)
        .unwrap();

    harness
        .engine
        .ingest_punches(&[punch_out("E001", "2024-01-22 18:00:00")])
        .unwrap();
    let report = harness
        .engine
        .pair_and_resolve("E001", date("2024-01-22"), date("2024-01-22"))
        .unwrap();
    assert_eq!(report.skipped_locked, 1);
    assert_eq!(report.records_written, 0);

    let record = harness
        .engine
        .store()
        .daily_record("E001", date("2024-01-22"))
        .unwrap()
        .unwrap();
    assert_eq!(record, resolved);
}

#[test]
fn test_closed_case_cannot_be_resolved_again() {
    let harness = create_harness();
    run_day(
        &harness,
        "E001",
        "2024-01-17",
        &[punch_in("E001", "2024-01-17 09:05:00")],
    );
    let case = harness
        .engine
        .store()
        .pending_case("E001", date("2024-01-17"))
        .unwrap()
        .unwrap();

    harness
        .engine
        .dismiss_ambiguous_case(case.id, "hr.lead", None)
        .unwrap();

    match harness
        .engine
        .resolve_ambiguous_case(case.id, "GEN", "hr.lead", None)
    {
        Err(EngineError::CaseAlreadyClosed { status, .. }) => assert_eq!(status, "dismissed"),
        other => panic!("Expected CaseAlreadyClosed, got {:?}", other),
    }
}

#[test]
fn test_dismiss_leaves_record_untouched() {
    let harness = create_harness();
    run_day(
        &harness,
        "E001",
        "2024-01-19",
        &[
            punch_in("E001", "2024-01-19 09:00:00"),
            punch_out("E001", "2024-01-19 17:30:00"),
        ],
    );
    let before = harness
        .engine
        .store()
        .daily_record("E001", date("2024-01-19"))
        .unwrap()
        .unwrap();
    let case = harness
        .engine
        .store()
        .pending_case("E001", date("2024-01-19"))
        .unwrap()
        .unwrap();

    let dismissed = harness
        .engine
        .dismiss_ambiguous_case(case.id, "hr.lead", Some("Provisional is fine".to_string()))
        .unwrap();
    assert_eq!(dismissed.status, CaseStatus::Dismissed);

    let after = harness
        .engine
        .store()
        .daily_record("E001", date("2024-01-19"))
        .unwrap()
        .unwrap();
    assert_eq!(before, after);
    assert!(!after.locked);
}

#[test]
fn test_auto_assign_picks_nearest_start_with_id_tiebreak() {
    let harness = create_harness();
    run_day(
        &harness,
        "E001",
        "2024-01-22",
        &[
            punch_in("E001", "2024-01-22 09:05:00"),
            punch_out("E001", "2024-01-22 15:00:00"),
        ],
    );
    let case = harness
        .engine
        .store()
        .pending_case("E001", date("2024-01-22"))
        .unwrap()
        .unwrap();

    let record = harness
        .engine
        .auto_assign_nearest(case.id, "hr.lead")
        .unwrap();

    // Both candidates start at 09:00; GEN wins on ID
    assert_eq!(record.shift_id.as_deref(), Some("GEN"));
    assert_eq!(record.early_out_minutes, 180);
    assert!(record.locked);
}

#[test]
fn test_unknown_case_is_not_found() {
    let harness = create_harness();
    let case_id = uuid::Uuid::new_v4();
    match harness.engine.dismiss_ambiguous_case(case_id, "hr.lead", None) {
        Err(EngineError::CaseNotFound { case_id: id }) => assert_eq!(id, case_id),
        other => panic!("Expected CaseNotFound, got {:?}", other),
    }
}

// =============================================================================
// SECTION 4: Manual Corrections
// =============================================================================

#[test]
fn test_correct_out_time_rolls_to_next_day() {
    let harness = create_harness();
    run_day(
        &harness,
        "E002",
        "2024-01-10",
        &[punch_in("E002", "2024-01-10 22:00:00")],
    );

    let record = harness
        .engine
        .correct_out_time(
            "E002",
            date("2024-01-10"),
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            "supervisor",
        )
        .unwrap();

    assert_eq!(record.out_time, Some(make_datetime("2024-01-11", "06:00:00")));
    assert_eq!(record.shift_id.as_deref(), Some("NIGHT"));
    assert_eq!(record.total_hours, Some(dec("8")));
    assert_eq!(record.early_out_minutes, 0);
    assert_eq!(record.status, AttendanceStatus::Present);
    assert!(record.locked);
    assert!(record.sources.contains(&PunchSource::Manual));
}

#[test]
fn test_correct_out_time_closes_case_when_it_disambiguates() {
    let harness = create_harness();
    run_day(
        &harness,
        "E001",
        "2024-01-17",
        &[punch_in("E001", "2024-01-17 09:05:00")],
    );

    let record = harness
        .engine
        .correct_out_time(
            "E001",
            date("2024-01-17"),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            "supervisor",
        )
        .unwrap();

    assert_eq!(record.shift_id.as_deref(), Some("GEN"));
    assert!(
        harness
            .engine
            .store()
            .pending_case("E001", date("2024-01-17"))
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_correct_out_time_requires_in_time() {
    let harness = create_harness();
    harness.engine.ensure_daily_records(date("2024-01-23")).unwrap();

    match harness.engine.correct_out_time(
        "E001",
        date("2024-01-23"),
        NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        "supervisor",
    ) {
        Err(EngineError::InvalidCorrection { .. }) => {}
        other => panic!("Expected InvalidCorrection, got {:?}", other),
    }
}

#[test]
fn test_manual_assignment_flags_roster_deviation() {
    let harness = create_harness();
    run_day(
        &harness,
        "E001",
        "2024-01-20",
        &[
            punch_in("E001", "2024-01-20 09:00:00"),
            punch_out("E001", "2024-01-20 17:00:00"),
        ],
    );

    let record = harness
        .engine
        .assign_shift("E001", date("2024-01-20"), "GEN_SHORT", "supervisor")
        .unwrap();

    assert_eq!(record.shift_id.as_deref(), Some("GEN_SHORT"));
    assert!(record.is_roster_deviation);
    assert_eq!(record.early_out_minutes, 0);
    assert!(record.locked);
}

#[test]
fn test_manual_assignment_of_unknown_shift_fails() {
    let harness = create_harness();
    run_day(
        &harness,
        "E001",
        "2024-01-15",
        &[
            punch_in("E001", "2024-01-15 09:00:00"),
            punch_out("E001", "2024-01-15 18:00:00"),
        ],
    );

    match harness
        .engine
        .assign_shift("E001", date("2024-01-15"), "NOPE", "supervisor")
    {
        Err(EngineError::ShiftNotFound { shift_id }) => assert_eq!(shift_id, "NOPE"),
        other => panic!("Expected ShiftNotFound, got {:?}", other),
    }
}

// =============================================================================
// SECTION 5: Approval Hooks and Monthly Summaries
// =============================================================================

#[test]
fn test_overtime_approval_clears_extra_hours() {
    let harness = create_harness();
    run_day(
        &harness,
        "E001",
        "2024-01-20",
        &[
            punch_in("E001", "2024-01-20 09:00:00"),
            punch_out("E001", "2024-01-20 20:00:00"),
        ],
    );
    let record = harness
        .engine
        .store()
        .daily_record("E001", date("2024-01-20"))
        .unwrap()
        .unwrap();
    assert_eq!(record.extra_hours, dec("2"));

    let overtime = ApprovedOvertime {
        employee_number: "E001".to_string(),
        date: date("2024-01-20"),
        hours: dec("2"),
    };
    harness.approvals.add_overtime(overtime.clone()).unwrap();
    let summary = harness.engine.on_overtime_approved(&overtime).unwrap();

    let record = harness
        .engine
        .store()
        .daily_record("E001", date("2024-01-20"))
        .unwrap()
        .unwrap();
    assert_eq!(record.extra_hours, Decimal::ZERO);
    assert_eq!(record.ot_hours, dec("2"));
    assert_eq!(summary.total_extra_hours, Decimal::ZERO);
    assert_eq!(summary.total_ot_hours, dec("2"));
}

#[test]
fn test_od_hours_lift_half_day_to_present() {
    let harness = create_harness();
    run_day(
        &harness,
        "E001",
        "2024-01-24",
        &[
            punch_in("E001", "2024-01-24 09:00:00"),
            punch_out("E001", "2024-01-24 14:00:00"),
        ],
    );
    let case = harness
        .engine
        .store()
        .pending_case("E001", date("2024-01-24"))
        .unwrap()
        .unwrap();
    let record = harness
        .engine
        .resolve_ambiguous_case(case.id, "GEN", "hr.lead", None)
        .unwrap();
    // 5 hours against a 6.3 hour threshold
    assert_eq!(record.status, AttendanceStatus::HalfDay);

    let od = ApprovedOd {
        employee_number: "E001".to_string(),
        from_date: date("2024-01-24"),
        to_date: date("2024-01-24"),
        kind: OdKind::Hours { hours: dec("2") },
    };
    harness.approvals.add_od(od.clone()).unwrap();
    let summaries = harness.engine.on_od_approved(&od).unwrap();

    let record = harness
        .engine
        .store()
        .daily_record("E001", date("2024-01-24"))
        .unwrap()
        .unwrap();
    assert_eq!(record.od_hours, dec("2"));
    assert_eq!(record.status, AttendanceStatus::Present);
    assert!(record.locked);

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].total_present_days, 1);
    assert_eq!(summaries[0].total_payable_shifts, dec("1"));
    assert_eq!(summaries[0].total_early_out_deduction_amount, dec("500"));
}

#[test]
fn test_permission_approval_counts_hours() {
    let harness = create_harness();
    let permission = ApprovedPermission {
        employee_number: "E001".to_string(),
        date: date("2024-01-12"),
        hours: dec("1.5"),
    };
    harness.approvals.add_permission(permission.clone()).unwrap();

    let summary = harness.engine.on_permission_approved(&permission).unwrap();
    assert_eq!(summary.total_permission_count, 1);
    assert_eq!(summary.total_permission_hours, dec("1.5"));
    assert_eq!(summary.total_days_in_month, 31);
}

#[test]
fn test_recompute_is_idempotent() {
    let harness = create_harness();
    run_day(
        &harness,
        "E001",
        "2024-01-15",
        &[
            punch_in("E001", "2024-01-15 09:03:00"),
            punch_out("E001", "2024-01-15 18:05:00"),
        ],
    );

    let first = harness
        .engine
        .recompute_monthly_summary("E001", january())
        .unwrap();
    let second = harness
        .engine
        .recompute_monthly_summary("E001", january())
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.total_present_days, 1);
    assert_eq!(first.total_extra_hours, dec("0.08"));
}

#[test]
fn test_ensure_daily_records_creates_missing_only() {
    let harness = create_harness();
    run_day(
        &harness,
        "E001",
        "2024-01-07",
        &[
            punch_in("E001", "2024-01-07 09:00:00"),
            punch_out("E001", "2024-01-07 18:00:00"),
        ],
    );

    let created = harness.engine.ensure_daily_records(date("2024-01-07")).unwrap();

    // E001 already has a record and E005 is inactive
    let mut employees: Vec<&str> = created.iter().map(|r| r.employee_number.as_str()).collect();
    employees.sort();
    assert_eq!(employees, vec!["E002", "E003", "E004"]);

    let week_off = created
        .iter()
        .find(|r| r.employee_number == "E002")
        .unwrap();
    assert_eq!(week_off.status, AttendanceStatus::WeekOff);
    assert!(
        created
            .iter()
            .filter(|r| r.employee_number != "E002")
            .all(|r| r.status == AttendanceStatus::Absent)
    );

    let again = harness.engine.ensure_daily_records(date("2024-01-07")).unwrap();
    assert!(again.is_empty());
}

// =============================================================================
// SECTION 6: Batch Runs
// =============================================================================

#[tokio::test]
async fn test_sync_range_reports_failures_per_employee() {
    let harness = create_harness();
    harness
        .engine
        .ingest_punches(&[
            punch_in("E001", "2024-01-15 09:03:00"),
            punch_out("E001", "2024-01-15 18:05:00"),
            punch_in("E002", "2024-01-15 06:00:00"),
            punch_out("E002", "2024-01-15 14:00:00"),
            punch_in("E999", "2024-01-15 09:00:00"),
        ])
        .unwrap();

    let report = harness
        .engine
        .sync_range(date("2024-01-15"), date("2024-01-15"))
        .await
        .unwrap();

    assert_eq!(report.processed, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors[0].key, "E999");

    let record = harness
        .engine
        .store()
        .daily_record("E002", date("2024-01-15"))
        .unwrap()
        .unwrap();
    assert_eq!(record.shift_id.as_deref(), Some("MORN"));
}

#[tokio::test]
async fn test_recompute_all_covers_active_employees() {
    let harness = create_harness();

    let report = harness.engine.recompute_all(january()).await.unwrap();

    assert_eq!(report.processed, 4);
    assert_eq!(report.failed, 0);
    assert!(
        harness
            .engine
            .store()
            .summary("E005", january())
            .unwrap()
            .is_none()
    );
    let summary = harness
        .engine
        .store()
        .summary("E003", january())
        .unwrap()
        .unwrap();
    assert_eq!(summary.total_present_days, 0);
}

#[tokio::test]
async fn test_refresh_extra_hours_picks_up_unhooked_overtime() {
    let harness = create_harness();
    run_day(
        &harness,
        "E001",
        "2024-01-20",
        &[
            punch_in("E001", "2024-01-20 09:00:00"),
            punch_out("E001", "2024-01-20 20:00:00"),
        ],
    );
    harness
        .approvals
        .add_overtime(ApprovedOvertime {
            employee_number: "E001".to_string(),
            date: date("2024-01-20"),
            hours: dec("1.5"),
        })
        .unwrap();

    let report = harness
        .engine
        .refresh_extra_hours(date("2024-01-01"), date("2024-01-31"))
        .await
        .unwrap();
    assert_eq!(report.succeeded, 1);

    let summary = harness
        .engine
        .store()
        .summary("E001", january())
        .unwrap()
        .unwrap();
    assert_eq!(summary.total_extra_hours, Decimal::ZERO);
    assert_eq!(summary.total_ot_hours, dec("1.5"));
}

// =============================================================================
// SECTION 7: Failure Isolation
// =============================================================================

/// Approval source whose leave lookup always fails.
struct FailingLeaves;

impl ApprovalSource for FailingLeaves {
    fn leaves(
        &self,
        _employee_number: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> EngineResult<Vec<ApprovedLeave>> {
        Err(EngineError::Store {
            message: "leave service unavailable".to_string(),
        })
    }

    fn ods(
        &self,
        _employee_number: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> EngineResult<Vec<ApprovedOd>> {
        Ok(Vec::new())
    }

    fn overtime(
        &self,
        _employee_number: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> EngineResult<Vec<ApprovedOvertime>> {
        Ok(Vec::new())
    }

    fn permissions(
        &self,
        _employee_number: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> EngineResult<Vec<ApprovedPermission>> {
        Ok(Vec::new())
    }
}

#[test]
fn test_failing_date_does_not_block_other_dates() {
    let (config, mut catalog) = ConfigLoader::load("./config/default")
        .expect("Failed to load config")
        .into_parts();
    catalog.roster.push(RosterEntry {
        employee_number: "E001".to_string(),
        date: date("2024-01-16"),
        assignment: RosterAssignment::Shift {
            shift_id: "GONE".to_string(),
        },
    });
    let engine = AttendanceEngine::new(
        config,
        Arc::new(StaticShiftCatalog::from_config(catalog)),
        Arc::new(InMemoryApprovals::new()),
        Arc::new(MemoryStore::new()),
    );
    engine
        .ingest_punches(&[
            punch_in("E001", "2024-01-15 09:03:00"),
            punch_out("E001", "2024-01-15 18:05:00"),
            punch_in("E001", "2024-01-16 09:03:00"),
            punch_out("E001", "2024-01-16 18:05:00"),
            punch_in("E001", "2024-01-17 09:03:00"),
            punch_out("E001", "2024-01-17 18:05:00"),
        ])
        .unwrap();

    let report = engine
        .pair_and_resolve("E001", date("2024-01-15"), date("2024-01-17"))
        .unwrap();

    assert_eq!(report.records_written, 2);
    assert_eq!(report.day_failures.len(), 1);
    assert_eq!(report.day_failures[0].date, date("2024-01-16"));
    assert!(report.day_failures[0].message.contains("GONE"));

    let store = engine.store();
    assert!(store.daily_record("E001", date("2024-01-15")).unwrap().is_some());
    assert!(store.daily_record("E001", date("2024-01-16")).unwrap().is_none());
    assert!(store.daily_record("E001", date("2024-01-17")).unwrap().is_some());

    let summary = store.summary("E001", january()).unwrap().unwrap();
    assert_eq!(summary.total_present_days, 2);
}

#[tokio::test]
async fn test_sync_range_flags_employee_with_failed_date() {
    let (config, mut catalog) = ConfigLoader::load("./config/default")
        .expect("Failed to load config")
        .into_parts();
    catalog.roster.push(RosterEntry {
        employee_number: "E001".to_string(),
        date: date("2024-01-16"),
        assignment: RosterAssignment::Shift {
            shift_id: "GONE".to_string(),
        },
    });
    let engine = AttendanceEngine::new(
        config,
        Arc::new(StaticShiftCatalog::from_config(catalog)),
        Arc::new(InMemoryApprovals::new()),
        Arc::new(MemoryStore::new()),
    );
    engine
        .ingest_punches(&[
            punch_in("E001", "2024-01-15 09:03:00"),
            punch_out("E001", "2024-01-15 18:05:00"),
            punch_in("E001", "2024-01-16 09:03:00"),
            punch_out("E001", "2024-01-16 18:05:00"),
        ])
        .unwrap();

    let report = engine
        .sync_range(date("2024-01-15"), date("2024-01-16"))
        .await
        .unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.errors[0].key, "E001");
    assert!(report.errors[0].message.contains("2024-01-16"));
    assert!(
        engine
            .store()
            .daily_record("E001", date("2024-01-15"))
            .unwrap()
            .is_some()
    );
}

#[test]
fn test_recompute_failure_keeps_written_record() {
    let (config, catalog) = ConfigLoader::load("./config/default")
        .expect("Failed to load config")
        .into_parts();
    let engine = AttendanceEngine::new(
        config,
        Arc::new(StaticShiftCatalog::from_config(catalog)),
        Arc::new(FailingLeaves),
        Arc::new(MemoryStore::new()),
    );
    engine
        .ingest_punches(&[
            punch_in("E001", "2024-01-15 09:03:00"),
            punch_out("E001", "2024-01-15 18:05:00"),
        ])
        .unwrap();

    let report = engine
        .pair_and_resolve("E001", date("2024-01-15"), date("2024-01-15"))
        .unwrap();

    assert_eq!(report.records_written, 1);
    assert_eq!(report.recompute_failures.len(), 1);
    assert!(report.recompute_failures[0].contains("2024-01"));
    assert!(report.recompute_failures[0].contains("leave service unavailable"));

    let record = engine
        .store()
        .daily_record("E001", date("2024-01-15"))
        .unwrap()
        .unwrap();
    assert_eq!(record.shift_id.as_deref(), Some("GEN"));
    assert!(engine.store().summary("E001", january()).unwrap().is_none());
}
