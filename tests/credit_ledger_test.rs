// ==========================================
// Credit ledger integration tests
// ==========================================
// Property under test: for any sequence of status transitions on one
// course enrollment, the ledger ends at the contribution of the final
// status, regardless of the path taken.
// ==========================================

mod test_helpers;

use academic_promotion::domain::types::CourseEnrollmentStatus::{
    Active, Completed, Planned, Withdrawn,
};
use academic_promotion::engine::CourseEnrollmentService;
use academic_promotion::repository::{CreditLedgerRepository, EnrollmentRepository};
use test_helpers::{create_test_db, open_test_connection, seed_simple_scenario};

const CREDITS: f64 = 6.0;

fn setup() -> (
    tempfile::NamedTempFile,
    std::sync::Arc<std::sync::Mutex<rusqlite::Connection>>,
    test_helpers::SimpleScenario,
) {
    let (temp_file, db_path) = create_test_db().expect("create test db");
    let conn = open_test_connection(&db_path).expect("open db");
    let scenario = {
        let guard = conn.lock().unwrap();
        seed_simple_scenario(&guard, 14.0, CREDITS).expect("seed")
    };
    (temp_file, conn, scenario)
}

#[test]
fn test_enrollment_start_counts_as_in_progress() {
    let (_tmp, conn, s) = setup();
    let ledger = CreditLedgerRepository::new(conn.clone());

    // seeding left the course enrollment ACTIVE with no ledger row;
    // register its initial contribution
    ledger
        .apply_delta(&s.student_id, &s.year_id, CREDITS, 0.0)
        .unwrap();

    let entry = ledger.get(&s.student_id, &s.year_id).unwrap();
    assert_eq!(entry.credits_in_progress, CREDITS);
    assert_eq!(entry.credits_earned, 0.0);
}

#[test]
fn test_completion_moves_credits_to_earned() {
    let (_tmp, conn, s) = setup();
    let ledger = CreditLedgerRepository::new(conn.clone());
    let service = CourseEnrollmentService::new(
        EnrollmentRepository::new(conn.clone()),
        CreditLedgerRepository::new(conn.clone()),
    );

    ledger
        .apply_delta(&s.student_id, &s.year_id, CREDITS, 0.0)
        .unwrap();
    service
        .transition("ce1", &s.student_id, &s.year_id, Active, Completed, CREDITS)
        .unwrap();

    let entry = ledger.get(&s.student_id, &s.year_id).unwrap();
    assert_eq!(entry.credits_in_progress, 0.0);
    assert_eq!(entry.credits_earned, CREDITS);
}

#[test]
fn test_correction_path_never_double_counts() {
    // active -> completed -> withdrawn (a correction) must end at the
    // same ledger state as a direct active -> withdrawn
    let (_tmp, conn, s) = setup();
    let ledger = CreditLedgerRepository::new(conn.clone());
    let service = CourseEnrollmentService::new(
        EnrollmentRepository::new(conn.clone()),
        CreditLedgerRepository::new(conn.clone()),
    );

    ledger
        .apply_delta(&s.student_id, &s.year_id, CREDITS, 0.0)
        .unwrap();
    service
        .transition("ce1", &s.student_id, &s.year_id, Active, Completed, CREDITS)
        .unwrap();
    service
        .transition("ce1", &s.student_id, &s.year_id, Completed, Withdrawn, CREDITS)
        .unwrap();

    let entry = ledger.get(&s.student_id, &s.year_id).unwrap();
    assert_eq!(entry.credits_in_progress, 0.0);
    assert_eq!(entry.credits_earned, 0.0);
}

#[test]
fn test_planned_and_active_both_count_in_progress() {
    let (_tmp, conn, s) = setup();
    let ledger = CreditLedgerRepository::new(conn.clone());
    let service = CourseEnrollmentService::new(
        EnrollmentRepository::new(conn.clone()),
        CreditLedgerRepository::new(conn.clone()),
    );

    ledger
        .apply_delta(&s.student_id, &s.year_id, CREDITS, 0.0)
        .unwrap();
    // active -> planned is a no-op on the ledger
    service
        .transition("ce1", &s.student_id, &s.year_id, Active, Planned, CREDITS)
        .unwrap();

    let entry = ledger.get(&s.student_id, &s.year_id).unwrap();
    assert_eq!(entry.credits_in_progress, CREDITS);
    assert_eq!(entry.credits_earned, 0.0);
}

#[test]
fn test_required_credits_overwritten_not_accumulated() {
    let (_tmp, conn, s) = setup();
    let ledger = CreditLedgerRepository::new(conn.clone());

    ledger
        .set_required_credits(&s.student_id, &s.year_id, 60.0)
        .unwrap();
    ledger
        .set_required_credits(&s.student_id, &s.year_id, 54.0)
        .unwrap();

    let entry = ledger.get(&s.student_id, &s.year_id).unwrap();
    assert_eq!(entry.required_credits, 54.0);
}

#[test]
fn test_summarize_student_across_years() {
    let (_tmp, conn, s) = setup();
    {
        let guard = conn.lock().unwrap();
        test_helpers::insert_academic_year(&guard, "y2024", "2024-2025", 2024).unwrap();
    }
    let ledger = CreditLedgerRepository::new(conn.clone());

    ledger.apply_delta(&s.student_id, "y2024", 0.0, 48.0).unwrap();
    ledger
        .apply_delta(&s.student_id, &s.year_id, CREDITS, 12.0)
        .unwrap();

    let summary = ledger.summarize_student(&s.student_id).unwrap();
    assert_eq!(summary.credits_earned, 60.0);
    assert_eq!(summary.credits_in_progress, CREDITS);
    assert_eq!(summary.years_count, 2);
}

#[test]
fn test_missing_ledger_row_reads_as_zeros() {
    let (_tmp, conn, s) = setup();
    let ledger = CreditLedgerRepository::new(conn);

    let entry = ledger.get(&s.student_id, &s.year_id).unwrap();
    assert_eq!(entry.credits_earned, 0.0);
    assert_eq!(entry.credits_in_progress, 0.0);
    assert_eq!(entry.required_credits, 0.0);
}
