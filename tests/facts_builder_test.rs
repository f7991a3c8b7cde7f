// ==========================================
// FactsBuilder / summary cache integration tests
// ==========================================

mod test_helpers;

use academic_promotion::api::{ApiError, SummariesApi};
use academic_promotion::domain::GradingConfig;
use academic_promotion::repository::{CreditLedgerRepository, PromotionSummaryRepository};
use test_helpers::*;

#[test]
fn test_facts_composition_and_derived_indicators() {
    let (_tmp, db_path) = create_test_db().expect("create test db");
    let conn = open_test_connection(&db_path).expect("open db");
    let s = {
        let guard = conn.lock().unwrap();
        seed_simple_scenario(&guard, 14.0, 6.0).expect("seed")
    };

    let ledger = CreditLedgerRepository::new(conn.clone());
    ledger.set_required_credits(&s.student_id, &s.year_id, 60.0).unwrap();
    ledger.apply_delta(&s.student_id, &s.year_id, 30.0, 30.0).unwrap();

    let api = SummariesApi::new(conn, GradingConfig::default());
    let facts = api.get_facts(&s.student_id, &s.year_id).unwrap();

    assert_eq!(facts.student_id, s.student_id);
    assert_eq!(facts.registration_number, "R-0001");
    assert_eq!(facts.class_name.as_deref(), Some("L1-A"));
    assert_eq!(facts.program_code.as_deref(), Some("CS"));

    assert!((facts.overall_average - 14.0).abs() < 1e-9);
    assert_eq!(facts.courses_graded_count, 1);
    assert!((facts.success_rate - 1.0).abs() < 1e-9);

    assert_eq!(facts.credits_earned, 30.0);
    assert_eq!(facts.credits_in_progress, 30.0);
    assert_eq!(facts.required_credits, 60.0);
    assert!((facts.credit_completion_rate - 0.5).abs() < 1e-9);
    assert_eq!(facts.credit_deficit, 30.0);
    assert_eq!(facts.projected_credits, 60.0);
    assert!(facts.can_reach_required_credits);

    // (14/20)*50 + 0.5*30 + 1.0*20 = 35 + 15 + 20
    assert!((facts.performance_index - 70.0).abs() < 1e-9);
    // completion rate 0.5 is below the 0.75 on-track floor
    assert!(!facts.is_on_track);

    // one active enrollment => one active year
    assert_eq!(facts.active_years_count, 1);
    assert!((facts.progression_rate - 30.0).abs() < 1e-9);
}

#[test]
fn test_unknown_student_fails_fast() {
    let (_tmp, db_path) = create_test_db().expect("create test db");
    let conn = open_test_connection(&db_path).expect("open db");
    {
        let guard = conn.lock().unwrap();
        insert_academic_year(&guard, "y2025", "2025-2026", 2025).unwrap();
    }

    let api = SummariesApi::new(conn, GradingConfig::default());
    let err = api.get_facts("ghost", "y2025").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_refresh_then_cache_read_matches_live_facts() {
    let (_tmp, db_path) = create_test_db().expect("create test db");
    let conn = open_test_connection(&db_path).expect("open db");
    let s = {
        let guard = conn.lock().unwrap();
        seed_simple_scenario(&guard, 12.5, 6.0).expect("seed")
    };

    let api = SummariesApi::new(conn.clone(), GradingConfig::default());
    let refreshed = api.refresh_student(&s.student_id, &s.year_id).unwrap();

    let cached = PromotionSummaryRepository::new(conn)
        .get(&s.student_id, &s.year_id)
        .unwrap()
        .expect("summary row must exist after refresh");

    let live = api.get_facts(&s.student_id, &s.year_id).unwrap();

    assert!((refreshed.overall_average - live.overall_average).abs() < 1e-9);
    assert!((cached.facts.overall_average - live.overall_average).abs() < 1e-9);
    assert!((cached.overall_average - live.overall_average).abs() < 1e-9);
    assert_eq!(cached.facts.courses_graded_count, live.courses_graded_count);
}

#[test]
fn test_refresh_class_counts_and_missing_cache_state() {
    let (_tmp, db_path) = create_test_db().expect("create test db");
    let conn = open_test_connection(&db_path).expect("open db");
    let s = {
        let guard = conn.lock().unwrap();
        let s = seed_simple_scenario(&guard, 11.0, 6.0).expect("seed");
        insert_student(&guard, "s2", "R-0002", Some("c1")).unwrap();
        s
    };

    let summaries = PromotionSummaryRepository::new(conn.clone());
    // no refresh yet: absence is a first-class state, not zero facts
    assert!(summaries.get(&s.student_id, &s.year_id).unwrap().is_none());

    let api = SummariesApi::new(conn, GradingConfig::default());
    let outcome = api.refresh_class(&s.class_id, &s.year_id).unwrap();
    assert_eq!(outcome.student_count, 2);

    assert!(summaries.get(&s.student_id, &s.year_id).unwrap().is_some());
    assert!(summaries.get("s2", &s.year_id).unwrap().is_some());
}

#[test]
fn test_corrupt_enrollment_timestamp_is_an_error_not_a_guess() {
    // a garbled enrolled_at must not be silently replaced: the history
    // read orders by it
    let (_tmp, db_path) = create_test_db().expect("create test db");
    let conn = open_test_connection(&db_path).expect("open db");
    let s = {
        let guard = conn.lock().unwrap();
        let s = seed_simple_scenario(&guard, 14.0, 6.0).expect("seed");
        guard
            .execute(
                "UPDATE enrollment SET enrolled_at = 'garbage' WHERE enrollment_id = 'en1'",
                [],
            )
            .unwrap();
        s
    };

    let api = SummariesApi::new(conn, GradingConfig::default());
    let err = api.get_facts(&s.student_id, &s.year_id).unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));
    assert!(err.to_string().contains("enrolled_at"));
}

#[test]
fn test_refresh_unknown_class_fails() {
    let (_tmp, db_path) = create_test_db().expect("create test db");
    let conn = open_test_connection(&db_path).expect("open db");
    {
        let guard = conn.lock().unwrap();
        insert_academic_year(&guard, "y2025", "2025-2026", 2025).unwrap();
    }

    let api = SummariesApi::new(conn, GradingConfig::default());
    let err = api.refresh_class("no-such-class", "y2025").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
