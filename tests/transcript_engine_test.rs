// ==========================================
// TranscriptAggregator integration tests
// ==========================================

mod test_helpers;

use academic_promotion::domain::GradingConfig;
use academic_promotion::engine::TranscriptAggregator;
use academic_promotion::repository::GradeRepository;
use test_helpers::*;

#[test]
fn test_weighted_average_from_database() {
    let (_tmp, db_path) = create_test_db().expect("create test db");
    let conn = open_test_connection(&db_path).expect("open db");

    {
        let guard = conn.lock().unwrap();
        insert_academic_year(&guard, "y2025", "2025-2026", 2025).unwrap();
        insert_class(&guard, "c1", "L1-A", None).unwrap();
        insert_student(&guard, "s1", "R-0001", Some("c1")).unwrap();
        insert_teaching_unit(&guard, "u1", "UE1", 6.0).unwrap();
        insert_course(&guard, "co1", "u1", "MATH101", 3.0).unwrap();
        insert_class_course(&guard, "cc1", "c1", "co1").unwrap();
        // 12 at 40%, 16 at 60% => 14.4 exactly
        insert_exam(&guard, "e1", "cc1", 40.0).unwrap();
        insert_exam(&guard, "e2", "cc1", 60.0).unwrap();
        insert_grade(&guard, "g1", "e1", "s1", 12.0).unwrap();
        insert_grade(&guard, "g2", "e2", "s1", 16.0).unwrap();
    }

    let aggregator = TranscriptAggregator::new(GradeRepository::new(conn), GradingConfig::default());
    let summary = aggregator.aggregate("s1").unwrap();

    let course = summary.average_by_course.get("co1").unwrap();
    assert!((course.average - 14.4).abs() < 0.005);
    assert_eq!(summary.courses_graded_count, 1);
    assert_eq!(summary.grades_recorded_count, 2);
    assert_eq!(summary.courses_passed_count, 1);
    assert!((summary.overall_average - 14.4).abs() < 0.005);
}

#[test]
fn test_multi_unit_aggregation() {
    let (_tmp, db_path) = create_test_db().expect("create test db");
    let conn = open_test_connection(&db_path).expect("open db");

    {
        let guard = conn.lock().unwrap();
        insert_academic_year(&guard, "y2025", "2025-2026", 2025).unwrap();
        insert_class(&guard, "c1", "L1-A", None).unwrap();
        insert_student(&guard, "s1", "R-0001", Some("c1")).unwrap();
        // unit u1 (6 credits): two courses scored 16 and 12
        insert_teaching_unit(&guard, "u1", "UE1", 6.0).unwrap();
        insert_course(&guard, "co1", "u1", "MATH101", 3.0).unwrap();
        insert_course(&guard, "co2", "u1", "PHYS101", 3.0).unwrap();
        // unit u2 (2 credits): one course scored 7 (eliminatory)
        insert_teaching_unit(&guard, "u2", "UE2", 2.0).unwrap();
        insert_course(&guard, "co3", "u2", "HIST101", 2.0).unwrap();

        for (cc, co, exam, grade, score) in [
            ("cc1", "co1", "e1", "g1", 16.0),
            ("cc2", "co2", "e2", "g2", 12.0),
            ("cc3", "co3", "e3", "g3", 7.0),
        ] {
            insert_class_course(&guard, cc, "c1", co).unwrap();
            insert_exam(&guard, exam, cc, 100.0).unwrap();
            insert_grade(&guard, grade, exam, "s1", score).unwrap();
        }
    }

    let aggregator = TranscriptAggregator::new(GradeRepository::new(conn), GradingConfig::default());
    let summary = aggregator.aggregate("s1").unwrap();

    // unit means: u1 = 14, u2 = 7
    let u1 = summary.average_by_teaching_unit.get("u1").unwrap();
    assert!((u1.average - 14.0).abs() < 1e-9);
    let u2 = summary.average_by_teaching_unit.get("u2").unwrap();
    assert!((u2.average - 7.0).abs() < 1e-9);
    assert_eq!(summary.teaching_units_validated_count, 1);
    assert_eq!(summary.teaching_units_failed_count, 1);

    // overall, weighted by unit credits:
    // (16*6 + 12*6 + 7*2) / (6+6+2) = 182/14 = 13.0
    assert!((summary.overall_average - 13.0).abs() < 1e-9);
    assert!((summary.overall_average_unweighted - 35.0 / 3.0).abs() < 1e-9);

    assert_eq!(summary.highest_course_average, 16.0);
    assert_eq!(summary.lowest_course_average, 7.0);
    assert_eq!(summary.courses_eliminatory_count, 1);
}

#[test]
fn test_student_with_no_grades_gets_zeroed_summary() {
    let (_tmp, db_path) = create_test_db().expect("create test db");
    let conn = open_test_connection(&db_path).expect("open db");

    {
        let guard = conn.lock().unwrap();
        insert_class(&guard, "c1", "L1-A", None).unwrap();
        insert_student(&guard, "s1", "R-0001", Some("c1")).unwrap();
    }

    let aggregator = TranscriptAggregator::new(GradeRepository::new(conn), GradingConfig::default());
    let summary = aggregator.aggregate("s1").unwrap();

    // "no data" is zero counts, not an error
    assert_eq!(summary.courses_graded_count, 0);
    assert_eq!(summary.overall_average, 0.0);
    assert!(summary.average_by_course.is_empty());
    assert!(summary.average_by_teaching_unit.is_empty());
}
