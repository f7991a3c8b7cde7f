// ==========================================
// TranscriptAggregator - per-course / per-unit averages
// ==========================================
// Course score is a weighted contribution, Σ(score × percentage/100),
// across the course's exams. A course whose exams total less than
// 100% yields a partial score; that is the documented behavior, not
// something to silently correct here.
// ==========================================

use crate::domain::facts::{CourseAverage, TeachingUnitAverage};
use crate::domain::types::{GradeBand, GradingConfig};
use crate::repository::error::RepositoryResult;
use crate::repository::grade_repo::{GradeRepository, GradedExamRow};
use std::collections::HashMap;

/// Aggregated transcript of one student
///
/// "No data" and "data below threshold" stay distinguishable: callers
/// check `courses_graded_count`, never a zero average.
#[derive(Debug, Clone, Default)]
pub struct TranscriptSummary {
    pub average_by_course: HashMap<String, CourseAverage>,
    pub average_by_teaching_unit: HashMap<String, TeachingUnitAverage>,

    /// Credit-weighted across teaching units:
    /// Σ(courseScore × unitCredits) / Σ(unitCredits)
    pub overall_average: f64,
    /// Simple mean of all course scores
    pub overall_average_unweighted: f64,

    pub highest_course_average: f64,
    pub lowest_course_average: f64,

    pub courses_graded_count: u32,
    pub exams_taken_count: u32,
    pub grades_recorded_count: u32,
    pub courses_passed_count: u32,
    pub courses_compensable_count: u32,
    pub courses_eliminatory_count: u32,
    pub courses_failed_count: u32,

    pub teaching_units_graded_count: u32,
    pub teaching_units_validated_count: u32,
    pub teaching_units_failed_count: u32,

    pub success_rate: f64,
    pub teaching_unit_validation_rate: f64,
}

pub struct TranscriptAggregator {
    grades: GradeRepository,
    config: GradingConfig,
}

impl TranscriptAggregator {
    pub fn new(grades: GradeRepository, config: GradingConfig) -> Self {
        Self { grades, config }
    }

    /// Aggregate the full transcript of one student
    pub fn aggregate(&self, student_id: &str) -> RepositoryResult<TranscriptSummary> {
        let rows = self.grades.list_graded_exams(student_id)?;
        Ok(aggregate_rows(&rows, &self.config))
    }
}

/// Pure aggregation over pre-joined grade rows
pub fn aggregate_rows(rows: &[GradedExamRow], config: &GradingConfig) -> TranscriptSummary {
    if rows.is_empty() {
        return TranscriptSummary::default();
    }

    // per-course weighted contributions
    struct CourseAcc {
        code: String,
        name: String,
        credits: f64,
        unit_id: String,
        unit_code: String,
        unit_name: String,
        unit_credits: f64,
        score: f64,
        weight_pct: f64,
        exams: u32,
    }

    let mut courses: HashMap<String, CourseAcc> = HashMap::new();
    for row in rows {
        let acc = courses.entry(row.course_id.clone()).or_insert(CourseAcc {
            code: row.course_code.clone(),
            name: row.course_name.clone(),
            credits: row.course_credits,
            unit_id: row.teaching_unit_id.clone(),
            unit_code: row.teaching_unit_code.clone(),
            unit_name: row.teaching_unit_name.clone(),
            unit_credits: row.teaching_unit_credits,
            score: 0.0,
            weight_pct: 0.0,
            exams: 0,
        });
        acc.score += row.score * row.exam_percentage / 100.0;
        acc.weight_pct += row.exam_percentage;
        acc.exams += 1;
    }

    let mut summary = TranscriptSummary {
        grades_recorded_count: rows.len() as u32,
        exams_taken_count: rows.len() as u32,
        courses_graded_count: courses.len() as u32,
        lowest_course_average: f64::MAX,
        ..Default::default()
    };

    // per-teaching-unit arithmetic mean of course scores (unweighted
    // by credit at this level)
    struct UnitAcc {
        code: String,
        name: String,
        credits: f64,
        score_sum: f64,
        courses: u32,
    }
    let mut units: HashMap<String, UnitAcc> = HashMap::new();

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let mut plain_sum = 0.0;

    for (course_id, acc) in &courses {
        summary.average_by_course.insert(
            course_id.clone(),
            CourseAverage {
                average: acc.score,
                code: acc.code.clone(),
                name: acc.name.clone(),
                credits: acc.credits,
                weight_covered_pct: acc.weight_pct,
            },
        );

        match GradeBand::classify(acc.score, config) {
            GradeBand::Passed => summary.courses_passed_count += 1,
            GradeBand::Compensable => summary.courses_compensable_count += 1,
            GradeBand::Eliminatory => summary.courses_eliminatory_count += 1,
        }

        if acc.score > summary.highest_course_average {
            summary.highest_course_average = acc.score;
        }
        if acc.score < summary.lowest_course_average {
            summary.lowest_course_average = acc.score;
        }

        weighted_sum += acc.score * acc.unit_credits;
        weight_total += acc.unit_credits;
        plain_sum += acc.score;

        let unit = units.entry(acc.unit_id.clone()).or_insert(UnitAcc {
            code: acc.unit_code.clone(),
            name: acc.unit_name.clone(),
            credits: acc.unit_credits,
            score_sum: 0.0,
            courses: 0,
        });
        unit.score_sum += acc.score;
        unit.courses += 1;
    }

    summary.courses_failed_count =
        summary.courses_compensable_count + summary.courses_eliminatory_count;

    for (unit_id, acc) in &units {
        let average = acc.score_sum / acc.courses as f64;
        summary.average_by_teaching_unit.insert(
            unit_id.clone(),
            TeachingUnitAverage {
                average,
                code: acc.code.clone(),
                name: acc.name.clone(),
                credits: acc.credits,
                courses_count: acc.courses,
            },
        );
        if average >= config.passing_threshold {
            summary.teaching_units_validated_count += 1;
        } else {
            summary.teaching_units_failed_count += 1;
        }
    }
    summary.teaching_units_graded_count = units.len() as u32;

    summary.overall_average = if weight_total > 0.0 {
        weighted_sum / weight_total
    } else {
        0.0
    };
    summary.overall_average_unweighted = plain_sum / courses.len() as f64;

    summary.success_rate = summary.courses_passed_count as f64 / courses.len() as f64;
    summary.teaching_unit_validation_rate =
        summary.teaching_units_validated_count as f64 / units.len() as f64;

    if summary.lowest_course_average == f64::MAX {
        summary.lowest_course_average = 0.0;
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        course_id: &str,
        unit_id: &str,
        unit_credits: f64,
        exam_id: &str,
        pct: f64,
        score: f64,
    ) -> GradedExamRow {
        GradedExamRow {
            grade_id: format!("g-{}", exam_id),
            exam_id: exam_id.to_string(),
            exam_percentage: pct,
            score,
            course_id: course_id.to_string(),
            course_code: course_id.to_uppercase(),
            course_name: format!("Course {}", course_id),
            course_credits: 3.0,
            teaching_unit_id: unit_id.to_string(),
            teaching_unit_code: unit_id.to_uppercase(),
            teaching_unit_name: format!("Unit {}", unit_id),
            teaching_unit_credits: unit_credits,
        }
    }

    #[test]
    fn test_weighted_course_score() {
        // 12 at 40% plus 16 at 60% => 14.4 exactly
        let rows = vec![
            row("c1", "u1", 6.0, "e1", 40.0, 12.0),
            row("c1", "u1", 6.0, "e2", 60.0, 16.0),
        ];
        let summary = aggregate_rows(&rows, &GradingConfig::default());
        let course = summary.average_by_course.get("c1").unwrap();
        assert!((course.average - 14.4).abs() < 1e-9);
        assert!((course.weight_covered_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_exam_weight_yields_partial_score() {
        // single exam at 40% stays a partial contribution by design
        let rows = vec![row("c1", "u1", 6.0, "e1", 40.0, 15.0)];
        let summary = aggregate_rows(&rows, &GradingConfig::default());
        let course = summary.average_by_course.get("c1").unwrap();
        assert!((course.average - 6.0).abs() < 1e-9);
        assert!((course.weight_covered_pct - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_grades_returns_zeroed_summary() {
        let summary = aggregate_rows(&[], &GradingConfig::default());
        assert_eq!(summary.courses_graded_count, 0);
        assert_eq!(summary.overall_average, 0.0);
        assert!(summary.average_by_course.is_empty());
    }

    #[test]
    fn test_overall_average_credit_weighted_across_units() {
        // unit u1 (credits 6): course 16; unit u2 (credits 2): course 8
        // weighted: (16*6 + 8*2) / 8 = 14; unweighted: 12
        let rows = vec![
            row("c1", "u1", 6.0, "e1", 100.0, 16.0),
            row("c2", "u2", 2.0, "e2", 100.0, 8.0),
        ];
        let summary = aggregate_rows(&rows, &GradingConfig::default());
        assert!((summary.overall_average - 14.0).abs() < 1e-9);
        assert!((summary.overall_average_unweighted - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_band_counts_and_rates() {
        let rows = vec![
            row("c1", "u1", 3.0, "e1", 100.0, 14.0), // passed
            row("c2", "u1", 3.0, "e2", 100.0, 9.0),  // compensable
            row("c3", "u2", 3.0, "e3", 100.0, 5.0),  // eliminatory
        ];
        let summary = aggregate_rows(&rows, &GradingConfig::default());
        assert_eq!(summary.courses_passed_count, 1);
        assert_eq!(summary.courses_compensable_count, 1);
        assert_eq!(summary.courses_eliminatory_count, 1);
        assert_eq!(summary.courses_failed_count, 2);
        assert!((summary.success_rate - 1.0 / 3.0).abs() < 1e-9);
        // u1 mean 11.5 validated, u2 mean 5.0 failed
        assert_eq!(summary.teaching_units_validated_count, 1);
        assert_eq!(summary.teaching_units_failed_count, 1);
        assert!((summary.teaching_unit_validation_rate - 0.5).abs() < 1e-9);
    }
}
