// ==========================================
// Academic Records Platform - student promotion facts
// ==========================================
// One flat value object per (student, academic year). Rule conditions
// address fields by their camelCase serde name, so the struct stays
// flat on purpose: nesting would force path-based fact lookup.
//
// Scale invariants: rates are in [0,1], scores are 0-20,
// performanceIndex is nominally 0-100 (unclamped; assumes 0-20 input).
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-course aggregate inside the facts snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAverage {
    pub average: f64,
    pub code: String,
    pub name: String,
    pub credits: f64,
    /// Sum of exam percentages contributing to the average; below 100
    /// means the course total is partial by design
    pub weight_covered_pct: f64,
}

/// Per-teaching-unit aggregate inside the facts snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeachingUnitAverage {
    pub average: f64,
    pub code: String,
    pub name: String,
    pub credits: f64,
    pub courses_count: u32,
}

/// Scalar value a rule condition can compare against
#[derive(Debug, Clone, PartialEq)]
pub enum FactValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

/// Full computed facts snapshot for one student in one academic year
///
/// Ephemeral: computed by the Facts Builder, persisted only as the
/// JSON body of a promotion summary row. Absent map entries mean
/// "no grade recorded", never zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPromotionFacts {
    // ===== identification =====
    pub student_id: String,
    pub registration_number: String,
    pub full_name: String,
    pub class_id: Option<String>,
    pub class_name: Option<String>,
    pub program_id: Option<String>,
    pub program_code: Option<String>,
    pub academic_year_id: String,

    // ===== averages =====
    /// Credit-weighted across teaching units (0-20)
    pub overall_average: f64,
    /// Simple mean of all course scores (0-20)
    pub overall_average_unweighted: f64,

    // ===== per-entity averages =====
    pub average_by_course: HashMap<String, CourseAverage>,
    pub average_by_teaching_unit: HashMap<String, TeachingUnitAverage>,

    // ===== score extremes and distribution =====
    pub highest_course_average: f64,
    pub lowest_course_average: f64,
    pub courses_passed_count: u32,
    pub courses_compensable_count: u32,
    pub courses_eliminatory_count: u32,
    pub courses_graded_count: u32,
    pub exams_taken_count: u32,
    pub grades_recorded_count: u32,

    // ===== failures and validations =====
    pub courses_failed_count: u32,
    pub teaching_units_graded_count: u32,
    pub teaching_units_validated_count: u32,
    pub teaching_units_failed_count: u32,

    // ===== success rates =====
    pub success_rate: f64,
    pub teaching_unit_validation_rate: f64,

    // ===== credits (evaluated year) =====
    pub credits_earned: f64,
    pub credits_in_progress: f64,
    pub credits_attempted: f64,
    pub required_credits: f64,
    pub credit_deficit: f64,
    pub credit_completion_rate: f64,
    pub projected_credits: f64,
    pub can_reach_required_credits: bool,

    // ===== credits (lifetime) =====
    pub total_credits_earned: f64,
    pub progression_rate: f64,

    // ===== attempt / retake statistics (evaluated year) =====
    pub course_enrollments_count: u32,
    pub retake_count: u32,
    pub max_attempt_number: u32,
    pub failed_course_enrollments_count: u32,
    pub withdrawn_course_enrollments_count: u32,

    // ===== enrollment history =====
    pub enrollments_count: u32,
    pub completed_years_count: u32,
    pub active_years_count: u32,
    pub prior_enrollments_count: u32,

    // ===== derived composite indicators =====
    /// (overallAverage/20)*50 + creditCompletionRate*30 + successRate*20
    pub performance_index: f64,
    pub is_on_track: bool,

    pub computed_at: DateTime<Utc>,
}

impl StudentPromotionFacts {
    /// Flat fact lookup by the camelCase name rule conditions use
    ///
    /// Returns None for unknown names; the condition interpreter treats
    /// that as "condition false", not as an error.
    pub fn fact(&self, name: &str) -> Option<FactValue> {
        use FactValue::{Bool, Number, Text};
        let v = match name {
            "studentId" => Text(self.student_id.clone()),
            "registrationNumber" => Text(self.registration_number.clone()),
            "fullName" => Text(self.full_name.clone()),
            "classId" => Text(self.class_id.clone()?),
            "className" => Text(self.class_name.clone()?),
            "programId" => Text(self.program_id.clone()?),
            "programCode" => Text(self.program_code.clone()?),
            "academicYearId" => Text(self.academic_year_id.clone()),

            "overallAverage" => Number(self.overall_average),
            "overallAverageUnweighted" => Number(self.overall_average_unweighted),

            "highestCourseAverage" => Number(self.highest_course_average),
            "lowestCourseAverage" => Number(self.lowest_course_average),
            "coursesPassedCount" => Number(self.courses_passed_count as f64),
            "coursesCompensableCount" => Number(self.courses_compensable_count as f64),
            "coursesEliminatoryCount" => Number(self.courses_eliminatory_count as f64),
            "coursesGradedCount" => Number(self.courses_graded_count as f64),
            "examsTakenCount" => Number(self.exams_taken_count as f64),
            "gradesRecordedCount" => Number(self.grades_recorded_count as f64),

            "coursesFailedCount" => Number(self.courses_failed_count as f64),
            "teachingUnitsGradedCount" => Number(self.teaching_units_graded_count as f64),
            "teachingUnitsValidatedCount" => Number(self.teaching_units_validated_count as f64),
            "teachingUnitsFailedCount" => Number(self.teaching_units_failed_count as f64),

            "successRate" => Number(self.success_rate),
            "teachingUnitValidationRate" => Number(self.teaching_unit_validation_rate),

            "creditsEarned" => Number(self.credits_earned),
            "creditsInProgress" => Number(self.credits_in_progress),
            "creditsAttempted" => Number(self.credits_attempted),
            "requiredCredits" => Number(self.required_credits),
            "creditDeficit" => Number(self.credit_deficit),
            "creditCompletionRate" => Number(self.credit_completion_rate),
            "projectedCredits" => Number(self.projected_credits),
            "canReachRequiredCredits" => Bool(self.can_reach_required_credits),

            "totalCreditsEarned" => Number(self.total_credits_earned),
            "progressionRate" => Number(self.progression_rate),

            "courseEnrollmentsCount" => Number(self.course_enrollments_count as f64),
            "retakeCount" => Number(self.retake_count as f64),
            "maxAttemptNumber" => Number(self.max_attempt_number as f64),
            "failedCourseEnrollmentsCount" => Number(self.failed_course_enrollments_count as f64),
            "withdrawnCourseEnrollmentsCount" => {
                Number(self.withdrawn_course_enrollments_count as f64)
            }

            "enrollmentsCount" => Number(self.enrollments_count as f64),
            "completedYearsCount" => Number(self.completed_years_count as f64),
            "activeYearsCount" => Number(self.active_years_count as f64),
            "priorEnrollmentsCount" => Number(self.prior_enrollments_count as f64),

            "performanceIndex" => Number(self.performance_index),
            "isOnTrack" => Bool(self.is_on_track),

            _ => return None,
        };
        Some(v)
    }
}
