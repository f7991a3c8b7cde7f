// ==========================================
// FactsBuilder - composes the promotion facts snapshot
// ==========================================
// Orchestrates transcript aggregation, the credit ledger and the
// enrollment history for one (student, academic year), then computes
// the derived composite indicators. Fails fast (NotFound) only when
// the student record itself is missing; every sub-aggregation
// tolerates missing data by returning zeros/empty maps.
// ==========================================

use crate::domain::facts::StudentPromotionFacts;
use crate::domain::types::{CourseEnrollmentStatus, GradingConfig, GRADE_SCALE_MAX};
use crate::engine::enrollment_history::EnrollmentHistoryReader;
use crate::engine::transcript::TranscriptAggregator;
use crate::repository::credit_ledger_repo::CreditLedgerRepository;
use crate::repository::enrollment_repo::EnrollmentRepository;
use crate::repository::error::RepositoryResult;
use crate::repository::student_repo::StudentRepository;
use chrono::Utc;

pub struct FactsBuilder {
    students: StudentRepository,
    transcripts: TranscriptAggregator,
    ledger: CreditLedgerRepository,
    history: EnrollmentHistoryReader,
    enrollments: EnrollmentRepository,
    config: GradingConfig,
}

impl FactsBuilder {
    pub fn new(
        students: StudentRepository,
        transcripts: TranscriptAggregator,
        ledger: CreditLedgerRepository,
        history: EnrollmentHistoryReader,
        enrollments: EnrollmentRepository,
        config: GradingConfig,
    ) -> Self {
        Self {
            students,
            transcripts,
            ledger,
            history,
            enrollments,
            config,
        }
    }

    /// Compute the full facts snapshot for one (student, academic year)
    pub fn build(
        &self,
        student_id: &str,
        academic_year_id: &str,
    ) -> RepositoryResult<StudentPromotionFacts> {
        // precondition: the student must exist
        let student = self.students.get_student(student_id)?;

        let transcript = self.transcripts.aggregate(student_id)?;
        let ledger_entry = self.ledger.get(student_id, academic_year_id)?;
        let ledger_totals = self.ledger.summarize_student(student_id)?;
        let history = self.history.summarize(student_id, academic_year_id)?;
        let course_enrollments = self
            .enrollments
            .list_course_enrollments(student_id, academic_year_id)?;

        // ===== attempt / retake statistics =====
        let mut credits_attempted = 0.0;
        let mut retake_count = 0;
        let mut max_attempt_number = 0;
        let mut failed_enrollments = 0;
        let mut withdrawn_enrollments = 0;
        for ce in &course_enrollments {
            credits_attempted += ce.course_credits;
            if ce.attempt_number > 1 {
                retake_count += 1;
            }
            if ce.attempt_number > max_attempt_number {
                max_attempt_number = ce.attempt_number;
            }
            match ce.status {
                CourseEnrollmentStatus::Failed => failed_enrollments += 1,
                CourseEnrollmentStatus::Withdrawn => withdrawn_enrollments += 1,
                _ => {}
            }
        }

        // ===== credit figures =====
        let credits_earned = ledger_entry.credits_earned;
        let credits_in_progress = ledger_entry.credits_in_progress;
        let required_credits = ledger_entry.required_credits;
        let credit_completion_rate = if required_credits > 0.0 {
            (credits_earned / required_credits).min(1.0)
        } else {
            0.0
        };
        let credit_deficit = (required_credits - credits_earned).max(0.0);
        let projected_credits = credits_earned + credits_in_progress;
        let can_reach_required_credits = projected_credits >= required_credits;

        let progression_rate = if history.active_years_count > 0 {
            ledger_totals.credits_earned / history.active_years_count as f64
        } else {
            0.0
        };

        // ===== derived composite indicators =====
        // Unclamped on purpose; assumes averages stay on the 0-20 scale.
        let performance_index = (transcript.overall_average / GRADE_SCALE_MAX) * 50.0
            + credit_completion_rate * 30.0
            + transcript.success_rate * 20.0;
        let is_on_track = credit_completion_rate >= self.config.on_track_completion_rate
            && transcript.overall_average >= self.config.passing_threshold;

        Ok(StudentPromotionFacts {
            student_id: student.student_id.clone(),
            registration_number: student.registration_number.clone(),
            full_name: student.full_name(),
            class_id: student.class_id.clone(),
            class_name: student.class_name.clone(),
            program_id: student.program_id.clone(),
            program_code: student.program_code.clone(),
            academic_year_id: academic_year_id.to_string(),

            overall_average: transcript.overall_average,
            overall_average_unweighted: transcript.overall_average_unweighted,

            average_by_course: transcript.average_by_course,
            average_by_teaching_unit: transcript.average_by_teaching_unit,

            highest_course_average: transcript.highest_course_average,
            lowest_course_average: transcript.lowest_course_average,
            courses_passed_count: transcript.courses_passed_count,
            courses_compensable_count: transcript.courses_compensable_count,
            courses_eliminatory_count: transcript.courses_eliminatory_count,
            courses_graded_count: transcript.courses_graded_count,
            exams_taken_count: transcript.exams_taken_count,
            grades_recorded_count: transcript.grades_recorded_count,

            courses_failed_count: transcript.courses_failed_count,
            teaching_units_graded_count: transcript.teaching_units_graded_count,
            teaching_units_validated_count: transcript.teaching_units_validated_count,
            teaching_units_failed_count: transcript.teaching_units_failed_count,

            success_rate: transcript.success_rate,
            teaching_unit_validation_rate: transcript.teaching_unit_validation_rate,

            credits_earned,
            credits_in_progress,
            credits_attempted,
            required_credits,
            credit_deficit,
            credit_completion_rate,
            projected_credits,
            can_reach_required_credits,

            total_credits_earned: ledger_totals.credits_earned,
            progression_rate,

            course_enrollments_count: course_enrollments.len() as u32,
            retake_count,
            max_attempt_number,
            failed_course_enrollments_count: failed_enrollments,
            withdrawn_course_enrollments_count: withdrawn_enrollments,

            enrollments_count: history.enrollments_count,
            completed_years_count: history.completed_years_count,
            active_years_count: history.active_years_count,
            prior_enrollments_count: history.prior_enrollments_count,

            performance_index,
            is_on_track,

            computed_at: Utc::now(),
        })
    }
}
