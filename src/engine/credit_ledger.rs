// ==========================================
// Credit ledger contribution rules and transition service
// ==========================================
// Contribution table (relative to the course's credit weight):
//   planned, active    -> (in_progress = credits, earned = 0)
//   completed          -> (in_progress = 0,       earned = credits)
//   failed, withdrawn  -> (0, 0)
//
// On every status transition the *difference* between old and new
// contributions is applied to the ledger, so repeated transitions
// (including corrections like active -> completed -> withdrawn) never
// double-count or lose credits.
// ==========================================

use crate::domain::types::CourseEnrollmentStatus;
use crate::repository::credit_ledger_repo::CreditLedgerRepository;
use crate::repository::enrollment_repo::EnrollmentRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};

/// (in_progress, earned) contribution of a status for a credit weight
pub fn credit_contribution(status: CourseEnrollmentStatus, credits: f64) -> (f64, f64) {
    match status {
        CourseEnrollmentStatus::Planned | CourseEnrollmentStatus::Active => (credits, 0.0),
        CourseEnrollmentStatus::Completed => (0.0, credits),
        CourseEnrollmentStatus::Failed | CourseEnrollmentStatus::Withdrawn => (0.0, 0.0),
    }
}

/// Ledger delta for a transition between two statuses of one course
/// enrollment, for the same credit weight
pub fn transition_delta(
    old_status: CourseEnrollmentStatus,
    new_status: CourseEnrollmentStatus,
    credits: f64,
) -> (f64, f64) {
    let (old_ip, old_earned) = credit_contribution(old_status, credits);
    let (new_ip, new_earned) = credit_contribution(new_status, credits);
    (new_ip - old_ip, new_earned - old_earned)
}

/// Applies course-enrollment status transitions together with their
/// ledger deltas, so the two can never drift apart
pub struct CourseEnrollmentService {
    enrollments: EnrollmentRepository,
    ledger: CreditLedgerRepository,
}

impl CourseEnrollmentService {
    pub fn new(enrollments: EnrollmentRepository, ledger: CreditLedgerRepository) -> Self {
        Self {
            enrollments,
            ledger,
        }
    }

    /// Transition one course enrollment and adjust the ledger by the
    /// contribution difference
    pub fn transition(
        &self,
        course_enrollment_id: &str,
        student_id: &str,
        academic_year_id: &str,
        old_status: CourseEnrollmentStatus,
        new_status: CourseEnrollmentStatus,
        course_credits: f64,
    ) -> RepositoryResult<()> {
        if old_status == new_status {
            return Ok(());
        }
        if course_credits < 0.0 {
            return Err(RepositoryError::ValidationError(format!(
                "course credits must be non-negative, got {}",
                course_credits
            )));
        }

        self.enrollments
            .update_course_enrollment_status(course_enrollment_id, new_status)?;

        let (ip_delta, earned_delta) = transition_delta(old_status, new_status, course_credits);
        if ip_delta != 0.0 || earned_delta != 0.0 {
            self.ledger
                .apply_delta(student_id, academic_year_id, ip_delta, earned_delta)?;
        }

        tracing::debug!(
            course_enrollment_id = course_enrollment_id,
            from = %old_status,
            to = %new_status,
            in_progress_delta = ip_delta,
            earned_delta = earned_delta,
            "course enrollment transitioned"
        );
        Ok(())
    }
}
