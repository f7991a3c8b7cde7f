// ==========================================
// EnrollmentHistoryReader - enrollment counters
// ==========================================

use crate::domain::student::EnrollmentHistorySummary;
use crate::domain::types::EnrollmentStatus;
use crate::repository::enrollment_repo::EnrollmentRepository;
use crate::repository::error::RepositoryResult;

pub struct EnrollmentHistoryReader {
    enrollments: EnrollmentRepository,
}

impl EnrollmentHistoryReader {
    pub fn new(enrollments: EnrollmentRepository) -> Self {
        Self { enrollments }
    }

    /// Summarize a student's enrollment records into counters
    ///
    /// `academic_year_id` is the year under evaluation; enrollments in
    /// other years count as prior enrollments.
    pub fn summarize(
        &self,
        student_id: &str,
        academic_year_id: &str,
    ) -> RepositoryResult<EnrollmentHistorySummary> {
        let records = self.enrollments.list_for_student(student_id)?;

        let mut summary = EnrollmentHistorySummary::default();
        for record in &records {
            summary.enrollments_count += 1;
            match record.status {
                EnrollmentStatus::Completed => summary.completed_years_count += 1,
                EnrollmentStatus::Active => summary.active_years_count += 1,
                EnrollmentStatus::Withdrawn => summary.withdrawn_years_count += 1,
            }
            if record.academic_year_id != academic_year_id {
                summary.prior_enrollments_count += 1;
            }
        }

        Ok(summary)
    }
}
