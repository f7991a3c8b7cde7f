// ==========================================
// SummaryRefreshService - the only write path to the summary cache
// ==========================================
// There is no invalidation-on-write anywhere else: staleness between
// explicit refreshes is accepted, and callers needing freshness must
// refresh before evaluating. A class refresh that fails partway
// leaves the rows already written; re-invoking is safe because each
// row is a full overwrite keyed by (student, year).
// ==========================================

use crate::domain::facts::StudentPromotionFacts;
use crate::engine::facts_builder::FactsBuilder;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::student_repo::StudentRepository;
use crate::repository::summary_repo::PromotionSummaryRepository;

pub struct SummaryRefreshService {
    facts_builder: FactsBuilder,
    summaries: PromotionSummaryRepository,
    students: StudentRepository,
}

impl SummaryRefreshService {
    pub fn new(
        facts_builder: FactsBuilder,
        summaries: PromotionSummaryRepository,
        students: StudentRepository,
    ) -> Self {
        Self {
            facts_builder,
            summaries,
            students,
        }
    }

    /// Recompute and overwrite one (student, year) summary row
    ///
    /// Returns the freshly computed facts.
    pub fn refresh_student(
        &self,
        student_id: &str,
        academic_year_id: &str,
    ) -> RepositoryResult<StudentPromotionFacts> {
        let facts = self.facts_builder.build(student_id, academic_year_id)?;
        self.summaries.upsert(&facts)?;

        tracing::debug!(
            student_id = student_id,
            academic_year_id = academic_year_id,
            overall_average = facts.overall_average,
            "promotion summary refreshed"
        );
        Ok(facts)
    }

    /// Refresh every current student of a class; returns the count
    ///
    /// Students are processed sequentially in a stable but unspecified
    /// order; callers must not rely on cross-student ordering.
    pub fn refresh_class(
        &self,
        class_id: &str,
        academic_year_id: &str,
    ) -> RepositoryResult<u32> {
        if !self.students.class_exists(class_id)? {
            return Err(RepositoryError::NotFound {
                entity: "Class".to_string(),
                id: class_id.to_string(),
            });
        }

        let roster = self.students.list_class_students(class_id)?;
        for student in &roster {
            self.refresh_student(&student.student_id, academic_year_id)?;
        }

        tracing::info!(
            class_id = class_id,
            academic_year_id = academic_year_id,
            student_count = roster.len(),
            "class promotion summaries refreshed"
        );
        Ok(roster.len() as u32)
    }
}
