// ==========================================
// PromotionExecutor - batch class transfer with audit trail
// ==========================================
// Applies an admin-approved promotion list: per student, close the
// source enrollment context, create the target enrollment for the
// next academic year, and transfer the student. Each student's writes
// run in their own transaction; one student's failure never rolls
// back students already committed. The execution record itself is
// written once, after the loop, summarizing the batch.
//
// Re-running the same batch is NOT idempotent: it will re-close and
// re-create enrollments. Left as-is pending a product decision.
// ==========================================

use crate::domain::execution::{
    PromotionExecution, PromotionExecutionDetails, PromotionExecutionResult,
};
use crate::domain::student::{AcademicYear, StudentRecord};
use crate::domain::types::{CourseEnrollmentStatus, EnrollmentStatus};
use crate::engine::credit_ledger::transition_delta;
use crate::repository::enrollment_repo::EnrollmentRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::execution_repo::PromotionExecutionRepository;
use crate::repository::rule_repo::PromotionRuleRepository;
use crate::repository::student_repo::StudentRepository;
use crate::repository::summary_repo::PromotionSummaryRepository;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Input of one applyPromotion call
#[derive(Debug, Clone)]
pub struct ApplyPromotionRequest {
    pub source_class_id: String,
    pub target_class_id: String,
    pub rule_id: String,
    pub academic_year_id: String,
    pub student_ids: Vec<String>,
    pub executed_by: String,
}

pub struct PromotionExecutor {
    conn: Arc<Mutex<Connection>>,
    students: StudentRepository,
    enrollments: EnrollmentRepository,
    rules: PromotionRuleRepository,
    summaries: PromotionSummaryRepository,
    executions: PromotionExecutionRepository,
}

impl PromotionExecutor {
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        students: StudentRepository,
        enrollments: EnrollmentRepository,
        rules: PromotionRuleRepository,
        summaries: PromotionSummaryRepository,
        executions: PromotionExecutionRepository,
    ) -> Self {
        Self {
            conn,
            students,
            enrollments,
            rules,
            summaries,
            executions,
        }
    }

    /// Apply a promotion batch and persist the audit trail
    ///
    /// Whole-call preconditions (rule, classes, next academic year)
    /// fail before any per-student work; per-student validation
    /// failures become failed result rows instead.
    pub fn apply_promotion(
        &self,
        request: &ApplyPromotionRequest,
    ) -> RepositoryResult<PromotionExecutionDetails> {
        // ===== whole-call preconditions =====
        let rule = self.rules.get_by_id(&request.rule_id)?;
        if !self.students.class_exists(&request.source_class_id)? {
            return Err(RepositoryError::NotFound {
                entity: "Class".to_string(),
                id: request.source_class_id.clone(),
            });
        }
        if !self.students.class_exists(&request.target_class_id)? {
            return Err(RepositoryError::NotFound {
                entity: "Class".to_string(),
                id: request.target_class_id.clone(),
            });
        }
        let next_year = self
            .students
            .next_academic_year(&request.academic_year_id)?
            .ok_or_else(|| {
                RepositoryError::BusinessRuleViolation(format!(
                    "no academic year follows '{}'; create it before promoting",
                    request.academic_year_id
                ))
            })?;

        let execution_id = Uuid::new_v4().to_string();
        let mut results = Vec::with_capacity(request.student_ids.len());

        // sequential on purpose: keeps ledger delta application
        // race-free without per-row locks
        for student_id in &request.student_ids {
            let result = self.promote_one(student_id, request, &next_year);
            let (was_promoted, reasons) = match result {
                Ok(()) => (true, Vec::new()),
                Err(reasons) => (false, reasons),
            };

            // best effort: attach the facts snapshot the decision used
            let facts = self
                .summaries
                .get(student_id, &request.academic_year_id)
                .ok()
                .flatten()
                .map(|row| row.facts);

            results.push(PromotionExecutionResult {
                result_id: Uuid::new_v4().to_string(),
                execution_id: execution_id.clone(),
                student_id: student_id.clone(),
                was_promoted,
                reasons,
                facts,
            });
        }

        let execution = PromotionExecution {
            execution_id,
            rule_id: rule.rule_id.clone(),
            source_class_id: request.source_class_id.clone(),
            target_class_id: request.target_class_id.clone(),
            academic_year_id: request.academic_year_id.clone(),
            executed_by: request.executed_by.clone(),
            executed_at: Utc::now(),
        };
        self.executions.insert_execution(&execution, &results)?;

        let promoted_count = results.iter().filter(|r| r.was_promoted).count() as u32;
        let failed_count = results.len() as u32 - promoted_count;

        tracing::info!(
            execution_id = %execution.execution_id,
            rule_id = %execution.rule_id,
            source_class_id = %execution.source_class_id,
            target_class_id = %execution.target_class_id,
            promoted = promoted_count,
            failed = failed_count,
            "promotion batch applied"
        );

        Ok(PromotionExecutionDetails {
            execution,
            results,
            promoted_count,
            failed_count,
        })
    }

    /// Validate and promote a single student
    ///
    /// Err carries the reasons recorded on the failed result row.
    fn promote_one(
        &self,
        student_id: &str,
        request: &ApplyPromotionRequest,
        next_year: &AcademicYear,
    ) -> Result<(), Vec<String>> {
        // ===== per-student validation (reads, no guard held) =====
        let student = match self.students.get_student(student_id) {
            Ok(s) => s,
            Err(RepositoryError::NotFound { .. }) => {
                return Err(vec![format!("student '{}' does not exist", student_id)]);
            }
            Err(e) => return Err(vec![format!("student lookup failed: {}", e)]),
        };

        if student.class_id.as_deref() != Some(request.source_class_id.as_str()) {
            return Err(vec![format!(
                "student '{}' is not in source class '{}'",
                student.registration_number, request.source_class_id
            )]);
        }

        match self
            .enrollments
            .enrollment_exists(student_id, &request.target_class_id)
        {
            Ok(true) => {
                return Err(vec![format!(
                    "student '{}' is already enrolled in target class '{}'",
                    student.registration_number, request.target_class_id
                )]);
            }
            Ok(false) => {}
            Err(e) => return Err(vec![format!("target enrollment check failed: {}", e)]),
        }

        let active_enrollment = self
            .enrollments
            .get_active_enrollment(student_id, &request.source_class_id)
            .map_err(|e| vec![format!("source enrollment lookup failed: {}", e)])?;

        let open_courses = match &active_enrollment {
            Some(enrollment) => self
                .enrollments
                .list_open_course_enrollments(&enrollment.enrollment_id)
                .map_err(|e| vec![format!("course enrollment lookup failed: {}", e)])?,
            None => Vec::new(),
        };

        // ===== per-student transaction (writes) =====
        self.apply_student_writes(&student, request, next_year, active_enrollment.as_ref().map(|e| e.enrollment_id.as_str()), &open_courses)
            .map_err(|e| vec![format!("promotion write failed: {}", e)])
    }

    fn apply_student_writes(
        &self,
        student: &StudentRecord,
        request: &ApplyPromotionRequest,
        next_year: &AcademicYear,
        active_enrollment_id: Option<&str>,
        open_courses: &[crate::repository::enrollment_repo::CourseEnrollmentRow],
    ) -> RepositoryResult<()> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        // close open course enrollments and settle their credits
        for course in open_courses {
            tx.execute(
                "UPDATE course_enrollment SET status = ?2, updated_at = ?3 WHERE course_enrollment_id = ?1",
                params![
                    course.course_enrollment_id,
                    CourseEnrollmentStatus::Completed.as_str(),
                    now,
                ],
            )?;

            let (ip_delta, earned_delta) = transition_delta(
                course.status,
                CourseEnrollmentStatus::Completed,
                course.course_credits,
            );
            tx.execute(
                r#"
                INSERT INTO credit_ledger (
                    student_id, academic_year_id,
                    credits_earned, credits_in_progress, required_credits, updated_at
                ) VALUES (?1, ?2, ?4, ?3, 0, ?5)
                ON CONFLICT(student_id, academic_year_id) DO UPDATE SET
                    credits_earned = credits_earned + excluded.credits_earned,
                    credits_in_progress = credits_in_progress + excluded.credits_in_progress,
                    updated_at = excluded.updated_at
                "#,
                params![
                    course.student_id,
                    course.academic_year_id,
                    ip_delta,
                    earned_delta,
                    now,
                ],
            )?;
        }

        // close the source enrollment
        if let Some(enrollment_id) = active_enrollment_id {
            tx.execute(
                "UPDATE enrollment SET status = ?2, closed_at = ?3 WHERE enrollment_id = ?1",
                params![enrollment_id, EnrollmentStatus::Completed.as_str(), now],
            )?;
        }

        // open the target enrollment in the next academic year
        tx.execute(
            r#"
            INSERT INTO enrollment (
                enrollment_id, student_id, class_id, academic_year_id,
                status, enrolled_at, closed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)
            "#,
            params![
                Uuid::new_v4().to_string(),
                student.student_id,
                request.target_class_id,
                next_year.academic_year_id,
                EnrollmentStatus::Active.as_str(),
                now,
            ],
        )?;

        // transfer the student to the target class
        tx.execute(
            "UPDATE student SET class_id = ?2 WHERE student_id = ?1",
            params![student.student_id, request.target_class_id],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }
}
