// ==========================================
// RuleEvaluator - class-wide rule evaluation
// ==========================================
// A pure read: evaluates one rule's condition tree against the cached
// promotion summary of every student in a class and partitions them
// into eligible / not eligible with explainable reasons. Never falls
// back to live facts computation; a missing summary row is reported
// as such, which forces an explicit refresh step and keeps evaluation
// cheap and deterministic.
// ==========================================

use crate::domain::facts::StudentPromotionFacts;
use crate::engine::condition;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::rule_repo::PromotionRuleRepository;
use crate::repository::student_repo::StudentRepository;
use crate::repository::summary_repo::PromotionSummaryRepository;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reason attached when a student has no cached summary row
pub const MISSING_SUMMARY_REASON: &str = "Promotion summary missing - refresh required";

/// One student's evaluation outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentEvaluation {
    pub student_id: String,
    pub registration_number: String,
    pub full_name: String,
    /// Facts the decision was based on; absent when the summary row
    /// was missing
    pub facts: Option<StudentPromotionFacts>,
    /// Why the student is not eligible; empty for eligible students
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// Result envelope of evaluating one rule against one class
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPromotionEvaluation {
    pub rule_id: String,
    pub rule_name: String,
    pub source_class_id: String,
    pub academic_year_id: String,
    pub eligible: Vec<StudentEvaluation>,
    pub not_eligible: Vec<StudentEvaluation>,
    pub eligible_count: u32,
    pub not_eligible_count: u32,
    pub total_students: u32,
    pub evaluated_at: DateTime<Utc>,
}

pub struct RuleEvaluator {
    rules: PromotionRuleRepository,
    students: StudentRepository,
    summaries: PromotionSummaryRepository,
}

impl RuleEvaluator {
    pub fn new(
        rules: PromotionRuleRepository,
        students: StudentRepository,
        summaries: PromotionSummaryRepository,
    ) -> Self {
        Self {
            rules,
            students,
            summaries,
        }
    }

    /// Evaluate one rule against every current student of a class
    ///
    /// Preconditions (rule exists and is active, class exists) fail
    /// the whole call; per-student problems degrade to not-eligible
    /// results and never abort the batch.
    pub fn evaluate_class(
        &self,
        rule_id: &str,
        source_class_id: &str,
        academic_year_id: &str,
    ) -> RepositoryResult<ClassPromotionEvaluation> {
        let rule = self.rules.get_by_id(rule_id)?;
        if !rule.is_active {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "promotion rule '{}' is inactive",
                rule.name
            )));
        }
        if !self.students.class_exists(source_class_id)? {
            return Err(RepositoryError::NotFound {
                entity: "Class".to_string(),
                id: source_class_id.to_string(),
            });
        }

        let roster = self.students.list_class_students(source_class_id)?;

        let mut eligible = Vec::new();
        let mut not_eligible = Vec::new();

        for student in &roster {
            let base = StudentEvaluation {
                student_id: student.student_id.clone(),
                registration_number: student.registration_number.clone(),
                full_name: student.full_name(),
                facts: None,
                reasons: Vec::new(),
            };

            match self.summaries.get(&student.student_id, academic_year_id) {
                Ok(Some(summary)) => {
                    let outcome = condition::evaluate(&rule.ruleset.conditions, &summary.facts);
                    if outcome.matched {
                        eligible.push(StudentEvaluation {
                            facts: Some(summary.facts),
                            ..base
                        });
                    } else {
                        not_eligible.push(StudentEvaluation {
                            facts: Some(summary.facts),
                            reasons: outcome.failed_conditions,
                            ..base
                        });
                    }
                }
                Ok(None) => {
                    not_eligible.push(StudentEvaluation {
                        reasons: vec![MISSING_SUMMARY_REASON.to_string()],
                        ..base
                    });
                }
                Err(e) => {
                    // a broken summary row affects only this student
                    tracing::warn!(
                        student_id = %student.student_id,
                        error = %e,
                        "promotion summary unreadable during evaluation"
                    );
                    not_eligible.push(StudentEvaluation {
                        reasons: vec![format!("Promotion summary unreadable: {}", e)],
                        ..base
                    });
                }
            }
        }

        let evaluation = ClassPromotionEvaluation {
            rule_id: rule.rule_id.clone(),
            rule_name: rule.name.clone(),
            source_class_id: source_class_id.to_string(),
            academic_year_id: academic_year_id.to_string(),
            eligible_count: eligible.len() as u32,
            not_eligible_count: not_eligible.len() as u32,
            total_students: roster.len() as u32,
            eligible,
            not_eligible,
            evaluated_at: Utc::now(),
        };

        tracing::info!(
            rule_id = rule_id,
            source_class_id = source_class_id,
            academic_year_id = academic_year_id,
            eligible = evaluation.eligible_count,
            not_eligible = evaluation.not_eligible_count,
            "class promotion evaluation completed"
        );

        Ok(evaluation)
    }
}
