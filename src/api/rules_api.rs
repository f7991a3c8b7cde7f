// ==========================================
// RulesApi - promotion rule CRUD, evaluation and execution
// ==========================================
// The procedure-call boundary for the `rules.*` contract. The caller
// guarantees only privileged actors reach these operations; no
// authorization happens here.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::execution::{PromotionExecution, PromotionExecutionDetails};
use crate::domain::rule::{
    validate_ruleset, NewPromotionRule, PromotionRule, PromotionRuleUpdate,
};
use crate::engine::evaluator::{ClassPromotionEvaluation, RuleEvaluator};
use crate::engine::executor::{ApplyPromotionRequest, PromotionExecutor};
use crate::repository::execution_repo::PromotionExecutionRepository;
use crate::repository::rule_repo::PromotionRuleRepository;
use crate::repository::student_repo::StudentRepository;
use crate::repository::summary_repo::PromotionSummaryRepository;
use crate::repository::enrollment_repo::EnrollmentRepository;
use chrono::Utc;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub struct RulesApi {
    rules: PromotionRuleRepository,
    executions: PromotionExecutionRepository,
    evaluator: RuleEvaluator,
    executor: PromotionExecutor,
}

impl RulesApi {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        let rules = PromotionRuleRepository::new(conn.clone());
        let executions = PromotionExecutionRepository::new(conn.clone());
        let evaluator = RuleEvaluator::new(
            PromotionRuleRepository::new(conn.clone()),
            StudentRepository::new(conn.clone()),
            PromotionSummaryRepository::new(conn.clone()),
        );
        let executor = PromotionExecutor::new(
            conn.clone(),
            StudentRepository::new(conn.clone()),
            EnrollmentRepository::new(conn.clone()),
            PromotionRuleRepository::new(conn.clone()),
            PromotionSummaryRepository::new(conn.clone()),
            PromotionExecutionRepository::new(conn),
        );
        Self {
            rules,
            executions,
            evaluator,
            executor,
        }
    }

    // ==========================================
    // rule CRUD
    // ==========================================

    /// rules.create
    pub fn create(&self, input: NewPromotionRule) -> ApiResult<PromotionRule> {
        if input.name.trim().is_empty() {
            return Err(ApiError::ValidationError(
                "rule name must not be empty".to_string(),
            ));
        }
        validate_ruleset(&input.ruleset).map_err(ApiError::ValidationError)?;

        let now = Utc::now();
        let rule = PromotionRule {
            rule_id: Uuid::new_v4().to_string(),
            name: input.name,
            description: input.description,
            source_class_id: input.source_class_id,
            program_id: input.program_id,
            cycle_level_id: input.cycle_level_id,
            ruleset: input.ruleset,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        self.rules.insert(&rule)?;

        tracing::info!(rule_id = %rule.rule_id, name = %rule.name, "promotion rule created");
        Ok(rule)
    }

    /// rules.update
    ///
    /// Rules referenced by an execution record are immutable; this is
    /// enforced here at the service layer, not in the schema.
    pub fn update(&self, rule_id: &str, update: PromotionRuleUpdate) -> ApiResult<PromotionRule> {
        let mut rule = self.rules.get_by_id(rule_id)?;

        if self.rules.is_referenced_by_execution(rule_id)? {
            return Err(ApiError::Conflict(format!(
                "rule '{}' is referenced by an execution record and can no longer be modified",
                rule.name
            )));
        }

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(ApiError::ValidationError(
                    "rule name must not be empty".to_string(),
                ));
            }
            rule.name = name;
        }
        if let Some(description) = update.description {
            rule.description = Some(description);
        }
        if let Some(source_class_id) = update.source_class_id {
            rule.source_class_id = Some(source_class_id);
        }
        if let Some(program_id) = update.program_id {
            rule.program_id = Some(program_id);
        }
        if let Some(cycle_level_id) = update.cycle_level_id {
            rule.cycle_level_id = Some(cycle_level_id);
        }
        if let Some(ruleset) = update.ruleset {
            validate_ruleset(&ruleset).map_err(ApiError::ValidationError)?;
            rule.ruleset = ruleset;
        }
        if let Some(is_active) = update.is_active {
            rule.is_active = is_active;
        }
        rule.updated_at = Utc::now();

        self.rules.update(&rule)?;
        Ok(rule)
    }

    /// rules.delete
    pub fn delete(&self, rule_id: &str) -> ApiResult<()> {
        let rule = self.rules.get_by_id(rule_id)?;
        if self.rules.is_referenced_by_execution(rule_id)? {
            return Err(ApiError::Conflict(format!(
                "rule '{}' is referenced by an execution record and cannot be deleted",
                rule.name
            )));
        }
        self.rules.delete(rule_id)?;
        tracing::info!(rule_id = rule_id, "promotion rule deleted");
        Ok(())
    }

    /// rules.getById
    pub fn get_by_id(&self, rule_id: &str) -> ApiResult<PromotionRule> {
        Ok(self.rules.get_by_id(rule_id)?)
    }

    /// rules.list
    pub fn list(&self) -> ApiResult<Vec<PromotionRule>> {
        Ok(self.rules.list()?)
    }

    // ==========================================
    // evaluation and execution
    // ==========================================

    /// rules.evaluateClass - pure read, never mutates data
    pub fn evaluate_class(
        &self,
        source_class_id: &str,
        rule_id: &str,
        academic_year_id: &str,
    ) -> ApiResult<ClassPromotionEvaluation> {
        Ok(self
            .evaluator
            .evaluate_class(rule_id, source_class_id, academic_year_id)?)
    }

    /// rules.applyPromotion
    pub fn apply_promotion(
        &self,
        request: ApplyPromotionRequest,
    ) -> ApiResult<PromotionExecutionDetails> {
        if request.student_ids.is_empty() {
            return Err(ApiError::ValidationError(
                "student id list must not be empty".to_string(),
            ));
        }
        if request.source_class_id == request.target_class_id {
            return Err(ApiError::ValidationError(
                "source and target class must differ".to_string(),
            ));
        }
        Ok(self.executor.apply_promotion(&request)?)
    }

    /// rules.listExecutions
    pub fn list_executions(&self) -> ApiResult<Vec<PromotionExecution>> {
        Ok(self.executions.list_executions()?)
    }

    /// rules.getExecutionDetails
    pub fn get_execution_details(&self, execution_id: &str) -> ApiResult<PromotionExecutionDetails> {
        let execution = self.executions.get_execution(execution_id)?;
        let results = self.executions.list_results(execution_id)?;
        let promoted_count = results.iter().filter(|r| r.was_promoted).count() as u32;
        let failed_count = results.len() as u32 - promoted_count;
        Ok(PromotionExecutionDetails {
            execution,
            results,
            promoted_count,
            failed_count,
        })
    }
}
