// ==========================================
// SummariesApi / facts access
// ==========================================
// The `summaries.*` and `facts.get` contract operations: explicit
// cache refresh (privileged) and the live, uncached facts path used
// for inspection and tests.
// ==========================================

use crate::api::error::ApiResult;
use crate::domain::facts::StudentPromotionFacts;
use crate::domain::types::GradingConfig;
use crate::engine::enrollment_history::EnrollmentHistoryReader;
use crate::engine::facts_builder::FactsBuilder;
use crate::engine::summary_refresh::SummaryRefreshService;
use crate::engine::transcript::TranscriptAggregator;
use crate::repository::credit_ledger_repo::CreditLedgerRepository;
use crate::repository::enrollment_repo::EnrollmentRepository;
use crate::repository::grade_repo::GradeRepository;
use crate::repository::student_repo::StudentRepository;
use crate::repository::summary_repo::PromotionSummaryRepository;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Return envelope of summaries.refreshClass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRefreshOutcome {
    pub class_id: String,
    pub student_count: u32,
}

pub struct SummariesApi {
    refresh: SummaryRefreshService,
    facts_builder: FactsBuilder,
}

fn build_facts_builder(conn: &Arc<Mutex<Connection>>, config: GradingConfig) -> FactsBuilder {
    FactsBuilder::new(
        StudentRepository::new(conn.clone()),
        TranscriptAggregator::new(GradeRepository::new(conn.clone()), config.clone()),
        CreditLedgerRepository::new(conn.clone()),
        EnrollmentHistoryReader::new(EnrollmentRepository::new(conn.clone())),
        EnrollmentRepository::new(conn.clone()),
        config,
    )
}

impl SummariesApi {
    pub fn new(conn: Arc<Mutex<Connection>>, config: GradingConfig) -> Self {
        let refresh = SummaryRefreshService::new(
            build_facts_builder(&conn, config.clone()),
            PromotionSummaryRepository::new(conn.clone()),
            StudentRepository::new(conn.clone()),
        );
        let facts_builder = build_facts_builder(&conn, config);
        Self {
            refresh,
            facts_builder,
        }
    }

    /// summaries.refresh - recompute one (student, year) summary
    pub fn refresh_student(
        &self,
        student_id: &str,
        academic_year_id: &str,
    ) -> ApiResult<StudentPromotionFacts> {
        Ok(self.refresh.refresh_student(student_id, academic_year_id)?)
    }

    /// summaries.refreshClass (privileged)
    pub fn refresh_class(
        &self,
        class_id: &str,
        academic_year_id: &str,
    ) -> ApiResult<ClassRefreshOutcome> {
        let student_count = self.refresh.refresh_class(class_id, academic_year_id)?;
        Ok(ClassRefreshOutcome {
            class_id: class_id.to_string(),
            student_count,
        })
    }

    /// facts.get - live computation bypassing the cache
    pub fn get_facts(
        &self,
        student_id: &str,
        academic_year_id: &str,
    ) -> ApiResult<StudentPromotionFacts> {
        Ok(self.facts_builder.build(student_id, academic_year_id)?)
    }
}
