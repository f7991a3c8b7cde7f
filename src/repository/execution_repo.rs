// ==========================================
// PromotionExecutionRepository - append-only audit trail
// ==========================================
// Inserts only; there is deliberately no update or delete path for
// execution records or their per-student results.
// ==========================================

use crate::domain::execution::{PromotionExecution, PromotionExecutionResult};
use crate::repository::error::{parse_timestamp, RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct PromotionExecutionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PromotionExecutionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Persist one execution and all its per-student results atomically
    pub fn insert_execution(
        &self,
        execution: &PromotionExecution,
        results: &[PromotionExecutionResult],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            r#"
            INSERT INTO promotion_execution (
                execution_id, rule_id, source_class_id, target_class_id,
                academic_year_id, executed_by, executed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                execution.execution_id,
                execution.rule_id,
                execution.source_class_id,
                execution.target_class_id,
                execution.academic_year_id,
                execution.executed_by,
                execution.executed_at.to_rfc3339(),
            ],
        )?;

        for result in results {
            let reasons_json = if result.reasons.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&result.reasons)?)
            };
            let facts_json = result
                .facts
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;

            tx.execute(
                r#"
                INSERT INTO promotion_execution_result (
                    result_id, execution_id, student_id, was_promoted,
                    reasons_json, facts_json
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    result.result_id,
                    result.execution_id,
                    result.student_id,
                    result.was_promoted as i64,
                    reasons_json,
                    facts_json,
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    // executed_at parsed outside the rusqlite closure
    fn map_execution(row: &rusqlite::Row<'_>) -> rusqlite::Result<(PromotionExecution, String)> {
        let executed_at_raw: String = row.get(6)?;
        Ok((
            PromotionExecution {
                execution_id: row.get(0)?,
                rule_id: row.get(1)?,
                source_class_id: row.get(2)?,
                target_class_id: row.get(3)?,
                academic_year_id: row.get(4)?,
                executed_by: row.get(5)?,
                executed_at: Utc::now(),
            },
            executed_at_raw,
        ))
    }

    fn finish_execution(
        (mut execution, executed_at_raw): (PromotionExecution, String),
    ) -> RepositoryResult<PromotionExecution> {
        execution.executed_at =
            parse_timestamp(&executed_at_raw, "executed_at", &execution.execution_id)?;
        Ok(execution)
    }

    /// All executions, newest first
    pub fn list_executions(&self) -> RepositoryResult<Vec<PromotionExecution>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT execution_id, rule_id, source_class_id, target_class_id,
                   academic_year_id, executed_by, executed_at
            FROM promotion_execution
            ORDER BY executed_at DESC
            "#,
        )?;
        let raw = stmt
            .query_map([], Self::map_execution)?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        raw.into_iter().map(Self::finish_execution).collect()
    }

    pub fn get_execution(&self, execution_id: &str) -> RepositoryResult<PromotionExecution> {
        let conn = self.get_conn()?;
        let raw = conn
            .query_row(
                r#"
                SELECT execution_id, rule_id, source_class_id, target_class_id,
                       academic_year_id, executed_by, executed_at
                FROM promotion_execution
                WHERE execution_id = ?1
                "#,
                params![execution_id],
                Self::map_execution,
            )
            .optional()?;
        drop(conn);

        match raw {
            Some(pair) => Self::finish_execution(pair),
            None => Err(RepositoryError::NotFound {
                entity: "PromotionExecution".to_string(),
                id: execution_id.to_string(),
            }),
        }
    }

    /// Per-student results of one execution
    pub fn list_results(
        &self,
        execution_id: &str,
    ) -> RepositoryResult<Vec<PromotionExecutionResult>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT result_id, execution_id, student_id, was_promoted,
                   reasons_json, facts_json
            FROM promotion_execution_result
            WHERE execution_id = ?1
            ORDER BY student_id
            "#,
        )?;

        let raw = stmt
            .query_map(params![execution_id], |row| {
                let reasons_json: Option<String> = row.get(4)?;
                let facts_json: Option<String> = row.get(5)?;
                Ok((
                    PromotionExecutionResult {
                        result_id: row.get(0)?,
                        execution_id: row.get(1)?,
                        student_id: row.get(2)?,
                        was_promoted: row.get::<_, i64>(3)? != 0,
                        reasons: Vec::new(),
                        facts: None,
                    },
                    reasons_json,
                    facts_json,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        raw.into_iter()
            .map(|(mut result, reasons_json, facts_json)| {
                if let Some(json) = reasons_json {
                    result.reasons = serde_json::from_str(&json)?;
                }
                if let Some(json) = facts_json {
                    result.facts = Some(serde_json::from_str(&json)?);
                }
                Ok(result)
            })
            .collect()
    }
}
