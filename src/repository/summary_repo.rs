// ==========================================
// PromotionSummaryRepository - cached facts projection
// ==========================================
// One row per (student, academic year). Written only by the explicit
// refresh path; read-only for the rule evaluator. A missing row is a
// first-class state the evaluator must surface, so get() returns
// Option instead of zero-filled facts.
// ==========================================

use crate::domain::facts::StudentPromotionFacts;
use crate::repository::error::{parse_timestamp, RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// Cached summary row: hot columns plus the full facts snapshot
#[derive(Debug, Clone)]
pub struct PromotionSummaryRow {
    pub student_id: String,
    pub academic_year_id: String,
    pub overall_average: f64,
    pub credits_earned: f64,
    pub facts: StudentPromotionFacts,
    pub refreshed_at: DateTime<Utc>,
}

pub struct PromotionSummaryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PromotionSummaryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Create or overwrite the summary row for (student, year)
    ///
    /// Last writer wins on concurrent refresh of the same pair; the
    /// computation is deterministic given the same underlying data, so
    /// that is acceptable.
    pub fn upsert(&self, facts: &StudentPromotionFacts) -> RepositoryResult<()> {
        let facts_json = serde_json::to_string(facts)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO promotion_summary (
                student_id, academic_year_id, overall_average,
                credits_earned, facts_json, refreshed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(student_id, academic_year_id) DO UPDATE SET
                overall_average = excluded.overall_average,
                credits_earned = excluded.credits_earned,
                facts_json = excluded.facts_json,
                refreshed_at = excluded.refreshed_at
            "#,
            params![
                facts.student_id,
                facts.academic_year_id,
                facts.overall_average,
                facts.credits_earned,
                facts_json,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Read the cached summary; None means "never refreshed"
    pub fn get(
        &self,
        student_id: &str,
        academic_year_id: &str,
    ) -> RepositoryResult<Option<PromotionSummaryRow>> {
        let conn = self.get_conn()?;

        let raw: Option<(f64, f64, String, String)> = conn
            .query_row(
                r#"
                SELECT overall_average, credits_earned, facts_json, refreshed_at
                FROM promotion_summary
                WHERE student_id = ?1 AND academic_year_id = ?2
                "#,
                params![student_id, academic_year_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;
        drop(conn);

        let Some((overall_average, credits_earned, facts_json, refreshed_at)) = raw else {
            return Ok(None);
        };

        let facts: StudentPromotionFacts = serde_json::from_str(&facts_json).map_err(|e| {
            RepositoryError::SerializationError(format!(
                "promotion summary of student {} / year {} is unreadable: {}",
                student_id, academic_year_id, e
            ))
        })?;

        Ok(Some(PromotionSummaryRow {
            student_id: student_id.to_string(),
            academic_year_id: academic_year_id.to_string(),
            overall_average,
            credits_earned,
            facts,
            refreshed_at: parse_timestamp(&refreshed_at, "refreshed_at", student_id)?,
        }))
    }
}
