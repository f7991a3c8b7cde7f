// ==========================================
// CreditLedgerRepository - accumulator rows per student x year
// ==========================================
// The ledger is an accumulator, not a view: writes are additive
// deltas applied in a single UPSERT with column arithmetic, never a
// read-modify-write in application code. That single-statement update
// is what keeps concurrent enrollment transitions race-free without
// row locks.
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// One ledger row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreditLedgerEntry {
    pub student_id: String,
    pub academic_year_id: String,
    pub credits_earned: f64,
    pub credits_in_progress: f64,
    pub required_credits: f64,
}

/// Cross-year ledger totals for one student
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreditLedgerSummary {
    pub credits_earned: f64,
    pub credits_in_progress: f64,
    pub required_credits: f64,
    pub years_count: u32,
}

pub struct CreditLedgerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CreditLedgerRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Apply an additive delta to one (student, year) row
    ///
    /// Creates the row if missing. The arithmetic happens inside the
    /// UPDATE so repeated transitions can never double-count or lose
    /// credits regardless of interleaving.
    pub fn apply_delta(
        &self,
        student_id: &str,
        academic_year_id: &str,
        in_progress_delta: f64,
        earned_delta: f64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
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
                student_id,
                academic_year_id,
                in_progress_delta,
                earned_delta,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Set the credit requirement for a (student, year) row
    ///
    /// Requirement is an absolute figure (program policy), so unlike
    /// earned/in-progress it is overwritten, not accumulated.
    pub fn set_required_credits(
        &self,
        student_id: &str,
        academic_year_id: &str,
        required_credits: f64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO credit_ledger (
                student_id, academic_year_id,
                credits_earned, credits_in_progress, required_credits, updated_at
            ) VALUES (?1, ?2, 0, 0, ?3, ?4)
            ON CONFLICT(student_id, academic_year_id) DO UPDATE SET
                required_credits = excluded.required_credits,
                updated_at = excluded.updated_at
            "#,
            params![
                student_id,
                academic_year_id,
                required_credits,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Read one ledger row; a missing row reads as all zeros
    pub fn get(
        &self,
        student_id: &str,
        academic_year_id: &str,
    ) -> RepositoryResult<CreditLedgerEntry> {
        let conn = self.get_conn()?;
        let entry = conn
            .query_row(
                r#"
                SELECT credits_earned, credits_in_progress, required_credits
                FROM credit_ledger
                WHERE student_id = ?1 AND academic_year_id = ?2
                "#,
                params![student_id, academic_year_id],
                |row| {
                    Ok(CreditLedgerEntry {
                        student_id: student_id.to_string(),
                        academic_year_id: academic_year_id.to_string(),
                        credits_earned: row.get(0)?,
                        credits_in_progress: row.get(1)?,
                        required_credits: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(entry.unwrap_or(CreditLedgerEntry {
            student_id: student_id.to_string(),
            academic_year_id: academic_year_id.to_string(),
            ..Default::default()
        }))
    }

    /// Aggregate ledger totals for a student across all years
    pub fn summarize_student(&self, student_id: &str) -> RepositoryResult<CreditLedgerSummary> {
        let conn = self.get_conn()?;
        let summary = conn.query_row(
            r#"
            SELECT COALESCE(SUM(credits_earned), 0),
                   COALESCE(SUM(credits_in_progress), 0),
                   COALESCE(SUM(required_credits), 0),
                   COUNT(*)
            FROM credit_ledger
            WHERE student_id = ?1
            "#,
            params![student_id],
            |row| {
                Ok(CreditLedgerSummary {
                    credits_earned: row.get(0)?,
                    credits_in_progress: row.get(1)?,
                    required_credits: row.get(2)?,
                    years_count: row.get::<_, i64>(3)? as u32,
                })
            },
        )?;
        Ok(summary)
    }
}
