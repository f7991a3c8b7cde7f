// ==========================================
// PromotionRuleRepository - declarative rule storage
// ==========================================
// Ruleset (condition tree + event) persisted as JSON text; the shape
// is a contract evaluated generically by the condition interpreter.
// ==========================================

use crate::domain::rule::{PromotionRule, RuleSet};
use crate::repository::error::{parse_timestamp, RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct PromotionRuleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PromotionRuleRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ruleset and timestamps parsed outside the rusqlite closure
    fn map_rule(
        row: &rusqlite::Row<'_>,
    ) -> rusqlite::Result<(PromotionRule, String, String, String)> {
        let ruleset_json: String = row.get(6)?;
        let created_at_raw: String = row.get(8)?;
        let updated_at_raw: String = row.get(9)?;
        Ok((
            PromotionRule {
                rule_id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                source_class_id: row.get(3)?,
                program_id: row.get(4)?,
                cycle_level_id: row.get(5)?,
                ruleset: RuleSet {
                    conditions: crate::domain::rule::ConditionNode::All { all: vec![] },
                    event: crate::domain::rule::RuleEvent {
                        event_type: String::new(),
                        params: None,
                    },
                },
                is_active: row.get::<_, i64>(7)? != 0,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            ruleset_json,
            created_at_raw,
            updated_at_raw,
        ))
    }

    fn finish_rule(
        (mut rule, ruleset_json, created_at_raw, updated_at_raw): (
            PromotionRule,
            String,
            String,
            String,
        ),
    ) -> RepositoryResult<PromotionRule> {
        rule.ruleset = serde_json::from_str(&ruleset_json).map_err(|e| {
            RepositoryError::SerializationError(format!(
                "ruleset of rule {} is unreadable: {}",
                rule.rule_id, e
            ))
        })?;
        rule.created_at = parse_timestamp(&created_at_raw, "created_at", &rule.rule_id)?;
        rule.updated_at = parse_timestamp(&updated_at_raw, "updated_at", &rule.rule_id)?;
        Ok(rule)
    }

    const SELECT_COLS: &'static str = r#"
        SELECT rule_id, name, description, source_class_id, program_id,
               cycle_level_id, ruleset_json, is_active, created_at, updated_at
        FROM promotion_rule
    "#;

    pub fn insert(&self, rule: &PromotionRule) -> RepositoryResult<()> {
        let ruleset_json = serde_json::to_string(&rule.ruleset)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO promotion_rule (
                rule_id, name, description, source_class_id, program_id,
                cycle_level_id, ruleset_json, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                rule.rule_id,
                rule.name,
                rule.description,
                rule.source_class_id,
                rule.program_id,
                rule.cycle_level_id,
                ruleset_json,
                rule.is_active as i64,
                rule.created_at.to_rfc3339(),
                rule.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn update(&self, rule: &PromotionRule) -> RepositoryResult<()> {
        let ruleset_json = serde_json::to_string(&rule.ruleset)?;
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE promotion_rule SET
                name = ?2, description = ?3, source_class_id = ?4,
                program_id = ?5, cycle_level_id = ?6, ruleset_json = ?7,
                is_active = ?8, updated_at = ?9
            WHERE rule_id = ?1
            "#,
            params![
                rule.rule_id,
                rule.name,
                rule.description,
                rule.source_class_id,
                rule.program_id,
                rule.cycle_level_id,
                ruleset_json,
                rule.is_active as i64,
                rule.updated_at.to_rfc3339(),
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "PromotionRule".to_string(),
                id: rule.rule_id.clone(),
            });
        }
        Ok(())
    }

    pub fn delete(&self, rule_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM promotion_rule WHERE rule_id = ?1",
            params![rule_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "PromotionRule".to_string(),
                id: rule_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn get_by_id(&self, rule_id: &str) -> RepositoryResult<PromotionRule> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE rule_id = ?1", Self::SELECT_COLS);
        let raw = conn
            .query_row(&sql, params![rule_id], Self::map_rule)
            .optional()?;
        drop(conn);

        match raw {
            Some(pair) => Self::finish_rule(pair),
            None => Err(RepositoryError::NotFound {
                entity: "PromotionRule".to_string(),
                id: rule_id.to_string(),
            }),
        }
    }

    /// All rules, newest first; inactive rules included so admins can
    /// see and re-activate them
    pub fn list(&self) -> RepositoryResult<Vec<PromotionRule>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY created_at DESC", Self::SELECT_COLS);
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map([], Self::map_rule)?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        raw.into_iter().map(Self::finish_rule).collect()
    }

    /// Whether any execution record references this rule
    ///
    /// Referenced rules are immutable at the service layer; the schema
    /// itself does not enforce it.
    pub fn is_referenced_by_execution(&self, rule_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM promotion_execution WHERE rule_id = ?1 LIMIT 1",
                params![rule_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}
