// ==========================================
// GradeRepository - graded-exam read model for the transcript
// ==========================================
// One join from grade through exam/class_course/course to teaching
// unit; the Transcript Aggregator does the arithmetic in memory.
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// One grade row with its full curriculum context
#[derive(Debug, Clone)]
pub struct GradedExamRow {
    pub grade_id: String,
    pub exam_id: String,
    pub exam_percentage: f64,
    pub score: f64,
    pub course_id: String,
    pub course_code: String,
    pub course_name: String,
    pub course_credits: f64,
    pub teaching_unit_id: String,
    pub teaching_unit_code: String,
    pub teaching_unit_name: String,
    pub teaching_unit_credits: f64,
}

pub struct GradeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl GradeRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// All graded exams of a student with course and unit context
    ///
    /// Returns an empty vec for a student with no grades; "no data"
    /// is not an error at this layer.
    pub fn list_graded_exams(&self, student_id: &str) -> RepositoryResult<Vec<GradedExamRow>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT g.grade_id, g.exam_id, e.percentage, g.score,
                   co.course_id, co.code, co.name, co.credits,
                   tu.teaching_unit_id, tu.code, tu.name, tu.credits
            FROM grade g
            JOIN exam e ON e.exam_id = g.exam_id
            JOIN class_course cc ON cc.class_course_id = e.class_course_id
            JOIN course co ON co.course_id = cc.course_id
            JOIN teaching_unit tu ON tu.teaching_unit_id = co.teaching_unit_id
            WHERE g.student_id = ?1
            ORDER BY tu.code, co.code, e.exam_id
            "#,
        )?;

        let rows = stmt
            .query_map(params![student_id], |row| {
                Ok(GradedExamRow {
                    grade_id: row.get(0)?,
                    exam_id: row.get(1)?,
                    exam_percentage: row.get(2)?,
                    score: row.get(3)?,
                    course_id: row.get(4)?,
                    course_code: row.get(5)?,
                    course_name: row.get(6)?,
                    course_credits: row.get(7)?,
                    teaching_unit_id: row.get(8)?,
                    teaching_unit_code: row.get(9)?,
                    teaching_unit_name: row.get(10)?,
                    teaching_unit_credits: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
