// ==========================================
// StudentRepository - student / class / year directory reads
// ==========================================
// Red line: repositories do data mapping only, no business logic
// ==========================================

use crate::domain::student::{AcademicYear, StudentRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct StudentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StudentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Fetch one student joined to class and program
    ///
    /// # Returns
    /// - `Ok(record)`: the directory entry
    /// - `Err(NotFound)`: no such student
    pub fn get_student(&self, student_id: &str) -> RepositoryResult<StudentRecord> {
        let conn = self.get_conn()?;

        let record = conn
            .query_row(
                r#"
                SELECT s.student_id, s.registration_number, s.first_name, s.last_name,
                       s.class_id, c.name, c.program_id, p.code, s.admission_year_id
                FROM student s
                LEFT JOIN school_class c ON c.class_id = s.class_id
                LEFT JOIN program p ON p.program_id = c.program_id
                WHERE s.student_id = ?1
                "#,
                params![student_id],
                |row| {
                    Ok(StudentRecord {
                        student_id: row.get(0)?,
                        registration_number: row.get(1)?,
                        first_name: row.get(2)?,
                        last_name: row.get(3)?,
                        class_id: row.get(4)?,
                        class_name: row.get(5)?,
                        program_id: row.get(6)?,
                        program_code: row.get(7)?,
                        admission_year_id: row.get(8)?,
                    })
                },
            )
            .optional()?;

        record.ok_or_else(|| RepositoryError::NotFound {
            entity: "Student".to_string(),
            id: student_id.to_string(),
        })
    }

    /// Current students of a class, stable order by registration number
    pub fn list_class_students(&self, class_id: &str) -> RepositoryResult<Vec<StudentRecord>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT s.student_id, s.registration_number, s.first_name, s.last_name,
                   s.class_id, c.name, c.program_id, p.code, s.admission_year_id
            FROM student s
            LEFT JOIN school_class c ON c.class_id = s.class_id
            LEFT JOIN program p ON p.program_id = c.program_id
            WHERE s.class_id = ?1
            ORDER BY s.registration_number
            "#,
        )?;

        let students = stmt
            .query_map(params![class_id], |row| {
                Ok(StudentRecord {
                    student_id: row.get(0)?,
                    registration_number: row.get(1)?,
                    first_name: row.get(2)?,
                    last_name: row.get(3)?,
                    class_id: row.get(4)?,
                    class_name: row.get(5)?,
                    program_id: row.get(6)?,
                    program_code: row.get(7)?,
                    admission_year_id: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(students)
    }

    /// Whether a class exists
    pub fn class_exists(&self, class_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM school_class WHERE class_id = ?1",
                params![class_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Fetch one academic year
    pub fn get_academic_year(&self, academic_year_id: &str) -> RepositoryResult<AcademicYear> {
        let conn = self.get_conn()?;
        let year = conn
            .query_row(
                "SELECT academic_year_id, label, start_year FROM academic_year WHERE academic_year_id = ?1",
                params![academic_year_id],
                |row| {
                    Ok(AcademicYear {
                        academic_year_id: row.get(0)?,
                        label: row.get(1)?,
                        start_year: row.get(2)?,
                    })
                },
            )
            .optional()?;

        year.ok_or_else(|| RepositoryError::NotFound {
            entity: "AcademicYear".to_string(),
            id: academic_year_id.to_string(),
        })
    }

    /// The academic year following the given one, by start_year
    pub fn next_academic_year(
        &self,
        academic_year_id: &str,
    ) -> RepositoryResult<Option<AcademicYear>> {
        let current = self.get_academic_year(academic_year_id)?;
        let conn = self.get_conn()?;

        let next = conn
            .query_row(
                r#"
                SELECT academic_year_id, label, start_year
                FROM academic_year
                WHERE start_year > ?1
                ORDER BY start_year ASC
                LIMIT 1
                "#,
                params![current.start_year],
                |row| {
                    Ok(AcademicYear {
                        academic_year_id: row.get(0)?,
                        label: row.get(1)?,
                        start_year: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(next)
    }
}
