use crate::error::{EnrollError, Result};
use crate::models::{Course, Enrollment, Semester, Student};
use chrono::NaiveDate;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info};

/// DDL for the three entities plus the settings table.
pub const SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS students (
    student_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    major TEXT,
    enrollment_date TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS courses (
    course_id INTEGER PRIMARY KEY,
    course_code TEXT NOT NULL UNIQUE,
    course_name TEXT NOT NULL,
    department TEXT NOT NULL,
    credits INTEGER NOT NULL CHECK (credits > 0)
);

CREATE TABLE IF NOT EXISTS enrollments (
    enrollment_id INTEGER PRIMARY KEY,
    student_id INTEGER NOT NULL REFERENCES students(student_id) ON DELETE CASCADE,
    course_id INTEGER NOT NULL REFERENCES courses(course_id) ON DELETE CASCADE,
    semester TEXT NOT NULL,
    grade REAL CHECK (grade IS NULL OR (grade >= 0.0 AND grade <= 4.0)),
    enrollment_date TEXT NOT NULL,
    UNIQUE (student_id, course_id, semester)
);

CREATE INDEX IF NOT EXISTS idx_enrollments_student_id ON enrollments(student_id);
CREATE INDEX IF NOT EXISTS idx_enrollments_course_id ON enrollments(course_id);
CREATE INDEX IF NOT EXISTS idx_enrollments_semester ON enrollments(semester);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// Database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database connection
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::configure(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> Result<Self> {
        // Cascading deletes depend on this
        conn.pragma_update(None, "foreign_keys", "ON")?;

        conn.create_scalar_function(
            "semester_key",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let key = match ctx.get_raw(0) {
                    ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                        .ok()
                        .and_then(|label| label.parse::<Semester>().ok())
                        .map(|semester| semester.sort_key()),
                    _ => None,
                };
                Ok(key)
            },
        )?;

        Ok(Database { conn })
    }

    /// Initialize the database schema
    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        info!("schema created");
        Ok(())
    }

    /// Check if database is initialized
    pub fn is_initialized(&self) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='students'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside one transaction, committing only if it succeeds
    pub fn transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    // ==================== Student Operations ====================

    pub fn insert_student(
        &self,
        student_id: i64,
        name: &str,
        major: Option<&str>,
        enrollment_date: NaiveDate,
    ) -> Result<Student> {
        self.conn.execute(
            "INSERT INTO students (student_id, name, major, enrollment_date)
             VALUES (?1, ?2, ?3, ?4)",
            (student_id, name, major, enrollment_date),
        )?;
        debug!(student_id, "student inserted");
        self.get_student(student_id)?
            .ok_or(EnrollError::StudentNotFound(student_id))
    }

    pub fn get_student(&self, student_id: i64) -> Result<Option<Student>> {
        self.conn
            .query_row(
                "SELECT student_id, name, major, enrollment_date
                 FROM students WHERE student_id = ?1",
                [student_id],
                student_from_row,
            )
            .optional()
            .map_err(|e| e.into())
    }

    pub fn list_students(&self) -> Result<Vec<Student>> {
        let mut stmt = self.conn.prepare(
            "SELECT student_id, name, major, enrollment_date
             FROM students
             ORDER BY student_id",
        )?;

        let students = stmt.query_map([], student_from_row)?;
        students
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| e.into())
    }

    pub fn count_students(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete a student; returns how many enrollments the cascade removed
    pub fn delete_student(&self, student_id: i64) -> Result<usize> {
        self.transaction(|db| {
            let dependents = db.count_enrollments_where("student_id", student_id)?;
            let rows = db
                .conn
                .execute("DELETE FROM students WHERE student_id = ?1", [student_id])?;
            if rows == 0 {
                return Err(EnrollError::StudentNotFound(student_id));
            }
            info!(student_id, cascaded = dependents, "student deleted");
            Ok(dependents)
        })
    }

    // ==================== Course Operations ====================

    pub fn insert_course(
        &self,
        course_id: i64,
        course_code: &str,
        course_name: &str,
        department: &str,
        credits: i64,
    ) -> Result<Course> {
        self.conn.execute(
            "INSERT INTO courses (course_id, course_code, course_name, department, credits)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (course_id, course_code, course_name, department, credits),
        )?;
        debug!(course_id, course_code, "course inserted");
        self.get_course(course_id)?
            .ok_or(EnrollError::CourseNotFound(course_id))
    }

    pub fn get_course(&self, course_id: i64) -> Result<Option<Course>> {
        self.conn
            .query_row(
                "SELECT course_id, course_code, course_name, department, credits
                 FROM courses WHERE course_id = ?1",
                [course_id],
                course_from_row,
            )
            .optional()
            .map_err(|e| e.into())
    }

    pub fn list_courses(&self) -> Result<Vec<Course>> {
        let mut stmt = self.conn.prepare(
            "SELECT course_id, course_code, course_name, department, credits
             FROM courses
             ORDER BY course_id",
        )?;

        let courses = stmt.query_map([], course_from_row)?;
        courses
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| e.into())
    }

    /// Delete a course; returns how many enrollments the cascade removed
    pub fn delete_course(&self, course_id: i64) -> Result<usize> {
        self.transaction(|db| {
            let dependents = db.count_enrollments_where("course_id", course_id)?;
            let rows = db
                .conn
                .execute("DELETE FROM courses WHERE course_id = ?1", [course_id])?;
            if rows == 0 {
                return Err(EnrollError::CourseNotFound(course_id));
            }
            info!(course_id, cascaded = dependents, "course deleted");
            Ok(dependents)
        })
    }

    // ==================== Enrollment Operations ====================

    pub fn insert_enrollment(
        &self,
        enrollment_id: i64,
        student_id: i64,
        course_id: i64,
        semester: &str,
        grade: Option<f64>,
        enrollment_date: NaiveDate,
    ) -> Result<Enrollment> {
        self.conn.execute(
            "INSERT INTO enrollments
                (enrollment_id, student_id, course_id, semester, grade, enrollment_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                enrollment_id,
                student_id,
                course_id,
                semester,
                grade,
                enrollment_date,
            ),
        )?;
        debug!(enrollment_id, student_id, course_id, semester, "enrollment inserted");
        self.get_enrollment(enrollment_id)?
            .ok_or(EnrollError::EnrollmentNotFound(enrollment_id))
    }

    pub fn get_enrollment(&self, enrollment_id: i64) -> Result<Option<Enrollment>> {
        self.conn
            .query_row(
                "SELECT enrollment_id, student_id, course_id, semester, grade, enrollment_date
                 FROM enrollments WHERE enrollment_id = ?1",
                [enrollment_id],
                enrollment_from_row,
            )
            .optional()
            .map_err(|e| e.into())
    }

    pub fn list_enrollments(&self) -> Result<Vec<Enrollment>> {
        let mut stmt = self.conn.prepare(
            "SELECT enrollment_id, student_id, course_id, semester, grade, enrollment_date
             FROM enrollments
             ORDER BY enrollment_id",
        )?;

        let enrollments = stmt.query_map([], enrollment_from_row)?;
        enrollments
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| e.into())
    }

    /// Record or clear the grade of an enrollment
    pub fn set_grade(&self, enrollment_id: i64, grade: Option<f64>) -> Result<Enrollment> {
        let rows = self.conn.execute(
            "UPDATE enrollments SET grade = ?1 WHERE enrollment_id = ?2",
            (grade, enrollment_id),
        )?;
        if rows == 0 {
            return Err(EnrollError::EnrollmentNotFound(enrollment_id));
        }
        info!(enrollment_id, ?grade, "grade recorded");
        self.get_enrollment(enrollment_id)?
            .ok_or(EnrollError::EnrollmentNotFound(enrollment_id))
    }

    fn count_enrollments_where(&self, column: &str, id: i64) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM enrollments WHERE {column} = ?1"),
            [id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    // ==================== Settings Operations ====================

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| e.into())
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, value),
        )?;
        Ok(())
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM settings WHERE key = ?1", [key])?;
        Ok(rows > 0)
    }
}

// ==================== Row Parsers ====================

fn student_from_row(row: &Row) -> std::result::Result<Student, rusqlite::Error> {
    Ok(Student {
        student_id: row.get(0)?,
        name: row.get(1)?,
        major: row.get(2)?,
        enrollment_date: row.get(3)?,
    })
}

fn course_from_row(row: &Row) -> std::result::Result<Course, rusqlite::Error> {
    Ok(Course {
        course_id: row.get(0)?,
        course_code: row.get(1)?,
        course_name: row.get(2)?,
        department: row.get(3)?,
        credits: row.get(4)?,
    })
}

fn enrollment_from_row(row: &Row) -> std::result::Result<Enrollment, rusqlite::Error> {
    Ok(Enrollment {
        enrollment_id: row.get(0)?,
        student_id: row.get(1)?,
        course_id: row.get(2)?,
        semester: row.get(3)?,
        grade: row.get(4)?,
        enrollment_date: row.get(5)?,
    })
}
