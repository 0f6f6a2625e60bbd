//! Fixture rows used by the reports' tests and by `enroll seed`.
//!
//! Notable fixtures:
//! - student 8 has no major and no enrollments
//! - course 302 has no enrollments
//! - student 6 retakes course 301 in a later semester
//! - Computer Science has exactly four students with two or more graded courses
//! - courses 102 and 103 tie on enrollment count

use crate::db::Database;
use crate::error::{EnrollError, Result};
use crate::models::parse_date;
use tracing::info;

/// (student_id, name, major, enrollment_date)
pub const STUDENTS: &[(i64, &str, Option<&str>, &str)] = &[
    (1, "Alice Johnson", Some("Computer Science"), "2022-09-01"),
    (2, "Bob Smith", Some("Computer Science"), "2022-09-01"),
    (3, "Carol White", Some("Mathematics"), "2022-09-01"),
    (4, "David Brown", Some("Computer Science"), "2023-01-15"),
    (5, "Eve Davis", Some("Mathematics"), "2022-09-01"),
    (6, "Frank Miller", Some("Physics"), "2023-01-15"),
    (7, "Grace Lee", Some("Computer Science"), "2022-09-01"),
    (8, "Henry Wilson", None, "2023-09-01"),
    (9, "Ivy Chen", Some("Physics"), "2023-01-15"),
    (10, "Jack Taylor", Some("Mathematics"), "2023-01-15"),
];

/// (course_id, course_code, course_name, department, credits)
pub const COURSES: &[(i64, &str, &str, &str, i64)] = &[
    (101, "CS101", "Introduction to Programming", "Computer Science", 4),
    (102, "CS201", "Data Structures", "Computer Science", 4),
    (103, "CS301", "Database Systems", "Computer Science", 3),
    (201, "MATH101", "Calculus I", "Mathematics", 4),
    (202, "MATH201", "Linear Algebra", "Mathematics", 3),
    (301, "PHYS101", "General Physics", "Physics", 4),
    (302, "PHYS301", "Quantum Mechanics", "Physics", 3),
];

/// (enrollment_id, student_id, course_id, semester, grade, enrollment_date)
pub const ENROLLMENTS: &[(i64, i64, i64, &str, Option<f64>, &str)] = &[
    (1, 1, 101, "2023-Fall", Some(3.7), "2023-08-15"),
    (2, 1, 102, "2024-Spring", Some(3.9), "2024-01-10"),
    (3, 1, 103, "2024-Fall", None, "2024-08-15"),
    (4, 1, 201, "2023-Fall", Some(3.5), "2023-08-15"),
    (5, 2, 101, "2023-Fall", Some(3.0), "2023-08-16"),
    (6, 2, 102, "2024-Spring", Some(2.7), "2024-01-11"),
    (7, 2, 201, "2024-Spring", Some(3.3), "2024-01-11"),
    (8, 4, 101, "2024-Spring", Some(3.3), "2024-01-12"),
    (9, 4, 102, "2024-Fall", Some(3.7), "2024-08-16"),
    (10, 7, 101, "2023-Fall", Some(2.3), "2023-08-17"),
    (11, 7, 103, "2024-Fall", Some(2.0), "2024-08-17"),
    (12, 7, 301, "2024-Spring", Some(2.7), "2024-01-12"),
    (13, 3, 201, "2023-Fall", Some(4.0), "2023-08-15"),
    (14, 3, 202, "2024-Spring", Some(3.8), "2024-01-10"),
    (15, 5, 201, "2023-Fall", Some(2.7), "2023-08-18"),
    (16, 5, 202, "2024-Spring", Some(3.1), "2024-01-13"),
    (17, 5, 101, "2024-Fall", None, "2024-08-18"),
    (18, 10, 201, "2024-Spring", Some(3.3), "2024-01-14"),
    (19, 10, 202, "2024-Fall", None, "2024-08-19"),
    (20, 6, 301, "2023-Fall", Some(2.0), "2023-08-19"),
    (21, 6, 301, "2024-Spring", Some(3.0), "2024-01-15"),
    (22, 9, 301, "2024-Fall", Some(3.3), "2024-08-19"),
    (23, 9, 201, "2024-Fall", None, "2024-08-20"),
    (24, 2, 103, "2024-Fall", None, "2024-08-20"),
];

/// Counts of rows inserted by [`load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub students: usize,
    pub courses: usize,
    pub enrollments: usize,
}

/// Insert all fixtures in one transaction. Refuses a database that already
/// holds students.
pub fn load(db: &Database) -> Result<SeedSummary> {
    if db.count_students()? > 0 {
        return Err(EnrollError::AlreadySeeded);
    }

    let summary = db.transaction(|db| {
        for &(id, name, major, date) in STUDENTS {
            db.insert_student(id, name, major, parse_date(date)?)?;
        }
        for &(id, code, name, department, credits) in COURSES {
            db.insert_course(id, code, name, department, credits)?;
        }
        for &(id, student_id, course_id, semester, grade, date) in ENROLLMENTS {
            db.insert_enrollment(id, student_id, course_id, semester, grade, parse_date(date)?)?;
        }
        Ok(SeedSummary {
            students: STUDENTS.len(),
            courses: COURSES.len(),
            enrollments: ENROLLMENTS.len(),
        })
    })?;

    info!(
        students = summary.students,
        courses = summary.courses,
        enrollments = summary.enrollments,
        "seed data loaded"
    );
    Ok(summary)
}

/// The fixtures as plain INSERT statements, runnable on any SQL engine
pub fn seed_sql() -> String {
    let mut sql = String::new();

    sql.push_str("INSERT INTO students (student_id, name, major, enrollment_date) VALUES\n");
    let rows: Vec<String> = STUDENTS
        .iter()
        .map(|&(id, name, major, date)| {
            format!("    ({id}, {}, {}, {})", quote(name), quote_opt(major), quote(date))
        })
        .collect();
    sql.push_str(&format!("{};\n\n", rows.join(",\n")));

    sql.push_str(
        "INSERT INTO courses (course_id, course_code, course_name, department, credits) VALUES\n",
    );
    let rows: Vec<String> = COURSES
        .iter()
        .map(|&(id, code, name, department, credits)| {
            format!(
                "    ({id}, {}, {}, {}, {credits})",
                quote(code),
                quote(name),
                quote(department)
            )
        })
        .collect();
    sql.push_str(&format!("{};\n\n", rows.join(",\n")));

    sql.push_str(
        "INSERT INTO enrollments (enrollment_id, student_id, course_id, semester, grade, enrollment_date) VALUES\n",
    );
    let rows: Vec<String> = ENROLLMENTS
        .iter()
        .map(|&(id, student_id, course_id, semester, grade, date)| {
            format!(
                "    ({id}, {student_id}, {course_id}, {}, {}, {})",
                quote(semester),
                grade_literal(grade),
                quote(date)
            )
        })
        .collect();
    sql.push_str(&format!("{};\n", rows.join(",\n")));

    sql
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn grade_literal(grade: Option<f64>) -> String {
    grade.map_or_else(|| "NULL".to_string(), |g| g.to_string())
}

fn quote_opt(value: Option<&str>) -> String {
    value.map_or_else(|| "NULL".to_string(), quote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Semester;
    use std::collections::HashSet;

    fn empty_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        db
    }

    #[test]
    fn test_load_inserts_everything() {
        let db = empty_db();
        let summary = load(&db).unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                students: 10,
                courses: 7,
                enrollments: 24
            }
        );
        assert_eq!(db.list_enrollments().unwrap().len(), 24);
    }

    #[test]
    fn test_load_twice_is_rejected() {
        let db = empty_db();
        load(&db).unwrap();
        assert!(matches!(load(&db), Err(EnrollError::AlreadySeeded)));
        assert_eq!(db.count_students().unwrap(), 10);
    }

    #[test]
    fn test_fixtures_respect_invariants() {
        let mut triples = HashSet::new();
        for &(_, student_id, course_id, semester, grade, _) in ENROLLMENTS {
            assert!(semester.parse::<Semester>().is_ok(), "{semester}");
            if let Some(g) = grade {
                assert!((0.0..=4.0).contains(&g));
            }
            assert!(triples.insert((student_id, course_id, semester)));
        }
        assert!(COURSES.iter().all(|c| c.4 > 0));
    }

    #[test]
    fn test_seed_sql_is_loadable() {
        let db = empty_db();
        db.conn().execute_batch(&seed_sql()).unwrap();

        let via_sql = db.list_enrollments().unwrap();
        let other = empty_db();
        load(&other).unwrap();
        assert_eq!(via_sql, other.list_enrollments().unwrap());
        assert_eq!(db.list_students().unwrap(), other.list_students().unwrap());
        assert_eq!(db.list_courses().unwrap(), other.list_courses().unwrap());
    }

    #[test]
    fn test_grade_literal_keeps_full_precision() {
        assert_eq!(grade_literal(None), "NULL");
        assert_eq!(grade_literal(Some(3.25)), "3.25");
        assert_eq!(grade_literal(Some(3.7)), "3.7");

        let db = empty_db();
        db.insert_student(1, "Ada", None, parse_date("2024-09-01").unwrap())
            .unwrap();
        db.insert_course(1, "X101", "Sample", "Dept", 3).unwrap();
        db.conn()
            .execute_batch(&format!(
                "INSERT INTO enrollments VALUES (1, 1, 1, '2024-Fall', {}, '2024-09-01')",
                grade_literal(Some(3.25))
            ))
            .unwrap();
        assert_eq!(db.get_enrollment(1).unwrap().unwrap().grade, Some(3.25));
    }
}
