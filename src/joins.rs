//! Enrollment visibility reports built from joins over the three tables.

use crate::db::Database;
use crate::error::Result;
use crate::models::{AuditRow, AuditStatus, Course, PeerPair, RosterRow, Student};
use rusqlite::Row;
use tracing::debug;

impl Database {
    /// Every enrollment of `semester` with its student and course.
    /// Highest grade first, in-progress rows last.
    pub fn complete_enrollments(&self, semester: &str) -> Result<Vec<RosterRow>> {
        let mut stmt = self.conn().prepare(
            "SELECT e.enrollment_id, s.student_id, s.name, s.major,
                    c.course_code, c.course_name, c.credits, e.grade
             FROM enrollments e
             INNER JOIN students s ON s.student_id = e.student_id
             INNER JOIN courses c ON c.course_id = e.course_id
             WHERE e.semester = ?1
             ORDER BY e.grade DESC NULLS LAST, e.enrollment_id",
        )?;

        let rows = stmt
            .query_map([semester], |row| {
                Ok(RosterRow {
                    enrollment_id: row.get(0)?,
                    student_id: row.get(1)?,
                    student_name: row.get(2)?,
                    major: row.get(3)?,
                    course_code: row.get(4)?,
                    course_name: row.get(5)?,
                    credits: row.get(6)?,
                    grade: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(semester, rows = rows.len(), "roster report");
        Ok(rows)
    }

    /// Students with no enrollment at all
    pub fn unenrolled_students(&self) -> Result<Vec<Student>> {
        let mut stmt = self.conn().prepare(
            "SELECT s.student_id, s.name, s.major, s.enrollment_date
             FROM students s
             LEFT JOIN enrollments e ON e.student_id = s.student_id
             WHERE e.enrollment_id IS NULL
             ORDER BY s.student_id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Student {
                    student_id: row.get(0)?,
                    name: row.get(1)?,
                    major: row.get(2)?,
                    enrollment_date: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(rows = rows.len(), "unenrolled students report");
        Ok(rows)
    }

    /// Courses nobody has enrolled in
    pub fn untaken_courses(&self) -> Result<Vec<Course>> {
        let mut stmt = self.conn().prepare(
            "SELECT c.course_id, c.course_code, c.course_name, c.department, c.credits
             FROM enrollments e
             RIGHT JOIN courses c ON c.course_id = e.course_id
             WHERE e.enrollment_id IS NULL
             ORDER BY c.course_id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Course {
                    course_id: row.get(0)?,
                    course_code: row.get(1)?,
                    course_name: row.get(2)?,
                    department: row.get(3)?,
                    credits: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(rows = rows.len(), "untaken courses report");
        Ok(rows)
    }

    /// Rows of the student/enrollment/course full outer join where any side
    /// is missing
    pub fn enrollment_audit(&self) -> Result<Vec<AuditRow>> {
        let mut stmt = self.conn().prepare(
            "SELECT s.student_id, s.name, c.course_id, c.course_code,
                    CASE
                        WHEN s.student_id IS NOT NULL AND c.course_id IS NOT NULL THEN 'Enrolled'
                        WHEN s.student_id IS NOT NULL THEN 'Student Not Enrolled'
                        WHEN c.course_id IS NOT NULL THEN 'Course Not Taken'
                        ELSE 'No Match'
                    END AS status
             FROM students s
             FULL OUTER JOIN enrollments e ON e.student_id = s.student_id
             FULL OUTER JOIN courses c ON c.course_id = e.course_id
             WHERE s.student_id IS NULL
                OR e.enrollment_id IS NULL
                OR c.course_id IS NULL
             ORDER BY s.student_id NULLS LAST, c.course_id NULLS LAST",
        )?;

        let rows = stmt
            .query_map([], audit_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(rows = rows.len(), "audit report");
        Ok(rows)
    }

    /// Pairs of students admitted together into the same major
    pub fn study_peers(&self) -> Result<Vec<PeerPair>> {
        let mut stmt = self.conn().prepare(
            "SELECT s1.student_id, s1.name, s2.student_id, s2.name,
                    s1.major, s1.enrollment_date
             FROM students s1
             INNER JOIN students s2
                 ON s1.major = s2.major
                AND s1.enrollment_date = s2.enrollment_date
                AND s1.student_id < s2.student_id
             ORDER BY s1.major, s1.student_id, s2.student_id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(PeerPair {
                    student1_id: row.get(0)?,
                    student1_name: row.get(1)?,
                    student2_id: row.get(2)?,
                    student2_name: row.get(3)?,
                    major: row.get(4)?,
                    enrollment_date: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(rows = rows.len(), "study peers report");
        Ok(rows)
    }
}

fn audit_from_row(row: &Row) -> std::result::Result<AuditRow, rusqlite::Error> {
    let status_str: String = row.get(4)?;
    let status = AuditStatus::try_from(status_str.as_str()).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        )
    })?;

    Ok(AuditRow {
        student_id: row.get(0)?,
        student_name: row.get(1)?,
        course_id: row.get(2)?,
        course_code: row.get(3)?,
        status,
    })
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::AuditStatus;
    use crate::seed;
    use std::collections::HashSet;

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        seed::load(&db).unwrap();
        db
    }

    #[test]
    fn test_roster_orders_by_grade_with_in_progress_last() {
        let db = seeded();
        let rows = db.complete_enrollments("2024-Fall").unwrap();
        assert_eq!(rows.len(), 8);

        let graded: Vec<f64> = rows.iter().filter_map(|r| r.grade).collect();
        assert_eq!(graded, vec![3.7, 3.3, 2.0]);
        assert!(rows[..3].iter().all(|r| r.grade.is_some()));
        assert!(rows[3..].iter().all(|r| r.grade.is_none()));
        assert_eq!(rows[0].student_name, "David Brown");
        assert_eq!(rows[0].course_code, "CS201");
    }

    #[test]
    fn test_roster_unknown_semester_is_empty() {
        let db = seeded();
        assert!(db.complete_enrollments("1999-Fall").unwrap().is_empty());
    }

    #[test]
    fn test_unenrolled_students_is_the_no_major_fixture() {
        let db = seeded();
        let rows = db.unenrolled_students().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].student_id, 8);
        assert_eq!(rows[0].major, None);
    }

    #[test]
    fn test_untaken_courses_is_exactly_one() {
        let db = seeded();
        let rows = db.untaken_courses().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].course_id, 302);
        assert_eq!(rows[0].course_code, "PHYS301");
    }

    #[test]
    fn test_audit_surfaces_only_partial_matches() {
        let db = seeded();
        let rows = db.enrollment_audit().unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].student_id, Some(8));
        assert_eq!(rows[0].course_id, None);
        assert_eq!(rows[0].status, AuditStatus::StudentNotEnrolled);

        // Rows without a student sort last
        assert_eq!(rows[1].student_id, None);
        assert_eq!(rows[1].course_id, Some(302));
        assert_eq!(rows[1].status, AuditStatus::CourseNotTaken);
    }

    #[test]
    fn test_audit_empty_when_everything_matches() {
        let db = seeded();
        db.delete_student(8).unwrap();
        db.delete_course(302).unwrap();
        assert!(db.enrollment_audit().unwrap().is_empty());
    }

    #[test]
    fn test_study_peers_pairs_are_unique_and_ordered() {
        let db = seeded();
        let pairs = db.study_peers().unwrap();
        let students: std::collections::HashMap<i64, _> = db
            .list_students()
            .unwrap()
            .into_iter()
            .map(|s| (s.student_id, s))
            .collect();

        let mut seen = HashSet::new();
        for pair in &pairs {
            assert!(pair.student1_id < pair.student2_id);
            let s1 = &students[&pair.student1_id];
            let s2 = &students[&pair.student2_id];
            assert_eq!(s1.major.as_deref(), Some(pair.major.as_str()));
            assert_eq!(s1.major, s2.major);
            assert_eq!(s1.enrollment_date, s2.enrollment_date);
            assert!(seen.insert((pair.student1_id, pair.student2_id)));
            assert!(!seen.contains(&(pair.student2_id, pair.student1_id)));
        }

        let ids: Vec<(i64, i64)> = pairs
            .iter()
            .map(|p| (p.student1_id, p.student2_id))
            .collect();
        assert_eq!(ids, vec![(1, 2), (1, 7), (2, 7), (3, 5), (6, 9)]);
    }
}
