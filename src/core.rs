use crate::config::{self, DEFAULT_SEMESTER_KEY};
use crate::db::Database;
use crate::error::{EnrollError, Result};
use crate::models::{
    AuditRow, Course, CourseRanking, DepartmentTrend, Enrollment, Mismatch, PeerPair, RosterRow,
    Semester, SemesterChange, Student, StudentStanding,
};
use crate::seed::{self, SeedSummary};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;

/// Every report computed from one snapshot
#[derive(Debug, Clone, Serialize)]
pub struct ReportBundle {
    pub semester: Option<String>,
    pub roster: Vec<RosterRow>,
    pub unenrolled: Vec<Student>,
    pub untaken: Vec<Course>,
    pub audit: Vec<AuditRow>,
    pub peers: Vec<PeerPair>,
    pub rankings: Vec<CourseRanking>,
    pub trends: Vec<DepartmentTrend>,
    pub changes: Vec<SemesterChange>,
    pub distribution: Vec<StudentStanding>,
}

/// Validating facade over the database
pub struct Registrar {
    db: Database,
}

impl Registrar {
    /// Open database at specific path
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = Database::open(path)?;
        Ok(Registrar { db })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Registrar { db })
    }

    /// Check if initialized
    pub fn is_initialized(&self) -> Result<bool> {
        self.db.is_initialized()
    }

    /// Create the schema; fails if it already exists
    pub fn init(&self) -> Result<()> {
        if self.db.is_initialized()? {
            return Err(EnrollError::AlreadyInitialized);
        }
        self.db.init()
    }

    /// Load the fixture rows
    pub fn seed(&self) -> Result<SeedSummary> {
        seed::load(&self.db)
    }

    // ==================== Writes ====================

    pub fn add_student(
        &self,
        student_id: i64,
        name: &str,
        major: Option<&str>,
        enrollment_date: NaiveDate,
    ) -> Result<Student> {
        let name = non_empty(name, "Student name")?;
        let major = major.map(str::trim).filter(|m| !m.is_empty());
        self.db
            .insert_student(student_id, name, major, enrollment_date)
    }

    pub fn add_course(
        &self,
        course_id: i64,
        course_code: &str,
        course_name: &str,
        department: &str,
        credits: i64,
    ) -> Result<Course> {
        if credits <= 0 {
            return Err(EnrollError::InvalidCredits(credits));
        }
        let course_code = non_empty(course_code, "Course code")?;
        let course_name = non_empty(course_name, "Course name")?;
        let department = non_empty(department, "Department")?;
        self.db
            .insert_course(course_id, course_code, course_name, department, credits)
    }

    pub fn enroll(
        &self,
        enrollment_id: i64,
        student_id: i64,
        course_id: i64,
        semester: &str,
        grade: Option<f64>,
        enrollment_date: NaiveDate,
    ) -> Result<Enrollment> {
        let semester: Semester = semester.parse()?;
        if let Some(g) = grade {
            check_grade(g)?;
        }
        if self.db.get_student(student_id)?.is_none() {
            return Err(EnrollError::StudentNotFound(student_id));
        }
        if self.db.get_course(course_id)?.is_none() {
            return Err(EnrollError::CourseNotFound(course_id));
        }
        self.db.insert_enrollment(
            enrollment_id,
            student_id,
            course_id,
            &semester.to_string(),
            grade,
            enrollment_date,
        )
    }

    /// Record a final grade, or clear it to mark the enrollment in progress
    pub fn record_grade(&self, enrollment_id: i64, grade: Option<f64>) -> Result<Enrollment> {
        if let Some(g) = grade {
            check_grade(g)?;
        }
        self.db.set_grade(enrollment_id, grade)
    }

    /// Remove a student and, by cascade, their enrollments
    pub fn remove_student(&self, student_id: i64) -> Result<usize> {
        self.db.delete_student(student_id)
    }

    /// Remove a course and, by cascade, its enrollments
    pub fn remove_course(&self, course_id: i64) -> Result<usize> {
        self.db.delete_course(course_id)
    }

    // ==================== Reads ====================

    pub fn students(&self) -> Result<Vec<Student>> {
        self.db.list_students()
    }

    pub fn courses(&self) -> Result<Vec<Course>> {
        self.db.list_courses()
    }

    pub fn enrollments(&self) -> Result<Vec<Enrollment>> {
        self.db.list_enrollments()
    }

    /// Resolve the roster semester: explicit argument, else stored default
    pub fn resolve_semester(&self, semester: Option<&str>) -> Result<String> {
        let label = match semester {
            Some(s) => s.to_string(),
            None => self
                .db
                .get_setting(DEFAULT_SEMESTER_KEY)?
                .ok_or(EnrollError::MissingSemester)?,
        };
        Ok(label.parse::<Semester>()?.to_string())
    }

    pub fn roster(&self, semester: Option<&str>) -> Result<(String, Vec<RosterRow>)> {
        let semester = self.resolve_semester(semester)?;
        let rows = self.db.complete_enrollments(&semester)?;
        Ok((semester, rows))
    }

    pub fn unenrolled_students(&self) -> Result<Vec<Student>> {
        self.db.unenrolled_students()
    }

    pub fn untaken_courses(&self) -> Result<Vec<Course>> {
        self.db.untaken_courses()
    }

    pub fn audit(&self) -> Result<Vec<AuditRow>> {
        self.db.enrollment_audit()
    }

    pub fn peers(&self) -> Result<Vec<PeerPair>> {
        self.db.study_peers()
    }

    pub fn rankings(&self) -> Result<Vec<CourseRanking>> {
        self.db.course_rankings()
    }

    pub fn trends(&self) -> Result<Vec<DepartmentTrend>> {
        self.db.department_trends()
    }

    pub fn changes(&self) -> Result<Vec<SemesterChange>> {
        self.db.semester_changes()
    }

    pub fn distribution(&self) -> Result<Vec<StudentStanding>> {
        self.db.performance_distribution()
    }

    /// Run every report against one read snapshot. The roster is skipped
    /// when no semester is given and no default is stored.
    pub fn all_reports(&self, semester: Option<&str>) -> Result<ReportBundle> {
        let semester = match self.resolve_semester(semester) {
            Ok(s) => Some(s),
            Err(EnrollError::MissingSemester) => None,
            Err(e) => return Err(e),
        };

        self.db.transaction(|db| {
            let roster = match &semester {
                Some(s) => db.complete_enrollments(s)?,
                None => Vec::new(),
            };
            Ok(ReportBundle {
                semester: semester.clone(),
                roster,
                unenrolled: db.unenrolled_students()?,
                untaken: db.untaken_courses()?,
                audit: db.enrollment_audit()?,
                peers: db.study_peers()?,
                rankings: db.course_rankings()?,
                trends: db.department_trends()?,
                changes: db.semester_changes()?,
                distribution: db.performance_distribution()?,
            })
        })
    }

    pub fn verify(&self) -> Result<Vec<Mismatch>> {
        self.db.verify_window_analytics()
    }

    // ==================== Settings ====================

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        config::validate_key(key)?;
        self.db.get_setting(key)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        config::validate_setting(key, value)?;
        self.db.set_setting(key, value)
    }

    pub fn unset_setting(&self, key: &str) -> Result<bool> {
        config::validate_key(key)?;
        self.db.delete_setting(key)
    }
}

fn check_grade(grade: f64) -> Result<()> {
    if (0.0..=4.0).contains(&grade) {
        Ok(())
    } else {
        Err(EnrollError::GradeOutOfRange(grade))
    }
}

fn non_empty<'a>(value: &'a str, field: &'static str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(EnrollError::EmptyField(field))
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_date;

    fn registrar() -> Registrar {
        let registrar = Registrar::open_in_memory().unwrap();
        registrar.init().unwrap();
        registrar
    }

    fn seeded() -> Registrar {
        let registrar = registrar();
        registrar.seed().unwrap();
        registrar
    }

    #[test]
    fn test_init_twice_fails() {
        let registrar = registrar();
        assert!(matches!(
            registrar.init(),
            Err(EnrollError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_add_course_rejects_non_positive_credits() {
        let registrar = registrar();
        for credits in [0, -3] {
            assert!(matches!(
                registrar.add_course(1, "CS1", "Intro", "Computer Science", credits),
                Err(EnrollError::InvalidCredits(c)) if c == credits
            ));
        }
        assert!(registrar.courses().unwrap().is_empty());
    }

    #[test]
    fn test_add_student_trims_and_validates() {
        let registrar = registrar();
        let date = parse_date("2024-09-01").unwrap();
        assert!(matches!(
            registrar.add_student(1, "   ", None, date),
            Err(EnrollError::EmptyField(_))
        ));
        let student = registrar
            .add_student(1, " Ada ", Some("  "), date)
            .unwrap();
        assert_eq!(student.name, "Ada");
        assert_eq!(student.major, None);
    }

    #[test]
    fn test_enroll_validates_grade_and_semester() {
        let registrar = seeded();
        let date = parse_date("2025-01-10").unwrap();
        assert!(matches!(
            registrar.enroll(100, 1, 101, "2025-Spring", Some(4.5), date),
            Err(EnrollError::GradeOutOfRange(_))
        ));
        assert!(matches!(
            registrar.enroll(100, 1, 101, "Spring 2025", None, date),
            Err(EnrollError::InvalidSemester(_))
        ));
        assert!(matches!(
            registrar.enroll(100, 99, 101, "2025-Spring", None, date),
            Err(EnrollError::StudentNotFound(99))
        ));
        assert!(matches!(
            registrar.enroll(100, 1, 999, "2025-Spring", None, date),
            Err(EnrollError::CourseNotFound(999))
        ));

        let e = registrar
            .enroll(100, 8, 302, "2025-Spring", None, date)
            .unwrap();
        assert_eq!(e.semester, "2025-Spring");
        assert!(registrar.unenrolled_students().unwrap().is_empty());
        assert!(registrar.untaken_courses().unwrap().is_empty());
    }

    #[test]
    fn test_enroll_rejects_years_that_do_not_round_trip() {
        let registrar = seeded();
        let date = parse_date("2025-01-10").unwrap();
        for label in ["0999-Fall", "+999-Spring"] {
            assert!(
                matches!(
                    registrar.enroll(100, 8, 302, label, None, date),
                    Err(EnrollError::InvalidSemester(_))
                ),
                "{label}"
            );
        }
        assert!(
            registrar
                .enrollments()
                .unwrap()
                .iter()
                .all(|e| e.semester.parse::<Semester>().is_ok())
        );
    }

    #[test]
    fn test_stored_semesters_keep_chronological_order() {
        let registrar = seeded();
        let date = parse_date("2025-01-10").unwrap();
        registrar.enroll(100, 8, 302, "2025-Fall", None, date).unwrap();
        registrar.enroll(101, 1, 302, "2025-Spring", None, date).unwrap();

        let physics: Vec<String> = registrar
            .trends()
            .unwrap()
            .into_iter()
            .filter(|t| t.department == "Physics")
            .map(|t| t.semester)
            .collect();
        assert_eq!(
            physics,
            vec!["2023-Fall", "2024-Spring", "2024-Fall", "2025-Spring", "2025-Fall"]
        );
    }

    #[test]
    fn test_enroll_same_course_twice_in_semester_rejected() {
        let registrar = seeded();
        let date = parse_date("2023-08-20").unwrap();
        // Student 1 already took course 101 in 2023-Fall
        assert!(matches!(
            registrar.enroll(100, 1, 101, "2023-Fall", None, date),
            Err(EnrollError::Duplicate(_))
        ));
    }

    #[test]
    fn test_record_grade() {
        let registrar = seeded();
        assert!(matches!(
            registrar.record_grade(3, Some(-1.0)),
            Err(EnrollError::GradeOutOfRange(_))
        ));
        let e = registrar.record_grade(3, Some(4.0)).unwrap();
        assert_eq!(e.grade, Some(4.0));
        assert!(registrar
            .enrollments()
            .unwrap()
            .iter()
            .all(|e| e.grade.is_none_or(|g| (0.0..=4.0).contains(&g))));
    }

    #[test]
    fn test_remove_student_cascades() {
        let registrar = seeded();
        assert_eq!(registrar.remove_student(1).unwrap(), 4);
        assert!(registrar
            .enrollments()
            .unwrap()
            .iter()
            .all(|e| e.student_id != 1));
    }

    #[test]
    fn test_remove_course_cascades() {
        let registrar = seeded();
        assert_eq!(registrar.remove_course(201).unwrap(), 6);
        assert!(registrar
            .enrollments()
            .unwrap()
            .iter()
            .all(|e| e.course_id != 201));
        assert_eq!(registrar.remove_course(302).unwrap(), 0);
    }

    #[test]
    fn test_roster_uses_default_semester() {
        let registrar = seeded();
        assert!(matches!(
            registrar.roster(None),
            Err(EnrollError::MissingSemester)
        ));

        registrar
            .set_setting(DEFAULT_SEMESTER_KEY, "2023-Fall")
            .unwrap();
        let (semester, rows) = registrar.roster(None).unwrap();
        assert_eq!(semester, "2023-Fall");
        assert_eq!(rows.len(), 7);

        let (semester, _) = registrar.roster(Some("2024-Spring")).unwrap();
        assert_eq!(semester, "2024-Spring");
    }

    #[test]
    fn test_settings_validation() {
        let registrar = registrar();
        assert!(matches!(
            registrar.set_setting(DEFAULT_SEMESTER_KEY, "next term"),
            Err(EnrollError::InvalidSemester(_))
        ));
        assert!(matches!(
            registrar.get_setting("unknown"),
            Err(EnrollError::UnknownSetting(_))
        ));
        registrar
            .set_setting(DEFAULT_SEMESTER_KEY, "2024-Fall")
            .unwrap();
        assert!(registrar.unset_setting(DEFAULT_SEMESTER_KEY).unwrap());
        assert_eq!(registrar.get_setting(DEFAULT_SEMESTER_KEY).unwrap(), None);
    }

    #[test]
    fn test_all_reports_without_semester_skips_roster() {
        let registrar = seeded();
        let bundle = registrar.all_reports(None).unwrap();
        assert_eq!(bundle.semester, None);
        assert!(bundle.roster.is_empty());
        assert_eq!(bundle.unenrolled.len(), 1);
        assert_eq!(bundle.untaken.len(), 1);
        assert_eq!(bundle.audit.len(), 2);
        assert_eq!(bundle.peers.len(), 5);
        assert_eq!(bundle.rankings.len(), 7);

        let bundle = registrar.all_reports(Some("2024-Spring")).unwrap();
        assert_eq!(bundle.roster.len(), 9);
    }

    #[test]
    fn test_verify_clean_after_writes() {
        let registrar = seeded();
        registrar.remove_student(4).unwrap();
        registrar.record_grade(17, Some(3.2)).unwrap();
        assert!(registrar.verify().unwrap().is_empty());
    }
}
