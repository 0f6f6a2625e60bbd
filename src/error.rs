use rusqlite::ffi;
use thiserror::Error;

/// All possible errors in the enrollment reporting tool
#[derive(Error, Debug)]
pub enum EnrollError {
    #[error("Student #{0} not found")]
    StudentNotFound(i64),

    #[error("Course #{0} not found")]
    CourseNotFound(i64),

    #[error("Enrollment #{0} not found")]
    EnrollmentNotFound(i64),

    #[error("Grade {0} is outside the 0.0-4.0 scale")]
    GradeOutOfRange(f64),

    #[error("Course credits must be positive, got {0}")]
    InvalidCredits(i64),

    #[error("Invalid semester label '{0}'. Expected <YEAR>-<Spring|Summer|Fall>, e.g. 2024-Fall")]
    InvalidSemester(String),

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Constraint failed: {0}")]
    ConstraintFailed(String),

    #[error("Referenced record does not exist: {0}")]
    MissingReference(String),

    #[error("Unknown setting '{0}'. Known settings: {known}", known = crate::config::KNOWN_SETTINGS.join(", "))]
    UnknownSetting(String),

    #[error("No semester given and no default set. Use `--semester` or `enroll config set default_semester <SEMESTER>`")]
    MissingSemester,

    #[error("Database not initialized. Run `enroll init` first.")]
    NotInitialized,

    #[error("Database already initialized")]
    AlreadyInitialized,

    #[error("Database already holds students; seed data can only be loaded into an empty database")]
    AlreadySeeded,

    #[error("Window analytics disagree with recomputation in {0} place(s)")]
    VerificationFailed(usize),

    #[error("Database error: {0}")]
    Db(rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for EnrollError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                let msg = msg.clone().unwrap_or_else(|| code.to_string());
                match code.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        EnrollError::Duplicate(msg)
                    }
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => EnrollError::MissingReference(msg),
                    _ => EnrollError::ConstraintFailed(msg),
                }
            }
            _ => EnrollError::Db(err),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EnrollError>;
