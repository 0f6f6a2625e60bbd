use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn enroll(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("enroll").unwrap();
    cmd.current_dir(dir);
    cmd.env_remove("ENROLL_DB");
    cmd
}

fn seeded_dir() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    enroll(&temp_dir).arg("init").assert().success();
    enroll(&temp_dir)
        .arg("seed")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Loaded 10 students, 7 courses, 24 enrollments",
        ));
    temp_dir
}

fn json_value(dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = enroll(dir).args(args).arg("--json").output().unwrap();
    assert!(output.status.success(), "{args:?} failed");
    serde_json::from_slice(&output.stdout).unwrap()
}

fn json_rows(dir: &TempDir, args: &[&str]) -> Vec<serde_json::Value> {
    json_value(dir, args).as_array().unwrap().clone()
}

#[test]
fn test_commands_require_init() {
    let temp_dir = TempDir::new().unwrap();
    enroll(&temp_dir)
        .args(["report", "peers"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn test_init_twice_fails() {
    let temp_dir = TempDir::new().unwrap();
    enroll(&temp_dir).arg("init").assert().success();
    enroll(&temp_dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn test_seed_twice_fails() {
    let temp_dir = seeded_dir();
    enroll(&temp_dir)
        .arg("seed")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already holds students"));
}

#[test]
fn test_print_schema_and_seed_sql() {
    let temp_dir = TempDir::new().unwrap();
    enroll(&temp_dir)
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("UNIQUE (student_id, course_id, semester)"));
    enroll(&temp_dir)
        .args(["seed", "--print"])
        .assert()
        .success()
        .stdout(predicate::str::contains("INSERT INTO enrollments"))
        .stdout(predicate::str::contains("'Henry Wilson', NULL"));
}

#[test]
fn test_anti_join_reports() {
    let temp_dir = seeded_dir();
    enroll(&temp_dir)
        .args(["report", "unenrolled"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Henry Wilson"))
        .stdout(predicate::str::contains("Alice").not());

    let courses = json_rows(&temp_dir, &["report", "untaken"]);
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["course_code"], "PHYS301");

    let audit = json_rows(&temp_dir, &["report", "audit"]);
    let statuses: Vec<&str> = audit.iter().map(|r| r["status"].as_str().unwrap()).collect();
    assert_eq!(statuses, vec!["Student Not Enrolled", "Course Not Taken"]);
}

#[test]
fn test_peer_pairs_json() {
    let temp_dir = seeded_dir();
    let pairs = json_rows(&temp_dir, &["report", "peers"]);
    assert_eq!(pairs.len(), 5);
    for pair in &pairs {
        assert!(pair["student1_id"].as_i64().unwrap() < pair["student2_id"].as_i64().unwrap());
    }
}

#[test]
fn test_roster_uses_stored_default_semester() {
    let temp_dir = seeded_dir();
    enroll(&temp_dir)
        .args(["report", "roster"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No semester given"));

    enroll(&temp_dir)
        .args(["config", "set", "default_semester", "2024-Fall"])
        .assert()
        .success();
    enroll(&temp_dir)
        .args(["report", "roster"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Roster for 2024-Fall"))
        .stdout(predicate::str::contains("in progress"));

    enroll(&temp_dir)
        .args(["config", "set", "colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown setting"));
}

#[test]
fn test_window_reports_and_verify() {
    let temp_dir = seeded_dir();
    enroll(&temp_dir)
        .args(["report", "distribution"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Top Performer"))
        .stdout(predicate::str::contains("Needs Improvement"));

    let trends = json_rows(&temp_dir, &["report", "trends"]);
    let physics: Vec<i64> = trends
        .iter()
        .filter(|r| r["department"] == "Physics")
        .map(|r| r["running_total"].as_i64().unwrap())
        .collect();
    assert_eq!(physics, vec![1, 3, 4]);

    enroll(&temp_dir)
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("no mismatches"));

    enroll(&temp_dir)
        .args(["report", "all", "--semester", "2023-Fall"])
        .assert()
        .success()
        .stdout(predicate::str::contains("== Roster (2023-Fall) =="))
        .stdout(predicate::str::contains("== Performance distribution =="));
}

#[test]
fn test_write_commands_and_constraints() {
    let temp_dir = seeded_dir();

    enroll(&temp_dir)
        .args(["register", "30", "1", "101", "2023-Fall", "--date", "2023-08-20"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate record"));

    enroll(&temp_dir)
        .args(["register", "30", "8", "302", "2025-Spring", "--date", "2025-01-10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("grade: in progress"));

    enroll(&temp_dir)
        .args(["grade", "30", "4.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside the 0.0-4.0 scale"));

    enroll(&temp_dir)
        .args(["grade", "30", "3.5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("grade: 3.50"));

    enroll(&temp_dir)
        .args([
            "course", "add", "400", "ART101", "Drawing", "--department", "Art", "--credits", "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("credits must be positive"));

    enroll(&temp_dir)
        .args(["student", "delete", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted student #1 and 4 enrollment(s)"));

    enroll(&temp_dir)
        .args(["course", "delete", "302"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted course #302 and 1 enrollment(s)"));
}

#[test]
fn test_db_flag_and_env_var() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("custom.db");

    enroll(&temp_dir)
        .args(["--db", path.to_str().unwrap(), "init"])
        .assert()
        .success();
    assert!(path.exists());
    assert!(!temp_dir.path().join("enroll.db").exists());

    enroll(&temp_dir)
        .env("ENROLL_DB", &path)
        .args(["student", "add", "1", "Ada Lovelace", "--major", "Mathematics", "--date", "2024-09-01"])
        .assert()
        .success();

    enroll(&temp_dir)
        .args(["--db", path.to_str().unwrap(), "student", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ada Lovelace"));
}

#[test]
fn test_config_commands_honor_json() {
    let temp_dir = seeded_dir();

    let unset = json_value(&temp_dir, &["config", "get", "default_semester"]);
    assert_eq!(unset["key"], "default_semester");
    assert!(unset["value"].is_null());

    let set = json_value(&temp_dir, &["config", "set", "default_semester", "2024-Spring"]);
    assert_eq!(set["value"], "2024-Spring");

    let get = json_value(&temp_dir, &["config", "get", "default_semester"]);
    assert_eq!(get["value"], "2024-Spring");

    let removed = json_value(&temp_dir, &["config", "unset", "default_semester"]);
    assert_eq!(removed["removed"], true);

    let again = json_value(&temp_dir, &["config", "unset", "default_semester"]);
    assert_eq!(again["removed"], false);
}
