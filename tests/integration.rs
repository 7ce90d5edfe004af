use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn rvw_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("rvw");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    // Project fixture: two reviewable files plus one excluded extension.
    let project_dir = root.join("project");
    fs::create_dir_all(&project_dir).unwrap();
    fs::write(project_dir.join("A.py"), "print(1)").unwrap();
    fs::write(project_dir.join("B.txt"), "notes, not code").unwrap();
    fs::write(project_dir.join("C.java"), "").unwrap();

    // The LLM endpoint points at a port nothing listens on, so every
    // generation call fails fast and is recorded as a failed review.
    // Embeddings are disabled; runs still write reports.
    let config_content = format!(
        r#"[store]
db_path = "{root}/data/reviews.sqlite"
data_root = "{root}/data/reports"
user_root = "{root}/user_data"
clone_dir = "{root}/cloned_projects"

[review]
extensions = [".py", ".java"]
max_content_chars = 3000
per_call_timeout_secs = 5

[llm]
base_url = "http://127.0.0.1:9"
model = "test-model"
timeout_secs = 2

[server]
bind = "127.0.0.1:7401"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("review.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_rvw(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = rvw_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run rvw binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_rvw(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/reviews.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_rvw(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_rvw(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_review_local_tree_survives_unreachable_model() {
    let (tmp, config_path) = setup_test_env();

    run_rvw(&config_path, &["init"]);

    let project = tmp.path().join("project");
    let (stdout, stderr, success) = run_rvw(
        &config_path,
        &["review", project.to_str().unwrap(), "--progress", "off"],
    );
    assert!(
        success,
        "review failed: stdout={}, stderr={}",
        stdout, stderr
    );

    // Both .py and .java reviewed; B.txt excluded; every call failed but
    // the run completed.
    assert!(stdout.contains("total files: 2"), "stdout: {}", stdout);
    assert!(stdout.contains("failed: 2"), "stdout: {}", stdout);
    assert!(stdout.contains("ok"));

    // One report per sequence id under the single-user data root.
    let reports_dir = tmp.path().join("data/reports");
    assert!(reports_dir.join("review_1.json").exists());
    assert!(reports_dir.join("review_2.json").exists());
    assert!(!reports_dir.join("review_3.json").exists());

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(reports_dir.join("review_1.json")).unwrap())
            .unwrap();
    assert!(report["file"].as_str().unwrap().ends_with("A.py"));
    assert_eq!(report["status"], "failed");
    assert!(!report["summary"].as_str().unwrap().is_empty());
}

#[test]
fn test_review_missing_root_fails() {
    let (_tmp, config_path) = setup_test_env();

    run_rvw(&config_path, &["init"]);
    let (_, stderr, success) = run_rvw(
        &config_path,
        &["review", "/no/such/project", "--progress", "off"],
    );
    assert!(!success);
    assert!(stderr.contains("does not exist"), "stderr: {}", stderr);
}

#[test]
fn test_reports_list_after_run() {
    let (tmp, config_path) = setup_test_env();

    run_rvw(&config_path, &["init"]);
    let project = tmp.path().join("project");
    run_rvw(
        &config_path,
        &["review", project.to_str().unwrap(), "--progress", "off"],
    );

    let (stdout, _, success) = run_rvw(&config_path, &["reports", "list"]);
    assert!(success);
    assert!(stdout.contains("A.py"));
    assert!(stdout.contains("C.java"));
    assert!(!stdout.contains("B.txt"));
}

#[test]
fn test_reports_list_empty_scope() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_rvw(&config_path, &["reports", "list"]);
    assert!(success);
    assert!(stdout.contains("No reports found."));
}

#[test]
fn test_user_register_and_duplicate() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_rvw(
        &config_path,
        &["user", "register", "alice", "--password", "hunter2"],
    );
    assert!(success);
    assert!(stdout.contains("alice"));
    assert!(tmp.path().join("user_data/users.json").exists());

    let (_, stderr, success) = run_rvw(
        &config_path,
        &["user", "register", "alice", "--password", "other"],
    );
    assert!(!success);
    assert!(stderr.contains("already exists"), "stderr: {}", stderr);
}

#[test]
fn test_review_scoped_to_user_uses_multi_user_layout() {
    let (tmp, config_path) = setup_test_env();

    run_rvw(&config_path, &["init"]);
    let project = tmp.path().join("project");
    let (stdout, stderr, success) = run_rvw(
        &config_path,
        &[
            "review",
            project.to_str().unwrap(),
            "--user",
            "alice",
            "--project",
            "demo",
            "--progress",
            "off",
        ],
    );
    assert!(
        success,
        "review failed: stdout={}, stderr={}",
        stdout, stderr
    );

    let scoped = tmp
        .path()
        .join("user_data/alice/projects/demo/code_review_reports");
    assert!(scoped.join("review_1.json").exists());
    assert!(scoped.join("review_2.json").exists());
}
