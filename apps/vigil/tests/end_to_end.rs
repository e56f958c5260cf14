use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;
use vigil::config::{resolve_effective, Overrides};
use vigil::lint::run_lint;
use vigil::report;
use vigil::select::{SelectionMode, SelectionSource};

const USER_CS: &str = "\
namespace App.Models;

/// <summary>User</summary>
public class User { }

/// <summary>Role</summary>
public class Role { }
// TODO: move Role out
";

fn write(root: &Path, rel: &str, content: &str) {
    let p = root.join(rel);
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(p, content).unwrap();
}

fn fixture(root: &Path) {
    fs::create_dir(root.join(".git")).unwrap();
    write(root, "Models/User.cs", USER_CS);
    write(root, "Views/Index.cshtml", "<button onclick=\"save()\">Save</button>\n");
    write(root, "src/app.ts", "export const greet = (n: string) => `hi ${n}`;\n");
    write(root, "node_modules/lib/x.ts", "console.log('ignored');\n");
    write(root, "README.md", "password123\n");
}

fn all_files(root: &Path) -> Overrides {
    Overrides {
        repo_root: Some(root.to_string_lossy().to_string()),
        selection: Some(SelectionMode::All),
        ..Overrides::default()
    }
}

#[test]
fn test_pipeline_scores_and_reports() {
    let dir = tempdir().unwrap();
    fixture(dir.path());
    let eff = resolve_effective(&all_files(dir.path())).unwrap();

    let run = run_lint(&eff, &[]).unwrap();
    assert_eq!(run.source, Some(SelectionSource::All));
    let mut candidates = run.candidates.clone();
    candidates.sort();
    assert_eq!(
        candidates,
        vec!["Models/User.cs", "Views/Index.cshtml", "src/app.ts"]
    );
    let res = &run.result;
    assert_eq!(res.files_checked, 3);
    assert_eq!(res.counts.errors, 4);
    assert_eq!(res.counts.warnings, 0);
    assert_eq!(res.files_with_errors, 2);
    assert_eq!(res.compliance_score, 33.3);
    assert_eq!(res.exit_code(), 1);

    let lines: Vec<_> = res
        .violations
        .iter()
        .map(|v| (v.file_path.as_str(), v.line_number, v.rule_id.as_str()))
        .collect();
    assert_eq!(
        lines,
        vec![
            ("Models/User.cs", 4, "single-declaration-per-file"),
            ("Models/User.cs", 7, "single-declaration-per-file"),
            ("Models/User.cs", 8, "no-incomplete-implementation-markers"),
            ("Views/Index.cshtml", 1, "no-inline-presentation-code"),
        ]
    );
    assert!(run.report.contains("**Compliance Score**: 33.3/100"));
    assert!(run.report.contains("**File**: `Models/User.cs:7`"));
}

#[test]
fn test_repeated_runs_write_identical_reports() {
    let dir = tempdir().unwrap();
    fixture(dir.path());
    let eff = resolve_effective(&all_files(dir.path())).unwrap();

    let first = run_lint(&eff, &[]).unwrap();
    report::persist(&eff.report_path(), &first.report).unwrap();
    let before = fs::read(eff.report_path()).unwrap();

    let second = run_lint(&eff, &[]).unwrap();
    report::persist(&eff.report_path(), &second.report).unwrap();
    assert_eq!(before, fs::read(eff.report_path()).unwrap());
}

#[test]
fn test_single_file_with_two_declarations_and_todo() {
    let dir = tempdir().unwrap();
    fixture(dir.path());
    let eff = resolve_effective(&all_files(dir.path())).unwrap();

    let run = run_lint(&eff, &["Models/User.cs".to_string()]).unwrap();
    assert_eq!(run.source, Some(SelectionSource::Explicit));
    assert_eq!(run.result.files_checked, 1);
    assert_eq!(run.result.counts.errors, 3);
    assert_eq!(run.result.compliance_score, 0.0);
    assert_eq!(run.result.exit_code(), 1);
}

#[test]
fn test_missing_root_and_empty_tree_are_informational() {
    let dir = tempdir().unwrap();
    let eff = resolve_effective(&all_files(&dir.path().join("absent"))).unwrap();
    let run = run_lint(&eff, &[]).unwrap();
    assert!(run.source.is_none());
    assert_eq!(run.result.files_checked, 0);
    assert_eq!(run.result.exit_code(), 0);

    fs::create_dir(dir.path().join(".git")).unwrap();
    write(dir.path(), "notes.txt", "nothing governed\n");
    let eff = resolve_effective(&all_files(dir.path())).unwrap();
    let run = run_lint(&eff, &[]).unwrap();
    assert!(run.source.is_none());
    assert_eq!(run.result.total_violations(), 0);
}

#[test]
fn test_binary_check_and_gate() {
    let dir = tempdir().unwrap();
    fixture(dir.path());
    let exe = env!("CARGO_BIN_EXE_vigil");

    let out = Command::new(exe)
        .args(["check", "--selection", "all", "--output", "json", "--repo-root"])
        .arg(dir.path())
        .env("NO_COLOR", "1")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["compliance_score"], 33.3);
    assert_eq!(json["report"], "CODE_VALIDATION_REPORT.md");
    assert!(dir.path().join("CODE_VALIDATION_REPORT.md").exists());

    write(
        dir.path(),
        "todos.json",
        r#"{"todos": [
            {"id": "1", "content": "models", "priority": "high", "status": "completed"},
            {"id": "2", "content": "views", "priority": "medium", "status": "pending"}
        ]}"#,
    );
    let out = Command::new(exe)
        .args(["gate", "--output", "json", "--tasks"])
        .arg(dir.path().join("todos.json"))
        .arg("--repo-root")
        .arg(dir.path())
        .env("NO_COLOR", "1")
        .output()
        .unwrap();
    // the gate propagates the failing quality gate of the validation it ran
    assert_eq!(out.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["should_trigger_validation"], true);
    assert_eq!(json["all_high_priority_completed"], true);
    assert_eq!(json["validation"]["completed"], true);
    assert_eq!(json["validation"]["compliance_score"], 33.3);
    assert_eq!(json["validation"]["quality_gate_passed"], false);
}

#[test]
fn test_gate_over_tree_without_governed_files_passes() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join(".git")).unwrap();
    write(
        dir.path(),
        "todos.json",
        r#"[{"id": "1", "priority": "high", "status": "completed"}]"#,
    );
    let out = Command::new(env!("CARGO_BIN_EXE_vigil"))
        .args(["gate", "--tasks"])
        .arg(dir.path().join("todos.json"))
        .arg("--repo-root")
        .arg(dir.path())
        .env("NO_COLOR", "1")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0));
    let summary = String::from_utf8_lossy(&out.stdout);
    assert!(summary.contains("- **Status**: COMPLETED"));
    assert!(summary.contains("No governed files found to validate"));
    assert!(!summary.contains("WARNING"));
    assert!(!dir.path().join("CODE_VALIDATION_REPORT.md").exists());
}
