use std::io::{BufRead, BufReader, Read, Write};
use std::process::Stdio;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const WEEK_ID: &str = "66f1c0ffee0000000000abcd";

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

struct Sandbox {
    home: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let sandbox = Sandbox {
            home: tempfile::tempdir().unwrap(),
        };
        let data_dir = sandbox.home.path().join("data");
        sandbox
            .cmd()
            .args(["init", "--data-dir", data_dir.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("Initialized pennywise"));
        sandbox
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("pennywise").unwrap();
        cmd.env("HOME", self.home.path())
            .env("NO_COLOR", "1")
            .env_remove("PENNYWISE_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> String {
        let output = self.cmd().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "{args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    /// Write a variant of the week fixture into the sandbox and return its path.
    fn week_variant(&self, name: &str, edit: impl FnOnce(String) -> String) -> String {
        let content = std::fs::read_to_string(fixture("week.json")).unwrap();
        let path = self.home.path().join(name);
        std::fs::write(&path, edit(content)).unwrap();
        path.to_str().unwrap().to_string()
    }

    fn import_week(&self) {
        self.run(&["budget", "import", &fixture("week.json")]);
    }
}

#[test]
fn test_commands_require_init() {
    let home = tempfile::tempdir().unwrap();
    Command::cargo_bin("pennywise")
        .unwrap()
        .env("HOME", home.path())
        .args(["budget", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pennywise init"));
}

#[test]
fn test_init_writes_settings_and_database() {
    let sandbox = Sandbox::new();
    let settings = sandbox.home.path().join(".config/pennywise/settings.json");
    assert!(settings.exists());
    assert!(sandbox.home.path().join("data/pennywise.db").exists());
    sandbox
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Budgets:     0"));
}

#[test]
fn test_import_and_show() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["budget", "import", &fixture("week.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 categories, 3 payments"));

    let out = sandbox.run(&["budget", "show", "--budget", "2026-10-14", "--as-of", "2026-10-15"]);
    assert!(out.contains("Week of 2026-10-12 to 2026-10-18"), "{out}");
    assert!(out.contains("shared with household hh-42"), "{out}");
    assert!(out.contains("Groceries"), "{out}");
    assert!(out.contains("$135.60"), "{out}");
    assert!(out.contains("-$15.60"), "{out}");
    assert!(out.contains("37.9%"), "{out}");
    assert!(out.contains("within budget"), "{out}");
    assert!(out.contains("1 paid, 1 pending, 1 overdue"), "{out}");
    assert!(out.contains("Payment \"Electric bill\" is overdue"), "{out}");
}

#[test]
fn test_warnings_follow_as_of_date() {
    let sandbox = Sandbox::new();
    sandbox.import_week();

    let out = sandbox.run(&["warnings", "--budget", WEEK_ID, "--as-of", "2026-10-15"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2, "{out}");
    assert!(lines[0].contains("Category \"Groceries\" exceeds its allocation by $15.60"));
    assert!(lines[1].contains("Payment \"Electric bill\" is overdue (due 2026-10-14, Utilities)"));

    let out = sandbox.run(&["warnings", "--budget", WEEK_ID, "--as-of", "2026-10-13"]);
    assert!(!out.contains("overdue"), "{out}");
}

#[test]
fn test_malformed_document_is_rejected() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["budget", "import", &fixture("malformed.json")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("categories[0].payments[0].amount"));
    sandbox
        .cmd()
        .args(["budget", "show", "--budget", "bad-doc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown budget"));
}

#[test]
fn test_budget_lifecycle() {
    let sandbox = Sandbox::new();
    let out = sandbox.run(&["budget", "new", "--total", "200", "--date", "2026-10-14"]);
    assert!(out.contains("2026-10-12 to 2026-10-18"), "{out}");

    sandbox
        .cmd()
        .args(["budget", "new", "--total", "50", "--date", "2026-10-16"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    sandbox.run(&[
        "category", "add", "rent", "--name", "Rent", "--allocated", "150", "--budget", "2026-10-14",
    ]);
    let out = sandbox.run(&[
        "payment", "add", "--category", "rent", "--name", "October rent", "--amount", "175.00",
        "--date", "2026-10-15", "--budget", "2026-10-14",
    ]);
    let payment_id = out
        .split_whitespace()
        .nth(2)
        .unwrap()
        .trim_end_matches(':')
        .to_string();
    assert_eq!(payment_id.len(), 24, "{out}");

    let out = sandbox.run(&["warnings", "--budget", "2026-10-14", "--as-of", "2026-10-14"]);
    assert!(out.contains("Category \"Rent\" exceeds its allocation by $25.00"), "{out}");

    sandbox.run(&["payment", "pay", &payment_id, "--budget", "2026-10-14"]);
    sandbox
        .cmd()
        .args(["payment", "pay", &payment_id, "--budget", "2026-10-14"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot go from paid to paid"));

    let out = sandbox.run(&["category", "show", "rent", "--budget", "2026-10-14"]);
    assert!(out.contains("116.7%"), "{out}");

    let out = sandbox.run(&["budget", "total", "100", "--budget", "2026-10-14"]);
    assert!(out.contains("Over budget"), "{out}");

    let out = sandbox.run(&["category", "remove", "rent", "--budget", "2026-10-14"]);
    assert!(out.contains("Removed category Rent and 1 payment(s)"), "{out}");

    let out = sandbox.run(&["warnings", "--budget", "2026-10-14", "--as-of", "2026-10-20"]);
    assert!(out.contains("No warnings"), "{out}");
}

#[test]
fn test_delete_cascades_and_export_reimports() {
    let sandbox = Sandbox::new();
    sandbox.import_week();

    let export_path = sandbox.home.path().join("week-export.json");
    sandbox.run(&[
        "budget", "export", "--budget", WEEK_ID, "--output", export_path.to_str().unwrap(),
    ]);

    let out = sandbox.run(&["budget", "delete", WEEK_ID]);
    assert!(out.contains("Deleted budget"), "{out}");
    let out = sandbox.run(&["status"]);
    assert!(out.contains("Payments:    0"), "{out}");

    sandbox.run(&["budget", "import", export_path.to_str().unwrap()]);
    let out = sandbox.run(&["warnings", "--budget", WEEK_ID, "--as-of", "2026-10-15"]);
    assert_eq!(out.lines().count(), 2, "{out}");
}

#[test]
fn test_watch_rerenders_only_on_change() {
    let sandbox = Sandbox::new();
    sandbox.import_week();

    let events = format!(
        "budget:updated {WEEK_ID}\n\
         {{\"event\": \"transaction:created\", \"data\": {{}}}}\n\
         user:login someone\n\
         budget:deleted {WEEK_ID}\n\
         budget:updated {WEEK_ID}\n"
    );
    let output = sandbox
        .cmd()
        .args(["watch", "--budget", WEEK_ID])
        .write_stdin(events)
        .output()
        .unwrap();
    assert!(output.status.success());
    let out = String::from_utf8(output.stdout).unwrap();
    assert_eq!(out.matches("Week of 2026-10-12").count(), 1, "{out}");
    assert!(out.contains(&format!("Budget {WEEK_ID} was deleted.")), "{out}");
}

#[test]
fn test_week_start_setting() {
    let sandbox = Sandbox::new();
    sandbox.run(&["init", "--data-dir", sandbox.home.path().join("data").to_str().unwrap(), "--week-start", "sunday"]);
    let out = sandbox.run(&["budget", "new", "--total", "80", "--date", "2026-10-14"]);
    assert!(out.contains("2026-10-11 to 2026-10-17"), "{out}");

    sandbox
        .cmd()
        .args(["init", "--data-dir", "x", "--week-start", "someday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("week_start"));
}

#[test]
fn test_oversized_amount_fails_import_cleanly() {
    let sandbox = Sandbox::new();
    let path = sandbox.week_variant("huge.json", |doc| {
        doc.replace("\"amount\": 110", "\"amount\": \"50000000000000000000000000000\"")
    });
    sandbox
        .cmd()
        .args(["budget", "import", &path])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("categories[1].payments[0].amount"));
}

#[test]
fn test_import_rejects_second_budget_for_same_week() {
    let sandbox = Sandbox::new();
    sandbox.import_week();

    let path = sandbox.week_variant("other.json", |doc| doc.replace(WEEK_ID, "other-budget"));
    sandbox
        .cmd()
        .args(["budget", "import", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    // Re-importing the same budget replaces it.
    sandbox.import_week();
    let out = sandbox.run(&["budget", "list"]);
    assert!(out.contains(WEEK_ID), "{out}");
    assert!(!out.contains("other-budget"), "{out}");
}

#[test]
fn test_watch_rerenders_after_a_change() {
    let sandbox = Sandbox::new();
    sandbox.import_week();

    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("pennywise"))
        .args(["watch", "--budget", WEEK_ID])
        .env("HOME", sandbox.home.path())
        .env("NO_COLOR", "1")
        .env("PENNYWISE_LOG", "debug")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    let mut stdin = child.stdin.take().unwrap();
    let mut stdout = BufReader::new(child.stdout.take().unwrap());

    // Wait for the first render so the change below lands after it.
    let mut out = String::new();
    while !out.contains("Week of 2026-10-12") {
        assert_ne!(stdout.read_line(&mut out).unwrap(), 0, "watch exited early: {out}");
    }
    writeln!(stdin, "budget:updated {WEEK_ID}").unwrap();

    sandbox.run(&["payment", "pay", "pay-bulk", "--budget", WEEK_ID]);

    writeln!(stdin, "payment:updated {WEEK_ID}").unwrap();
    writeln!(stdin, "payment:updated {WEEK_ID}").unwrap();
    drop(stdin);

    stdout.read_to_string(&mut out).unwrap();
    let mut err = String::new();
    child.stderr.take().unwrap().read_to_string(&mut err).unwrap();
    assert!(child.wait().unwrap().success());

    assert_eq!(out.matches("Week of 2026-10-12").count(), 2, "{out}");
    assert!(out.contains("Payments (2 paid"), "{out}");
    assert!(err.contains("cache hit"), "{err}");
}
