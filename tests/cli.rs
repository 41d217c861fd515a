#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

fn cli(roster: &Path) -> Command {
    let mut cmd = Command::cargo_bin("duty-roster-cli").unwrap();
    cmd.env_remove("DUTY_ROSTER_ACTOR")
        .env_remove("DUTY_ROSTER_AUDIT_LOG")
        .arg("--roster")
        .arg(roster);
    cmd
}

fn first_field(stdout: &[u8], line: usize) -> String {
    let text = String::from_utf8_lossy(stdout);
    text.lines()
        .nth(line)
        .and_then(|l| l.split(" | ").next())
        .unwrap()
        .trim()
        .to_string()
}

#[test]
fn generate_propose_approve_roundtrip() {
    let dir = tempdir().unwrap();
    let roster = dir.path().join("duties.json");
    let audit = dir.path().join("audit.jsonl");

    let out = cli(&roster)
        .args(["--as", "admin", "--audit-log"])
        .arg(&audit)
        .args(["generate", "--kind", "regular", "--start", "2025-10-06", "--end", "2025-10-12"])
        .args(["--assignees", "X,Y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-10-12"))
        .stdout(predicate::str::contains("2025-10-10").not())
        .get_output()
        .stdout
        .clone();
    assert_eq!(String::from_utf8_lossy(&out).lines().count(), 5);
    let x_duty = first_field(&out, 0);
    let y_duty = first_field(&out, 1);

    let proposed = cli(&roster)
        .args(["--as", "X", "propose", "--duty", x_duty.as_str(), "--target", y_duty.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("PENDING"))
        .get_output()
        .stdout
        .clone();
    let request = first_field(&proposed, 0);

    cli(&roster)
        .args(["--as", "Y", "pending"])
        .assert()
        .success()
        .stdout(predicate::str::contains(request.as_str()));

    cli(&roster)
        .args(["--as", "Y", "approve", "--request", request.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("APPROVED"));

    cli(&roster)
        .args(["--as", "Y", "approve", "--request", request.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NOT_PENDING"));

    cli(&roster)
        .args(["show", "--id", x_duty.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("| Y"));

    let log = std::fs::read_to_string(&audit).unwrap();
    assert!(log.contains("\"GENERATE\""));
}

#[test]
fn self_swap_reports_stable_code() {
    let dir = tempdir().unwrap();
    let roster = dir.path().join("duties.json");
    let out = cli(&roster)
        .args(["--as", "admin", "generate", "--kind", "regular"])
        .args(["--start", "2025-10-06", "--end", "2025-10-07", "--assignees", "X"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let a = first_field(&out, 0);
    let b = first_field(&out, 1);

    cli(&roster)
        .args(["--as", "X", "propose", "--duty", a.as_str(), "--target", b.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SELF_SWAP"));
}

#[test]
fn mutating_commands_require_an_actor() {
    let dir = tempdir().unwrap();
    cli(&dir.path().join("duties.json"))
        .args(["create", "--kind", "regular", "--date", "2025-10-06", "--assignee", "X"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--as"));
}
