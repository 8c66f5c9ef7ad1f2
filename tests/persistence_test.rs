#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::io::Write;
use std::process::Command;
use tempfile::tempdir;

const HEADER: &str = "kind, user_id, chat_id, name, username, message_id, payload";

fn run(csv: &tempfile::NamedTempFile, db_path: &std::path::Path) -> String {
    let output = Command::new(cargo_bin!("topup-ledger"))
        .arg(csv.path())
        .args(["--admin-ids", "900", "--admin-group-id", "-100"])
        .arg("--db-path")
        .arg(db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // First run: authorize, top up and get approved.
    let mut csv1 = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv1, "{HEADER}").unwrap();
    writeln!(csv1, "command, 900, -100, Admin, admin, , /unban 1").unwrap();
    writeln!(csv1, "command, 1, 1, Aung, aung, , /topup 5000").unwrap();
    writeln!(csv1, "callback, 1, 1, Aung, aung, 2, topup_pay_wave_5000").unwrap();
    writeln!(csv1, "photo, 1, 1, Aung, aung, , proof").unwrap();
    writeln!(csv1, "command, 900, -100, Admin, admin, , /approve 1 5000").unwrap();
    let stdout1 = run(&csv1, &db_path);
    assert!(stdout1.contains("5000 MMK"));

    // Second run: the balance and the authorization survived the restart.
    let mut csv2 = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv2, "{HEADER}").unwrap();
    writeln!(csv2, "command, 1, 1, Aung, aung, , /mmb 12345678 1234 11").unwrap();
    writeln!(csv2, "command, 1, 1, Aung, aung, , /balance").unwrap();
    let stdout2 = run(&csv2, &db_path);

    assert!(stdout2.contains("Balance: 4050 MMK"));
}
