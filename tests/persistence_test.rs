#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::io::Write;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: seed the marketplace and give user 2 a working balance.
    let mut csv1 = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv1, "op, actor, task, target, amount, title, text").unwrap();
    writeln!(csv1, "balance, 1, , 2, 500.00, ,").unwrap();

    let mut cmd1 = Command::new(cargo_bin!("gigmarket"));
    cmd1.arg("--seed").arg(csv1.path()).arg("--db-path").arg(&db_path);

    let output1 = cmd1.output().expect("Failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("2,500,0,500"));

    // 2. Second run: no seeding; the recovered user acquires a recovered task.
    let mut csv2 = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv2, "op, actor, task, target, amount, title, text").unwrap();
    writeln!(csv2, "acquire, 2, 2, , , ,").unwrap();

    let mut cmd2 = Command::new(cargo_bin!("gigmarket"));
    cmd2.arg(csv2.path()).arg("--db-path").arg(&db_path);

    let output2 = cmd2.output().expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);

    // Task 2 costs 200.0001: the recovered balance covers it and the
    // escrow shows up in the frozen column.
    assert!(stdout2.contains("2,500,200.0001,299.9999"));
}
