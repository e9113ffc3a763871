//! End-to-end tests for the `mchbill` binary against a temporary data
//! directory. Every invocation is a fresh process, so these also cover
//! session and catalog persistence between runs.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn mchbill(data_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mchbill"))
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("MCHBILL_PASSPHRASE")
        .env_remove("MCHBILL_STORAGE_ENCRYPT")
        .env_remove("MCHBILL_INVENTORY_SEED_PATH")
        .output()
        .expect("failed to run mchbill")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn sign_in_admin(data_dir: &Path) {
    stdout(&mchbill(
        data_dir,
        &["auth", "sign-in", "Admin@Hospital.local", "--password", "admin123"],
    ));
}

#[test]
fn test_editing_requires_sign_in() {
    let dir = TempDir::new().unwrap();

    let output = mchbill(dir.path(), &["items", "add", "CBC", "250"]);
    assert!(!output.status.success());

    sign_in_admin(dir.path());
    let id = stdout(&mchbill(dir.path(), &["items", "add", "CBC", "250", "--category", "Lab"]));
    assert!(id.trim().parse::<u64>().is_ok());

    stdout(&mchbill(dir.path(), &["auth", "sign-out"]));
    assert!(!mchbill(dir.path(), &["items", "delete", id.trim()]).status.success());
}

#[test]
fn test_catalog_workflow() {
    let dir = TempDir::new().unwrap();
    sign_in_admin(dir.path());

    let id = stdout(&mchbill(
        dir.path(),
        &["items", "add", "Paracetamol", "5", "--category", "Medicine", "--type", "Tablet"],
    ));
    let id = id.trim();

    let listing = stdout(&mchbill(dir.path(), &["items", "list", "--json"]));
    let items: serde_json::Value = serde_json::from_str(&listing).unwrap();
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["category"], "Medicine");
    assert_eq!(items[0]["type"], "Tablet");

    stdout(&mchbill(dir.path(), &["items", "update", id, "--category", "Pharmacy"]));
    let categories = stdout(&mchbill(dir.path(), &["categories", "list"]));
    assert!(categories.contains("Pharmacy (1)"));
    assert!(!categories.lines().any(|l| l.trim_start().starts_with("Medicine (")));
    assert!(categories.contains("Nursing Care (0)"));

    let quote = stdout(&mchbill(dir.path(), &["quote", &format!("{}:4", id)]));
    assert!(quote.contains("20.00"));

    stdout(&mchbill(dir.path(), &["items", "delete", id]));
    let listing = stdout(&mchbill(dir.path(), &["items", "list", "--json"]));
    assert_eq!(listing.trim(), "[]");
}

#[test]
fn test_import_export_round_trip() {
    let dir = TempDir::new().unwrap();
    let backups = TempDir::new().unwrap();
    sign_in_admin(dir.path());

    let payload = backups.path().join("in.json");
    std::fs::write(
        &payload,
        r#"[{"name": "X", "price": 10, "category": "A"}, {"name": "Y", "price": "Rs 20", "category": "A"}]"#,
    )
    .unwrap();
    let imported = stdout(&mchbill(dir.path(), &["import", payload.to_str().unwrap()]));
    assert!(imported.contains("Imported 2"));

    let path = stdout(&mchbill(
        dir.path(),
        &["export", "--out", backups.path().to_str().unwrap()],
    ));
    let path = path.trim();
    assert!(path.contains("mch_db_"));

    let exported: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(exported[1]["price"], 20.0);

    let bad = backups.path().join("bad.json");
    std::fs::write(&bad, r#"{"not": "an array"}"#).unwrap();
    assert!(!mchbill(dir.path(), &["import", bad.to_str().unwrap()]).status.success());

    let again = stdout(&mchbill(dir.path(), &["export"]));
    let again: serde_json::Value = serde_json::from_str(&again).unwrap();
    assert_eq!(again, exported);
}

#[test]
fn test_sign_up_and_roles() {
    let dir = TempDir::new().unwrap();

    let created = stdout(&mchbill(
        dir.path(),
        &["auth", "sign-up", "clerk@hospital.local", "--password", "pw", "--name", "Clerk"],
    ));
    assert!(created.contains("billing_clerk"));

    let whoami = stdout(&mchbill(dir.path(), &["auth", "whoami"]));
    assert!(whoami.contains("clerk@hospital.local"));

    // Clerks may edit but may not list accounts
    stdout(&mchbill(dir.path(), &["items", "add", "ECG", "400"]));
    assert!(!mchbill(dir.path(), &["auth", "users"]).status.success());

    let duplicate = mchbill(
        dir.path(),
        &["auth", "sign-up", "CLERK@hospital.local", "--password", "x"],
    );
    assert!(!duplicate.status.success());

    sign_in_admin(dir.path());
    let users = stdout(&mchbill(dir.path(), &["auth", "users"]));
    assert!(users.contains("admin-1"));
    assert!(users.contains("clerk@hospital.local"));
}

#[test]
fn test_encrypted_storage_needs_passphrase() {
    let dir = TempDir::new().unwrap();

    let without = Command::new(env!("CARGO_BIN_EXE_mchbill"))
        .arg("--data-dir")
        .arg(dir.path())
        .args(["auth", "whoami"])
        .env("MCHBILL_STORAGE_ENCRYPT", "true")
        .env_remove("MCHBILL_PASSPHRASE")
        .output()
        .unwrap();
    assert!(!without.status.success());

    let with = Command::new(env!("CARGO_BIN_EXE_mchbill"))
        .arg("--data-dir")
        .arg(dir.path())
        .args(["auth", "sign-in", "admin@hospital.local", "--password", "admin123"])
        .env("MCHBILL_STORAGE_ENCRYPT", "true")
        .env("MCHBILL_PASSPHRASE", "front desk")
        .output()
        .unwrap();
    stdout(&with);

    let users = std::fs::read_to_string(dir.path().join("mch_users.dat")).unwrap();
    assert!(!users.contains("admin@hospital.local"));
}

fn mchbill_encrypted(data_dir: &Path, idle_timeout: &str, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mchbill"))
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("MCHBILL_INVENTORY_SEED_PATH")
        .env("MCHBILL_STORAGE_ENCRYPT", "true")
        .env("MCHBILL_STORAGE_IDLE_TIMEOUT", idle_timeout)
        .env("MCHBILL_PASSPHRASE", "front desk")
        .output()
        .expect("failed to run mchbill")
}

#[test]
fn test_idle_window_ends_session_within_an_invocation() {
    let dir = TempDir::new().unwrap();

    stdout(&mchbill_encrypted(
        dir.path(),
        "15m",
        &["auth", "sign-in", "admin@hospital.local", "--password", "admin123"],
    ));
    let me = stdout(&mchbill_encrypted(dir.path(), "15m", &["auth", "whoami"]));
    assert!(me.contains("admin@hospital.local"));

    // A window shorter than the command itself has passed by the time it ends
    stdout(&mchbill_encrypted(dir.path(), "1ns", &["auth", "whoami"]));
    let me = stdout(&mchbill_encrypted(dir.path(), "15m", &["auth", "whoami"]));
    assert!(me.contains("Not signed in"));
}
