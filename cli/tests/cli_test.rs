use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;

fn paystar(dir: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin!("paystar"));
    cmd.arg("--config")
        .arg(dir.join("paystar.toml"))
        .arg("--ledger")
        .arg(dir.join("ledger"))
        .env("PAYSTAR_MERCHANT_ID", "test-pin")
        .env("RUST_LOG", "warn");
    cmd
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_full_payment_flow_with_mock_provider() {
    let dir = tempfile::tempdir().unwrap();

    let purchase = json_stdout(paystar(dir.path()).args([
        "purchase",
        "--amount",
        "10000",
        "--email",
        "a@b.com",
        "--mobile",
        "09120000000",
    ]));
    let transid = purchase["transaction_id"].as_str().unwrap().to_string();
    assert_eq!(purchase["amount"], 10000);
    assert_eq!(transid.len(), 16);

    let pay = json_stdout(paystar(dir.path()).args(["pay", "--transid", &transid]));
    assert_eq!(pay["redirect"]["method"], "GET");
    assert_eq!(
        pay["redirect"]["action"],
        format!("https://paystar.ir/paying/{transid}")
    );
    assert_eq!(pay["invoice_id"], purchase["invoice_id"]);

    let callback = format!("http://yoursite.com/path/to?transid={transid}");
    let receipt = json_stdout(paystar(dir.path()).args(["verify", "--callback-url", &callback]));
    assert_eq!(receipt["driver"], "paystar");
    assert_eq!(receipt["reference_id"], transid.as_str());

    let status = json_stdout(paystar(dir.path()).arg("status"));
    assert_eq!(status[0]["state"], "verified");
    assert_eq!(status[0]["transaction_id"], transid.as_str());
}

#[test]
fn test_second_verify_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let purchase = json_stdout(paystar(dir.path()).args(["purchase", "--amount", "500"]));
    let invoice_id = purchase["invoice_id"].as_str().unwrap().to_string();

    paystar(dir.path())
        .args(["verify", "--invoice", &invoice_id])
        .assert()
        .success();

    paystar(dir.path())
        .args(["verify", "--invoice", &invoice_id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be verified while verified"));
}

#[test]
fn test_zero_amount_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    paystar(dir.path())
        .args(["purchase", "--amount", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("amount: must be greater than zero"));
}

#[test]
fn test_pay_requires_a_target() {
    let dir = tempfile::tempdir().unwrap();

    paystar(dir.path()).arg("pay").assert().failure();
}

#[test]
fn test_unknown_transaction_is_reported() {
    let dir = tempfile::tempdir().unwrap();

    paystar(dir.path())
        .args(["pay", "--transid", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no payment recorded for transaction nope"));
}

#[test]
fn test_unknown_transport_kind_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("paystar.toml"), "[transport]\nkind = \"HTTP\"\n").unwrap();

    paystar(dir.path())
        .env("PAYSTAR_MERCHANT_ID", "real-pin")
        .args(["purchase", "--amount", "10000"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Failed to load app config"));

    assert!(!dir.path().join("ledger").exists());
}
