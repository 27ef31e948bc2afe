use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

fn decide() -> Command {
    let mut cmd = Command::new(cargo_bin!("chainroute"));
    cmd.arg("decide")
        .arg("--configs")
        .arg("tests/fixtures/configs.json")
        .arg("--metrics")
        .arg("tests/fixtures/metrics.json")
        .arg("--merchant")
        .arg("merchant123");
    cmd
}

#[test]
fn test_cli_query_sorted_by_fee() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("chainroute"));
    cmd.arg("query")
        .arg("--log")
        .arg("tests/fixtures/transactions.csv")
        .arg("--sort")
        .arg("fee")
        .arg("--direction")
        .arg("asc");

    let output = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output)?;
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(
        lines[0],
        "id,merchant_id,network,fee,confirmation_time,decision_method,amount,status,timestamp"
    );
    assert!(lines[1].starts_with("tx3,merchant123,Optimism,0.0012 ETH"));
    assert!(lines[2].starts_with("tx4,"));
    assert!(lines[3].starts_with("tx1,"));
    assert_eq!(lines.len(), 6);
    Ok(())
}

#[test]
fn test_cli_query_network_filter_and_search() {
    let mut cmd = Command::new(cargo_bin!("chainroute"));
    cmd.arg("query")
        .arg("--log")
        .arg("tests/fixtures/transactions.csv")
        .arg("--network")
        .arg("polygon");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("tx2,merchant123,Polygon,0.5 MATIC"))
        .stdout(predicate::str::contains("tx1,").not());

    let mut cmd = Command::new(cargo_bin!("chainroute"));
    cmd.arg("query")
        .arg("--log")
        .arg("tests/fixtures/transactions.csv")
        .arg("--search")
        .arg("TX5");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("tx5,"))
        .stdout(predicate::str::contains("tx2,").not());
}

#[test]
fn test_cli_query_rejects_unknown_network() {
    let mut cmd = Command::new(cargo_bin!("chainroute"));
    cmd.arg("query")
        .arg("--log")
        .arg("tests/fixtures/transactions.csv")
        .arg("--network")
        .arg("solana");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown network 'solana'"));
}

#[test]
fn test_cli_decide_heuristic() {
    decide()
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""selected_network": "polygon""#))
        .stdout(predicate::str::contains(r#""decision_method": "heuristic""#))
        .stdout(predicate::str::contains(r#""degraded": false"#))
        .stdout(predicate::str::contains("sequencer feed returned 503"));
}

#[test]
fn test_cli_decide_with_advisor() {
    decide()
        .arg("--use-ai")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""selected_network": "optimism""#))
        .stdout(predicate::str::contains(r#""decision_method": "hybrid""#))
        .stdout(predicate::str::contains(r#""ai_recommendation": "optimism""#));
}

#[test]
fn test_cli_decide_appends_to_log_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let log_path = dir.path().join("transactions.csv");
    std::fs::copy("tests/fixtures/transactions.csv", &log_path)?;

    decide()
        .arg("--amount")
        .arg("50")
        .arg("--log")
        .arg(&log_path)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""transaction_id": "tx6""#));

    let written = std::fs::read_to_string(&log_path)?;
    assert_eq!(written.lines().count(), 7);
    assert!(written.contains("tx6,merchant123,Polygon,0.00084 MATIC,8 seconds,heuristic,50 MATIC,pending,"));
    assert!(written.contains("tx1,merchant123,Ethereum Mainnet,0.0045 ETH"));
    Ok(())
}

#[test]
fn test_cli_decide_unknown_merchant() {
    let mut cmd = Command::new(cargo_bin!("chainroute"));
    cmd.arg("decide")
        .arg("--configs")
        .arg("tests/fixtures/configs.json")
        .arg("--metrics")
        .arg("tests/fixtures/metrics.json")
        .arg("--merchant")
        .arg("nobody");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no routing config for merchant 'nobody'"));
}

#[test]
fn test_cli_deadline_from_environment() {
    let mut metrics = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        metrics,
        r#"{{ "ethereum": {{ "gas_price_gwei": 20, "confirmation_time_seconds": 12, "congestion": "low", "delay_ms": 1500 }} }}"#
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("chainroute"));
    cmd.env("CHAINROUTE_DEADLINE_MS", "50")
        .arg("decide")
        .arg("--configs")
        .arg("tests/fixtures/configs.json")
        .arg("--metrics")
        .arg(metrics.path())
        .arg("--merchant")
        .arg("merchant123");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("deadline"));
}

#[test]
fn test_cli_stats() {
    let mut cmd = Command::new(cargo_bin!("chainroute"));
    cmd.arg("stats")
        .arg("--log")
        .arg("tests/fixtures/transactions.csv");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""total": 5"#))
        .stdout(predicate::str::contains(r#""ETH": "0.0035""#))
        .stdout(predicate::str::contains(r#""average_confirmation_seconds": "9.8""#))
        .stdout(predicate::str::contains(r#""heuristic": 2"#))
        .stdout(predicate::str::contains(r#""hybrid": 3"#));
}

#[test]
fn test_cli_rejects_log_with_repeated_ids() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = std::fs::read_to_string("tests/fixtures/transactions.csv")?;
    let mut log = tempfile::NamedTempFile::new()?;
    write!(log, "{}", fixture)?;
    writeln!(
        log,
        "tx2,merchant123,Ethereum Mainnet,0.0045 ETH,15 seconds,heuristic,1 ETH,pending,2023-11-10T13:00:00Z"
    )?;

    let mut cmd = Command::new(cargo_bin!("chainroute"));
    cmd.arg("query").arg("--log").arg(log.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("transaction id 'tx2' is already taken"));

    decide()
        .arg("--log")
        .arg(log.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already taken"));
    Ok(())
}

#[test]
fn test_cli_log_rewrite_leaves_no_staging_files() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let log_path = dir.path().join("transactions.csv");
    std::fs::copy("tests/fixtures/transactions.csv", &log_path)?;

    decide().arg("--log").arg(&log_path).assert().success();
    decide().arg("--log").arg(&log_path).assert().success();

    let entries = std::fs::read_dir(dir.path())?.collect::<Result<Vec<_>, std::io::Error>>()?;
    assert_eq!(entries.len(), 1);
    let written = std::fs::read_to_string(&log_path)?;
    assert!(written.contains("tx7,"));
    assert!(written.contains("tx1,merchant123,Ethereum Mainnet"));
    Ok(())
}
