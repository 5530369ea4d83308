//! Configuration file loading tests

use std::io::Write;
use std::time::Duration;

use jito_swap::config::Config;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[test]
fn test_full_file_loads() {
    let file = write_config(
        r#"
[rpc]
url = "http://127.0.0.1:8899"

[jupiter]
api_url = "http://127.0.0.1:8080"
api_key = "jup-key"

[jito]
block_engine_url = "http://127.0.0.1:9000/api/v1"
tip_lamports = 25000
requests_per_second = 5

[wallet]
keypair_path = "/tmp/id.json"

[swap]
output_mint = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
amount = 0.5
slippage_bps = 50
max_retries = 5

[execution]
retry_delay_ms = 500
confirmation_polls = 4
poll_interval_ms = 1000
max_priority_fee_micro_lamports = 200000
"#,
    );

    let config = Config::from_file(file.path().to_str().unwrap()).expect("parse");
    config.validate().expect("valid");

    assert_eq!(config.rpc.url, "http://127.0.0.1:8899");
    assert_eq!(config.jupiter.api_key.as_deref(), Some("jup-key"));
    assert_eq!(config.jito.tip_lamports, 25_000);
    assert_eq!(config.jito.requests_per_second, 5);
    assert_eq!(config.wallet.keypair_path.as_deref(), Some("/tmp/id.json"));
    assert_eq!(config.execution.retry_delay(), Duration::from_millis(500));
    assert_eq!(config.execution.poll_interval(), Duration::from_secs(1));
    assert_eq!(config.execution.max_priority_fee_micro_lamports, Some(200_000));

    let request = config.swap_request().expect("request");
    assert_eq!(request.base_slippage_bps, 50);
    assert_eq!(request.max_retries, 5);
    assert_eq!(request.input_mint, spl_token::native_mint::id());
}

#[test]
fn test_partial_sections_get_defaults() {
    let file = write_config(
        r#"
[swap]
amount = 2.0
"#,
    );

    let config = Config::from_file(file.path().to_str().unwrap()).expect("parse");
    assert_eq!(config.swap.amount, 2.0);
    assert_eq!(config.swap.slippage_bps, 100);
    assert_eq!(config.swap.max_retries, 3);
    assert_eq!(config.jito.tip_lamports, 10_000);
    assert_eq!(config.execution.confirmation_polls, 3);
    assert_eq!(config.execution.simulation_retries, 5);
    assert!(config.wallet.private_key.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_values_rejected() {
    let file = write_config(
        r#"
[execution]
min_cu_limit = 2000000
max_cu_limit = 1400000
"#,
    );
    let config = Config::from_file(file.path().to_str().unwrap()).expect("parse");
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("min_cu_limit"));

    let file = write_config(
        r#"
[rpc]
url = "localhost:8899"
"#,
    );
    let config = Config::from_file(file.path().to_str().unwrap()).expect("parse");
    assert!(config.validate().is_err());
}

#[test]
fn test_malformed_toml_is_an_error() {
    let file = write_config("[swap\namount = ");
    assert!(Config::from_file(file.path().to_str().unwrap()).is_err());
}

#[test]
fn test_private_key_is_never_serialized() {
    let mut config = Config::default();
    config.wallet.private_key = Some("super-secret".to_string());
    let rendered = toml::to_string(&config).expect("serialize");
    assert!(!rendered.contains("super-secret"));
}
