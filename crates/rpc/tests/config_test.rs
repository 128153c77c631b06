//! Integration tests for configuration loading.

use phoenix_rpc::{BlockNumberFallback, RpcConfig, RpcError, RpcNamespace};

/// Test that a missing file yields the defaults.
#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = RpcConfig::load(&dir.path().join("rpc.toml")).unwrap();
    assert_eq!(config, RpcConfig::default());
}

/// Test that a saved config loads back unchanged.
#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config").join("rpc.toml");

    let mut config = RpcConfig::with_chain_id(8888);
    config.http_addr = "127.0.0.1:18545".parse().unwrap();
    config.enabled_namespaces = vec![RpcNamespace::Eth, RpcNamespace::Web3];
    config.ip_allowlist = Some(vec!["10.0.0.1".parse().unwrap()]);
    config.block_number_fallback = BlockNumberFallback::Error;

    config.save(&path).unwrap();
    let loaded = RpcConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

/// Test that an unparsable file is a config error.
#[test]
fn test_load_invalid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rpc.toml");
    std::fs::write(&path, "http_addr = 42").unwrap();

    match RpcConfig::load(&path) {
        Err(RpcError::Config(msg)) => assert!(msg.contains("failed to parse")),
        other => panic!("expected config error, got {:?}", other),
    }
}
