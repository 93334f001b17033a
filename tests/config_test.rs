//! File configuration loading.
#![cfg(feature = "config")]

use std::io::Write;
use std::time::Duration;

use swapquote::config::Config;
use swapquote::{CacheConfig, CachePreset, SwapQuoteError};

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn load_full_config() {
    let file = write_config(
        r#"
        [client]
        base_url = "http://localhost:8080/v6"
        timeout_secs = 5

        [cache]
        preset = "predictive"
        max_entries = 200
        enable_metrics = false
    "#,
    );

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.client.base_url, "http://localhost:8080/v6");
    assert_eq!(config.client.timeout_secs, 5);

    let cache = config.cache_config();
    assert!(cache.enable_predictive);
    assert!(cache.enable_adaptive_ttl);
    assert!(!cache.enable_metrics);
    assert_eq!(cache.max_entries, 200);
    assert_eq!(cache.max_ttl, Duration::from_secs(120));
    assert!(cache.validate().is_ok());
}

#[test]
fn preset_only() {
    let file = write_config("[cache]\npreset = \"conservative\"\n");
    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(
        config.cache_config(),
        CacheConfig::preset(CachePreset::Conservative)
    );
}

#[test]
fn overrides_can_produce_an_invalid_advanced_config() {
    let file = write_config(
        r#"
        [cache]
        preset = "adaptive"
        min_ttl_secs = 200
    "#,
    );
    let config = Config::load(Some(file.path())).unwrap();
    let err = config.cache_config().validate().unwrap_err();
    assert!(matches!(err, SwapQuoteError::Configuration(_)));
}

#[test]
fn unknown_keys_are_rejected() {
    let file = write_config("[cache]\nmax_entires = 10\n");
    let err = Config::load(Some(file.path())).unwrap_err();
    assert!(matches!(err, SwapQuoteError::Configuration(_)));
}

#[test]
fn malformed_toml_is_rejected() {
    let file = write_config("[client\nbase_url = ");
    assert!(Config::load(Some(file.path())).is_err());
}

#[test]
fn http_client_uses_configured_base_url() {
    let file = write_config("[client]\nbase_url = \"http://127.0.0.1:9999/\"\n");
    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.http_client().unwrap().base_url(), "http://127.0.0.1:9999");
}
