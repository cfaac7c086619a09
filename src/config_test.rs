use super::*;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn from_lookup_defaults() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[("HOME", "/home/ana")])).unwrap();
    assert_eq!(cfg.api_url, DEFAULT_API_URL);
    assert_eq!(cfg.refresh_interval, Duration::from_secs(600));
    assert_eq!(cfg.timeouts, HttpTimeouts::default());
    assert_eq!(cfg.token_path(), PathBuf::from("/home/ana/.marmite/tokens.json"));
}

#[test]
fn from_lookup_parses_overrides() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[
        ("MARMITE_API_URL", "https://api.example.test/v1/"),
        ("MARMITE_REFRESH_INTERVAL_SECS", "120"),
        ("MARMITE_REQUEST_TIMEOUT_SECS", "5"),
        ("MARMITE_CONNECT_TIMEOUT_SECS", "2"),
        ("MARMITE_STATE_DIR", "/tmp/marmite"),
    ]))
    .unwrap();
    assert_eq!(cfg.api_url, "https://api.example.test/v1");
    assert_eq!(cfg.refresh_interval, Duration::from_secs(120));
    assert_eq!(cfg.timeouts, HttpTimeouts { request_secs: 5, connect_secs: 2 });
    assert_eq!(cfg.state_dir, PathBuf::from("/tmp/marmite"));
}

#[test]
fn missing_home_falls_back_to_relative_dir() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(cfg.state_dir, PathBuf::from(STATE_DIR_NAME));
}

#[test]
fn url_without_scheme_errors() {
    let err = ClientConfig::from_lookup(lookup_from(&[("MARMITE_API_URL", "localhost:5000")])).unwrap_err();
    assert_eq!(err, ConfigError::InvalidApiUrl("localhost:5000".into()));
}

#[test]
fn zero_interval_errors() {
    let err = ClientConfig::from_lookup(lookup_from(&[("MARMITE_REFRESH_INTERVAL_SECS", "0")])).unwrap_err();
    assert!(err.to_string().contains("MARMITE_REFRESH_INTERVAL_SECS"));
}

#[test]
fn non_numeric_timeout_errors() {
    let err = ClientConfig::from_lookup(lookup_from(&[("MARMITE_REQUEST_TIMEOUT_SECS", "soon")])).unwrap_err();
    assert_eq!(err, ConfigError::InvalidDuration { var: "MARMITE_REQUEST_TIMEOUT_SECS", value: "soon".into() });
}
