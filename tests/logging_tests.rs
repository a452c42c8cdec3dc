//! Logging configuration

use docmap::infrastructure::config::Logging;
use docmap::infrastructure::logging::{build_filter, DRIVER_TARGET};

fn logging(level: &str, driver_level: Option<&str>) -> Logging {
    Logging {
        enable: true,
        path: None,
        level: level.to_string(),
        driver_level: driver_level.map(str::to_string),
    }
}

#[test]
fn test_log_level_parsing() {
    for (level, expected) in [
        ("DEBUG", "debug"),
        ("INFO", "info"),
        ("WARN", "warn"),
        ("ERROR", "error"),
        ("info", "info"),
        ("LOUD", "warn"),
    ] {
        assert_eq!(build_filter(&logging(level, None)), expected);
    }
}

#[test]
fn test_driver_level_is_delegated_to_driver_target() {
    let filter = build_filter(&logging("WARN", Some("DEBUG")));
    assert_eq!(filter, format!("warn,{}=debug", DRIVER_TARGET));
}

#[test]
fn test_log_level_default() {
    let defaults = Logging::default();
    assert!(defaults.enable);
    assert_eq!(build_filter(&defaults), "warn");
}

#[test]
fn test_filter_is_accepted_by_env_filter() {
    let filter = build_filter(&logging("INFO", Some("TRACE")));
    assert!(tracing_subscriber::EnvFilter::try_new(filter).is_ok());
}
