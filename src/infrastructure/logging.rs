use crate::domain::error::DocError;
use crate::infrastructure::config::Logging;
use tracing_subscriber::EnvFilter;

/// Log target used by the drivers
pub const DRIVER_TARGET: &str = "docmap::driver";

fn level_name(level: &str) -> &'static str {
    match level {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARN" => "warn",
        "ERROR" => "error",
        _ => "warn",
    }
}

/// Filter directives for the configured levels. The driver target gets its
/// own level when `driver_level` is set, otherwise it follows `level`.
pub fn build_filter(logging: &Logging) -> String {
    let level = level_name(&logging.level.to_uppercase());
    match logging.driver_level.as_deref() {
        Some(driver) => format!(
            "{},{}={}",
            level,
            DRIVER_TARGET,
            level_name(&driver.to_uppercase())
        ),
        None => level.to_string(),
    }
}

/// Initialize logging with path and level configuration
pub fn init_logging(logging: &Logging) -> Result<(), DocError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(build_filter(logging)));

    if let Some(path) = &logging.path {
        if !path.is_empty() {
            // Log to file
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init();
            return Ok(());
        }
    }

    // Log to stderr (default)
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
