//! Logger initialization
//!
//! Everything goes to the terminal and is appended to a log file, so a
//! restart keeps the history of previous runs.

use anyhow::{Context, Result};
use simplelog::*;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file, created if missing
/// * `level` - Maximum level written to both sinks
pub fn init_logger(log_file_path: &str, level: LevelFilter) -> Result<()> {
    let log_file = fs_err::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .context("Failed to open log file")?;

    let config = ConfigBuilder::new()
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(level, config.clone(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, config, log_file),
    ])
    .context("Failed to initialize logger")?;

    Ok(())
}

/// Routes panics through the logger so they land in the log file too.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());
        log::error!("Panic at {}: {}", location, payload);
        eprintln!("Panic at {}: {}", location, payload);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_logger_creates_log_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot.log");

        // A logger may already be installed by another test in this binary;
        // the file must exist either way.
        let _ = init_logger(path.to_str().unwrap(), LevelFilter::Info);
        assert!(path.exists());
    }

    #[test]
    fn init_logger_fails_for_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("bot.log");
        assert!(init_logger(path.to_str().unwrap(), LevelFilter::Info).is_err());
    }
}
