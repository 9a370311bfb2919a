use anyhow::{anyhow, Context, Result};
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use std::fs;
use std::path::Path;

const LOG_FILE_BASENAME: &str = "mindflow";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

/// Logs go to files only; the TUI owns the terminal.
///
/// Keep the returned handle alive for the whole run; dropping it flushes and
/// stops the logger.
pub fn init_logging(level: Option<&str>, log_dir: &Path) -> Result<LoggerHandle> {
    let level = effective_level(level)?;
    fs::create_dir_all(log_dir).with_context(|| format!("creating {:?}", log_dir))?;

    let handle = Logger::try_with_str(level)
        .map_err(|err| anyhow!("invalid log level `{}`: {}", level, err))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .context("starting logger")?;

    info!(
        "event=app_start version={} level={} log_dir={}",
        env!("CARGO_PKG_VERSION"),
        level,
        log_dir.display()
    );
    Ok(handle)
}

pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn effective_level(requested: Option<&str>) -> Result<&'static str> {
    normalize_level(requested.unwrap_or(default_log_level()))
}

fn normalize_level(level: &str) -> Result<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        "off" => Ok("off"),
        other => Err(anyhow!(
            "unsupported log level `{}`; expected trace|debug|info|warn|error|off",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_normalized() {
        assert_eq!(normalize_level(" WARNING ").unwrap(), "warn");
        assert_eq!(normalize_level("Info").unwrap(), "info");
        assert_eq!(normalize_level("off").unwrap(), "off");
        assert!(normalize_level("loud").is_err());
    }

    #[test]
    fn requested_level_wins_over_default() {
        let requested = String::from("Error");
        assert_eq!(effective_level(Some(requested.as_str())).unwrap(), "error");
        assert_eq!(effective_level(None).unwrap(), default_log_level());
        assert!(effective_level(Some("chatty")).is_err());
    }
}
