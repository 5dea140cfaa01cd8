// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::APP_NAME;

const LOG_ENV: &str = "HARVEST_LOG";
const LOG_FILE_NAME: &str = "harvest.log";
const DEFAULT_FILTER: &str = "info";

/// Directory the log file lives in: the platform data dir.
pub fn log_dir() -> Result<PathBuf> {
    let data_root = dirs::data_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory for the log file; set HOME or XDG_DATA_HOME")
    })?;
    Ok(data_root.join(APP_NAME))
}

/// Routes `tracing` output to `<dir>/harvest.log`. The terminal belongs to
/// the dashboard, so nothing is written to stdout or stderr. Keep the guard
/// alive until exit or buffered lines are lost.
pub fn init(dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(dir)
        .with_context(|| format!("create log directory {}", dir.display()))?;
    let filter = filter_from(env::var(LOG_ENV).ok().as_deref())?;

    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;
    Ok(guard)
}

fn filter_from(raw: Option<&str>) -> Result<EnvFilter> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).with_context(|| {
            format!("invalid {LOG_ENV} value {directives:?}; use a level such as info or debug")
        }),
        None => Ok(EnvFilter::new(DEFAULT_FILTER)),
    }
}

#[cfg(test)]
mod tests {
    use super::{filter_from, log_dir};
    use anyhow::Result;

    #[test]
    fn filter_defaults_to_info() -> Result<()> {
        assert_eq!(filter_from(None)?.to_string(), "info");
        assert_eq!(filter_from(Some("   "))?.to_string(), "info");
        Ok(())
    }

    #[test]
    fn filter_accepts_per_crate_directives() {
        assert!(filter_from(Some("warn,harvest_api=debug")).is_ok());
    }

    #[test]
    fn log_dir_is_namespaced() -> Result<()> {
        assert!(log_dir()?.ends_with("harvest"));
        Ok(())
    }
}
