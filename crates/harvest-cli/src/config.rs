// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use harvest_app::{DEFAULT_PAGE_SIZE, PAGE_SIZE_CHOICES};
use harvest_tui::UiOptions;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "harvest";
const CONFIG_VERSION: i64 = 1;
const CONFIG_PATH_ENV: &str = "HARVEST_CONFIG_PATH";
const API_URL_ENV: &str = "HARVEST_API_URL";
const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT: &str = "30s";
const DEFAULT_SCRAPE_TIMEOUT: &str = "10m";
const DEFAULT_SCRAPE_PAGES: u32 = 1;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub export: Export,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            ui: Ui::default(),
            export: Export::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
    pub scrape_timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_API_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
            scrape_timeout: Some(DEFAULT_SCRAPE_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub page_size: Option<usize>,
    pub default_pages: Option<u32>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            page_size: Some(DEFAULT_PAGE_SIZE),
            default_pages: Some(DEFAULT_SCRAPE_PAGES),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Export {
    pub dir: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and put values under [api], [ui], and [export]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.api.base_url
            && base_url.trim().is_empty()
        {
            bail!(
                "api.base_url in {} is empty; set it to the scraper backend, for example {}",
                path.display(),
                DEFAULT_API_BASE_URL
            );
        }

        for (key, value) in [
            ("api.timeout", &self.api.timeout),
            ("api.scrape_timeout", &self.api.scrape_timeout),
        ] {
            if let Some(raw) = value
                && parse_duration(raw)? == Duration::ZERO
            {
                bail!("{key} in {} must be positive, got {raw}", path.display());
            }
        }

        if let Some(page_size) = self.ui.page_size
            && !PAGE_SIZE_CHOICES.contains(&page_size)
        {
            bail!(
                "ui.page_size in {} must be one of 5, 10, 25, 50, 100, got {}",
                path.display(),
                page_size
            );
        }

        if self.ui.default_pages == Some(0) {
            bail!(
                "ui.default_pages in {} must be at least 1",
                path.display()
            );
        }

        if let Some(dir) = &self.export.dir
            && dir.trim().is_empty()
        {
            bail!(
                "export.dir in {} is empty; remove it to export into the current directory",
                path.display()
            );
        }

        Ok(())
    }

    /// `HARVEST_API_URL` wins over `[api].base_url`.
    pub fn api_base_url(&self) -> String {
        let from_env = env::var(API_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());
        let raw = from_env
            .as_deref()
            .or(self.api.base_url.as_deref())
            .unwrap_or(DEFAULT_API_BASE_URL);
        raw.trim().trim_end_matches('/').to_owned()
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn scrape_timeout(&self) -> Result<Duration> {
        parse_duration(
            self.api
                .scrape_timeout
                .as_deref()
                .unwrap_or(DEFAULT_SCRAPE_TIMEOUT),
        )
    }

    pub fn ui_options(&self) -> UiOptions {
        UiOptions {
            page_size: self.ui.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            default_pages: self.ui.default_pages.unwrap_or(DEFAULT_SCRAPE_PAGES),
        }
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export
            .dir
            .as_deref()
            .map_or_else(|| PathBuf::from("."), PathBuf::from)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# harvest config\n# Place this file at: {}\n\nversion = 1\n\n[api]\n# {API_URL_ENV} overrides base_url\nbase_url = \"{}\"\ntimeout = \"{}\"\n# scrapes of many pages can take minutes\nscrape_timeout = \"{}\"\n\n[ui]\n# one of 5, 10, 25, 50, 100\npage_size = {}\ndefault_pages = {}\n\n[export]\n# Optional. Default is the current directory\n# dir = \"/absolute/path/to/exports\"\n",
            path.display(),
            DEFAULT_API_BASE_URL,
            DEFAULT_TIMEOUT,
            DEFAULT_SCRAPE_TIMEOUT,
            DEFAULT_PAGE_SIZE,
            DEFAULT_SCRAPE_PAGES,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins.saturating_mul(60)));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 30s)")
}
