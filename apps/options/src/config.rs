use std::{fs, io::ErrorKind, path::Path};

use anyhow::Context;
use client_core::OptionsDefaults;
use serde::Deserialize;

const DEFAULT_DATABASE_URL: &str = "sqlite://./data/options.db";
const DEFAULT_API_BASE_URL: &str = "https://api.phraseapp.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub database_url: String,
    pub api_base_url: String,
    pub default_domain: String,
    pub default_clipboard: bool,
    pub locale_code: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        let defaults = OptionsDefaults::default();
        Self {
            database_url: DEFAULT_DATABASE_URL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            default_domain: defaults.default_domain,
            default_clipboard: defaults.default_clipboard,
            locale_code: defaults.locale_code,
        }
    }
}

impl AppSettings {
    pub fn options_defaults(&self) -> OptionsDefaults {
        OptionsDefaults {
            default_domain: self.default_domain.clone(),
            default_clipboard: self.default_clipboard,
            locale_code: self.locale_code.clone(),
        }
    }
}

/// Keys accepted in `options.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    database_url: Option<String>,
    api_base_url: Option<String>,
    default_domain: Option<String>,
    default_clipboard: Option<bool>,
    locale_code: Option<String>,
}

/// Defaults, then the optional config file, then environment overrides.
pub fn load_settings(config_path: &Path) -> anyhow::Result<AppSettings> {
    let mut settings = AppSettings::default();

    match fs::read_to_string(config_path) {
        Ok(raw) => {
            let file_cfg = parse_file_settings(&raw)
                .with_context(|| format!("invalid config file '{}'", config_path.display()))?;
            apply_file_settings(&mut settings, file_cfg);
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", config_path.display()))
        }
    }

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    settings.database_url = normalize_database_url(&settings.database_url);
    Ok(settings)
}

fn parse_file_settings(raw: &str) -> anyhow::Result<FileSettings> {
    Ok(toml::from_str(raw)?)
}

fn apply_file_settings(settings: &mut AppSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.default_domain {
        settings.default_domain = v;
    }
    if let Some(v) = file_cfg.default_clipboard {
        settings.default_clipboard = v;
    }
    if let Some(v) = file_cfg.locale_code {
        settings.locale_code = v;
    }
}

fn apply_env_overrides(settings: &mut AppSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__DEFAULT_DOMAIN") {
        settings.default_domain = v;
    }
    if let Some(v) = lookup("APP__LOCALE_CODE") {
        settings.locale_code = v;
    }

    if let Some(v) = lookup("APP__DEFAULT_CLIPBOARD") {
        match v.trim().parse::<bool>() {
            Ok(parsed) => settings.default_clipboard = parsed,
            Err(_) => tracing::warn!(value = %v, "ignoring invalid APP__DEFAULT_CLIPBOARD"),
        }
    }
}

fn normalize_database_url(raw_database_url: &str) -> String {
    storage::database_url_from(raw_database_url).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
