use std::{fs, path::Path, time::Duration};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::warn;
use url::Url;

pub const SETTINGS_FILE: &str = "planner.toml";

pub const DEFAULT_PALETTE: [&str; 8] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerSettings {
    pub api_base_url: String,
    pub lab_suffix: char,
    pub reference_monday: NaiveDate,
    pub palette: Vec<String>,
    pub request_timeout_secs: u64,
    pub redraw_interval_ms: Option<u64>,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".into(),
            lab_suffix: 'T',
            reference_monday: NaiveDate::from_ymd_opt(2025, 7, 28).unwrap_or_default(),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            request_timeout_secs: 15,
            redraw_interval_ms: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid api base url '{0}'")]
    InvalidApiUrl(String),
    #[error("color palette must contain at least one color")]
    EmptyPalette,
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingKey {
    ApiBaseUrl,
    LabSuffix,
    ReferenceMonday,
    Palette,
    RequestTimeoutSecs,
    RedrawIntervalMs,
}

const FILE_KEYS: [(&str, SettingKey); 6] = [
    ("api_base_url", SettingKey::ApiBaseUrl),
    ("lab_suffix", SettingKey::LabSuffix),
    ("reference_monday", SettingKey::ReferenceMonday),
    ("palette", SettingKey::Palette),
    ("request_timeout_secs", SettingKey::RequestTimeoutSecs),
    ("redraw_interval_ms", SettingKey::RedrawIntervalMs),
];

// Later entries win.
const ENV_KEYS: [(&str, SettingKey); 7] = [
    ("PLANNER_API_URL", SettingKey::ApiBaseUrl),
    ("APP__API_BASE_URL", SettingKey::ApiBaseUrl),
    ("APP__LAB_SUFFIX", SettingKey::LabSuffix),
    ("APP__REFERENCE_MONDAY", SettingKey::ReferenceMonday),
    ("APP__PALETTE", SettingKey::Palette),
    ("APP__REQUEST_TIMEOUT_SECS", SettingKey::RequestTimeoutSecs),
    ("APP__REDRAW_INTERVAL_MS", SettingKey::RedrawIntervalMs),
];

impl PlannerSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn redraw_interval(&self) -> Option<Duration> {
        self.redraw_interval_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let url = Url::parse(&self.api_base_url)
            .map_err(|_| SettingsError::InvalidApiUrl(self.api_base_url.clone()))?;
        if url.cannot_be_a_base() {
            return Err(SettingsError::InvalidApiUrl(self.api_base_url.clone()));
        }
        if self.palette.is_empty() {
            return Err(SettingsError::EmptyPalette);
        }
        if self.request_timeout_secs == 0 {
            return Err(SettingsError::ZeroTimeout);
        }
        Ok(())
    }

    fn set(&mut self, key: SettingKey, raw: &str) -> bool {
        let raw = raw.trim();
        match key {
            SettingKey::ApiBaseUrl => {
                if raw.is_empty() {
                    return false;
                }
                self.api_base_url = raw.to_string();
            }
            SettingKey::LabSuffix => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(suffix), None) => self.lab_suffix = suffix,
                    _ => return false,
                }
            }
            SettingKey::ReferenceMonday => match raw.parse::<NaiveDate>() {
                Ok(date) => self.reference_monday = date,
                Err(_) => return false,
            },
            SettingKey::Palette => {
                let palette: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|color| !color.is_empty())
                    .map(str::to_string)
                    .collect();
                if palette.is_empty() {
                    return false;
                }
                self.palette = palette;
            }
            SettingKey::RequestTimeoutSecs => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => return false,
            },
            SettingKey::RedrawIntervalMs => match raw.parse::<u64>() {
                Ok(0) => self.redraw_interval_ms = None,
                Ok(ms) => self.redraw_interval_ms = Some(ms),
                Err(_) => return false,
            },
        }
        true
    }
}

pub fn load_settings() -> PlannerSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |name| std::env::var(name).ok())
}

/// Defaults, then the optional settings file, then the environment.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> PlannerSettings {
    let mut settings = PlannerSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match raw.parse::<toml::Table>() {
            Ok(table) => {
                for (name, key) in FILE_KEYS {
                    let Some(value) = table.get(name) else {
                        continue;
                    };
                    let value = match value {
                        toml::Value::String(text) => text.clone(),
                        toml::Value::Array(items) => items
                            .iter()
                            .filter_map(|item| item.as_str())
                            .collect::<Vec<_>>()
                            .join(","),
                        other => other.to_string(),
                    };
                    if !settings.set(key, &value) {
                        warn!(file = %path.display(), setting = name, value = %value, "settings: ignoring invalid value");
                    }
                }
            }
            Err(err) => {
                warn!(file = %path.display(), "settings: ignoring unreadable file: {err}");
            }
        }
    }

    for (name, key) in ENV_KEYS {
        if let Some(value) = env(name) {
            if !settings.set(key, &value) {
                warn!(variable = name, value = %value, "settings: ignoring invalid value");
            }
        }
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
