use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use toml::{Table, Value};

pub const DEFAULT_CONFIG_PATH: &str = "birthday.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediumKind {
    Sqlite,
    File,
    Memory,
}

impl MediumKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "native" => Some(MediumKind::Sqlite),
            "file" | "local" => Some(MediumKind::File),
            "memory" => Some(MediumKind::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub fallback_path: PathBuf,
    /// Media in the order the store tries them.
    pub media: Vec<MediumKind>,
    pub log_filter: String,
    pub celebration_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/preferences.db".into(),
            fallback_path: PathBuf::from("./data/local_storage.json"),
            media: vec![MediumKind::Sqlite, MediumKind::File],
            log_filter: "info".into(),
            celebration_ms: 4000,
        }
    }
}

/// Resolved settings plus anything that was skipped while resolving them.
///
/// Loading happens before logging is installed, so problems are collected here and logged by the
/// caller once the subscriber is up.
#[derive(Debug, Clone, Default)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub warnings: Vec<String>,
}

pub fn load_settings(config_path: Option<&Path>) -> LoadedSettings {
    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    load_settings_from(path, |name| std::env::var(name).ok())
}

/// Defaults, then the TOML file at `config_path` (if present), then environment variables.
///
/// A bad value only drops its own key; the rest of the file still applies.
pub fn load_settings_from(
    config_path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> LoadedSettings {
    let mut loaded = LoadedSettings::default();

    match fs::read_to_string(config_path) {
        Ok(raw) => match raw.parse::<Table>() {
            Ok(table) => loaded.apply_table(&table),
            Err(err) => loaded.warn(format!(
                "ignoring config file {}: {err}",
                config_path.display()
            )),
        },
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => loaded.warn(format!(
            "could not read config file {}: {err}",
            config_path.display()
        )),
    }

    if let Some(v) = env("DATABASE_URL") {
        loaded.settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        loaded.settings.database_url = v;
    }

    if let Some(v) = env("APP__FALLBACK_PATH") {
        loaded.settings.fallback_path = PathBuf::from(v);
    }

    if let Some(v) = env("APP__MEDIA") {
        let names: Vec<&str> = v.split(',').collect();
        loaded.apply_media("APP__MEDIA", &names);
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        loaded.settings.log_filter = v;
    }

    if let Some(v) = env("APP__CELEBRATION_MS") {
        loaded.apply_celebration_ms("APP__CELEBRATION_MS", &Value::String(v));
    }

    loaded.settings.database_url = normalize_database_url(&loaded.settings.database_url);
    loaded
}

impl LoadedSettings {
    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    fn apply_table(&mut self, table: &Table) {
        for (key, value) in table {
            match key.as_str() {
                "database_url" => {
                    if let Some(v) = self.expect_str(key, value) {
                        self.settings.database_url = v;
                    }
                }
                "fallback_path" => {
                    if let Some(v) = self.expect_str(key, value) {
                        self.settings.fallback_path = PathBuf::from(v);
                    }
                }
                "log_filter" => {
                    if let Some(v) = self.expect_str(key, value) {
                        self.settings.log_filter = v;
                    }
                }
                "media" => match value {
                    Value::String(list) => {
                        let names: Vec<&str> = list.split(',').collect();
                        self.apply_media(key, &names);
                    }
                    Value::Array(items) => {
                        let names: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                        if names.len() != items.len() {
                            self.warn(format!("{key}: non-string entries ignored"));
                        }
                        self.apply_media(key, &names);
                    }
                    other => self.warn(format!(
                        "{key}: expected a string or array, found {}",
                        other.type_str()
                    )),
                },
                "celebration_ms" => self.apply_celebration_ms(key, value),
                other => self.warn(format!("unknown config key '{other}'")),
            }
        }
    }

    fn expect_str(&mut self, key: &str, value: &Value) -> Option<String> {
        match value.as_str() {
            Some(v) => Some(v.to_string()),
            None => {
                self.warn(format!("{key}: expected a string, found {}", value.type_str()));
                None
            }
        }
    }

    fn apply_media(&mut self, source: &str, names: &[&str]) {
        let mut media = Vec::new();
        for name in names.iter().map(|name| name.trim()).filter(|name| !name.is_empty()) {
            match MediumKind::parse(name) {
                Some(kind) if !media.contains(&kind) => media.push(kind),
                Some(_) => {}
                None => self.warn(format!("{source}: unknown storage medium '{name}'")),
            }
        }
        if media.is_empty() {
            self.warn(format!(
                "{source}: no usable storage media, keeping {:?}",
                self.settings.media
            ));
            return;
        }
        self.settings.media = media;
    }

    fn apply_celebration_ms(&mut self, source: &str, value: &Value) {
        let parsed = match value {
            Value::Integer(ms) => u64::try_from(*ms).map_err(|err| err.to_string()),
            Value::String(raw) => raw.trim().parse::<u64>().map_err(|err| err.to_string()),
            other => Err(format!("expected an integer, found {}", other.type_str())),
        };
        match parsed {
            Ok(ms) => self.settings.celebration_ms = ms,
            Err(err) => self.warn(format!("{source}: invalid celebration_ms {value}: {err}")),
        }
    }
}

/// Bare paths and `sqlite:path` become `sqlite://path`; full URLs and in-memory URLs pass through.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let trimmed = raw_database_url.trim();
    if trimmed.is_empty() {
        return Settings::default().database_url;
    }
    if trimmed.contains("://") || trimmed.starts_with("sqlite::memory:") {
        return trimmed.to_string();
    }

    let path = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    format!("sqlite://{}", path.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
