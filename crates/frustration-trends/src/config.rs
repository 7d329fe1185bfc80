// frustration-trends/crates/frustration-trends/src/config.rs

use anyhow::{Context, Result};
use chrono::Weekday;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Column names of the raw review export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub text: String,
    pub date: String,
    pub version: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            text: "content".to_string(),
            date: "at".to_string(),
            version: "appVersion".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub version_config_path: PathBuf,
    pub apps: Vec<String>,
    pub columns: ColumnMapping,
    pub min_text_chars: usize,
    pub max_classifier_chars: usize,
    pub week_start: Weekday,
    pub classifier_url: Option<String>,
    pub classifier_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("outputs"),
            version_config_path: PathBuf::from("config/app_versions.json"),
            apps: vec!["Zoom".to_string(), "Webex".to_string(), "Firefox".to_string()],
            columns: ColumnMapping::default(),
            min_text_chars: 10,
            max_classifier_chars: 512,
            week_start: Weekday::Mon,
            classifier_url: None,
            classifier_timeout_seconds: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            warn!("Failed to load .env file: {}. Using system environment variables.", e);
        } else {
            info!("Loaded environment variables from .env file");
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; missing keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let apps = match get("APPS") {
            Some(raw) => Self::parse_apps(&raw),
            None => defaults.apps,
        };

        let week_start = match get("WEEK_START") {
            Some(raw) => Self::parse_weekday(&raw)?,
            None => defaults.week_start,
        };

        Ok(Self {
            data_dir: get("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            output_dir: get("OUTPUT_DIR").map(PathBuf::from).unwrap_or(defaults.output_dir),
            version_config_path: get("VERSION_CONFIG")
                .map(PathBuf::from)
                .unwrap_or(defaults.version_config_path),
            apps,
            columns: ColumnMapping {
                text: get("TEXT_COLUMN").unwrap_or(defaults.columns.text),
                date: get("DATE_COLUMN").unwrap_or(defaults.columns.date),
                version: get("VERSION_COLUMN").unwrap_or(defaults.columns.version),
            },
            min_text_chars: get("MIN_TEXT_CHARS")
                .unwrap_or_else(|| "10".into())
                .parse()
                .context("MIN_TEXT_CHARS must be a non-negative integer")?,
            max_classifier_chars: get("MAX_CLASSIFIER_CHARS")
                .unwrap_or_else(|| "512".into())
                .parse()
                .context("MAX_CLASSIFIER_CHARS must be a non-negative integer")?,
            week_start,
            classifier_url: get("CLASSIFIER_URL"),
            classifier_timeout_seconds: get("CLASSIFIER_TIMEOUT_SECONDS")
                .unwrap_or_else(|| "30".into())
                .parse()
                .context("CLASSIFIER_TIMEOUT_SECONDS must be a non-negative integer")?,
        })
    }

    fn parse_apps(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|app| !app.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn parse_weekday(raw: &str) -> Result<Weekday> {
        raw.trim()
            .parse::<Weekday>()
            .map_err(|_| anyhow::anyhow!("Invalid WEEK_START '{}': expected a weekday like 'mon'", raw))
    }

    /// Raw export for an app, e.g. `data/Zoom.csv`
    pub fn input_path(&self, app: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", app))
    }

    /// Stage checkpoint for an app, e.g. `outputs/zoom_cleaned.csv`
    pub fn checkpoint_path(&self, app: &str, stage: &str) -> PathBuf {
        self.output_dir.join(format!("{}_{}.csv", app.to_lowercase(), stage))
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_secs(self.classifier_timeout_seconds)
    }

    pub fn print_config(&self) {
        info!("Current Configuration:");
        info!("- Data Dir: {}", self.data_dir.display());
        info!("- Output Dir: {}", self.output_dir.display());
        info!("- Version Config: {}", self.version_config_path.display());
        info!("- Apps: {}", self.apps.join(", "));
        info!(
            "- Columns: text={}, date={}, version={}",
            self.columns.text, self.columns.date, self.columns.version
        );
        info!("- Min Text Chars: {}", self.min_text_chars);
        info!("- Max Classifier Chars: {}", self.max_classifier_chars);
        info!("- Week Start: {:?}", self.week_start);
        match &self.classifier_url {
            Some(url) => info!("- Classifier: {} (timeout {}s)", url, self.classifier_timeout_seconds),
            None => info!("- Classifier: built-in lexicon"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    // ===== Defaults =====

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.columns, ColumnMapping::default());
        assert_eq!(config.apps, vec!["Zoom", "Webex", "Firefox"]);
        assert_eq!(config.min_text_chars, 10);
        assert_eq!(config.max_classifier_chars, 512);
        assert_eq!(config.week_start, Weekday::Mon);
        assert!(config.classifier_url.is_none());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[("APPS", "  "), ("TEXT_COLUMN", "")])).unwrap();
        assert_eq!(config.apps.len(), 3);
        assert_eq!(config.columns.text, "content");
    }

    // ===== Overrides =====

    #[test]
    fn test_overrides_are_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("APPS", "Slack, Teams,,"),
            ("TEXT_COLUMN", "text"),
            ("DATE_COLUMN", "date"),
            ("WEEK_START", "Sunday"),
            ("MAX_CLASSIFIER_CHARS", "256"),
            ("CLASSIFIER_URL", "http://127.0.0.1:8080/classify"),
        ]))
        .unwrap();

        assert_eq!(config.apps, vec!["Slack", "Teams"]);
        assert_eq!(config.columns.text, "text");
        assert_eq!(config.columns.date, "date");
        assert_eq!(config.columns.version, "appVersion");
        assert_eq!(config.week_start, Weekday::Sun);
        assert_eq!(config.max_classifier_chars, 256);
        assert_eq!(config.classifier_url.as_deref(), Some("http://127.0.0.1:8080/classify"));
    }

    #[test]
    fn test_invalid_numbers_and_weekday_are_errors() {
        assert!(Config::from_lookup(lookup_from(&[("MIN_TEXT_CHARS", "ten")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("WEEK_START", "someday")])).is_err());
    }

    // ===== Paths =====

    #[test]
    fn test_paths() {
        let config = Config::default();
        assert_eq!(config.input_path("Zoom"), PathBuf::from("data/Zoom.csv"));
        assert_eq!(
            config.checkpoint_path("Zoom", "cleaned"),
            PathBuf::from("outputs/zoom_cleaned.csv")
        );
        assert_eq!(config.classifier_timeout(), Duration::from_secs(30));
    }
}
