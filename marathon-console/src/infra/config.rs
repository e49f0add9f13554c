use crate::infra::api_client::normalize_base_url;
use crate::infra::errors::{ConsoleError, ConsoleResult};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_SERVER_URL: &str =
    "https://econet-marathon-api.onrender.com/api/v1";

const APP_DIR: &str = "marathon-console";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub server_url: String,
    /// Rows per page in the runners list
    pub page_limit: u32,
    pub request_timeout_secs: u64,
    /// Reconnect attempts for the live feed before giving up
    pub feed_max_retries: u32,
    /// Live events buffered while a list fetch is in flight
    pub event_journal_capacity: usize,
    pub export_dir: Option<PathBuf>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            page_limit: 10,
            request_timeout_secs: 30,
            feed_max_retries: 10,
            event_journal_capacity: 256,
            export_dir: None,
        }
    }
}

impl ConsoleConfig {
    /// Load the config file (if any) and apply environment overrides on top.
    pub fn load() -> ConsoleResult<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_path(&path)?,
            _ => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> ConsoleResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            ConsoleError::Config(format!(
                "Failed to parse {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    pub fn save(&self) -> ConsoleResult<PathBuf> {
        let path = Self::default_path().ok_or_else(|| {
            ConsoleError::Config(
                "Unable to determine config directory".to_string(),
            )
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> ConsoleResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Environment wins over the file. `lookup` is injected so tests do not
    /// have to mutate the process environment.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConsoleResult<()> {
        if let Some(url) = lookup("MARATHON_API_URL") {
            self.server_url = url;
        }
        if let Some(raw) = lookup("MARATHON_PAGE_LIMIT") {
            self.page_limit = parse_var("MARATHON_PAGE_LIMIT", &raw)?;
        }
        if let Some(raw) = lookup("MARATHON_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs =
                parse_var("MARATHON_REQUEST_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("MARATHON_FEED_MAX_RETRIES") {
            self.feed_max_retries =
                parse_var("MARATHON_FEED_MAX_RETRIES", &raw)?;
        }
        if let Some(raw) = lookup("MARATHON_EVENT_JOURNAL_CAPACITY") {
            self.event_journal_capacity =
                parse_var("MARATHON_EVENT_JOURNAL_CAPACITY", &raw)?;
        }
        if let Some(dir) = lookup("MARATHON_EXPORT_DIR") {
            self.export_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn validate(&self) -> ConsoleResult<()> {
        if self.server_url.trim().is_empty() {
            return Err(ConsoleError::Config(
                "server_url must not be empty".to_string(),
            ));
        }
        url::Url::parse(&normalize_base_url(&self.server_url)).map_err(
            |e| {
                ConsoleError::Config(format!(
                    "server_url {:?} is not a valid URL: {}",
                    self.server_url, e
                ))
            },
        )?;
        if self.page_limit == 0 {
            return Err(ConsoleError::Config(
                "page_limit must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConsoleError::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Where exports land when no directory is given explicitly.
    pub fn export_dir_or_cwd(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> ConsoleResult<T> {
    raw.trim().parse().map_err(|_| {
        ConsoleError::Config(format!("{key} has an invalid value: {raw:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_file_values() {
        let vars = HashMap::from([
            ("MARATHON_API_URL", "http://localhost:5000"),
            ("MARATHON_PAGE_LIMIT", "25"),
        ]);
        let mut config = ConsoleConfig::default();

        config
            .apply_env_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server_url, "http://localhost:5000");
        assert_eq!(config.page_limit, 25);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn malformed_number_is_a_config_error() {
        let mut config = ConsoleConfig::default();
        let err = config
            .apply_env_overrides(|key| {
                (key == "MARATHON_PAGE_LIMIT").then(|| "ten".to_string())
            })
            .unwrap_err();

        assert!(matches!(err, ConsoleError::Config(_)));
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"page_limit": 50}"#).unwrap();

        let config = ConsoleConfig::from_path(&path).unwrap();
        assert_eq!(config.page_limit, 50);
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn save_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = ConsoleConfig {
            export_dir: Some(dir.path().to_path_buf()),
            ..ConsoleConfig::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(ConsoleConfig::from_path(&path).unwrap(), config);
    }

    #[test]
    fn unparseable_server_url_is_rejected() {
        let config = ConsoleConfig {
            server_url: "http://exa mple.com".into(),
            ..ConsoleConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConsoleError::Config(_))));
    }

    #[test]
    fn zero_page_limit_is_rejected() {
        let config = ConsoleConfig {
            page_limit: 0,
            ..ConsoleConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
