use crate::constants::{ENV_API_BASE_URL, ENV_API_TOKEN, ENV_DESTINATION_DIR};
use crate::errors::{AppError, AppResult};
use chrono::Datelike;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Resolved configuration with all values filled in (no Options).
///
/// This struct carries the run defaults and can be deserialized by the TOML
/// loader. Unknown keys are rejected so typos surface instead of being silently ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolvedConfig {
    // Remote API
    /// Base URL of the accounting platform (e.g. `https://tenant.example.com`)
    pub api_base_url: String,
    /// Access token embedded in the API path
    pub api_token: String,
    /// Timeout in seconds for the contact and certificate listing calls
    pub metadata_timeout_secs: u64,
    /// Timeout in seconds for file downloads
    pub download_timeout_secs: u64,

    // Local files
    /// Root folder for downloaded certificates
    pub destination_dir: PathBuf,
    /// Plain-text roster, one CNPJ per line
    pub cnpj_list_path: PathBuf,
    /// JSON ledger of downloaded file identifiers
    pub ledger_path: PathBuf,

    // Scan window
    /// Years to scan. Empty means previous and current calendar year.
    pub years: Vec<i32>,
    /// Refresh the roster from the contact list before scanning
    pub sync_contacts: bool,

    // Pacing
    /// Pause after every certificate listing request
    pub request_delay_ms: u64,
    /// Pause after every file download attempt
    pub download_delay_ms: u64,
    /// Pause after finishing a CNPJ
    pub between_cnpj_delay_ms: u64,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            api_token: String::new(),
            metadata_timeout_secs: 30,
            download_timeout_secs: 60,
            destination_dir: PathBuf::from("CNDs"),
            cnpj_list_path: PathBuf::from("cnpjs.txt"),
            ledger_path: PathBuf::from("baixados.json"),
            years: Vec::new(),
            sync_contacts: true,
            request_delay_ms: 600,
            download_delay_ms: 1500,
            between_cnpj_delay_ms: 3000,
        }
    }
}

impl ResolvedConfig {
    /// Loads configuration from a TOML file.
    ///
    /// Missing keys fall back to [`ResolvedConfig::default`]. The result is not
    /// validated; call [`ResolvedConfig::validate`] once environment overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be read and `ConfigError` if the TOML is
    /// malformed or contains unknown keys.
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            AppError::IoError(format!("Failed to read config {}: {e}", path.display()))
        })?;
        let config: ResolvedConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Applies `CND_API_BASE_URL`, `CND_API_TOKEN` and `CND_DESTINATION_DIR` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup. Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(ENV_API_BASE_URL) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(token) = lookup(ENV_API_TOKEN) {
            self.api_token = token.trim().to_string();
        }
        if let Some(dir) = lookup(ENV_DESTINATION_DIR) {
            self.destination_dir = PathBuf::from(dir);
        }
        self
    }

    /// Checks that the configuration can drive a run.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the base URL is missing or not an http(s) URL, the token
    /// is empty, a timeout is zero, or a configured year is out of range.
    pub fn validate(&self) -> AppResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(AppError::ConfigError(format!(
                "API base URL is not set (use `api_base_url` or {ENV_API_BASE_URL})"
            )));
        }
        let url = Url::parse(&self.api_base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::ConfigError(format!(
                "API base URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.api_token.trim().is_empty() {
            return Err(AppError::ConfigError(format!(
                "API token is not set (use `api_token` or {ENV_API_TOKEN})"
            )));
        }
        if self.metadata_timeout_secs == 0 || self.download_timeout_secs == 0 {
            return Err(AppError::ConfigError(
                "Timeouts must be greater than 0".into(),
            ));
        }
        if let Some(year) = self.years.iter().find(|y| !(1900..=9999).contains(*y)) {
            return Err(AppError::ConfigError(format!(
                "Year {year} is outside the supported range 1900-9999"
            )));
        }
        Ok(())
    }

    /// Years to scan in ascending order.
    pub fn scan_years(&self) -> Vec<i32> {
        self.scan_years_from(chrono::Local::now().year())
    }

    fn scan_years_from(&self, current_year: i32) -> Vec<i32> {
        let mut years = if self.years.is_empty() {
            vec![current_year - 1, current_year]
        } else {
            self.years.clone()
        };
        years.sort_unstable();
        years.dedup();
        years
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}
