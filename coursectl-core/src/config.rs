use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `lms.token`
pub const TOKEN_ENV: &str = "COURSECTL_TOKEN";

/// Configuration for coursectl, read from ~/.coursectl/config.toml.
/// Every section is optional; missing values fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseConfig {
    pub lms: LmsConfig,
    pub cache: CacheConfig,
    pub browse: BrowseConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmsConfig {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Scheme word placed before the token in the Authorization header
    pub auth_scheme: String,
    pub page_limit: u32,
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for LmsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://learningmanager.adobe.com/primeapi/v2".to_string(),
            token: None,
            auth_scheme: "oauth".to_string(),
            page_limit: 9,
            language: "en-US".to_string(),
            timeout_secs: 30,
        }
    }
}

impl LmsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of skill names kept in memory
    pub skill_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { skill_capacity: 256 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseConfig {
    pub debounce_ms: u64,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

impl BrowseConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl CourseConfig {
    /// Load config from ~/.coursectl/config.toml, or defaults if it does not exist.
    ///
    /// `${VAR}` references are expanded from the environment and
    /// `COURSECTL_TOKEN` overrides the configured token.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::debug!(path = %config_path.display(), "No config file, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file and expand variables, without env overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {:?}", path))?;

        let mut config: Self =
            toml::from_str(&content).context("Failed to parse config file (invalid TOML)")?;

        config.expand_variables();
        Ok(config)
    }

    /// Get config directory path: ~/.coursectl
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".coursectl")
    }

    /// Get config file path: ~/.coursectl/config.toml
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(token) = env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.lms.token = Some(token);
            }
        }
    }

    /// Expand ${VAR} references in string values
    fn expand_variables(&mut self) {
        self.lms.base_url = expand_env(&self.lms.base_url);
        if let Some(ref token) = self.lms.token {
            let expanded = expand_env(token);
            // An unset variable leaves an empty token, which means "no token"
            self.lms.token = (!expanded.trim().is_empty()).then_some(expanded);
        }
    }

    /// Check values that would otherwise fail later with a confusing error
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if !(self.lms.base_url.starts_with("https://") || self.lms.base_url.starts_with("http://")) {
            errors.push(format!("  ✗ lms.base_url: {:?} (must be an http(s) URL)", self.lms.base_url));
        }
        if self.lms.page_limit == 0 {
            errors.push("  ✗ lms.page_limit: must be at least 1".to_string());
        }
        if self.cache.skill_capacity == 0 {
            errors.push("  ✗ cache.skill_capacity: must be at least 1".to_string());
        }

        if !errors.is_empty() {
            anyhow::bail!("Config validation failed:\n{}", errors.join("\n"));
        }

        Ok(())
    }

    /// Save config to ~/.coursectl/config.toml
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(path, toml_str).context(format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }
}

/// Replace every `${NAME}` with the value of environment variable NAME (empty if unset)
fn expand_env(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                result.push_str(&env::var(name).unwrap_or_default());
                rest = &after[end + 1..];
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}
