//! Configuration management for Karma.
//!
//! Loads configuration from ${KARMA_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Returns the default config template with comments.
///
/// Embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Merges user config values into the default template.
///
/// New comments from the template are always present while the user's
/// customized values are preserved.
fn merge_with_template(user_config: &str) -> Result<String> {
    use toml_edit::DocumentMut;

    let mut doc: DocumentMut = default_config_template()
        .parse()
        .context("Failed to parse default config template")?;

    let user_doc: DocumentMut = user_config.parse().context("Failed to parse user config")?;

    merge_items(doc.as_table_mut(), user_doc.as_table());

    Ok(doc.to_string())
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for Karma configuration and session data.
    //!
    //! KARMA_HOME resolution order:
    //! 1. KARMA_HOME environment variable (if set)
    //! 2. ~/.config/karma (default)

    use std::path::PathBuf;

    use super::Config;

    /// Long-lived session store filename.
    const SESSION_FILE: &str = "session.json";

    /// Returns the Karma home directory.
    pub fn karma_home() -> PathBuf {
        if let Ok(home) = std::env::var("KARMA_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".karma"),
            |h| h.join(".config").join("karma"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        karma_home().join("config.toml")
    }

    /// Returns the long-lived ("remember me") session file.
    pub fn remembered_session_path() -> PathBuf {
        karma_home().join(SESSION_FILE)
    }

    /// Returns the session-scoped session file.
    ///
    /// Lives under the system temp dir unless `session_dir` is configured,
    /// so it does not survive a reboot.
    pub fn scoped_session_path(config: &Config) -> PathBuf {
        let dir = match config.session_dir.as_deref() {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => {
                let user = std::env::var("USER")
                    .or_else(|_| std::env::var("USERNAME"))
                    .unwrap_or_else(|_| "default".to_string());
                std::env::temp_dir().join(format!("karma-{user}"))
            }
        };
        dir.join(SESSION_FILE)
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the admin REST backend
    pub api_base_url: String,

    /// Base URL of the phone/OTP auth service (defaults to `api_base_url`)
    pub auth_base_url: Option<String>,

    /// Multipart upload endpoint
    pub upload_url: String,

    /// API key sent with uploads
    pub upload_api_key: Option<String>,

    /// Timeout for OTP verification and registration in seconds (0 disables)
    pub auth_timeout_secs: u64,

    /// Rows per page for list output
    pub page_size: usize,

    /// Region id attached to new admin registrations
    pub registration_region: String,

    /// Override for the session-scoped store directory
    pub session_dir: Option<String>,
}

impl Config {
    const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
    const DEFAULT_UPLOAD_URL: &str = "https://files-public.coffeecodes.in/upload";
    const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 15;
    const DEFAULT_PAGE_SIZE: usize = 10;
    const DEFAULT_REGISTRATION_REGION: &str = "-6k3cvb3xs";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&paths::config_path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Applies `KARMA_*` environment overrides on top of file values.
    pub fn apply_env_overrides(&mut self) {
        let non_empty = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = non_empty("KARMA_API_BASE_URL") {
            self.api_base_url = url;
        }
        if let Some(url) = non_empty("KARMA_AUTH_BASE_URL") {
            self.auth_base_url = Some(url);
        }
        if let Some(url) = non_empty("KARMA_UPLOAD_URL") {
            self.upload_url = url;
        }
        if let Some(dir) = non_empty("KARMA_SESSION_DIR") {
            self.session_dir = Some(dir);
        }
    }

    /// Returns the auth service base URL.
    pub fn effective_auth_base_url(&self) -> &str {
        match self.auth_base_url.as_deref() {
            Some(url) if !url.trim().is_empty() => url,
            _ => &self.api_base_url,
        }
    }

    /// Returns the auth call timeout, `None` when disabled.
    pub fn auth_timeout(&self) -> Option<Duration> {
        (self.auth_timeout_secs > 0).then(|| Duration::from_secs(self.auth_timeout_secs))
    }

    /// Returns the page size, never zero.
    pub fn effective_page_size(&self) -> usize {
        self.page_size.max(1)
    }

    /// Initializes a config file with defaults.
    ///
    /// # Errors
    /// Fails if the file already exists (no silent overwrite).
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Sets a single top-level key in the config file.
    ///
    /// Creates the file from the template if it doesn't exist. Existing values
    /// and comments are preserved.
    ///
    /// # Errors
    /// Returns an error for unknown keys, values of the wrong type, or I/O failures.
    pub fn save_value_to(path: &Path, key: &str, raw_value: &str) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        let item = match key {
            "api_base_url" | "auth_base_url" | "upload_url" | "upload_api_key"
            | "registration_region" | "session_dir" => value(raw_value),
            "auth_timeout_secs" | "page_size" => {
                let number: i64 = raw_value
                    .trim()
                    .parse()
                    .with_context(|| format!("'{key}' expects a non-negative integer"))?;
                if number < 0 {
                    anyhow::bail!("'{key}' expects a non-negative integer");
                }
                value(number)
            }
            other => anyhow::bail!("Unknown config key '{other}'"),
        };

        let contents = if path.exists() {
            let user_config = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            merge_with_template(&user_config)?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        doc[key] = item;

        Self::write_config(path, &doc.to_string())
    }

    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: Self::DEFAULT_API_BASE_URL.to_string(),
            auth_base_url: None,
            upload_url: Self::DEFAULT_UPLOAD_URL.to_string(),
            upload_api_key: None,
            auth_timeout_secs: Self::DEFAULT_AUTH_TIMEOUT_SECS,
            page_size: Self::DEFAULT_PAGE_SIZE,
            registration_region: Self::DEFAULT_REGISTRATION_REGION.to_string(),
            session_dir: None,
        }
    }
}
