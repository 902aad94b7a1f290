//! Configuration management for gtd.
//!
//! Handles loading configuration from TOML files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{IsolationMode, RetryPolicy};

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV: &str = "GTD_CONFIG";

/// Placeholder shown instead of a credential.
pub const REDACTED: &str = "***";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Report generation settings
    pub report: ReportConfig,

    /// Backoff for remote API calls
    pub retry: RetryConfig,

    /// Jira connection
    pub jira: JiraConfig,

    /// Trello connection
    pub trello: TrelloConfig,

    /// Notes directory for the weekly exercise
    pub notes: NotesConfig,

    /// Extra scripts whose output is appended to the report
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scripts: Vec<ScriptConfig>,
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Title of the rendered document
    pub title: String,

    /// Maximum number of extension workers (0 = number of CPUs)
    pub max_workers: usize,

    /// Extensions that should not run
    pub disabled: Vec<String>,

    /// Run each extension in its own process or on a worker thread
    pub isolation: IsolationMode,
}

/// Retry settings, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay before the first retry
    pub base_delay_secs: f64,

    /// Upper bound for a single delay
    pub max_delay_secs: f64,

    /// Maximum number of retries
    pub max_retries: u32,
}

/// Jira settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    /// Base URL of the Jira instance (empty disables the extension)
    pub url: String,

    /// Account user name
    pub username: String,

    /// Password or API token
    pub password: String,

    /// Custom field holding the task context
    pub context_field: String,

    /// Number of backlog tasks suggested on a healthy week
    pub backlog_focus: usize,

    /// Custom field listing the stakeholders of an epic
    pub stakeholders_field: String,

    /// Due dates a single day can take before it counts as overloaded
    pub max_deadlines_per_day: usize,
}

/// Trello settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrelloConfig {
    /// API key (empty disables the extension)
    pub api_key: String,

    /// API token
    pub token: String,

    /// Board to report on
    pub board: String,

    /// Label marking cards planned for this week
    pub this_week_label: String,

    /// First day counted in the closing-rate statistic (YYYY-MM-DD)
    pub stats_since: String,
}

/// Notes settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesConfig {
    /// Root of the notes tree (empty disables the extension)
    pub path: String,
}

/// A script whose output is included in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Section name
    pub name: String,

    /// Shell command to run
    pub script: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Treat output as text (true) or as raw HTML (false)
    #[serde(default = "default_escape")]
    pub escape: bool,
}

fn default_escape() -> bool {
    true
}

impl ScriptConfig {
    /// Create a script entry with the minimum required fields.
    pub fn new(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self { name: name.into(), script: script.into(), description: None, escape: true }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "GTD Report".to_string(),
            max_workers: 0,
            disabled: Vec::new(),
            isolation: IsolationMode::Process,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { base_delay_secs: 1.0, max_delay_secs: 60.0, max_retries: 5 }
    }
}

impl RetryConfig {
    /// Convert into a retry policy. Negative or non-finite values count as zero.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            secs(self.base_delay_secs),
            secs(self.max_delay_secs),
            self.max_retries,
        )
    }
}

fn mask(secret: &mut String) {
    if !secret.is_empty() {
        *secret = REDACTED.to_string();
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            context_field: "customfield_10036".to_string(),
            backlog_focus: 10,
            stakeholders_field: "customfield_10038".to_string(),
            max_deadlines_per_day: 1,
        }
    }
}

impl JiraConfig {
    /// Check if a Jira instance is configured.
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

impl Default for TrelloConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            token: String::new(),
            board: "Backlog".to_string(),
            this_week_label: "This week".to_string(),
            stats_since: "2025-01-05".to_string(),
        }
    }
}

impl TrelloConfig {
    /// Check if Trello credentials are configured.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.token.is_empty()
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. the file named by `GTD_CONFIG`
    /// 2. `.gtd.toml` in current directory
    /// 3. `~/.config/gtd/config.toml`
    /// 4. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load_from_file(Path::new(&path));
        }

        // Try local config first
        let local_config = PathBuf::from(".gtd.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        // Try global config
        if let Some(config_dir) = Self::config_dir() {
            let global_config = config_dir.join("config.toml");
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e)
        })?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Copy with credentials masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        mask(&mut config.jira.password);
        mask(&mut config.trello.api_key);
        mask(&mut config.trello.token);
        config
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("gtd"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.report.title, "GTD Report");
        assert_eq!(config.report.max_workers, 0);
        assert_eq!(config.report.isolation, IsolationMode::Process);
        assert!(!config.jira.is_configured());
        assert!(!config.trello.is_configured());
        assert_eq!(config.trello.board, "Backlog");
        assert!(config.scripts.is_empty());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("[report]"));
        assert!(toml_str.contains("[retry]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [report]
            title = "Weekly"
            max_workers = 3
            disabled = ["notes"]
            isolation = "thread"

            [retry]
            base_delay_secs = 0.5
            max_retries = 2

            [jira]
            url = "https://example.atlassian.net"
            username = "me"

            [[scripts]]
            name = "Disk usage"
            script = "df -h"

            [[scripts]]
            name = "Calendar"
            script = "cal"
            description = "This month"
            escape = false
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.report.title, "Weekly");
        assert_eq!(config.report.max_workers, 3);
        assert_eq!(config.report.disabled, vec!["notes"]);
        assert_eq!(config.report.isolation, IsolationMode::Thread);
        assert!(config.jira.is_configured());
        assert_eq!(config.jira.context_field, "customfield_10036");
        assert_eq!(config.jira.stakeholders_field, "customfield_10038");
        assert_eq!(config.jira.max_deadlines_per_day, 1);

        assert_eq!(config.scripts.len(), 2);
        assert!(config.scripts[0].escape);
        assert!(config.scripts[0].description.is_none());
        assert!(!config.scripts[1].escape);

        let policy = config.retry.policy();
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(60));
        assert_eq!(policy.max_retries, 2);
    }

    #[test]
    fn test_redacted_hides_credentials() {
        let mut config = Config::default();
        config.jira.username = "me".into();
        config.jira.password = "hunter2".into();
        config.trello.token = "tok-secret".into();

        let shown = toml::to_string_pretty(&config.redacted()).unwrap();
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("tok-secret"));
        assert!(shown.contains("username = \"me\""));
        assert!(shown.contains(&format!("password = \"{REDACTED}\"")));

        // Unset secrets stay empty so it is clear they are missing
        assert!(config.redacted().trello.api_key.is_empty());
        assert_eq!(config.jira.password, "hunter2");
    }

    #[test]
    fn test_negative_delay_clamped() {
        let retry = RetryConfig { base_delay_secs: -1.0, max_delay_secs: f64::NAN, max_retries: 1 };
        let policy = retry.policy();
        assert_eq!(policy.base_delay, Duration::ZERO);
        assert_eq!(policy.max_delay, Duration::ZERO);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gtd.toml");
        std::fs::write(&path, "[notes]\npath = \"~/notes\"\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.notes.path, "~/notes");
    }

    #[test]
    #[serial_test::serial]
    fn test_load_honours_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[report]\ntitle = \"From env\"\n").unwrap();

        std::env::set_var(CONFIG_ENV, &path);
        let loaded = Config::load();
        std::env::remove_var(CONFIG_ENV);

        assert_eq!(loaded.unwrap().report.title, "From env");
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = Config::load_from_file(Path::new("/nonexistent/gtd.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
