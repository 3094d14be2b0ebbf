//! CLI configuration and stored credentials.
//!
//! Both live as JSON files under `<config dir>/glue/`. A missing config file
//! means defaults; a missing credentials file means "not logged in".

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::CliError;

const CONFIG_FILE: &str = "config.json";
const CREDENTIALS_FILE: &str = "credentials.json";

/// Persistent CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GlueConfig {
    /// Base URL of the backend API.
    pub api_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Delay between deployment status polls, in seconds.
    pub watch_interval_secs: u64,
    /// Delay between log polls when following, in milliseconds.
    pub log_poll_interval_ms: u64,
    /// Quiet period used to batch followed log lines, in milliseconds.
    pub log_debounce_ms: u64,
}

impl Default for GlueConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 30,
            watch_interval_secs: 5,
            log_poll_interval_ms: 1000,
            log_debounce_ms: 100,
        }
    }
}

impl GlueConfig {
    /// Loads configuration from a JSON file, falling back to defaults if the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed or
    /// validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CliError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!(
                "failed to read config file '{}': {e}",
                path.display()
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parses configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or fails validation.
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| CliError::Config(format!("invalid JSON: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is out of range.
    pub fn validate(&self) -> Result<(), CliError> {
        validate_api_url(&self.api_url)?;

        for (name, value) in [
            ("request_timeout_secs", self.request_timeout_secs),
            ("watch_interval_secs", self.watch_interval_secs),
            ("log_poll_interval_ms", self.log_poll_interval_ms),
            ("log_debounce_ms", self.log_debounce_ms),
        ] {
            if value == 0 {
                return Err(CliError::Config(format!("{name} must be greater than 0")));
            }
        }

        Ok(())
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Deployment poll interval.
    #[must_use]
    pub const fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.watch_interval_secs)
    }

    /// Log poll interval.
    #[must_use]
    pub const fn log_poll_interval(&self) -> Duration {
        Duration::from_millis(self.log_poll_interval_ms)
    }

    /// Log batching quiet period.
    #[must_use]
    pub const fn log_debounce(&self) -> Duration {
        Duration::from_millis(self.log_debounce_ms)
    }
}

/// Checks that `api_url` is an absolute http(s) URL.
///
/// # Errors
///
/// Returns a config error otherwise.
pub fn validate_api_url(api_url: &str) -> Result<Url, CliError> {
    if api_url.is_empty() {
        return Err(CliError::Config("api_url cannot be empty".to_string()));
    }
    let url = Url::parse(api_url)
        .map_err(|e| CliError::Config(format!("invalid api_url '{api_url}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CliError::Config(
            "api_url must start with http:// or https://".to_string(),
        ));
    }
    Ok(url)
}

/// A stored API token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    /// Bearer token.
    pub token: String,
    /// Email of the account the token belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

impl Credentials {
    /// Loads credentials, returning `None` if none are stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is unreadable or malformed.
    pub fn load(path: &Path) -> Result<Option<Self>, CliError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let creds = serde_json::from_str(&content).map_err(|e| {
            CliError::Config(format!(
                "corrupt credentials file '{}': {e}",
                path.display()
            ))
        })?;
        Ok(Some(creds))
    }

    /// Writes credentials, readable only by the current user on unix.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;

        // An existing file keeps its old mode
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(json.as_bytes())?;

        debug!(path = %path.display(), "saved credentials");
        Ok(())
    }

    /// Deletes stored credentials. Returns whether a file was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn delete(path: &Path) -> Result<bool, CliError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Locations of the config and credentials files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Config file.
    pub config: PathBuf,
    /// Credentials file.
    pub credentials: PathBuf,
}

impl ConfigPaths {
    /// Paths inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config: dir.join(CONFIG_FILE),
            credentials: dir.join(CREDENTIALS_FILE),
        }
    }

    /// Default paths under the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform has no config directory.
    pub fn default_paths() -> Result<Self, CliError> {
        let base = dirs::config_dir()
            .ok_or_else(|| CliError::Config("cannot determine config directory".to_string()))?;
        Ok(Self::in_dir(&base.join("glue")))
    }

    /// Uses `config` as the config file, keeping credentials beside it.
    #[must_use]
    pub fn with_config_file(config: PathBuf) -> Self {
        let credentials = config
            .parent()
            .map_or_else(|| PathBuf::from(CREDENTIALS_FILE), |p| p.join(CREDENTIALS_FILE));
        Self {
            config,
            credentials,
        }
    }
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Loaded configuration with flag overrides applied.
    pub config: GlueConfig,
    /// File locations.
    pub paths: ConfigPaths,
    /// Token from `--token`/`GLUE_TOKEN`, or from stored credentials.
    pub token: Option<String>,
}

impl Settings {
    /// Loads config and credentials, then applies flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a file is malformed or the resulting config is
    /// invalid.
    pub fn resolve(
        paths: ConfigPaths,
        api_url: Option<&str>,
        token: Option<&str>,
    ) -> Result<Self, CliError> {
        let mut config = GlueConfig::from_file(&paths.config)?;
        if let Some(url) = api_url {
            config.api_url = url.trim_end_matches('/').to_string();
            config.validate()?;
        }

        let token = match token {
            Some(t) if !t.trim().is_empty() => Some(t.trim().to_string()),
            _ => Credentials::load(&paths.credentials)?.map(|c| c.token),
        };

        Ok(Self {
            config,
            paths,
            token,
        })
    }

    /// Returns the token or an auth error telling the user to log in.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Auth`] if no token is available.
    pub fn require_token(&self) -> Result<&str, CliError> {
        self.token
            .as_deref()
            .ok_or_else(|| CliError::Auth("not logged in; run `glue auth login`".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_case::test_case;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let config = GlueConfig::from_file(dir.path().join("nope.json")).expect("defaults");
        assert_eq!(config, GlueConfig::default());
        assert_eq!(config.watch_interval(), Duration::from_secs(5));
        assert_eq!(config.log_debounce(), Duration::from_millis(100));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config =
            GlueConfig::from_json(r#"{"api_url": "https://api.example.com", "watch_interval_secs": 2}"#)
                .expect("valid");
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.watch_interval_secs, 2);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test_case(r#"{"api_url": ""}"# ; "empty url")]
    #[test_case(r#"{"api_url": "ws://x"}"# ; "websocket scheme")]
    #[test_case(r#"{"api_url": "not a url"}"# ; "unparseable url")]
    #[test_case(r#"{"watch_interval_secs": 0}"# ; "zero watch interval")]
    #[test_case(r#"{"log_debounce_ms": 0}"# ; "zero debounce")]
    #[test_case(r#"{"api_url": 5}"# ; "wrong type")]
    fn invalid_config_rejected(json: &str) {
        let err = GlueConfig::from_json(json).expect_err("should be rejected");
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn credentials_round_trip_and_delete() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested").join(CREDENTIALS_FILE);

        assert_eq!(Credentials::load(&path).expect("load"), None);

        let creds = Credentials {
            token: "tok_123".into(),
            user_email: Some("dev@example.com".into()),
        };
        creds.save(&path).expect("save");
        assert_eq!(Credentials::load(&path).expect("load"), Some(creds));

        assert!(Credentials::delete(&path).expect("delete"));
        assert!(!Credentials::delete(&path).expect("delete again"));
    }

    #[cfg(unix)]
    #[test]
    fn credentials_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(CREDENTIALS_FILE);
        Credentials {
            token: "t".into(),
            user_email: None,
        }
        .save(&path)
        .expect("save");

        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn saving_over_a_readable_file_tightens_it() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(CREDENTIALS_FILE);
        std::fs::write(&path, "{}").expect("write");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).expect("chmod");

        let creds = Credentials {
            token: "t".into(),
            user_email: None,
        };
        creds.save(&path).expect("save");

        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(Credentials::load(&path).expect("load"), Some(creds));
    }

    #[test]
    fn settings_prefer_flag_token_over_stored() {
        let dir = TempDir::new().expect("tempdir");
        let paths = ConfigPaths::in_dir(dir.path());
        Credentials {
            token: "stored".into(),
            user_email: None,
        }
        .save(&paths.credentials)
        .expect("save");

        let stored = Settings::resolve(paths.clone(), None, None).expect("resolve");
        assert_eq!(stored.require_token().expect("token"), "stored");

        let flagged = Settings::resolve(paths, Some("https://api.example.com/"), Some("flag"))
            .expect("resolve");
        assert_eq!(flagged.require_token().expect("token"), "flag");
        assert_eq!(flagged.config.api_url, "https://api.example.com");
    }

    #[test]
    fn settings_without_token_require_login() {
        let dir = TempDir::new().expect("tempdir");
        let settings = Settings::resolve(ConfigPaths::in_dir(dir.path()), None, None).expect("resolve");
        assert!(matches!(settings.require_token(), Err(CliError::Auth(_))));
    }

    #[test]
    fn config_flag_keeps_credentials_beside_it() {
        let paths = ConfigPaths::with_config_file(PathBuf::from("/tmp/glue-test/custom.json"));
        assert_eq!(paths.credentials, PathBuf::from("/tmp/glue-test/credentials.json"));
    }
}
