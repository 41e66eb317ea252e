#[cfg(feature = "cli")]
pub mod cli;

use crate::adapters::http::DEFAULT_API_BASE_URL;
use crate::core::retry::RetryPolicy;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{MegaverseError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

const MAX_REQUEST_DELAY_SECS: f64 = 3600.0;
const MAX_INITIAL_BACKOFF_SECS: f64 = 300.0;

/// Runtime settings. Resolved as defaults, then TOML file, then environment, then CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub candidate_id: Option<String>,
    pub request_delay_secs: f64,
    pub max_retries: u32,
    pub backoff_factor: f64,
    pub initial_backoff_secs: f64,
    pub request_timeout_secs: u64,
    pub goal_file: String,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            candidate_id: None,
            request_delay_secs: 1.0,
            max_retries: 3,
            backoff_factor: 2.0,
            initial_backoff_secs: 1.0,
            request_timeout_secs: 30,
            goal_file: "goal.json".to_string(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api: Option<ApiSection>,
    run: Option<RunSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ApiSection {
    base_url: Option<String>,
    candidate_id: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RunSection {
    request_delay_secs: Option<f64>,
    max_retries: Option<u32>,
    backoff_factor: Option<f64>,
    initial_backoff_secs: Option<f64>,
    goal_file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoggingSection {
    level: Option<String>,
}

impl Settings {
    /// Defaults, overlaid with `config_path` (if any) and the process environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// `load` with an explicit variable source, used for both `${VAR}` substitution
    /// and the environment overlay.
    pub fn load_with<F>(config_path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match config_path {
            Some(path) => {
                let content = read_config_file(path)?;
                Self::parse_toml(&content, &lookup)?
            }
            None => Self::default(),
        };
        settings.apply_env(lookup)?;
        Ok(settings)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = read_config_file(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::parse_toml(content, &|key: &str| std::env::var(key).ok())
    }

    fn parse_toml<F>(content: &str, lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let processed = substitute_env_vars(content, lookup);
        let file: FileConfig =
            toml::from_str(&processed).map_err(|e| MegaverseError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;

        let mut settings = Self::default();
        if let Some(api) = file.api {
            if let Some(base_url) = api.base_url {
                settings.api_base_url = base_url;
            }
            settings.candidate_id = api.candidate_id.filter(|id| !is_unresolved(id));
            if let Some(timeout) = api.timeout_secs {
                settings.request_timeout_secs = timeout;
            }
        }
        if let Some(run) = file.run {
            if let Some(delay) = run.request_delay_secs {
                settings.request_delay_secs = delay;
            }
            if let Some(retries) = run.max_retries {
                settings.max_retries = retries;
            }
            if let Some(factor) = run.backoff_factor {
                settings.backoff_factor = factor;
            }
            if let Some(initial) = run.initial_backoff_secs {
                settings.initial_backoff_secs = initial;
            }
            if let Some(goal_file) = run.goal_file {
                settings.goal_file = goal_file;
            }
        }
        if let Some(level) = file.logging.and_then(|l| l.level) {
            settings.log_level = level.to_ascii_lowercase();
        }
        Ok(settings)
    }

    /// Overlays environment variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = get("CANDIDATE_ID") {
            self.candidate_id = Some(id.trim().to_string());
        }
        if let Some(url) = get("API_BASE_URL") {
            self.api_base_url = url;
        }
        if let Some(delay) = get("REQUEST_DELAY") {
            self.request_delay_secs = parse_env("REQUEST_DELAY", &delay)?;
        }
        if let Some(retries) = get("MAX_RETRIES") {
            self.max_retries = parse_env("MAX_RETRIES", &retries)?;
        }
        if let Some(factor) = get("BACKOFF_FACTOR") {
            self.backoff_factor = parse_env("BACKOFF_FACTOR", &factor)?;
        }
        if let Some(timeout) = get("REQUEST_TIMEOUT") {
            self.request_timeout_secs = parse_env("REQUEST_TIMEOUT", &timeout)?;
        }
        if let Some(goal_file) = get("GOAL_FILE") {
            self.goal_file = goal_file;
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.log_level = level.to_ascii_lowercase();
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            clamped_duration(self.initial_backoff_secs, MAX_INITIAL_BACKOFF_SECS),
            self.backoff_factor,
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The candidate id, validated. Only commands that talk to the API need it.
    pub fn require_candidate_id(&self) -> Result<&str> {
        let id = validation::validate_required_field("candidate_id", &self.candidate_id)?;
        validation::validate_candidate_id(id)?;
        Ok(id.as_str())
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api_base_url", &self.api_base_url)?;
        validation::validate_range(
            "request_delay_secs",
            self.request_delay_secs,
            0.0,
            MAX_REQUEST_DELAY_SECS,
        )?;
        validation::validate_range("max_retries", self.max_retries, 1, 100)?;
        validation::validate_range("backoff_factor", self.backoff_factor, 1.0, 10.0)?;
        validation::validate_range(
            "initial_backoff_secs",
            self.initial_backoff_secs,
            0.0,
            MAX_INITIAL_BACKOFF_SECS,
        )?;
        validation::validate_range("request_timeout_secs", self.request_timeout_secs, 1, 600)?;
        validation::validate_path("goal_file", &self.goal_file)?;
        validation::validate_one_of("log_level", &self.log_level, &LOG_LEVELS)?;
        Ok(())
    }
}

impl ConfigProvider for Settings {
    fn candidate_id(&self) -> Option<&str> {
        self.candidate_id.as_deref()
    }

    fn request_delay(&self) -> Duration {
        clamped_duration(self.request_delay_secs, MAX_REQUEST_DELAY_SECS)
    }

    fn goal_file(&self) -> &str {
        &self.goal_file
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| MegaverseError::InvalidConfigValueError {
            field: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn read_config_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| MegaverseError::ConfigError {
        message: format!("Cannot read config file {}: {}", path.display(), e),
    })
}

/// NaN and negatives become zero, anything above `max_secs` (including infinity) becomes `max_secs`.
fn clamped_duration(secs: f64, max_secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(secs.min(max_secs))
}

fn is_unresolved(value: &str) -> bool {
    value.trim().is_empty() || (value.starts_with("${") && value.ends_with('}'))
}

/// Replaces `${VAR}` with the value from `lookup`; unknown variables are left as-is.
fn substitute_env_vars<F>(content: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    use regex::Regex;
    use std::sync::OnceLock;

    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern is valid"));

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const CANDIDATE: &str = "3f2b8c1e-7a4d-4e2f-9b6a-1c2d3e4f5a6b";

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.request_delay(), Duration::from_secs(1));
        assert_eq!(settings.retry_policy().max_attempts, 3);
        assert!(settings.require_candidate_id().is_err());
    }

    #[test]
    fn test_from_toml_str() {
        let settings = Settings::from_toml_str(&format!(
            r#"
[api]
base_url = "http://localhost:9000/api"
candidate_id = "{}"
timeout_secs = 10

[run]
request_delay_secs = 0.5
max_retries = 5
goal_file = "maps/phase2.json"

[logging]
level = "DEBUG"
"#,
            CANDIDATE
        ))
        .unwrap();

        assert_eq!(settings.api_base_url, "http://localhost:9000/api");
        assert_eq!(settings.require_candidate_id().unwrap(), CANDIDATE);
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
        assert_eq!(settings.request_delay(), Duration::from_millis(500));
        assert_eq!(settings.max_retries, 5);
        assert_eq!(settings.goal_file, "maps/phase2.json");
        assert_eq!(settings.log_level, "debug");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_unresolved_placeholder_means_unset() {
        let settings = Settings::from_toml_str(
            r#"
[api]
candidate_id = "${MEGAVERSE_TEST_VARIABLE_THAT_IS_NEVER_SET}"
"#,
        )
        .unwrap();
        assert!(settings.candidate_id.is_none());
    }

    #[test]
    fn test_unknown_toml_key_is_rejected() {
        assert!(Settings::from_toml_str("[run]\nparallelism = 4\n").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CANDIDATE_ID", CANDIDATE),
            ("REQUEST_DELAY", "0.25"),
            ("MAX_RETRIES", "4"),
            ("LOG_LEVEL", "WARN"),
            ("GOAL_FILE", ""),
        ]);

        let mut settings = Settings::default();
        settings
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.candidate_id.as_deref(), Some(CANDIDATE));
        assert_eq!(settings.request_delay(), Duration::from_millis(250));
        assert_eq!(settings.max_retries, 4);
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.goal_file, "goal.json");
    }

    #[test]
    fn test_env_parse_error() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(|key| (key == "MAX_RETRIES").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, MegaverseError::InvalidConfigValueError { .. }));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = Settings {
            max_retries: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        settings.max_retries = 3;
        settings.log_level = "loud".to_string();
        assert!(settings.validate().is_err());

        settings.log_level = "info".to_string();
        settings.api_base_url = "ftp://example.com".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_nan_floats_fail_validation() {
        for key in ["REQUEST_DELAY", "BACKOFF_FACTOR"] {
            let mut settings = Settings::default();
            settings
                .apply_env(|k| (k == key).then(|| "NaN".to_string()))
                .unwrap();
            assert!(settings.validate().is_err(), "{} = NaN should be rejected", key);
        }
    }

    #[test]
    fn test_durations_are_clamped_without_validation() {
        let settings = Settings {
            request_delay_secs: f64::INFINITY,
            initial_backoff_secs: f64::NAN,
            ..Settings::default()
        };
        assert_eq!(settings.request_delay(), Duration::from_secs(3600));
        assert_eq!(settings.retry_policy().initial_backoff, Duration::ZERO);

        let settings = Settings::from_toml_str("[run]\nrequest_delay_secs = inf\n").unwrap();
        assert!(settings.validate().is_err());
        assert_eq!(settings.request_delay(), Duration::from_secs(3600));
    }

    #[test]
    fn test_load_layers_env_over_toml() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("megaverse.toml");
        std::fs::write(
            &path,
            r#"
[api]
candidate_id = "${MEGAVERSE_CANDIDATE}"

[run]
max_retries = 5
request_delay_secs = 0.5
"#,
        )
        .unwrap();

        let env: HashMap<&str, &str> =
            HashMap::from([("MAX_RETRIES", "4"), ("CANDIDATE_ID", CANDIDATE)]);
        let settings =
            Settings::load_with(Some(&path), |key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(settings.max_retries, 4);
        assert_eq!(settings.request_delay(), Duration::from_millis(500));
        assert_eq!(settings.require_candidate_id().unwrap(), CANDIDATE);
    }

    #[test]
    fn test_load_substitutes_placeholders_from_lookup() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("megaverse.toml");
        std::fs::write(&path, "[api]\ncandidate_id = \"${MEGAVERSE_CANDIDATE}\"\n").unwrap();

        let settings = Settings::load_with(Some(&path), |key| {
            (key == "MEGAVERSE_CANDIDATE").then(|| CANDIDATE.to_string())
        })
        .unwrap();
        assert_eq!(settings.candidate_id.as_deref(), Some(CANDIDATE));

        let settings = Settings::load_with(None, |_| None).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_unreadable_config_file_is_a_config_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let err = Settings::from_file(temp_dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, MegaverseError::ConfigError { .. }));
        assert_eq!(err.exit_code(), 3);
    }
}
