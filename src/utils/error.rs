use thiserror::Error;

#[derive(Error, Debug)]
pub enum MegaverseError {
    #[error("{}", format_api_error(.message, .status, .body))]
    Api {
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Goal map error: {message}")]
    GoalMap { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Object creation error: {message}")]
    ObjectCreation { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

fn format_api_error(message: &str, status: &Option<u16>, body: &Option<String>) -> String {
    let mut out = message.to_string();
    if let Some(status) = status {
        out.push_str(&format!(" (Status: {})", status));
    }
    if let Some(body) = body.as_deref().filter(|b| !b.is_empty()) {
        out.push_str(&format!(" - {}", body));
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Api,
    GoalMap,
    Validation,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MegaverseError {
    pub fn api(message: impl Into<String>, status: Option<u16>, body: Option<String>) -> Self {
        Self::Api {
            message: message.into(),
            status,
            body,
        }
    }

    pub fn goal_map(message: impl Into<String>) -> Self {
        Self::GoalMap {
            message: message.into(),
        }
    }

    /// Prefixes the message of goal-map errors; other variants pass through.
    pub fn in_goal_context(self, context: &str) -> Self {
        match self {
            Self::GoalMap { message } => Self::GoalMap {
                message: format!("{}: {}", context, message),
            },
            other => other,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Transport failures, throttling and server-side errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => match e.status() {
                Some(status) => status.as_u16() == 429 || status.is_server_error(),
                None => !e.is_builder() && !e.is_decode(),
            },
            Self::Api { status, .. } => match status {
                Some(code) => *code == 429 || (500..600).contains(code),
                None => true,
            },
            _ => false,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http(_) => ErrorCategory::Network,
            Self::Api { .. } => ErrorCategory::Api,
            Self::GoalMap { .. } | Self::SerializationError(_) => ErrorCategory::GoalMap,
            Self::ValidationError { .. } | Self::ObjectCreation { .. } => {
                ErrorCategory::Validation
            }
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Api => ErrorSeverity::Medium,
            ErrorCategory::GoalMap | ErrorCategory::Validation => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check your network connection and retry the command",
            ErrorCategory::Api => {
                "Verify the candidate id and API base URL, then retry; rerun with `create --only-missing` to resume"
            }
            ErrorCategory::GoalMap => {
                "Make sure the goal file exists and contains a JSON object with a rectangular `goal` grid"
            }
            ErrorCategory::Validation => "Fix the offending cell value or coordinates in the goal map",
            ErrorCategory::Configuration => {
                "Check CANDIDATE_ID and the other environment variables or the --config file"
            }
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Api {
                status: Some(401 | 403),
                ..
            } => "The API rejected the candidate id".to_string(),
            Self::Http(_) => "Could not reach the megaverse API".to_string(),
            Self::MissingConfigError { field } => {
                format!("Missing configuration value: {}", field)
            }
            other => other.to_string(),
        }
    }

    /// Process exit code for a fatal error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, MegaverseError>;
