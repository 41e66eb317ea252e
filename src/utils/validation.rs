use crate::domain::model::{Position, MAX_GRID_SIZE};
use crate::utils::error::{MegaverseError, Result};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub const PLACEHOLDER_CANDIDATE_ID: &str = "YOUR_CANDIDATE_ID";

fn uuid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .expect("static UUID pattern is valid")
    })
}

pub fn validate_candidate_id(candidate_id: &str) -> Result<()> {
    if candidate_id.trim().is_empty() {
        return Err(MegaverseError::MissingConfigError {
            field: "candidate_id".to_string(),
        });
    }

    if candidate_id == PLACEHOLDER_CANDIDATE_ID {
        return Err(MegaverseError::InvalidConfigValueError {
            field: "candidate_id".to_string(),
            value: candidate_id.to_string(),
            reason: "Please set your actual candidate ID".to_string(),
        });
    }

    if !uuid_pattern().is_match(candidate_id) {
        return Err(MegaverseError::InvalidConfigValueError {
            field: "candidate_id".to_string(),
            value: candidate_id.to_string(),
            reason: "Candidate ID must be a UUID".to_string(),
        });
    }

    Ok(())
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(MegaverseError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(MegaverseError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(MegaverseError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(MegaverseError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(MegaverseError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_position(position: Position) -> Result<()> {
    if position.row >= MAX_GRID_SIZE || position.column >= MAX_GRID_SIZE {
        return Err(MegaverseError::validation(format!(
            "Position coordinates exceed maximum size {}: {}",
            MAX_GRID_SIZE, position
        )));
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| MegaverseError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(MegaverseError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: format!("Expected one of: {}", allowed.join(", ")),
    })
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    // also rejects NaN
    if !(min..=max).contains(&value) {
        return Err(MegaverseError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_candidate_id() {
        assert!(validate_candidate_id("3f2b8c1e-7a4d-4e2f-9b6a-1c2d3e4f5a6b").is_ok());
        assert!(validate_candidate_id("").is_err());
        assert!(validate_candidate_id(PLACEHOLDER_CANDIDATE_ID).is_err());
        assert!(validate_candidate_id("not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("api_base_url", "https://example.com/api").is_ok());
        assert!(validate_url("api_base_url", "http://127.0.0.1:8080").is_ok());
        assert!(validate_url("api_base_url", "").is_err());
        assert!(validate_url("api_base_url", "invalid-url").is_err());
        assert!(validate_url("api_base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_position() {
        assert!(validate_position(Position::new(0, 0)).is_ok());
        assert!(validate_position(Position::new(49, 49)).is_ok());
        assert!(validate_position(Position::new(50, 0)).is_err());
        assert!(validate_position(Position::new(0, 50)).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("max_retries", 3u32, 1, 10).is_ok());
        assert!(validate_range("max_retries", 0u32, 1, 10).is_err());
        assert!(validate_range("request_delay_secs", -0.5f64, 0.0, 60.0).is_err());
    }

    #[test]
    fn test_validate_range_rejects_non_finite_floats() {
        assert!(validate_range("request_delay_secs", f64::NAN, 0.0, 60.0).is_err());
        assert!(validate_range("backoff_factor", f64::NAN, 1.0, 10.0).is_err());
        assert!(validate_range("request_delay_secs", f64::INFINITY, 0.0, 60.0).is_err());
    }
}
