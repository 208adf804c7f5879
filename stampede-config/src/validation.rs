//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a required string field
pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }
    Ok(())
}

/// Validate a positive number
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate an absolute http(s) URL
pub fn validate_url(url: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    validate_required_string(url, field_name, domain)?;

    let parsed = url::Url::parse(url).map_err(|e| ConfigError::DomainError {
        domain: domain.to_string(),
        message: format!("{} has invalid URL format: {}", field_name, e),
    })?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(ConfigError::DomainError {
                domain: domain.to_string(),
                message: format!("{} scheme '{}' is not http or https", field_name, scheme),
            })
        }
    }

    if parsed.query().is_some() || parsed.fragment().is_some() {
        log::warn!(
            "{} carries a query or fragment that will end up in front of every endpoint path",
            field_name
        );
    }

    Ok(())
}

/// Validate a path relative to the target base URL (must start with `/`)
pub fn validate_relative_path(path: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    validate_required_string(path, field_name, domain)?;

    if !path.starts_with('/') {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must start with '/', got '{}'", field_name, path),
        });
    }

    if path.starts_with("//") || path.contains("://") {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be relative to the base URL, got '{}'", field_name, path),
        });
    }

    Ok(())
}

/// Validate an enum choice
pub fn validate_enum_choice<T>(
    value: &str,
    valid_choices: &[T],
    field_name: &str,
    domain: &str,
) -> ConfigResult<()>
where
    T: AsRef<str>,
{
    let valid: Vec<&str> = valid_choices.iter().map(|c| c.as_ref()).collect();

    if !valid.iter().any(|&v| v.eq_ignore_ascii_case(value)) {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!(
                "{} has invalid value '{}'. Valid choices: {}",
                field_name,
                value,
                valid.join(", ")
            ),
        });
    }

    Ok(())
}
