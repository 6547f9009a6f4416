//! Configuration validation

use crate::schema::RawConfig;
use std::net::SocketAddr;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Invalid listen address '{value}': {message}")]
    InvalidListenAddress { value: String, message: String },

    #[error("Invalid base path '{value}': {message}")]
    InvalidBasePath { value: String, message: String },

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("Invalid oracle URL '{value}': {message}")]
    InvalidOracleUrl { value: String, message: String },

    #[error("Invalid domain '{value}': {message}")]
    InvalidDomain { value: String, message: String },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(listen) = &config.server.listen
        && let Err(message) = parse_listen(listen)
    {
        errors.push(ValidationError::InvalidListenAddress {
            value: listen.clone(),
            message,
        });
    }

    if let Some(base_path) = &config.server.base_path
        && let Err(message) = validate_base_path(base_path)
    {
        errors.push(ValidationError::InvalidBasePath {
            value: base_path.clone(),
            message,
        });
    }

    if config.cache.response_ttl_seconds == Some(0) {
        errors.push(ValidationError::ZeroDuration {
            field: "cache.response_ttl_seconds",
        });
    }

    if config.oracle.timeout_ms == Some(0) {
        errors.push(ValidationError::ZeroDuration {
            field: "oracle.timeout_ms",
        });
    }

    if let Some(url) = &config.oracle.base_url
        && !url.is_empty()
        && let Err(message) = validate_oracle_url(url)
    {
        errors.push(ValidationError::InvalidOracleUrl {
            value: url.clone(),
            message,
        });
    }

    if let Some(domain) = &config.sources.domain
        && !domain.is_empty()
        && let Err(message) = validate_domain(domain)
    {
        errors.push(ValidationError::InvalidDomain {
            value: domain.clone(),
            message,
        });
    }

    errors
}

/// Parse a listen address such as `0.0.0.0:3000`
pub fn parse_listen(s: &str) -> Result<SocketAddr, String> {
    s.trim()
        .parse::<SocketAddr>()
        .map_err(|e| format!("Expected IP:PORT ({})", e))
}

/// Base paths are either empty or `/segment[/segment...]` without a trailing slash
pub fn validate_base_path(s: &str) -> Result<(), String> {
    if s.is_empty() {
        return Ok(());
    }
    if !s.starts_with('/') {
        return Err("Must start with '/'".into());
    }
    if s.ends_with('/') {
        return Err("Must not end with '/'".into());
    }
    if s.chars().any(|c| c.is_whitespace() || c == '?' || c == '#') {
        return Err("Must not contain whitespace, '?' or '#'".into());
    }
    Ok(())
}

/// Oracle URLs must be absolute http(s) URLs with a host
pub fn validate_oracle_url(s: &str) -> Result<(), String> {
    let rest = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
        .ok_or_else(|| "Scheme must be http or https".to_string())?;

    let host = rest.split('/').next().unwrap_or_default();
    if host.is_empty() {
        return Err("Missing host".into());
    }
    if s.chars().any(char::is_whitespace) {
        return Err("Must not contain whitespace".into());
    }
    Ok(())
}

/// Domains are bare DNS names without surrounding dots
pub fn validate_domain(s: &str) -> Result<(), String> {
    if s.is_empty() {
        return Err("Must not be empty".into());
    }
    if s.starts_with('.') || s.ends_with('.') {
        return Err("Must not start or end with '.'".into());
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return Err("Only letters, digits, '-' and '.' are allowed".into());
    }
    Ok(())
}
