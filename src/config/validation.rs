use crate::config::types::{Config, CrawlerConfig, OutputConfig, OutputFormat, UserAgentConfig};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Upper bound on concurrent page tasks
const MAX_WORKERS_LIMIT: u32 = 100;

/// Upper bound on one backoff time-unit (one minute)
const MAX_BACKOFF_UNIT_MS: u64 = 60_000;

/// Validates the entire configuration
///
/// Called by the loader, and again by the binary after command-line overrides.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.max_workers < 1 || config.max_workers > MAX_WORKERS_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and {}, got {}",
            MAX_WORKERS_LIMIT, config.max_workers
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    if config.backoff_unit_ms > MAX_BACKOFF_UNIT_MS {
        return Err(ConfigError::Validation(format!(
            "backoff_unit_ms must be <= {}ms, got {}ms",
            MAX_BACKOFF_UNIT_MS, config.backoff_unit_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> ConfigResult<()> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if !config.contact_url.is_empty() {
        Url::parse(&config.contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration for the selected format
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    match config.format {
        OutputFormat::Files if config.directory.is_empty() => Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        )),
        OutputFormat::Sqlite if config.database_path.is_empty() => Err(
            ConfigError::Validation("database_path cannot be empty".to_string()),
        ),
        _ => Ok(()),
    }
}
