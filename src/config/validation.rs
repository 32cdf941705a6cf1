use crate::config::types::{Config, CrawlerConfig, PacingConfig, SelectorConfig, TimeoutConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_pacing_config(&config.pacing)?;
    validate_timeout_config(&config.timeouts)?;
    validate_crawler_config(&config.crawler)?;
    validate_selector_list("user-indicators", &config.auth.user_indicators)?;
    validate_selector_config(&config.selectors)?;

    if config.auth.login_patterns.iter().any(|p| p.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "login-patterns cannot contain empty patterns".to_string(),
        ));
    }

    Ok(())
}

/// Validates delay bounds and jitter ranges
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    if config.min_delay_ms < 1 {
        return Err(ConfigError::Validation(
            "min-delay-ms must be >= 1".to_string(),
        ));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min-delay-ms ({}) must not exceed max-delay-ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.default_delay_ms < config.min_delay_ms
        || config.default_delay_ms > config.max_delay_ms
    {
        return Err(ConfigError::Validation(format!(
            "default-delay-ms must be between {} and {}, got {}",
            config.min_delay_ms, config.max_delay_ms, config.default_delay_ms
        )));
    }

    if config.row_jitter_min_ms > config.row_jitter_max_ms {
        return Err(ConfigError::Validation(format!(
            "row-jitter-min-ms ({}) must not exceed row-jitter-max-ms ({})",
            config.row_jitter_min_ms, config.row_jitter_max_ms
        )));
    }

    Ok(())
}

/// Validates wait bounds
fn validate_timeout_config(config: &TimeoutConfig) -> Result<(), ConfigError> {
    if config.poll_interval_ms < 1 {
        return Err(ConfigError::Validation(
            "poll-interval-ms must be >= 1".to_string(),
        ));
    }

    if config.page_load_ms < config.poll_interval_ms
        || config.rows_appear_ms < config.poll_interval_ms
    {
        return Err(ConfigError::Validation(format!(
            "page-load-ms and rows-appear-ms must be at least poll-interval-ms ({}ms)",
            config.poll_interval_ms
        )));
    }

    Ok(())
}

/// Validates crawl loop settings
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.total_estimate_multiplier < 1 {
        return Err(ConfigError::Validation(format!(
            "total-estimate-multiplier must be >= 1, got {}",
            config.total_estimate_multiplier
        )));
    }

    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    Ok(())
}

/// Validates every selector chain
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    let chains: [(&str, &[String]); 11] = [
        ("rows", &config.rows),
        ("name", &config.name),
        ("email", &config.email),
        ("phone", &config.phone),
        ("linkedin", &config.linkedin),
        ("job-title", &config.job_title),
        ("company", &config.company),
        ("location", &config.location),
        ("company-link", &config.company_link),
        ("result-count", &config.result_count),
        ("next-page", &config.next_page),
    ];

    for (name, selectors) in chains {
        if selectors.is_empty() {
            return Err(ConfigError::Validation(format!(
                "selector chain '{}' cannot be empty",
                name
            )));
        }
        validate_selector_list(name, selectors)?;
    }

    if config.companies_path_segment.trim().is_empty() {
        return Err(ConfigError::Validation(
            "companies-path-segment cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that each selector in a list is valid CSS
fn validate_selector_list(name: &str, selectors: &[String]) -> Result<(), ConfigError> {
    for selector in selectors {
        Selector::parse(selector).map_err(|e| {
            ConfigError::InvalidSelector(format!("{} selector '{}': {:?}", name, selector, e))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_pacing_bounds() {
        let mut config = Config::default();
        config.pacing.min_delay_ms = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.pacing.default_delay_ms = config.pacing.max_delay_ms + 1;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.pacing.row_jitter_min_ms = 2_000;
        config.pacing.row_jitter_max_ms = 1_000;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_crawler_config() {
        let mut config = Config::default();
        config.crawler.max_pages = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.crawler.base_url = "ftp://example.com".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidUrl(_)
        ));

        let mut config = Config::default();
        config.crawler.base_url = "not a url".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_selectors() {
        let mut config = Config::default();
        config.selectors.next_page.clear();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::Validation(_)
        ));

        let mut config = Config::default();
        config.selectors.email = vec!["[[broken".to_string()];
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidSelector(_)
        ));
    }

    #[test]
    fn test_validate_login_patterns() {
        let mut config = Config::default();
        config.auth.login_patterns.push("  ".to_string());
        assert!(validate(&config).is_err());
    }
}
