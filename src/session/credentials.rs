//! Credential blobs and browsing-session setup

use crate::browser::{Browser, MASK_AUTOMATION_SCRIPT};
use crate::config::CrawlerConfig;
use crate::{BrowserResult, HarvestError};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// One session cookie
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credential {
    pub name: String,
    pub value: String,
}

impl Credential {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Parses a raw credential blob into cookies
///
/// Accepted shapes:
/// - a JSON array of `{"name": .., "value": ..}` objects (browser export)
/// - a JSON object mapping name to value
/// - a `name=value; name2=value2` cookie header
///
/// Malformed input yields no cookies.
pub fn parse_credentials(blob: &str) -> Vec<Credential> {
    let trimmed = blob.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let parsed = if trimmed.starts_with('[') {
        serde_json::from_str::<Vec<Credential>>(trimmed)
    } else if trimmed.starts_with('{') {
        serde_json::from_str::<serde_json::Map<String, Value>>(trimmed).map(|map| {
            map.into_iter()
                .map(|(name, value)| match value {
                    Value::String(value) => Credential::new(name, value),
                    other => Credential::new(name, other.to_string()),
                })
                .collect()
        })
    } else {
        return parse_cookie_header(trimmed);
    };

    match parsed {
        Ok(credentials) => credentials,
        Err(e) => {
            tracing::error!("Error parsing cookies: {}", e);
            Vec::new()
        }
    }
}

fn parse_cookie_header(header: &str) -> Vec<Credential> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| Credential::new(name.trim(), value.trim()))
        .filter(|credential| !credential.name.is_empty())
        .collect()
}

/// Prepares a fresh browsing session
///
/// With credentials, loads the site root and stores every cookie for the
/// configured cookie domain; a cookie the browser rejects is skipped. The
/// automation-masking script runs last and its failure is not fatal. Only a
/// failure to load the site root is returned.
pub async fn establish_session<B: Browser>(
    browser: &mut B,
    credentials: &[Credential],
    config: &CrawlerConfig,
) -> BrowserResult<()> {
    if !credentials.is_empty() {
        browser.navigate(&config.base_url).await?;

        let mut applied = 0;
        for credential in credentials {
            match browser
                .add_cookie(&credential.name, &credential.value, &config.cookie_domain)
                .await
            {
                Ok(()) => applied += 1,
                Err(e) => tracing::warn!("Failed to set cookie {}: {}", credential.name, e),
            }
        }
        tracing::info!("Applied {}/{} session cookies", applied, credentials.len());
    }

    if let Err(e) = browser.execute_script(MASK_AUTOMATION_SCRIPT).await {
        tracing::warn!("Could not mask automation flag: {}", e);
    }

    tracing::info!("Browser session setup completed");
    Ok(())
}

/// Checks that a search location is an absolute http(s) URL
pub fn validate_search_url(raw: &str) -> Result<Url, HarvestError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| HarvestError::InvalidRequest(format!("Invalid URL format: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(HarvestError::InvalidRequest(format!(
            "Search URL must use http or https, got {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(HarvestError::InvalidRequest(
            "Search URL has no host".to_string(),
        ));
    }

    Ok(url)
}
