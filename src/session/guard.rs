//! Sign-in detection

use crate::browser::Browser;
use crate::config::{AuthConfig, Config};
use crate::crawler::wait_for_page_load;
use crate::extract::first_match;
use crate::BrowserError;

/// Decides from a page location whether the session is signed in
#[derive(Debug, Clone)]
pub struct SessionGuard {
    login_patterns: Vec<String>,
}

impl SessionGuard {
    /// Patterns are matched case-insensitively as substrings of the location
    pub fn new(login_patterns: &[String]) -> Self {
        Self {
            login_patterns: login_patterns
                .iter()
                .map(|pattern| pattern.to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.login_patterns)
    }

    /// False when `location` is a sign-in or login surface
    pub fn is_authenticated(&self, location: &str) -> bool {
        let location = location.to_lowercase();
        !self
            .login_patterns
            .iter()
            .any(|pattern| location.contains(pattern.as_str()))
    }
}

/// Result of an authentication probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthProbe {
    pub authenticated: bool,
    pub message: String,
}

impl AuthProbe {
    fn new(authenticated: bool, message: impl Into<String>) -> Self {
        Self {
            authenticated,
            message: message.into(),
        }
    }
}

/// Checks whether an established session is signed in
///
/// Loads the site root and looks for a sign-in redirect first, then for any
/// element that only a signed-in user sees.
pub async fn probe_authentication<B: Browser>(browser: &mut B, config: &Config) -> AuthProbe {
    if let Err(e) = browser.navigate(&config.crawler.base_url).await {
        return AuthProbe::new(false, format!("Authentication test failed: {}", e));
    }
    wait_for_page_load(browser, config.timeouts.page_load(), config.timeouts.settle()).await;

    let location = match browser.current_location().await {
        Ok(location) => location,
        Err(e) => return AuthProbe::new(false, format!("Authentication test failed: {}", e)),
    };
    if !SessionGuard::from_config(&config.auth).is_authenticated(&location) {
        return AuthProbe::new(false, "Authentication failed - redirected to login page");
    }

    let page: &B = browser;
    let indicator = first_match(&config.auth.user_indicators, |selector| async move {
        Ok::<_, BrowserError>(page.find(selector, None).await?)
    })
    .await;

    match indicator {
        Ok(Some(_)) => AuthProbe::new(true, "Authentication successful"),
        Ok(None) => AuthProbe::new(false, "Authentication status unclear"),
        Err(e) => AuthProbe::new(false, format!("Authentication test failed: {}", e)),
    }
}
