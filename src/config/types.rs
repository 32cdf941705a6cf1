use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Lead-Harvest
///
/// Every section has defaults, so an empty TOML document is a complete
/// configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pacing: PacingConfig,
    pub timeouts: TimeoutConfig,
    pub crawler: CrawlerConfig,
    pub auth: AuthConfig,
    pub selectors: SelectorConfig,
    pub http: HttpConfig,
}

/// Delay bounds and jitter ranges
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Lower bound of any page-to-page delay (milliseconds)
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    /// Upper bound of any page-to-page delay (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// Base delay used when a request does not specify one (milliseconds)
    #[serde(rename = "default-delay-ms")]
    pub default_delay_ms: u64,

    /// Shortest pause between two row extractions (milliseconds)
    #[serde(rename = "row-jitter-min-ms")]
    pub row_jitter_min_ms: u64,

    /// Longest pause between two row extractions (milliseconds)
    #[serde(rename = "row-jitter-max-ms")]
    pub row_jitter_max_ms: u64,

    /// Pause after scrolling the next-page control into view (milliseconds)
    #[serde(rename = "scroll-pause-ms")]
    pub scroll_pause_ms: u64,

    /// Fixed RNG seed for reproducible jitter
    pub seed: Option<u64>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 2_000,
            max_delay_ms: 50_000,
            default_delay_ms: 10_000,
            row_jitter_min_ms: 500,
            row_jitter_max_ms: 1_500,
            scroll_pause_ms: 1_000,
            seed: None,
        }
    }
}

impl PacingConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn default_delay(&self) -> Duration {
        Duration::from_millis(self.default_delay_ms)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }
}

/// Upper bounds for every blocking browser interaction
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long to wait for the document to report ready (milliseconds)
    #[serde(rename = "page-load-ms")]
    pub page_load_ms: u64,

    /// Fixed wait after the document is ready, for client-side rendering (milliseconds)
    #[serde(rename = "settle-ms")]
    pub settle_ms: u64,

    /// How long to wait for the first result row to appear (milliseconds)
    #[serde(rename = "rows-appear-ms")]
    pub rows_appear_ms: u64,

    /// Polling interval for wait conditions (milliseconds)
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            page_load_ms: 30_000,
            settle_ms: 3_000,
            rows_appear_ms: 20_000,
            poll_interval_ms: 250,
        }
    }
}

impl TimeoutConfig {
    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn rows_appear(&self) -> Duration {
        Duration::from_millis(self.rows_appear_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Crawl loop behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Hard cap on harvested pages per crawl
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Rows on the first page times this value estimates the total when no
    /// result-count indicator is present. An approximation, not a guarantee.
    #[serde(rename = "total-estimate-multiplier")]
    pub total_estimate_multiplier: u32,

    /// Site root visited to apply session cookies and to probe authentication
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Domain attribute for applied cookies
    #[serde(rename = "cookie-domain")]
    pub cookie_domain: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 1_000,
            total_estimate_multiplier: 25,
            base_url: "https://app.apollo.io".to_string(),
            cookie_domain: ".apollo.io".to_string(),
        }
    }
}

/// Sign-in detection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Case-insensitive substrings of a location that mean "sign-in surface"
    #[serde(rename = "login-patterns")]
    pub login_patterns: Vec<String>,

    /// Selectors that only exist for a signed-in user
    #[serde(rename = "user-indicators")]
    pub user_indicators: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_patterns: strings(&["/sign-in", "login"]),
            user_indicators: strings(&[
                "[data-cy=\"user-menu\"]",
                ".user-avatar",
                "[class*=\"user\"]",
                "[class*=\"profile\"]",
            ]),
        }
    }
}

/// Ordered selector chains; the first one that yields a value wins
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub rows: Vec<String>,
    pub name: Vec<String>,
    pub email: Vec<String>,
    pub phone: Vec<String>,
    pub linkedin: Vec<String>,
    #[serde(rename = "job-title")]
    pub job_title: Vec<String>,
    pub company: Vec<String>,
    pub location: Vec<String>,
    #[serde(rename = "company-link")]
    pub company_link: Vec<String>,
    #[serde(rename = "companies-path-segment")]
    pub companies_path_segment: String,
    #[serde(rename = "result-count")]
    pub result_count: Vec<String>,
    #[serde(rename = "next-page")]
    pub next_page: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            rows: strings(&[
                "[data-cy=\"person\"]",
                ".zp_xVJ20",
                "[class*=\"person-row\"]",
                "[class*=\"contact-row\"]",
            ]),
            name: strings(&[
                "[data-cy=\"person-name\"]",
                ".zp_xVJ20",
                ".person-name",
                "[class*=\"name\"]",
            ]),
            email: strings(&[
                "[data-cy=\"person-email\"]",
                ".zp_Iu6Pf",
                "[class*=\"email\"]",
                "a[href^=\"mailto:\"]",
            ]),
            phone: strings(&[
                "[data-cy=\"person-phone\"]",
                ".zp_Yz4Ml",
                "[class*=\"phone\"]",
            ]),
            linkedin: strings(&["a[href*=\"linkedin.com\"]", "[data-cy=\"person-linkedin\"]"]),
            job_title: strings(&[
                "[data-cy=\"person-title\"]",
                ".zp_Y6y8d",
                "[class*=\"title\"]",
                "[class*=\"job-title\"]",
            ]),
            company: strings(&[
                "[data-cy=\"person-company\"]",
                ".zp_J1j1x",
                "[class*=\"company\"]",
            ]),
            location: strings(&[
                "[data-cy=\"person-location\"]",
                ".zp_MC4wf",
                "[class*=\"location\"]",
            ]),
            company_link: strings(&["a[href*=\"/companies/\"]"]),
            companies_path_segment: "/companies/".to_string(),
            result_count: strings(&[
                "[data-cy=\"results-count\"]",
                ".zp_xqF0w",
                "[class*=\"results\"]",
                "[class*=\"count\"]",
            ]),
            next_page: strings(&[
                "[data-cy=\"next-page\"]",
                ".zp_Zkc2Q[aria-label=\"Next\"]",
                "button[aria-label=\"Next\"]",
                ".pagination-next",
                "[class*=\"next\"]",
            ]),
        }
    }
}

/// Settings for the built-in HTTP browser
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    #[serde(rename = "connect-timeout-ms")]
    pub connect_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            request_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
