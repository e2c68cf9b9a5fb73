use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Seller-Census
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub range: RangeConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub html: HtmlConfig,
    pub output: OutputConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
}

/// Inclusive seller-id range to walk
#[derive(Debug, Clone, Deserialize)]
pub struct RangeConfig {
    #[serde(default = "default_from")]
    pub from: u64,

    #[serde(default = "default_to")]
    pub to: u64,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            from: default_from(),
            to: default_to(),
        }
    }
}

/// Request pacing and batching
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    /// Delay between batches (milliseconds)
    #[serde(rename = "delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Fetches in flight per batch; 1 means serial mode
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Flush the progress ledger after this many processed ids
    #[serde(rename = "flush-every", default = "default_flush_every")]
    pub flush_every: usize,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            concurrency: default_concurrency(),
            flush_every: default_flush_every(),
        }
    }
}

impl PacingConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Which upstream the fetch client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Structured JSON API with a bearer token
    Api,
    /// Rendered seller page with heuristic field extraction
    Html,
}

impl std::str::FromStr for FetchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "html" => Ok(Self::Html),
            other => Err(format!("unknown fetch mode '{}', expected 'api' or 'html'", other)),
        }
    }
}

impl std::fmt::Display for FetchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api => write!(f, "api"),
            Self::Html => write!(f, "html"),
        }
    }
}

/// Retry budget and timeouts for a single seller id
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_mode")]
    pub mode: FetchMode,

    /// Total attempts per id, including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base of the linear backoff used for transport errors and bad statuses
    #[serde(rename = "base-delay-ms", default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Base of the exponential backoff used for HTTP 429 without Retry-After
    #[serde(rename = "rate-limit-base-ms", default = "default_rate_limit_base_ms")]
    pub rate_limit_base_ms: u64,

    /// Upper bound on any single backoff sleep, including server-directed ones
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Per-attempt request timeout
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            rate_limit_base_ms: default_rate_limit_base_ms(),
            max_delay_ms: default_max_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Structured API upstream
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Seller endpoint; the id is appended as the last path segment
    #[serde(rename = "base-url", default = "default_api_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request
    #[serde(default)]
    pub token: Option<String>,

    /// Environment variable consulted when `token` is absent
    #[serde(rename = "token-env", default = "default_token_env")]
    pub token_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            token: None,
            token_env: default_token_env(),
        }
    }
}

impl ApiConfig {
    /// Resolves the bearer token from the config file or the environment
    pub fn resolve_token(&self) -> Option<String> {
        self.token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var(&self.token_env).ok())
            .filter(|t| !t.trim().is_empty())
    }
}

/// Rendered-page upstream
#[derive(Debug, Clone, Deserialize)]
pub struct HtmlConfig {
    /// Seller page URL; `{id}` is replaced with the seller id
    #[serde(rename = "url-template", default = "default_url_template")]
    pub url_template: String,

    /// Directory for raw page dumps of blocked or empty pages
    #[serde(rename = "debug-dir", default = "default_debug_dir")]
    pub debug_dir: Option<String>,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
            debug_dir: default_debug_dir(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV result file
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Path to the JSON progress ledger
    #[serde(rename = "progress-path")]
    pub progress_path: String,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(default = "default_agent_name")]
    pub name: String,

    #[serde(default = "default_agent_version")]
    pub version: String,

    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            version: default_agent_version(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.name, self.version, url),
            None => format!("{}/{}", self.name, self.version),
        }
    }
}

fn default_from() -> u64 {
    1
}

fn default_to() -> u64 {
    10_000
}

fn default_delay_ms() -> u64 {
    1_500
}

fn default_concurrency() -> usize {
    1
}

fn default_flush_every() -> usize {
    25
}

fn default_mode() -> FetchMode {
    FetchMode::Api
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    2_000
}

fn default_rate_limit_base_ms() -> u64 {
    5_000
}

fn default_max_delay_ms() -> u64 {
    120_000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_api_base_url() -> String {
    "https://api.example-marketplace.com/v1/sellers".to_string()
}

fn default_token_env() -> String {
    "SELLER_API_TOKEN".to_string()
}

fn default_url_template() -> String {
    "https://www.example-marketplace.com/sp?seller={id}".to_string()
}

fn default_debug_dir() -> Option<String> {
    Some("debug".to_string())
}

fn default_agent_name() -> String {
    "SellerCensus".to_string()
}

fn default_agent_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
