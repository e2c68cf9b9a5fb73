use crate::config::types::{
    ApiConfig, Config, FetchConfig, FetchMode, HtmlConfig, OutputConfig, PacingConfig,
    RangeConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_range_config(&config.range)?;
    validate_pacing_config(&config.pacing)?;
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;

    match config.fetch.mode {
        FetchMode::Api => validate_api_config(&config.api)?,
        FetchMode::Html => validate_html_config(&config.html)?,
    }

    Ok(())
}

fn validate_range_config(config: &RangeConfig) -> Result<(), ConfigError> {
    if config.from == 0 {
        return Err(ConfigError::Validation(
            "range.from must be a positive seller id".to_string(),
        ));
    }

    if config.from > config.to {
        return Err(ConfigError::Validation(format!(
            "range.from ({}) must not exceed range.to ({})",
            config.from, config.to
        )));
    }

    Ok(())
}

fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 64, got {}",
            config.concurrency
        )));
    }

    if config.flush_every < 1 {
        return Err(ConfigError::Validation(
            "flush-every must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.max_delay_ms < config.base_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max-delay-ms ({}) must be >= base-delay-ms ({})",
            config.max_delay_ms, config.base_delay_ms
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv-path cannot be empty".to_string(),
        ));
    }

    if config.progress_path.is_empty() {
        return Err(ConfigError::Validation(
            "progress-path cannot be empty".to_string(),
        ));
    }

    if config.csv_path == config.progress_path {
        return Err(ConfigError::Validation(
            "csv-path and progress-path must differ".to_string(),
        ));
    }

    Ok(())
}

fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    validate_http_url(&config.base_url, "api.base-url")?;

    if config.resolve_token().is_none() {
        return Err(ConfigError::MissingToken(config.token_env.clone()));
    }

    Ok(())
}

fn validate_html_config(config: &HtmlConfig) -> Result<(), ConfigError> {
    if !config.url_template.contains("{id}") {
        return Err(ConfigError::Validation(format!(
            "html.url-template must contain an {{id}} placeholder, got '{}'",
            config.url_template
        )));
    }

    let sample = config.url_template.replace("{id}", "1");
    validate_http_url(&sample, "html.url-template")?;

    if let Some(dir) = &config.debug_dir {
        if dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "html.debug-dir cannot be blank".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_http_url(raw: &str, field: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field,
            url.scheme()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::UserAgentConfig;

    fn create_test_config() -> Config {
        Config {
            range: RangeConfig { from: 1, to: 100 },
            pacing: PacingConfig::default(),
            fetch: FetchConfig {
                mode: FetchMode::Html,
                ..Default::default()
            },
            api: ApiConfig::default(),
            html: HtmlConfig::default(),
            output: OutputConfig {
                csv_path: "sellers.csv".to_string(),
                progress_path: "progress.json".to_string(),
            },
            user_agent: UserAgentConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&create_test_config()).is_ok());
    }

    #[test]
    fn test_zero_from_rejected() {
        let mut config = create_test_config();
        config.range.from = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut config = create_test_config();
        config.range.from = 200;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_single_id_range_allowed() {
        let mut config = create_test_config();
        config.range.from = 42;
        config.range.to = 42;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut config = create_test_config();
        config.pacing.concurrency = 0;
        assert!(validate(&config).is_err());

        config.pacing.concurrency = 65;
        assert!(validate(&config).is_err());

        config.pacing.concurrency = 64;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_max_attempts_bounds() {
        let mut config = create_test_config();
        config.fetch.max_attempts = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_template_requires_placeholder() {
        let mut config = create_test_config();
        config.html.url_template = "https://shop.example.com/sp?seller=1".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_template_must_be_http() {
        let mut config = create_test_config();
        config.html.url_template = "ftp://shop.example.com/{id}".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_same_output_paths_rejected() {
        let mut config = create_test_config();
        config.output.progress_path = config.output.csv_path.clone();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_api_mode_with_inline_token() {
        let mut config = create_test_config();
        config.fetch.mode = FetchMode::Api;
        config.api.token = Some("secret".to_string());
        config.api.token_env = "SELLER_CENSUS_TEST_UNSET_TOKEN".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_api_mode_without_token() {
        let mut config = create_test_config();
        config.fetch.mode = FetchMode::Api;
        config.api.token = None;
        config.api.token_env = "SELLER_CENSUS_TEST_UNSET_TOKEN".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::MissingToken(_))
        ));
    }
}
