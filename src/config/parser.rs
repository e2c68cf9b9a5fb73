use crate::config::types::{Config, FetchMode};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Command-line values that take precedence over the configuration file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub from: Option<u64>,
    pub to: Option<u64>,
    pub delay_ms: Option<u64>,
    pub concurrency: Option<usize>,
    pub mode: Option<FetchMode>,
}

impl ConfigOverrides {
    /// Applies the overrides to `config` and re-validates the result
    pub fn apply(&self, config: &mut Config) -> Result<(), ConfigError> {
        if let Some(from) = self.from {
            config.range.from = from;
        }
        if let Some(to) = self.to {
            config.range.to = to;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.pacing.delay_ms = delay_ms;
        }
        if let Some(concurrency) = self.concurrency {
            config.pacing.concurrency = concurrency;
        }
        if let Some(mode) = self.mode {
            config.fetch.mode = mode;
        }

        validate(config)
    }
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs against a changed configuration are easy to
/// spot when comparing logs of a resumed harvest.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const FULL_CONFIG: &str = r#"
[range]
from = 100
to = 250

[pacing]
delay-ms = 500
concurrency = 4
flush-every = 10

[fetch]
mode = "html"
max-attempts = 2
base-delay-ms = 1000
timeout-secs = 15

[html]
url-template = "https://shop.example.com/sp?seller={id}"
debug-dir = "./dumps"

[output]
csv-path = "./sellers.csv"
progress-path = "./progress.json"

[user-agent]
name = "TestCensus"
version = "0.1"
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(FULL_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.range.from, 100);
        assert_eq!(config.range.to, 250);
        assert_eq!(config.pacing.concurrency, 4);
        assert_eq!(config.fetch.mode, FetchMode::Html);
        assert_eq!(config.fetch.max_attempts, 2);
        assert_eq!(config.html.debug_dir.as_deref(), Some("./dumps"));
        assert_eq!(config.user_agent.name, "TestCensus");
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = parse_config(
            r#"
[fetch]
mode = "html"

[output]
csv-path = "out.csv"
progress-path = "progress.json"
"#,
        )
        .unwrap();

        assert_eq!(config.range.from, 1);
        assert_eq!(config.pacing.concurrency, 1);
        assert_eq!(config.fetch.max_attempts, 3);
        assert!(config.html.url_template.contains("{id}"));
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/census.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = FULL_CONFIG.replace("concurrency = 4", "concurrency = 0");
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_overrides_apply_and_revalidate() {
        let mut config = parse_config(FULL_CONFIG).unwrap();
        let overrides = ConfigOverrides {
            from: Some(1),
            to: Some(50),
            concurrency: Some(8),
            ..Default::default()
        };
        overrides.apply(&mut config).unwrap();
        assert_eq!(config.range.from, 1);
        assert_eq!(config.range.to, 50);
        assert_eq!(config.pacing.concurrency, 8);

        let inverted = ConfigOverrides {
            from: Some(60),
            ..Default::default()
        };
        assert!(inverted.apply(&mut config).is_err());
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }
}
