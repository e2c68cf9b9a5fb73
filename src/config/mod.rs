//! Configuration module for Seller-Census
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use seller_census::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("census.toml")).unwrap();
//! println!("Walking ids {}..={}", config.range.from, config.range.to);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, Config, FetchConfig, FetchMode, HtmlConfig, OutputConfig, PacingConfig,
    RangeConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, ConfigOverrides,
};
pub use validation::validate;
