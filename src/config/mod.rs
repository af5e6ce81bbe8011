mod schema;

pub use schema::{Config, ReportSection, ScoringSection, SourceSection};

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AuditError;
use crate::standings::DEFAULT_BEST_N;

pub const DEFAULT_RESULTS_TABLE: &str = "tournament_results";
pub const DEFAULT_STANDINGS_TABLE: &str = "aoy_standings_view";
pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REPORT_LIMIT: usize = 20;

/// Environment variables for the store URL, first match wins
pub const ENV_URL_VARS: &[&str] = &["AOY_AUDIT_URL", "SUPABASE_URL"];

/// Environment variables for the store key, first match wins
pub const ENV_KEY_VARS: &[&str] = &["AOY_AUDIT_API_KEY", "SUPABASE_SERVICE_ROLE_KEY"];

/// Connection settings for the table store, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub url: String,
    pub api_key: String,
    pub results_table: String,
    pub standings_table: String,
    pub page_size: usize,
    pub timeout: Duration,
}

/// Get the default config file path (~/.config/aoy-audit/config.yaml)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("aoy-audit").join("config.yaml"))
}

/// Load configuration from a YAML file.
///
/// With `path` set, the file must exist. Without it the default path is
/// tried and an absent file yields an empty config, since everything can
/// come from the environment.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("Config file not found at {}", p.display());
            }
            p
        }
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(Config::default()),
        },
    };

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    tracing::debug!(path = %config_path.display(), "loaded config");
    Ok(config)
}

/// Validate a loaded config. Returns all problems at once.
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(n) = config.scoring.best_n {
        if n <= 0 {
            errors.push(format!("scoring.best_n: must be a positive integer, got {}", n));
        }
    }

    if let Some(ref url) = config.source.url {
        if let Err(e) = reqwest::Url::parse(url) {
            errors.push(format!("source.url: invalid '{}' - {}", url, e));
        }
    }

    if config.source.page_size == Some(0) {
        errors.push("source.page_size: must be at least 1".to_string());
    }

    if let Some(ref timeout) = config.source.timeout {
        if let Err(e) = humantime::parse_duration(timeout) {
            errors.push(format!("source.timeout: invalid '{}' - {}", timeout, e));
        }
    }

    if config.report.limit == Some(0) {
        errors.push("report.limit: must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Best-N from the command line, else the config file, else the default.
pub fn resolve_best_n(config: &Config, cli: Option<i64>) -> Result<usize, AuditError> {
    match cli.or(config.scoring.best_n) {
        None => Ok(DEFAULT_BEST_N),
        Some(n) if n > 0 => usize::try_from(n)
            .map_err(|_| AuditError::invalid_config(format!("best_n {} is out of range", n))),
        Some(n) => Err(AuditError::invalid_config(format!(
            "best_n must be a positive integer, got {}",
            n
        ))),
    }
}

/// Read an environment variable, treating blank values as unset.
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn first_env(vars: &[&str], env: &impl Fn(&str) -> Option<String>) -> Option<String> {
    vars.iter().find_map(|name| env(*name))
}

/// Combine the config file with environment values into connection settings.
///
/// `env` is the variable lookup, normally [`env_var`]. Environment values win
/// over the file. A missing URL or key is an [`AuditError::InvalidConfiguration`].
pub fn resolve_source(
    config: &Config,
    env: impl Fn(&str) -> Option<String>,
) -> Result<SourceConfig, AuditError> {
    let section = &config.source;

    let url = first_env(ENV_URL_VARS, &env).or_else(|| section.url.clone());
    let api_key = first_env(ENV_KEY_VARS, &env).or_else(|| section.api_key.clone());

    let mut missing = Vec::new();
    if url.is_none() {
        missing.push(format!("store URL ({} or source.url)", ENV_URL_VARS.join("/")));
    }
    if api_key.is_none() {
        missing.push(format!("store key ({} or source.api_key)", ENV_KEY_VARS.join("/")));
    }
    let (Some(url), Some(api_key)) = (url, api_key) else {
        return Err(AuditError::invalid_config(format!(
            "missing {}",
            missing.join(" and ")
        )));
    };

    let timeout = match section.timeout {
        Some(ref t) => humantime::parse_duration(t)
            .map_err(|e| AuditError::invalid_config(format!("source.timeout '{}': {}", t, e)))?,
        None => DEFAULT_TIMEOUT,
    };

    let page_size = match section.page_size {
        Some(0) => return Err(AuditError::invalid_config("source.page_size must be at least 1")),
        Some(n) => usize::try_from(n)
            .map_err(|_| AuditError::invalid_config("source.page_size is out of range"))?,
        None => DEFAULT_PAGE_SIZE,
    };

    Ok(SourceConfig {
        url,
        api_key,
        results_table: section
            .results_table
            .clone()
            .unwrap_or_else(|| DEFAULT_RESULTS_TABLE.to_string()),
        standings_table: section
            .standings_table
            .clone()
            .unwrap_or_else(|| DEFAULT_STANDINGS_TABLE.to_string()),
        page_size,
        timeout,
    })
}
