use crate::config::types::{Config, MAX_CONCURRENCY, MAX_MAX_PAGES};
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::{Path, PathBuf};

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
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use docharvest::config::load_config;
///
/// let config = load_config(Path::new("docharvest.toml")).unwrap();
/// println!("Concurrency: {}", config.pipeline.concurrency);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Builds the effective configuration for one command invocation
///
/// Reads the optional config file, applies environment overrides using
/// `lookup`, and validates the result once.
pub fn resolve_config<F>(path: Option<&Path>, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) => load_config(p)?,
        None => Config::default(),
    };
    apply_env_overrides(&mut config, lookup);
    validate(&config)?;
    Ok(config)
}

/// Applies `DOCHARVEST_*` environment overrides
///
/// Numeric overrides are clamped to their hard ceiling; values that do not
/// parse as a positive integer are ignored. A backend URL with a non-http(s)
/// scheme is ignored with a warning.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(n) = positive_int(lookup("DOCHARVEST_CONCURRENCY")) {
        config.pipeline.concurrency = n.min(MAX_CONCURRENCY);
    }

    if let Some(n) = positive_int(lookup("DOCHARVEST_MAX_PAGES")) {
        config.crawler.max_pages = n.min(MAX_MAX_PAGES);
    }

    if let Some(model) = non_blank(lookup("DOCHARVEST_MODEL")) {
        config.converter.model = model;
    }

    if let Some(raw) = non_blank(lookup("DOCHARVEST_BACKEND_URL")) {
        match url::Url::parse(&raw) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {
                config.backend.url = Some(raw.trim_end_matches('/').to_string());
            }
            _ => tracing::warn!("Ignoring invalid DOCHARVEST_BACKEND_URL value: {}", raw),
        }
    }

    config.converter.api_key = non_blank(lookup("DOCHARVEST_API_KEY"))
        .or_else(|| non_blank(lookup("OPENROUTER_API_KEY")))
        .or(config.converter.api_key.take());
}

/// Default per-user cache root: `<home>/.docharvest/cache`
pub fn default_cache_root() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir)
        .join(".docharvest")
        .join("cache")
}

/// Default document root: `./.docharvest/docs`
pub fn default_docs_root() -> PathBuf {
    PathBuf::from(".docharvest").join("docs")
}

fn positive_int(value: Option<String>) -> Option<usize> {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
