//! [`RankConfig`] loading: optional JSON file, then env overlay, then validation.
//!
//! - `INTERNRANK_TOP_N`
//! - `INTERNRANK_EXPLAIN_LIMIT`
//! - `INTERNRANK_MAX_FEATURES`
//! - `INTERNRANK_MIN_DF`
//! - `INTERNRANK_MAX_DF` (fraction in (0, 1])
//!
//! Unset or blank vars keep the file/default value; unparsable values are logged and ignored.
//! Parsed values are checked by [`RankConfig::validate`] exactly like file values.

use internrank_core::{Error, RankConfig, Result};
use std::path::Path;
use std::str::FromStr;

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env(key)?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable env value");
            None
        }
    }
}

fn overlay_env(mut cfg: RankConfig) -> RankConfig {
    if let Some(v) = env_parse::<usize>("INTERNRANK_TOP_N") {
        cfg.top_n = v;
    }
    if let Some(v) = env_parse::<usize>("INTERNRANK_EXPLAIN_LIMIT") {
        cfg.explain_limit = v;
    }
    if let Some(v) = env_parse::<usize>("INTERNRANK_MAX_FEATURES") {
        cfg.vectorizer.max_features = v;
    }
    if let Some(v) = env_parse::<usize>("INTERNRANK_MIN_DF") {
        cfg.vectorizer.min_df = v;
    }
    if let Some(v) = env_parse::<f64>("INTERNRANK_MAX_DF") {
        cfg.vectorizer.max_df = v;
    }
    cfg
}

/// Read a (possibly partial) JSON config file; missing keys keep their defaults.
pub fn rank_config_from_file(path: &Path) -> Result<RankConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&raw).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}

/// File (if any) < env vars, validated.
pub fn load_rank_config(path: Option<&Path>) -> Result<RankConfig> {
    let base = match path {
        Some(p) => rank_config_from_file(p)?,
        None => RankConfig::default(),
    };
    let cfg = overlay_env(base);
    cfg.validate()?;
    tracing::debug!(?cfg, "rank config");
    Ok(cfg)
}
