//! Review configuration from environment variables

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::classifier::AnalysisSettings;
use crate::error::ConfigError;
use crate::stockfish::EngineOptions;

#[derive(Clone, Debug)]
pub struct ReviewConfig {
    /// How to run Stockfish
    pub engine: EngineOptions,

    /// Depth, thresholds and critical-moment selection
    pub settings: AnalysisSettings,

    /// Chess.com/Lichess username of the tracked player
    pub username: Option<String>,
}

impl ReviewConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = AnalysisSettings::default();

        let stockfish_path = lookup("STOCKFISH_PATH").unwrap_or_else(|| "stockfish".to_string());

        let depth: u32 = parse_var(&lookup, "STOCKFISH_DEPTH", defaults.depth)?;
        if depth == 0 {
            return Err(ConfigError::Invalid {
                name: "STOCKFISH_DEPTH",
                value: depth.to_string(),
            });
        }

        let query_timeout_secs: u64 = parse_var(&lookup, "ENGINE_QUERY_TIMEOUT_SECS", 30)?;
        if query_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "ENGINE_QUERY_TIMEOUT_SECS",
                value: query_timeout_secs.to_string(),
            });
        }

        let threads = parse_var(&lookup, "ENGINE_THREADS", 1)?;
        let hash_mb = parse_var(&lookup, "ENGINE_HASH_MB", 256)?;

        let critical_moment_limit =
            parse_var(&lookup, "CRITICAL_MOMENT_LIMIT", defaults.critical_moment_limit)?;
        let critical_moment_floor =
            parse_var(&lookup, "CRITICAL_MOMENT_FLOOR", defaults.critical_moment_floor)?;

        let username = lookup("CHESS_USERNAME").filter(|u| !u.trim().is_empty());

        Ok(Self {
            engine: EngineOptions {
                path: stockfish_path,
                args: Vec::new(),
                threads,
                hash_mb,
                query_timeout: Duration::from_secs(query_timeout_secs),
            },
            settings: AnalysisSettings {
                depth,
                critical_moment_limit,
                critical_moment_floor,
                ..defaults
            },
            username,
        })
    }
}

/// Read a numeric variable, falling back to `default` when unset
fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<ReviewConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ReviewConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.engine.path, "stockfish");
        assert_eq!(config.engine.query_timeout, Duration::from_secs(30));
        assert_eq!(config.settings, AnalysisSettings::default());
        assert_eq!(config.settings.depth, 15);
        assert_eq!(config.username, None);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("STOCKFISH_PATH", "/usr/local/bin/stockfish"),
            ("STOCKFISH_DEPTH", "20"),
            ("ENGINE_QUERY_TIMEOUT_SECS", "5"),
            ("CRITICAL_MOMENT_LIMIT", "5"),
            ("CHESS_USERNAME", "seanr87"),
        ])
        .unwrap();
        assert_eq!(config.engine.path, "/usr/local/bin/stockfish");
        assert_eq!(config.settings.depth, 20);
        assert_eq!(config.settings.critical_moment_limit, 5);
        assert_eq!(config.engine.query_timeout, Duration::from_secs(5));
        assert_eq!(config.username.as_deref(), Some("seanr87"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            config_from(&[("STOCKFISH_DEPTH", "deep")]),
            Err(ConfigError::Invalid { name: "STOCKFISH_DEPTH", .. })
        ));
        assert!(matches!(
            config_from(&[("STOCKFISH_DEPTH", "0")]),
            Err(ConfigError::Invalid { name: "STOCKFISH_DEPTH", .. })
        ));
        assert!(matches!(
            config_from(&[("ENGINE_QUERY_TIMEOUT_SECS", "0")]),
            Err(ConfigError::Invalid { name: "ENGINE_QUERY_TIMEOUT_SECS", .. })
        ));
    }
}
