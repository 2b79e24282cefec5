//! Start-up configuration from environment variables.
//!
//! `HOST` (default 0.0.0.0) and `PORT` (default 8080) pick the listen address.
//! `COMPETITIONS_CSV` and `TEAMS_CSV` optionally point at roster files loaded at start.

use std::path::PathBuf;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub competitions_csv: Option<PathBuf>,
    pub teams_csv: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            competitions_csv: None,
            teams_csv: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable or empty values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let port = match non_empty("PORT").map(|p| p.trim().parse::<u16>()) {
            Some(Ok(p)) => p,
            Some(Err(_)) => {
                log::warn!("Ignoring invalid PORT, using {}", default_port());
                default_port()
            }
            None => default_port(),
        };
        Self {
            host: non_empty("HOST").unwrap_or_else(default_host),
            port,
            competitions_csv: non_empty("COMPETITIONS_CSV").map(PathBuf::from),
            teams_csv: non_empty("TEAMS_CSV").map(PathBuf::from),
        }
    }
}
