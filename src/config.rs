//! Server Configuration
//!
//! Defaults match the public server. Every field can be overridden from
//! the environment; a value that does not parse is reported and ignored.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::core::constants::PREGAME_TIME;
use crate::game::tick::MatchConfig;
use crate::network::session::SessionConfig;
use crate::storage::STORE_QUOTA;

/// Port used when neither `ROYALE_BIND_ADDR` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 3000;

/// Process-wide settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Milliseconds between simulation passes.
    pub tick_ms: u64,
    /// Seconds between creating a match and starting it.
    pub pregame_secs: f64,
    /// Bots per new match.
    pub bots: usize,
    /// Store byte quota.
    pub store_quota: usize,
    /// Store file, if the store should survive restarts.
    pub store_path: Option<PathBuf>,
    /// How often store usage is checked for logging.
    pub store_log_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: 1000,
            tick_ms: 33,
            pregame_secs: PREGAME_TIME,
            bots: MatchConfig::default().bot_count,
            store_quota: STORE_QUOTA,
            store_path: None,
            store_log_interval: Duration::from_secs(2),
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", name, raw);
            None
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = parse_var(&lookup, "ROYALE_BIND_ADDR") {
            config.bind_addr = addr;
        } else if let Some(port) = parse_var::<u16>(&lookup, "PORT") {
            config.bind_addr.set_port(port);
        }
        if let Some(n) = parse_var(&lookup, "ROYALE_MAX_CONNECTIONS") {
            config.max_connections = n;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "ROYALE_TICK_MS") {
            config.tick_ms = ms.max(1);
        }
        if let Some(secs) = parse_var(&lookup, "ROYALE_PREGAME_SECS") {
            config.pregame_secs = secs;
        }
        if let Some(bots) = parse_var(&lookup, "ROYALE_BOTS") {
            config.bots = bots;
        }
        if let Some(quota) = parse_var(&lookup, "ROYALE_STORE_QUOTA") {
            config.store_quota = quota;
        }
        if let Some(path) = lookup("ROYALE_STORE_PATH").filter(|p| !p.is_empty()) {
            config.store_path = Some(PathBuf::from(path));
        }

        config
    }

    /// Simulation pass interval.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Settings for new matches.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            pregame_secs: self.pregame_secs,
            match_config: MatchConfig {
                bot_count: self.bots,
                ..MatchConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.tick_ms, 33);
        assert_eq!(config.store_quota, 13312);
        assert_eq!(config.bots, 19);
        assert!(config.store_path.is_none());
    }

    #[test]
    fn test_port_fallback() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "8080")]));
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());

        let config = ServerConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("ROYALE_BIND_ADDR", "127.0.0.1:9000"),
        ]));
        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("ROYALE_TICK_MS", "0"),
            ("ROYALE_BOTS", "3"),
            ("ROYALE_PREGAME_SECS", "5.5"),
            ("ROYALE_STORE_PATH", "/tmp/store.json"),
        ]));
        assert_eq!(config.tick_ms, 1);
        assert_eq!(config.pregame_secs, 5.5);
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/store.json")));

        let session = config.session_config();
        assert_eq!(session.match_config.bot_count, 3);
        assert_eq!(session.match_config.ammo_count, MatchConfig::default().ammo_count);
        assert_eq!(session.pregame_secs, 5.5);
    }

    #[test]
    fn test_bad_values_are_ignored() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("PORT", "not-a-port"),
            ("ROYALE_MAX_CONNECTIONS", "-4"),
        ]));
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.max_connections, 1000);
    }
}
