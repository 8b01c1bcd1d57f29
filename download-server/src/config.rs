use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub port: u16,
    /// Cap on incoming request bodies; the API only accepts small JSON.
    pub body_limit_bytes: usize,
    /// Connect timeout for upstream media fetches. No total timeout is set,
    /// streams must be allowed to run for as long as the download takes.
    pub connect_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            body_limit_bytes: 64 * 1024,
            connect_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let defaults = Self::default();

        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            body_limit_bytes: std::env::var("BODY_LIMIT_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.body_limit_bytes),
            connect_timeout_secs: std::env::var("CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.connect_timeout_secs),
        })
    }
}
