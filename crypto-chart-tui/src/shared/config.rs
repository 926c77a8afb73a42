//! Runtime configuration read from the environment
//!
//! | Variable             | Default                                  |
//! |----------------------|------------------------------------------|
//! | `WS_URL`             | EODHD demo crypto feed                   |
//! | `RECONNECT_DELAY_MS` | 3000                                     |
//! | `MAX_POINTS`         | 200 (one of 50/100/200/500)              |
//! | `CHART_LOG_FILE`     | crypto-chart.log                         |

use std::path::PathBuf;
use std::time::Duration;

use crate::shared::error::ChartError;
use crate::shared::types::Symbol;
use crate::shared::websocket::WebSocketConfig;

/// Public demo endpoint of the crypto price feed
pub const DEFAULT_WS_URL: &str = "wss://ws.eodhistoricaldata.com/ws/crypto?api_token=demo";

/// Selectable chart window sizes
pub const MAX_POINTS_OPTIONS: [usize; 4] = [50, 100, 200, 500];

pub const DEFAULT_MAX_POINTS: usize = 200;

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

const DEFAULT_LOG_FILE: &str = "crypto-chart.log";

#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub ws_url: String,
    pub reconnect_delay: Duration,
    pub max_points: usize,
    pub log_file: PathBuf,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_points: DEFAULT_MAX_POINTS,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl ChartConfig {
    /// Build the configuration from process environment variables
    pub fn from_env() -> Result<Self, ChartError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ChartError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("WS_URL") {
            config.ws_url = url.trim().to_string();
        }

        if let Some(raw) = lookup("RECONNECT_DELAY_MS") {
            let millis = raw.trim().parse::<u64>().map_err(|_| ChartError::Config {
                key: "RECONNECT_DELAY_MS",
                value: raw.clone(),
            })?;
            config.reconnect_delay = Duration::from_millis(millis);
        }

        if let Some(raw) = lookup("MAX_POINTS") {
            config.max_points = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|points| MAX_POINTS_OPTIONS.contains(points))
                .ok_or_else(|| ChartError::Config {
                    key: "MAX_POINTS",
                    value: raw.clone(),
                })?;
        }

        if let Some(path) = lookup("CHART_LOG_FILE") {
            config.log_file = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Feed configuration for the two charted symbols
    pub fn websocket(&self) -> WebSocketConfig {
        WebSocketConfig::new(self.ws_url.clone())
            .with_symbols(Symbol::ALL.to_vec())
            .with_reconnect_delay(self.reconnect_delay)
    }
}
