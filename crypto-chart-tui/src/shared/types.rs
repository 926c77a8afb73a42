//! Core data types for the price feed
//!
//! These types match the JSON messages of the crypto WebSocket feed:
//! outbound `{"action":"subscribe","symbols":"BTC-USD, ETH-USD"}` and
//! inbound `{"s":"BTC-USD","p":"97000.12","dc":"1.25","t":1700000000000}`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::error::ChartError;

/// Instruments charted by the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    BtcUsd,
    EthUsd,
}

impl Symbol {
    /// Every charted symbol, in display order
    pub const ALL: [Symbol; 2] = [Symbol::BtcUsd, Symbol::EthUsd];

    /// Feed identifier (e.g. "BTC-USD")
    pub fn as_str(&self) -> &'static str {
        match self {
            Symbol::BtcUsd => "BTC-USD",
            Symbol::EthUsd => "ETH-USD",
        }
    }

    /// Short ticker used on toggles and trend legends
    pub fn ticker(&self) -> &'static str {
        match self {
            Symbol::BtcUsd => "BTC",
            Symbol::EthUsd => "ETH",
        }
    }

    /// Series name shown in the chart legend
    pub fn series_name(&self) -> &'static str {
        match self {
            Symbol::BtcUsd => "Bitcoin",
            Symbol::EthUsd => "Ethereum",
        }
    }

    /// Map a feed identifier onto a charted symbol
    pub fn from_feed(s: &str) -> Option<Self> {
        Symbol::ALL.into_iter().find(|symbol| symbol.as_str() == s)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription request sent once the socket opens
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubscribeMessage {
    pub action: String,
    pub symbols: String,
}

impl SubscribeMessage {
    pub fn new(symbols: &[Symbol]) -> Self {
        Self {
            action: "subscribe".to_string(),
            symbols: symbols
                .iter()
                .map(Symbol::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Raw tick message from the feed
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TickMessage {
    /// Feed symbol (e.g. "BTC-USD")
    #[serde(rename = "s")]
    pub symbol: String,
    /// Last price, sent as a decimal string
    #[serde(rename = "p")]
    pub price: Decimal,
    /// Daily percent change, sent as a decimal string
    #[serde(rename = "dc")]
    pub change_pct: Decimal,
    /// Exchange timestamp in epoch millis
    #[serde(rename = "t", default)]
    pub time: Option<i64>,
}

/// One parsed price update for a charted symbol
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub symbol: Symbol,
    pub price: Decimal,
    pub change_pct: Decimal,
    /// Timestamp reported by the feed, if any
    pub time_exchange: Option<DateTime<Utc>>,
    /// Arrival time; drives chart bucketing
    pub time_received: DateTime<Utc>,
}

impl Tick {
    /// Parse a text frame into a [`Tick`], stamping it with its arrival time.
    pub fn parse(text: &str, time_received: DateTime<Utc>) -> Result<Self, ChartError> {
        let message = serde_json::from_str::<TickMessage>(text)?;
        let symbol = Symbol::from_feed(&message.symbol)
            .ok_or_else(|| ChartError::UnsupportedSymbol(message.symbol.clone()))?;

        Ok(Self {
            symbol,
            price: message.price,
            change_pct: message.change_pct,
            time_exchange: message.time.and_then(DateTime::from_timestamp_millis),
            time_received,
        })
    }
}

/// Which series are drawn and take part in zoom bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesVisibility {
    pub btc: bool,
    pub eth: bool,
}

impl Default for SeriesVisibility {
    fn default() -> Self {
        Self {
            btc: true,
            eth: true,
        }
    }
}

impl SeriesVisibility {
    pub fn is_visible(&self, symbol: Symbol) -> bool {
        match symbol {
            Symbol::BtcUsd => self.btc,
            Symbol::EthUsd => self.eth,
        }
    }

    pub fn toggle(&mut self, symbol: Symbol) {
        match symbol {
            Symbol::BtcUsd => self.btc = !self.btc,
            Symbol::EthUsd => self.eth = !self.eth,
        }
    }

    /// Visible symbols, in display order
    pub fn visible(&self) -> impl Iterator<Item = Symbol> + '_ {
        Symbol::ALL
            .into_iter()
            .filter(move |symbol| self.is_visible(*symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_subscribe_message_json() {
        let message = SubscribeMessage::new(&Symbol::ALL);
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"action": "subscribe", "symbols": "BTC-USD, ETH-USD"})
        );
    }

    #[test]
    fn test_parse_tick() {
        let now = Utc::now();
        let tick = Tick::parse(
            r#"{"s":"ETH-USD","p":"3012.45","dc":"-0.8123","t":1700000000000}"#,
            now,
        )
        .unwrap();

        assert_eq!(tick.symbol, Symbol::EthUsd);
        assert_eq!(tick.price, Decimal::from_str("3012.45").unwrap());
        assert_eq!(tick.change_pct, Decimal::from_str("-0.8123").unwrap());
        assert_eq!(
            tick.time_exchange,
            DateTime::from_timestamp_millis(1_700_000_000_000)
        );
        assert_eq!(tick.time_received, now);
    }

    #[test]
    fn test_parse_tick_accepts_numeric_fields() {
        let tick = Tick::parse(r#"{"s":"BTC-USD","p":97000.5,"dc":1.2}"#, Utc::now()).unwrap();
        assert_eq!(tick.symbol, Symbol::BtcUsd);
        assert_eq!(tick.price, Decimal::from_str("97000.5").unwrap());
        assert!(tick.time_exchange.is_none());
    }

    #[test]
    fn test_parse_tick_rejects_malformed() {
        assert!(matches!(
            Tick::parse("not json", Utc::now()),
            Err(ChartError::Deserialise(_))
        ));
        assert!(matches!(
            Tick::parse(r#"{"status_code":200,"message":"Authorized"}"#, Utc::now()),
            Err(ChartError::Deserialise(_))
        ));
        assert!(matches!(
            Tick::parse(r#"{"s":"BTC-USD","p":"abc","dc":"0"}"#, Utc::now()),
            Err(ChartError::Deserialise(_))
        ));
    }

    #[test]
    fn test_parse_tick_rejects_unknown_symbol() {
        let result = Tick::parse(r#"{"s":"SOL-USD","p":"150","dc":"0"}"#, Utc::now());
        assert!(matches!(result, Err(ChartError::UnsupportedSymbol(s)) if s == "SOL-USD"));
    }

    #[test]
    fn test_series_visibility_toggle() {
        let mut visibility = SeriesVisibility::default();
        assert_eq!(visibility.visible().count(), 2);

        visibility.toggle(Symbol::BtcUsd);
        assert!(!visibility.is_visible(Symbol::BtcUsd));
        assert_eq!(visibility.visible().collect::<Vec<_>>(), vec![Symbol::EthUsd]);

        visibility.toggle(Symbol::BtcUsd);
        assert!(visibility.is_visible(Symbol::BtcUsd));
    }
}
