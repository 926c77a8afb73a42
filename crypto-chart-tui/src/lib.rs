//! Crypto Chart TUI - Shared Library
//!
//! Everything the `crypto-chart` binary needs to draw a live BTC-USD / ETH-USD chart:
//! - Tick wire types and the WebSocket feed session (auto-reconnect, owned teardown)
//! - The time-bucketed chart buffer and least-squares trend overlay
//! - Drag-to-zoom selection and the full chart state driven by the UI loop
//! - Ratatui rendering of cards, controls and the chart surface

pub mod shared;

// Re-export commonly used types for convenience
pub use shared::config::{ChartConfig, DEFAULT_MAX_POINTS, DEFAULT_WS_URL, MAX_POINTS_OPTIONS};
pub use shared::error::ChartError;
pub use shared::types::{SeriesVisibility, SubscribeMessage, Symbol, Tick, TickMessage};

pub use shared::websocket::ConnectionStatus;
pub use shared::websocket::{FeedSession, WebSocketClient, WebSocketConfig};

pub use shared::buffer::{ChartBuffer, ChartPoint, MERGE_WINDOW_MS};
pub use shared::state::{ChangeDirection, ChartState, PriceCard};
pub use shared::trend::{calc_trend_line, fit_least_squares, LinearFit, TREND_MIN_POINTS};
pub use shared::widget::{render_ui, PlotArea};
pub use shared::zoom::{resolve_zoom, DragSelection, ZoomRange};
