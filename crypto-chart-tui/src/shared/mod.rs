/// Shared modules for the Crypto Chart TUI
pub mod buffer;
pub mod config;
pub mod error;
pub mod state;
pub mod trend;
pub mod types;
pub mod websocket;
pub mod widget;
pub mod zoom;
