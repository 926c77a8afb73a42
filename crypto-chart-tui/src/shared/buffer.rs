//! Time-bucketed chart buffer
//!
//! Both symbols tick independently; every tick either lands in the latest point
//! (when it arrives within [`MERGE_WINDOW_MS`] of that point) or opens a new one,
//! producing one merged two-series timeline. Oldest points are evicted FIFO.

use std::collections::VecDeque;

use chrono::{DateTime, Local, Utc};

use crate::shared::types::Symbol;

/// Ticks closer than this to the latest point are merged into it
pub const MERGE_WINDOW_MS: i64 = 500;

/// One time bucket holding up to one price per symbol
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    /// Local wall-clock label (HH:MM:SS)
    pub time: String,
    /// Epoch millis of the tick that opened the bucket
    pub timestamp: i64,
    pub btc: Option<f64>,
    pub eth: Option<f64>,
}

impl ChartPoint {
    fn new(at: DateTime<Utc>) -> Self {
        Self {
            time: time_label(at),
            timestamp: at.timestamp_millis(),
            btc: None,
            eth: None,
        }
    }

    pub fn price(&self, symbol: Symbol) -> Option<f64> {
        match symbol {
            Symbol::BtcUsd => self.btc,
            Symbol::EthUsd => self.eth,
        }
    }

    fn set_price(&mut self, symbol: Symbol, price: f64) {
        match symbol {
            Symbol::BtcUsd => self.btc = Some(price),
            Symbol::EthUsd => self.eth = Some(price),
        }
    }
}

/// Format an instant as the chart's X-axis label
pub fn time_label(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Bounded, time-ordered sequence of [`ChartPoint`]s
#[derive(Debug, Clone)]
pub struct ChartBuffer {
    points: VecDeque<ChartPoint>,
    max_points: usize,
}

impl ChartBuffer {
    pub fn new(max_points: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(max_points),
            max_points,
        }
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }

    /// Change the eviction bound. Points already buffered beyond the new
    /// bound stay until the next tick evicts them.
    pub fn set_max_points(&mut self, max_points: usize) {
        self.max_points = max_points;
    }

    /// Merge a price into the latest point, or append a new point.
    ///
    /// The result depends only on the current points, the symbol, the price
    /// and the arrival time `at`.
    pub fn push_tick(&mut self, symbol: Symbol, price: f64, at: DateTime<Utc>) {
        let now = at.timestamp_millis();

        match self.points.back_mut() {
            Some(last) if now - last.timestamp <= MERGE_WINDOW_MS => {
                last.set_price(symbol, price);
            }
            _ => {
                let mut point = ChartPoint::new(at);
                point.set_price(symbol, price);
                self.points.push_back(point);
            }
        }

        if self.points.len() > self.max_points {
            let excess = self.points.len() - self.max_points;
            self.points.drain(..excess);
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ChartPoint> {
        self.points.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter()
    }

    /// Index of the first point carrying `label`
    pub fn position_of_label(&self, label: &str) -> Option<usize> {
        self.points.iter().position(|point| point.time == label)
    }

    /// Prices of one symbol over an index range (clamped to the buffer)
    pub fn prices(&self, symbol: Symbol, range: std::ops::Range<usize>) -> Vec<Option<f64>> {
        let end = range.end.min(self.points.len());
        let start = range.start.min(end);
        self.points
            .range(start..end)
            .map(|point| point.price(symbol))
            .collect()
    }
}
