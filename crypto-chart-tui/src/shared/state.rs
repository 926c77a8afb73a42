//! Chart state driven by the UI loop
//!
//! Owns every piece of mutable state the terminal shows: price cards, the
//! connection status, the chart buffer, series toggles, pause, the drag
//! selection and the active zoom. All transitions run on the UI loop.

use std::ops::Range;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info};

use crate::shared::buffer::{ChartBuffer, ChartPoint};
use crate::shared::config::{DEFAULT_MAX_POINTS, MAX_POINTS_OPTIONS};
use crate::shared::trend::{calc_trend_line, TREND_MIN_POINTS};
use crate::shared::types::{SeriesVisibility, Symbol, Tick};
use crate::shared::websocket::ConnectionStatus;
use crate::shared::zoom::{resolve_zoom, DragSelection, ZoomRange};

/// Sign of a percent change, used for colouring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDirection {
    Up,
    Down,
    Flat,
}

/// Latest price and percent change of one symbol
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceCard {
    pub price: Option<Decimal>,
    pub change_pct: Option<Decimal>,
}

impl PriceCard {
    /// Price rounded half away from zero to 2 decimals, or "--" before the first tick
    pub fn price_label(&self) -> String {
        match self.price {
            Some(price) => format!(
                "{:.2}",
                price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            ),
            None => "--".to_string(),
        }
    }

    /// Percent change as sent by the feed, "+" prefixed when positive
    pub fn change_label(&self) -> String {
        let change = self.change_pct.unwrap_or_default();
        if change > Decimal::ZERO {
            format!("+{}%", change)
        } else {
            format!("{}%", change)
        }
    }

    pub fn direction(&self) -> ChangeDirection {
        match self.change_pct {
            Some(change) if change > Decimal::ZERO => ChangeDirection::Up,
            Some(change) if change < Decimal::ZERO => ChangeDirection::Down,
            _ => ChangeDirection::Flat,
        }
    }
}

/// Everything the chart screen renders
#[derive(Debug, Clone)]
pub struct ChartState {
    pub btc: PriceCard,
    pub eth: PriceCard,
    pub status: ConnectionStatus,
    pub visibility: SeriesVisibility,
    buffer: ChartBuffer,
    selection: DragSelection,
    zoom: Option<ZoomRange>,
    paused: bool,
    hover: Option<usize>,
}

impl Default for ChartState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POINTS)
    }
}

impl ChartState {
    pub fn new(max_points: usize) -> Self {
        Self {
            btc: PriceCard::default(),
            eth: PriceCard::default(),
            status: ConnectionStatus::default(),
            visibility: SeriesVisibility::default(),
            buffer: ChartBuffer::new(max_points),
            selection: DragSelection::default(),
            zoom: None,
            paused: false,
            hover: None,
        }
    }

    pub fn card(&self, symbol: Symbol) -> &PriceCard {
        match symbol {
            Symbol::BtcUsd => &self.btc,
            Symbol::EthUsd => &self.eth,
        }
    }

    fn card_mut(&mut self, symbol: Symbol) -> &mut PriceCard {
        match symbol {
            Symbol::BtcUsd => &mut self.btc,
            Symbol::EthUsd => &mut self.eth,
        }
    }

    /// Apply one tick: update the symbol's card and merge into the buffer.
    /// Ignored entirely while paused.
    pub fn apply_tick(&mut self, tick: &Tick) {
        if self.paused {
            return;
        }

        let card = self.card_mut(tick.symbol);
        card.price = Some(tick.price);
        card.change_pct = Some(tick.change_pct);

        match tick.price.to_f64() {
            Some(price) => self
                .buffer
                .push_tick(tick.symbol, price, tick.time_received),
            None => debug!("Price {} of {} not representable", tick.price, tick.symbol),
        }
    }

    pub fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            info!("Connection status: {}", status.as_str());
        }
        self.status = status;
    }

    pub fn buffer(&self) -> &ChartBuffer {
        &self.buffer
    }

    pub fn point_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn max_points(&self) -> usize {
        self.buffer.max_points()
    }

    /// Change the eviction bound; takes effect on the next tick.
    /// Values outside the selectable options are ignored.
    pub fn set_max_points(&mut self, max_points: usize) {
        if MAX_POINTS_OPTIONS.contains(&max_points) {
            self.buffer.set_max_points(max_points);
        }
    }

    /// Step to the next selectable max-points option, wrapping around
    pub fn cycle_max_points(&mut self) {
        let current = MAX_POINTS_OPTIONS
            .iter()
            .position(|points| *points == self.buffer.max_points())
            .unwrap_or(0);
        let next = MAX_POINTS_OPTIONS[(current + 1) % MAX_POINTS_OPTIONS.len()];
        self.set_max_points(next);
    }

    pub fn toggle_series(&mut self, symbol: Symbol) {
        self.visibility.toggle(symbol);
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        info!("Feed {}", if self.paused { "paused" } else { "resumed" });
    }

    /// Return to the auto-scaled full-buffer view
    pub fn reset_zoom(&mut self) {
        self.zoom = None;
    }

    /// Empty the buffer, dropping zoom, selection and card values with it
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.zoom = None;
        self.selection.clear();
        self.hover = None;
        self.btc = PriceCard::default();
        self.eth = PriceCard::default();
    }

    pub fn zoom(&self) -> Option<ZoomRange> {
        self.zoom
    }

    pub fn selection(&self) -> &DragSelection {
        &self.selection
    }

    /// Pointer pressed over buffer index `index`
    pub fn pointer_down(&mut self, index: usize) {
        if let Some(point) = self.buffer.get(index) {
            self.selection.begin(point.time.clone());
        }
    }

    /// Pointer moved over buffer index `index` while a drag may be active
    pub fn pointer_move(&mut self, index: usize) {
        self.hover = Some(index);
        if !self.selection.is_active() {
            return;
        }
        if let Some(point) = self.buffer.get(index) {
            self.selection.extend(point.time.clone());
        }
    }

    /// Pointer released: resolve the drag into a zoom, or drop it
    pub fn pointer_up(&mut self) {
        if let Some(zoom) = resolve_zoom(&self.selection, &self.buffer, self.visibility) {
            debug!("Zoom to {}..={}", zoom.start, zoom.end);
            self.zoom = Some(zoom);
        }
        self.selection.clear();
    }

    pub fn set_hover(&mut self, index: Option<usize>) {
        self.hover = index;
    }

    /// Hovered point, if it is still inside the display range
    pub fn hovered_point(&self) -> Option<(usize, &ChartPoint)> {
        let index = self.hover?;
        if !self.display_range().contains(&index) {
            return None;
        }
        self.buffer.get(index).map(|point| (index, point))
    }

    /// Buffer indices currently on screen
    pub fn display_range(&self) -> Range<usize> {
        let len = self.buffer.len();
        match self.zoom {
            Some(zoom) => {
                let end = (zoom.end + 1).min(len);
                zoom.start.min(end)..end
            }
            None => 0..len,
        }
    }

    /// Prices of `symbol` across the display range
    pub fn series(&self, symbol: Symbol) -> Vec<Option<f64>> {
        self.buffer.prices(symbol, self.display_range())
    }

    /// Trend overlay of `symbol` across the display range.
    ///
    /// None when the series is hidden, the buffer holds fewer than
    /// [`TREND_MIN_POINTS`] points, or fewer than 2 prices are visible.
    pub fn trend(&self, symbol: Symbol) -> Option<Vec<Option<f64>>> {
        if !self.visibility.is_visible(symbol) || self.buffer.len() < TREND_MIN_POINTS {
            return None;
        }
        calc_trend_line(&self.series(symbol))
    }

    /// Y-axis bounds: the zoom bounds when zoomed, otherwise fitted to the
    /// visible series and their trends.
    pub fn y_bounds(&self) -> (f64, f64) {
        if let Some((bottom, top)) = self.zoom.and_then(|zoom| zoom.value_bounds) {
            return (bottom, top);
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for symbol in self.visibility.visible() {
            let trend = self.trend(symbol).unwrap_or_default();
            for value in self.series(symbol).into_iter().chain(trend).flatten() {
                min = min.min(value);
                max = max.max(value);
            }
        }

        if min > max {
            return (0.0, 1.0);
        }
        if (max - min).abs() < f64::EPSILON {
            return (min - 1.0, max + 1.0);
        }
        let pad = (max - min) * 0.05;
        (min - pad, max + pad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta, Utc};
    use std::str::FromStr;

    fn tick(symbol: Symbol, price: &str, change: &str, offset_ms: i64) -> Tick {
        let base = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap();
        Tick {
            symbol,
            price: Decimal::from_str(price).unwrap(),
            change_pct: Decimal::from_str(change).unwrap(),
            time_exchange: None,
            time_received: base + TimeDelta::milliseconds(offset_ms),
        }
    }

    fn state_with_btc(prices: &[f64]) -> ChartState {
        let mut state = ChartState::new(200);
        for (i, price) in prices.iter().enumerate() {
            state.apply_tick(&tick(Symbol::BtcUsd, &price.to_string(), "0", i as i64 * 1_000));
        }
        state
    }

    #[test]
    fn test_tick_updates_card_and_buffer() {
        let mut state = ChartState::default();
        state.apply_tick(&tick(Symbol::BtcUsd, "97000.5", "1.25", 0));
        state.apply_tick(&tick(Symbol::EthUsd, "3000", "-0.50", 100));

        assert_eq!(state.btc.price_label(), "97000.50");
        assert_eq!(state.btc.change_label(), "+1.25%");
        assert_eq!(state.btc.direction(), ChangeDirection::Up);
        assert_eq!(state.eth.price_label(), "3000.00");
        assert_eq!(state.eth.change_label(), "-0.50%");
        assert_eq!(state.eth.direction(), ChangeDirection::Down);

        assert_eq!(state.point_count(), 1);
        let point = state.buffer().get(0).unwrap();
        assert_eq!(point.btc, Some(97000.5));
        assert_eq!(point.eth, Some(3000.0));
    }

    #[test]
    fn test_price_label_rounds() {
        let card = |price: &str| PriceCard {
            price: Some(Decimal::from_str(price).unwrap()),
            change_pct: None,
        };

        assert_eq!(card("3012.456").price_label(), "3012.46");
        assert_eq!(card("0.999").price_label(), "1.00");
        assert_eq!(card("2.005").price_label(), "2.01");
        assert_eq!(card("97000.123").price_label(), "97000.12");
    }

    #[test]
    fn test_default_cards() {
        let card = PriceCard::default();
        assert_eq!(card.price_label(), "--");
        assert_eq!(card.change_label(), "0%");
        assert_eq!(card.direction(), ChangeDirection::Flat);
    }

    #[test]
    fn test_paused_ignores_ticks() {
        let mut state = ChartState::default();
        state.toggle_pause();
        state.apply_tick(&tick(Symbol::BtcUsd, "97000", "1", 0));

        assert!(state.is_paused());
        assert_eq!(state.point_count(), 0);
        assert_eq!(state.btc.price_label(), "--");

        state.toggle_pause();
        state.apply_tick(&tick(Symbol::BtcUsd, "97000", "1", 0));
        assert_eq!(state.point_count(), 1);
    }

    #[test]
    fn test_clear_resets_everything_but_controls() {
        let mut state = state_with_btc(&[100.0, 105.0, 95.0, 110.0]);
        state.pointer_down(0);
        state.pointer_move(3);
        state.pointer_up();
        state.toggle_series(Symbol::EthUsd);
        assert!(state.zoom().is_some());

        state.clear();
        state.cycle_max_points();
        state.reset_zoom();
        state.toggle_series(Symbol::EthUsd);

        assert_eq!(state.point_count(), 0);
        assert!(state.zoom().is_none());
        assert!(!state.selection().is_active());
        assert_eq!(state.btc.price_label(), "--");
        assert_eq!(state.eth.price_label(), "--");
        assert!(state.trend(Symbol::BtcUsd).is_none());
        assert_eq!(state.display_range(), 0..0);
    }

    #[test]
    fn test_drag_zoom_sets_display_range() {
        let mut state = state_with_btc(&[100.0, 105.0, 95.0, 110.0, 120.0]);
        state.pointer_down(3);
        state.pointer_move(1);
        state.pointer_up();

        let zoom = state.zoom().unwrap();
        assert_eq!((zoom.start, zoom.end), (1, 3));
        assert_eq!(state.display_range(), 1..4);
        assert_eq!(state.series(Symbol::BtcUsd), vec![Some(105.0), Some(95.0), Some(110.0)]);
        assert_eq!(state.y_bounds(), zoom.value_bounds.unwrap());
        assert!(!state.selection().is_active());

        state.reset_zoom();
        assert_eq!(state.display_range(), 0..5);
    }

    #[test]
    fn test_click_without_drag_keeps_display() {
        let mut state = state_with_btc(&[100.0, 105.0, 95.0]);
        state.pointer_down(1);
        state.pointer_up();
        assert!(state.zoom().is_none());

        state.pointer_down(1);
        state.pointer_move(1);
        state.pointer_up();
        assert!(state.zoom().is_none());
        assert_eq!(state.display_range(), 0..3);
    }

    #[test]
    fn test_move_without_press_only_hovers() {
        let mut state = state_with_btc(&[100.0, 105.0, 95.0]);
        state.pointer_move(2);
        state.pointer_up();

        assert!(state.zoom().is_none());
        let (index, point) = state.hovered_point().unwrap();
        assert_eq!(index, 2);
        assert_eq!(point.btc, Some(95.0));
    }

    #[test]
    fn test_toggle_changes_zoom_bounds() {
        let mut state = ChartState::new(200);
        for (i, (btc, eth)) in [(100.0, 20.0), (105.0, 30.0), (95.0, 25.0)].iter().enumerate() {
            let offset = i as i64 * 1_000;
            state.apply_tick(&tick(Symbol::BtcUsd, &btc.to_string(), "0", offset));
            state.apply_tick(&tick(Symbol::EthUsd, &eth.to_string(), "0", offset + 50));
        }

        let zoom_with = |state: &mut ChartState| {
            state.pointer_down(0);
            state.pointer_move(2);
            state.pointer_up();
            state.zoom().unwrap().value_bounds.unwrap()
        };

        let (bottom_both, top_both) = zoom_with(&mut state);
        state.toggle_series(Symbol::EthUsd);
        let (bottom_btc, top_btc) = zoom_with(&mut state);

        assert!((bottom_both - 20.0 * 0.999).abs() < 1e-9);
        assert!((bottom_btc - 95.0 * 0.999).abs() < 1e-9);
        assert_eq!(top_both, top_btc);
        assert!(state.trend(Symbol::EthUsd).is_none());
    }

    #[test]
    fn test_trend_threshold() {
        let nine: Vec<f64> = (0..9).map(|i| 100.0 + i as f64).collect();
        let state = state_with_btc(&nine);
        assert!(state.trend(Symbol::BtcUsd).is_none());

        let ten: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let state = state_with_btc(&ten);
        let trend = state.trend(Symbol::BtcUsd).unwrap();
        assert_eq!(trend.len(), 10);
        assert!((trend[9].unwrap() - 109.0).abs() < 1e-9);

        // No ETH ticks: fewer than 2 values, no overlay
        assert!(state.trend(Symbol::EthUsd).is_none());
    }

    #[test]
    fn test_trend_follows_zoomed_window() {
        let prices: Vec<f64> = (0..12).map(|i| if i < 6 { 100.0 } else { 200.0 + i as f64 }).collect();
        let mut state = state_with_btc(&prices);
        state.pointer_down(6);
        state.pointer_move(11);
        state.pointer_up();

        let trend = state.trend(Symbol::BtcUsd).unwrap();
        assert_eq!(trend.len(), 6);
        // Window 6..=11 is the exact line 206..=211
        assert!((trend[0].unwrap() - 206.0).abs() < 1e-9);
        assert!((trend[5].unwrap() - 211.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_points_controls() {
        let mut state = ChartState::default();
        assert_eq!(state.max_points(), 200);

        state.cycle_max_points();
        assert_eq!(state.max_points(), 500);
        state.cycle_max_points();
        assert_eq!(state.max_points(), 50);

        state.set_max_points(75);
        assert_eq!(state.max_points(), 50);
        state.set_max_points(100);
        assert_eq!(state.max_points(), 100);
    }

    #[test]
    fn test_display_range_clamped_after_eviction() {
        let mut state = ChartState::new(100);
        for i in 0..100 {
            state.apply_tick(&tick(Symbol::BtcUsd, "100", "0", i * 1_000));
        }
        state.pointer_down(90);
        state.pointer_move(99);
        state.pointer_up();
        assert_eq!(state.display_range(), 90..100);

        state.set_max_points(50);
        state.apply_tick(&tick(Symbol::BtcUsd, "100", "0", 100_000));
        assert_eq!(state.point_count(), 50);
        assert!(state.display_range().is_empty());
        assert!(state.series(Symbol::BtcUsd).is_empty());

        state.reset_zoom();
        assert_eq!(state.display_range(), 0..50);
    }

    #[test]
    fn test_auto_y_bounds() {
        let empty = ChartState::default();
        assert_eq!(empty.y_bounds(), (0.0, 1.0));

        let flat = state_with_btc(&[100.0, 100.0]);
        assert_eq!(flat.y_bounds(), (99.0, 101.0));

        let state = state_with_btc(&[100.0, 200.0]);
        let (bottom, top) = state.y_bounds();
        assert!(bottom < 100.0 && top > 200.0);
    }
}
