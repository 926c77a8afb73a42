//! Ratatui rendering for the chart screen
//!
//! Header (status + point count), two price cards, the control bar, the chart
//! surface with trend overlays and drag shading, and a footer hint.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::shared::state::{ChangeDirection, ChartState};
use crate::shared::types::Symbol;
use crate::shared::websocket::ConnectionStatus;

const C_BTC: Color = Color::Rgb(249, 115, 22);
const C_ETH: Color = Color::Rgb(59, 130, 246);
const C_BTC_TREND: Color = Color::Rgb(160, 90, 40);
const C_ETH_TREND: Color = Color::Rgb(50, 90, 160);
const C_UP: Color = Color::Rgb(16, 185, 129);
const C_DOWN: Color = Color::Rgb(244, 63, 94);
const C_DIM: Color = Color::Rgb(148, 163, 184);
const C_BRIGHT: Color = Color::Rgb(226, 232, 240);
const C_SELECTION: Color = Color::Rgb(51, 65, 85);

fn series_color(symbol: Symbol) -> Color {
    match symbol {
        Symbol::BtcUsd => C_BTC,
        Symbol::EthUsd => C_ETH,
    }
}

fn trend_color(symbol: Symbol) -> Color {
    match symbol {
        Symbol::BtcUsd => C_BTC_TREND,
        Symbol::EthUsd => C_ETH_TREND,
    }
}

/// Screen region holding the plotted data, used to map the pointer onto points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlotArea {
    pub area: Rect,
    /// Buffer index of the leftmost point
    pub first_index: usize,
    /// Number of points across the area
    pub len: usize,
}

impl PlotArea {
    pub fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.area.left()
            && column < self.area.right()
            && row >= self.area.top()
            && row < self.area.bottom()
    }

    /// Buffer index of the point nearest to `column`, ignoring rows
    pub fn index_at_column(&self, column: u16) -> Option<usize> {
        if self.len == 0 || self.area.width == 0 {
            return None;
        }
        let column = column.clamp(self.area.left(), self.area.right() - 1);
        let offset = (column - self.area.left()) as f64;
        let span = (self.area.width.max(2) - 1) as f64;
        let position = (offset / span * (self.len - 1) as f64).round() as usize;
        Some(self.first_index + position.min(self.len - 1))
    }

    /// Buffer index under the pointer, if it is over the plot
    pub fn index_at(&self, column: u16, row: u16) -> Option<usize> {
        if !self.contains(column, row) {
            return None;
        }
        self.index_at_column(column)
    }

    /// Screen column of buffer index `index`
    pub fn column_of(&self, index: usize) -> Option<u16> {
        if index < self.first_index || index >= self.first_index + self.len {
            return None;
        }
        if self.len == 1 {
            return Some(self.area.left());
        }
        let span = (self.area.width.max(1) - 1) as f64;
        let offset = ((index - self.first_index) as f64 / (self.len - 1) as f64 * span).round();
        Some(self.area.left() + offset as u16)
    }
}

/// Render the full screen and report where the plot landed
pub fn render_ui(f: &mut Frame, state: &ChartState) -> PlotArea {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, chunks[0], state);
    render_price_cards(f, chunks[1], state);
    render_controls(f, chunks[2], state);
    let plot = render_chart(f, chunks[3], state);
    render_selection(f, plot, state);

    let footer = Paragraph::new(Line::from(Span::styled(
        "Click and drag to zoom • Real-time WebSocket data",
        Style::default().fg(C_DIM),
    )))
    .alignment(Alignment::Center);
    f.render_widget(footer, chunks[4]);

    plot
}

fn render_header(f: &mut Frame, area: Rect, state: &ChartState) {
    let status_color = match state.status {
        ConnectionStatus::Connected => C_UP,
        ConnectionStatus::Disconnected => C_DIM,
        ConnectionStatus::Error => C_DOWN,
    };

    let mut spans = vec![
        Span::styled(
            " CRYPTO CHART ",
            Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ● ", Style::default().fg(status_color)),
        Span::styled(state.status.as_str(), Style::default().fg(C_DIM)),
        Span::styled(" • ", Style::default().fg(C_DIM)),
        Span::styled(
            format!("{} points", state.point_count()),
            Style::default().fg(C_DIM),
        ),
    ];
    if state.is_paused() {
        spans.push(Span::styled(
            "  PAUSED",
            Style::default().fg(C_DOWN).add_modifier(Modifier::BOLD),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_price_cards(f: &mut Frame, area: Rect, state: &ChartState) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    for (symbol, card_area) in Symbol::ALL.into_iter().zip(cards.iter()) {
        let card = state.card(symbol);
        let change_color = match card.direction() {
            ChangeDirection::Up => C_UP,
            ChangeDirection::Down => C_DOWN,
            ChangeDirection::Flat => C_DIM,
        };

        let block = Block::default()
            .title(Span::styled(
                format!(" {} ", symbol.as_str()),
                Style::default().fg(series_color(symbol)),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(series_color(symbol)));

        let line = Line::from(vec![
            Span::styled(
                format!("${}", card.price_label()),
                Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(card.change_label(), Style::default().fg(change_color)),
        ]);

        f.render_widget(Paragraph::new(line).block(block), *card_area);
    }
}

fn render_controls(f: &mut Frame, area: Rect, state: &ChartState) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(C_DIM));
    let toggle = |symbol: Symbol| {
        let style = if state.visibility.is_visible(symbol) {
            Style::default().fg(Color::Black).bg(series_color(symbol))
        } else {
            Style::default().fg(C_DIM)
        };
        Span::styled(format!(" {} ", symbol.ticker()), style)
    };

    let line = Line::from(vec![
        key(" [M] "),
        Span::styled(
            format!("{}pt", state.max_points()),
            Style::default().fg(C_BRIGHT),
        ),
        key("  [B]"),
        toggle(Symbol::BtcUsd),
        key(" [E]"),
        toggle(Symbol::EthUsd),
        key("  [P] "),
        Span::styled(
            if state.is_paused() { "Resume" } else { "Pause" },
            Style::default().fg(C_BRIGHT),
        ),
        key("  [R] "),
        Span::styled("Reset", Style::default().fg(C_BRIGHT)),
        key("  [C] "),
        Span::styled("Clear", Style::default().fg(C_BRIGHT)),
        key("  [Q] "),
        Span::styled("Quit", Style::default().fg(C_BRIGHT)),
    ]);

    f.render_widget(Paragraph::new(line), area);
}

/// `(local x, value)` pairs for the chart; gaps are skipped so lines bridge them
fn to_points(values: &[Option<f64>]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, value)| value.map(|v| (i as f64, v)))
        .collect()
}

fn dollars(value: f64, decimals: usize) -> String {
    format!("${:.*}", decimals, value)
}

/// Tooltip for the hovered point: its time, visible prices and trend values
fn hover_line(state: &ChartState) -> Line<'static> {
    let Some((index, point)) = state.hovered_point() else {
        return Line::from("");
    };
    let offset = index - state.display_range().start;

    let mut spans = vec![Span::styled(
        format!(" {} ", point.time),
        Style::default().fg(C_BRIGHT),
    )];
    for symbol in state.visibility.visible() {
        if let Some(price) = point.price(symbol) {
            spans.push(Span::styled(
                format!(" {} {} ", symbol.series_name(), dollars(price, 2)),
                Style::default().fg(series_color(symbol)),
            ));
        }
    }
    for symbol in state.visibility.visible() {
        let value = state
            .trend(symbol)
            .and_then(|trend| trend.get(offset).copied().flatten());
        if let Some(value) = value {
            spans.push(Span::styled(
                format!(" {} Trend {} ", symbol.ticker(), dollars(value, 2)),
                Style::default().fg(trend_color(symbol)),
            ));
        }
    }
    Line::from(spans)
}

fn render_chart(f: &mut Frame, area: Rect, state: &ChartState) -> PlotArea {
    let range = state.display_range();
    let len = range.len();

    let series: Vec<(Symbol, Vec<(f64, f64)>)> = state
        .visibility
        .visible()
        .map(|symbol| (symbol, to_points(&state.series(symbol))))
        .collect();
    let trends: Vec<(Symbol, Vec<(f64, f64)>)> = state
        .visibility
        .visible()
        .filter_map(|symbol| state.trend(symbol).map(|trend| (symbol, to_points(&trend))))
        .collect();

    let mut datasets = Vec::new();
    for (symbol, data) in &series {
        datasets.push(
            Dataset::default()
                .name(symbol.series_name())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(series_color(*symbol)))
                .data(data),
        );
    }
    for (symbol, data) in &trends {
        datasets.push(
            Dataset::default()
                .name(format!("{} Trend", symbol.ticker()))
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(trend_color(*symbol)))
                .data(data),
        );
    }

    let (bottom, top) = state.y_bounds();
    let y_labels: Vec<String> = [bottom, (bottom + top) / 2.0, top]
        .into_iter()
        .map(|v| dollars(v, 0))
        .collect();

    let buffer = state.buffer();
    let x_labels: Vec<String> = if len == 0 {
        Vec::new()
    } else {
        [range.start, range.start + len / 2, range.end - 1]
            .into_iter()
            .filter_map(|i| buffer.get(i).map(|point| point.time.clone()))
            .collect()
    };

    let tooltip = hover_line(state);

    let block = Block::default()
        .title(" PRICE ")
        .title_bottom(tooltip)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_DIM));
    let inner = block.inner(area);

    let plot = plot_area(inner, &y_labels, x_labels.first().map(String::as_str), range.start, len);

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(C_DIM))
                .bounds([0.0, len.saturating_sub(1).max(1) as f64])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(C_DIM))
                .bounds([bottom, top])
                .labels(y_labels),
        );

    f.render_widget(chart, area);
    plot
}

/// Mirror of the chart's own layout: Y labels (or the overhang of the first
/// X label) on the left, one column for the Y axis, two rows for the X axis.
fn plot_area(
    inner: Rect,
    y_labels: &[String],
    first_x_label: Option<&str>,
    first_index: usize,
    len: usize,
) -> PlotArea {
    let y_width = y_labels.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16;
    let x_overhang = first_x_label
        .map(|l| (l.chars().count() as u16).saturating_sub(1))
        .unwrap_or(0);
    let left = y_width.max(x_overhang).min(inner.width / 3) + 1;

    let x_rows = if first_x_label.is_some() { 2 } else { 1 };

    PlotArea {
        area: Rect {
            x: inner.x + left,
            y: inner.y,
            width: inner.width.saturating_sub(left),
            height: inner.height.saturating_sub(x_rows),
        },
        first_index,
        len,
    }
}

/// Shade the columns between the two ends of an in-progress drag
fn render_selection(f: &mut Frame, plot: PlotArea, state: &ChartState) {
    let Some((start, end)) = state.selection().labels() else {
        return;
    };
    let buffer = state.buffer();
    let columns = buffer
        .position_of_label(start)
        .zip(buffer.position_of_label(end))
        .and_then(|(a, b)| plot.column_of(a).zip(plot.column_of(b)));

    if let Some((a, b)) = columns {
        let (left, right) = if a <= b { (a, b) } else { (b, a) };
        let shade = Rect {
            x: left,
            y: plot.area.y,
            width: right - left + 1,
            height: plot.area.height,
        };
        f.buffer_mut()
            .set_style(shade, Style::default().bg(C_SELECTION));
    }
}
