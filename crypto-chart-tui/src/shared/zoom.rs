//! Drag-to-zoom selection
//!
//! A drag records the time labels under the pointer at press and while moving.
//! On release the labels resolve to buffer indices, and the visible series'
//! prices inside that range give the zoomed Y-axis bounds.

use crate::shared::buffer::ChartBuffer;
use crate::shared::types::SeriesVisibility;

pub const ZOOM_LOWER_MARGIN: f64 = 0.999;
pub const ZOOM_UPPER_MARGIN: f64 = 1.001;

/// In-progress drag, expressed in point labels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragSelection {
    start: Option<String>,
    end: Option<String>,
}

impl DragSelection {
    /// Pointer pressed over the label `label`
    pub fn begin(&mut self, label: impl Into<String>) {
        self.start = Some(label.into());
        self.end = None;
    }

    /// Pointer moved over `label`; ignored unless a drag has begun
    pub fn extend(&mut self, label: impl Into<String>) {
        if self.start.is_some() {
            self.end = Some(label.into());
        }
    }

    pub fn is_active(&self) -> bool {
        self.start.is_some()
    }

    /// Both ends, once the pointer has moved after the press
    pub fn labels(&self) -> Option<(&str, &str)> {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => Some((start.as_str(), end.as_str())),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.start = None;
        self.end = None;
    }
}

/// Active zoom: an inclusive index range and optional Y bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomRange {
    pub start: usize,
    pub end: usize,
    /// `(bottom, top)`; None when no visible series had a value in range
    pub value_bounds: Option<(f64, f64)>,
}

/// Resolve a finished drag into a zoom range.
///
/// Returns None (leaving the display untouched) when the drag never moved,
/// started and ended on the same label, or a label no longer exists.
pub fn resolve_zoom(
    selection: &DragSelection,
    buffer: &ChartBuffer,
    visibility: SeriesVisibility,
) -> Option<ZoomRange> {
    let (start_label, end_label) = selection.labels()?;
    if start_label == end_label {
        return None;
    }

    let a = buffer.position_of_label(start_label)?;
    let b = buffer.position_of_label(end_label)?;
    let (start, end) = if a <= b { (a, b) } else { (b, a) };

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for symbol in visibility.visible() {
        for price in buffer.prices(symbol, start..end + 1).into_iter().flatten() {
            min = min.min(price);
            max = max.max(price);
        }
    }

    let value_bounds = (min <= max).then(|| (min * ZOOM_LOWER_MARGIN, max * ZOOM_UPPER_MARGIN));

    Some(ZoomRange {
        start,
        end,
        value_bounds,
    })
}
