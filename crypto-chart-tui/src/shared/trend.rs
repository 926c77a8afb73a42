//! Ordinary least-squares trend overlay
//!
//! Fits price against point index over the visible window. The fitted line is
//! only evaluated where the source series has a value, so the overlay never
//! extends past real data coverage.

/// Minimum buffered points before any trend overlay is shown
pub const TREND_MIN_POINTS: usize = 10;

/// Fitted line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    #[inline]
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Least-squares fit over the present values of `prices`, indexed by position.
/// Returns None with fewer than 2 present values.
pub fn fit_least_squares(prices: &[Option<f64>]) -> Option<LinearFit> {
    let points: Vec<(f64, f64)> = prices
        .iter()
        .enumerate()
        .filter_map(|(i, price)| price.map(|y| (i as f64, y)))
        .collect();

    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|(x, _)| x).sum();
    let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
    let sum_xy: f64 = points.iter().map(|(x, y)| x * y).sum();
    let sum_x2: f64 = points.iter().map(|(x, _)| x * x).sum();

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;

    Some(LinearFit { slope, intercept })
}

/// Trend values aligned with `prices`: the fitted line where a price exists,
/// None where it does not.
pub fn calc_trend_line(prices: &[Option<f64>]) -> Option<Vec<Option<f64>>> {
    let fit = fit_least_squares(prices)?;

    Some(
        prices
            .iter()
            .enumerate()
            .map(|(i, price)| price.map(|_| fit.at(i as f64)))
            .collect(),
    )
}
