//! Dynamic R-multiple computation and derived sequence measures.
//!
//! The risk unit (1R) is a constant percentage of *running* equity, so it
//! compounds as the account grows. The per-trade pass is an inherently
//! sequential fold and must not be parallelized.

use super::trade::MatchedTrade;

/// Result of the compounding R pass over a chronological trade sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct RSeries {
    /// Per-trade P&L expressed in risk units.
    pub r_multiples: Vec<f64>,
    /// The 1R dollar amount in effect for each trade.
    pub one_r_values: Vec<f64>,
    /// Equity after applying every trade's P&L.
    pub final_equity: f64,
}

/// Fold trades in order, risking `risk_percent` of running equity per trade.
pub fn compute_r_series(
    trades: &[MatchedTrade],
    start_capital: f64,
    risk_percent: f64,
) -> RSeries {
    let mut equity = start_capital;
    let mut r_multiples = Vec::with_capacity(trades.len());
    let mut one_r_values = Vec::with_capacity(trades.len());

    for trade in trades {
        let one_r = equity * risk_percent / 100.0;
        let r = if one_r > 0.0 { trade.pnl / one_r } else { 0.0 };
        r_multiples.push(r);
        one_r_values.push(one_r);
        equity += trade.pnl;
    }

    RSeries {
        r_multiples,
        one_r_values,
        final_equity: equity,
    }
}

/// Running sum of R-multiples: the equity curve in risk units.
pub fn cumulative_r(r_multiples: &[f64]) -> Vec<f64> {
    let mut sum = 0.0;
    r_multiples
        .iter()
        .map(|r| {
            sum += r;
            sum
        })
        .collect()
}

/// Largest peak-to-trough decline of the cumulative R curve. Zero for a
/// non-decreasing curve.
pub fn max_drawdown_r(cumulative: &[f64]) -> f64 {
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for &value in cumulative {
        if value > peak {
            peak = value;
        }
        let dd = peak - value;
        if dd > max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

/// Longest consecutive runs of winners (R > 0) and non-winners (R <= 0).
pub fn streaks(r_multiples: &[f64]) -> (usize, usize) {
    let mut longest_win = 0usize;
    let mut longest_loss = 0usize;
    let mut current_win = 0usize;
    let mut current_loss = 0usize;

    for &r in r_multiples {
        if r > 0.0 {
            current_win += 1;
            current_loss = 0;
        } else {
            current_loss += 1;
            current_win = 0;
        }
        longest_win = longest_win.max(current_win);
        longest_loss = longest_loss.max(current_loss);
    }

    (longest_win, longest_loss)
}

/// One integer-width histogram bin covering `[low, low + 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RBin {
    pub low: i64,
    pub count: usize,
    pub is_win: bool,
}

/// Integer-width bins from `floor(min R)` to `ceil(max R)`. Bins whose lower
/// bound is non-negative are tagged as win bins.
pub fn histogram(r_multiples: &[f64]) -> Vec<RBin> {
    if r_multiples.is_empty() {
        return Vec::new();
    }

    let min = r_multiples.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = r_multiples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let low = min.floor() as i64;
    let high = (max.ceil() as i64).max(low + 1);

    let mut bins: Vec<RBin> = (low..high)
        .map(|b| RBin {
            low: b,
            count: 0,
            is_win: b >= 0,
        })
        .collect();

    for &r in r_multiples {
        let mut index = (r.floor() as i64 - low) as usize;
        if index >= bins.len() {
            // max R falls exactly on the upper edge.
            index = bins.len() - 1;
        }
        bins[index].count += 1;
    }

    bins
}
