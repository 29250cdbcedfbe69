//! Aggregate statistics over the R-multiple sequence.
//!
//! Recomputed on demand from matched trades; never persisted. Degenerate
//! inputs (zero trades, zero variance, zero denominators) resolve to `None`
//! or explicit sentinel values, never NaN.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashMap;

use super::equity::{period_start_capital, PeriodFilter};
use super::execution::CashEvent;
use super::rmultiple::{self, RBin};
use super::trade::MatchedTrade;

/// Average days per calendar month, used for trade-frequency normalization.
const DAYS_PER_MONTH: f64 = 30.44;

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolStats {
    pub symbol: String,
    pub trades: usize,
    pub total_r: f64,
    pub avg_r: f64,
    pub win_rate: f64,
    pub total_pnl: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthStats {
    pub year: i32,
    pub month: u32,
    pub trades: usize,
    pub total_r: f64,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekdayStats {
    pub weekday: Weekday,
    pub trades: usize,
    pub total_r: f64,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsSnapshot {
    pub trade_count: usize,
    pub winners: usize,
    pub losers: usize,
    pub breakeven: usize,
    pub period_start_capital: f64,
    pub final_equity: f64,

    pub r_multiples: Vec<f64>,
    pub mean_r: f64,
    pub std_r: f64,
    pub median_r: f64,
    pub sqn: f64,
    pub win_rate: f64,
    pub avg_win_r: f64,
    pub avg_loss_r: f64,
    pub largest_win_r: f64,
    pub largest_loss_r: f64,
    pub payoff_ratio: f64,
    pub profit_factor_r: f64,
    pub expectancy_ratio: f64,
    pub rating: &'static str,
    pub skewness: f64,
    pub kurtosis: f64,
    pub trades_per_month: f64,
    pub expectunity: f64,

    pub cumulative_r: Vec<f64>,
    pub max_drawdown_r: f64,
    pub longest_win_streak: usize,
    pub longest_loss_streak: usize,
    pub histogram: Vec<RBin>,

    pub by_symbol: Vec<SymbolStats>,
    pub by_month: Vec<MonthStats>,
    pub by_weekday: Vec<WeekdayStats>,
}

/// Van Tharp's quality scale for `mean R / std R`.
pub fn rate_expectancy(ratio: f64) -> &'static str {
    if ratio >= 0.70 {
        "Holy Grail"
    } else if ratio >= 0.50 {
        "Superb"
    } else if ratio >= 0.30 {
        "Excellent"
    } else if ratio >= 0.25 {
        "Good"
    } else if ratio >= 0.20 {
        "Average"
    } else if ratio >= 0.16 {
        "Poor but tradable"
    } else {
        "Not tradable"
    }
}

/// Compute the full snapshot. Returns `None` when no trades survive the
/// period filter. The capital base for R calculations is reconstructed at
/// the window start (backward from `current_balance` when supplied).
pub fn compute_statistics(
    trades: &[MatchedTrade],
    cash_events: &[CashEvent],
    starting_capital: f64,
    risk_percent: f64,
    filter: &PeriodFilter,
    current_balance: Option<f64>,
) -> Option<StatisticsSnapshot> {
    let mut filtered: Vec<&MatchedTrade> = trades
        .iter()
        .filter(|t| filter.contains(t.sell_date))
        .collect();
    filtered.sort_by_key(|t| t.sell_date);

    if filtered.is_empty() {
        return None;
    }

    let capital = period_start_capital(
        trades,
        cash_events,
        starting_capital,
        current_balance,
        filter.from,
    );

    let owned: Vec<MatchedTrade> = filtered.iter().map(|t| (*t).clone()).collect();
    let series = rmultiple::compute_r_series(&owned, capital, risk_percent);
    let r = &series.r_multiples;
    let n = r.len();
    let nf = n as f64;

    let mean_r = r.iter().sum::<f64>() / nf;
    let std_r = (r.iter().map(|x| (x - mean_r).powi(2)).sum::<f64>() / nf).sqrt();
    let median_r = median(r);

    let sqn = if std_r > 0.0 {
        (mean_r / std_r) * (nf.min(100.0)).sqrt()
    } else {
        0.0
    };

    let winners = r.iter().filter(|&&x| x > 0.0).count();
    let losers = r.iter().filter(|&&x| x < 0.0).count();
    let breakeven = n - winners - losers;
    let win_rate = winners as f64 / nf * 100.0;

    let win_sum: f64 = r.iter().filter(|&&x| x > 0.0).sum();
    let loss_sum: f64 = r.iter().filter(|&&x| x <= 0.0).sum();
    let non_winners = n - winners;

    let avg_win_r = if winners > 0 { win_sum / winners as f64 } else { 0.0 };
    let avg_loss_r = if non_winners > 0 {
        (loss_sum / non_winners as f64).abs()
    } else {
        0.0
    };

    let payoff_ratio = if avg_loss_r > 0.0 {
        avg_win_r / avg_loss_r
    } else if avg_win_r > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    let profit_factor_r = if loss_sum.abs() > 0.0 {
        win_sum / loss_sum.abs()
    } else if win_sum > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    let largest_win_r = r.iter().cloned().fold(0.0_f64, f64::max);
    let largest_loss_r = r.iter().cloned().fold(0.0_f64, f64::min).abs();

    let expectancy_ratio = if std_r > 0.0 { mean_r / std_r } else { 0.0 };

    let skewness = sample_skewness(r, mean_r);
    let kurtosis = sample_excess_kurtosis(r, mean_r);

    let first_sell = owned.first().map(|t| t.sell_date).unwrap_or_default();
    let last_sell = owned.last().map(|t| t.sell_date).unwrap_or_default();
    let trading_days = (last_sell - first_sell).num_days() as f64;
    let trades_per_month = nf / (trading_days / DAYS_PER_MONTH).max(1.0);
    let expectunity = mean_r * trades_per_month;

    let cumulative_r = rmultiple::cumulative_r(r);
    let max_drawdown_r = rmultiple::max_drawdown_r(&cumulative_r);
    let (longest_win_streak, longest_loss_streak) = rmultiple::streaks(r);
    let histogram = rmultiple::histogram(r);

    let by_symbol = group_by_symbol(&owned, r);
    let by_month = group_by_month(&owned, r);
    let by_weekday = group_by_weekday(&owned, r);

    Some(StatisticsSnapshot {
        trade_count: n,
        winners,
        losers,
        breakeven,
        period_start_capital: capital,
        final_equity: series.final_equity,
        r_multiples: series.r_multiples,
        mean_r,
        std_r,
        median_r,
        sqn,
        win_rate,
        avg_win_r,
        avg_loss_r,
        largest_win_r,
        largest_loss_r,
        payoff_ratio,
        profit_factor_r,
        expectancy_ratio,
        rating: rate_expectancy(expectancy_ratio),
        skewness,
        kurtosis,
        trades_per_month,
        expectunity,
        cumulative_r,
        max_drawdown_r,
        longest_win_streak,
        longest_loss_streak,
        histogram,
        by_symbol,
        by_month,
        by_weekday,
    })
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Adjusted Fisher-Pearson skewness (sample std-dev based). Zero below the
/// n > 2 threshold or with zero variance.
fn sample_skewness(values: &[f64], mean: f64) -> f64 {
    let n = values.len();
    if n <= 2 {
        return 0.0;
    }
    let nf = n as f64;
    let sample_var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (nf - 1.0);
    let s = sample_var.sqrt();
    if s == 0.0 {
        return 0.0;
    }
    let cubed: f64 = values.iter().map(|x| ((x - mean) / s).powi(3)).sum();
    nf / ((nf - 1.0) * (nf - 2.0)) * cubed
}

/// Sample excess kurtosis. Zero below the n > 3 threshold or with zero
/// variance.
fn sample_excess_kurtosis(values: &[f64], mean: f64) -> f64 {
    let n = values.len();
    if n <= 3 {
        return 0.0;
    }
    let nf = n as f64;
    let sample_var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (nf - 1.0);
    let s = sample_var.sqrt();
    if s == 0.0 {
        return 0.0;
    }
    let fourth: f64 = values.iter().map(|x| ((x - mean) / s).powi(4)).sum();
    nf * (nf + 1.0) / ((nf - 1.0) * (nf - 2.0) * (nf - 3.0)) * fourth
        - 3.0 * (nf - 1.0).powi(2) / ((nf - 2.0) * (nf - 3.0))
}

fn group_by_symbol(trades: &[MatchedTrade], r: &[f64]) -> Vec<SymbolStats> {
    let mut acc: HashMap<&str, (usize, f64, usize, f64)> = HashMap::new();
    for (trade, &r_value) in trades.iter().zip(r) {
        let entry = acc.entry(trade.symbol.as_str()).or_insert((0, 0.0, 0, 0.0));
        entry.0 += 1;
        entry.1 += r_value;
        if r_value > 0.0 {
            entry.2 += 1;
        }
        entry.3 += trade.pnl;
    }

    let mut stats: Vec<SymbolStats> = acc
        .into_iter()
        .map(|(symbol, (count, total_r, wins, total_pnl))| SymbolStats {
            symbol: symbol.to_string(),
            trades: count,
            total_r,
            avg_r: total_r / count as f64,
            win_rate: wins as f64 / count as f64 * 100.0,
            total_pnl,
        })
        .collect();

    // Best symbols first; symbol name breaks ties for determinism.
    stats.sort_by(|a, b| {
        b.total_r
            .total_cmp(&a.total_r)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    stats
}

fn group_by_month(trades: &[MatchedTrade], r: &[f64]) -> Vec<MonthStats> {
    let mut acc: HashMap<(i32, u32), (usize, f64, usize)> = HashMap::new();
    for (trade, &r_value) in trades.iter().zip(r) {
        let key = (trade.sell_date.year(), trade.sell_date.month());
        let entry = acc.entry(key).or_insert((0, 0.0, 0));
        entry.0 += 1;
        entry.1 += r_value;
        if r_value > 0.0 {
            entry.2 += 1;
        }
    }

    let mut stats: Vec<MonthStats> = acc
        .into_iter()
        .map(|((year, month), (count, total_r, wins))| MonthStats {
            year,
            month,
            trades: count,
            total_r,
            win_rate: wins as f64 / count as f64 * 100.0,
        })
        .collect();

    stats.sort_by_key(|m| (m.year, m.month));
    stats
}

fn group_by_weekday(trades: &[MatchedTrade], r: &[f64]) -> Vec<WeekdayStats> {
    let mut acc: HashMap<Weekday, (usize, f64, usize)> = HashMap::new();
    for (trade, &r_value) in trades.iter().zip(r) {
        let entry = acc.entry(trade.sell_date.weekday()).or_insert((0, 0.0, 0));
        entry.0 += 1;
        entry.1 += r_value;
        if r_value > 0.0 {
            entry.2 += 1;
        }
    }

    let mut stats: Vec<WeekdayStats> = acc
        .into_iter()
        .map(|(weekday, (count, total_r, wins))| WeekdayStats {
            weekday,
            trades: count,
            total_r,
            win_rate: wins as f64 / count as f64 * 100.0,
        })
        .collect();

    stats.sort_by_key(|w| w.weekday.num_days_from_monday());
    stats
}
