//! Account equity reconstruction at a period boundary.
//!
//! When statistics are restricted to a date window, the capital base for R
//! calculations must be the account's equity at the window start, not the
//! global starting capital. Two modes exist: *forward* rolls the starting
//! capital up through everything before the window, *backward* solves from a
//! known live balance. Mode selection is an explicit branch on whether a
//! balance is available.

use chrono::NaiveDate;

use super::execution::CashEvent;
use super::trade::MatchedTrade;

/// A `[from, to]` window applied to trade sell dates (and cash-event dates).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl PeriodFilter {
    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(from) = self.from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if date > to {
                return false;
            }
        }
        true
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Equity at the window start. Prefers backward reconstruction when a live
/// balance is known, otherwise rolls forward from the starting capital.
pub fn period_start_capital(
    trades: &[MatchedTrade],
    cash_events: &[CashEvent],
    starting_capital: f64,
    current_balance: Option<f64>,
    window_start: Option<NaiveDate>,
) -> f64 {
    match current_balance {
        Some(balance) => backward_capital(trades, cash_events, balance, window_start),
        None => forward_capital(trades, cash_events, starting_capital, window_start),
    }
}

/// Starting capital plus all P&L and cash flows dated strictly before the
/// window start.
pub fn forward_capital(
    trades: &[MatchedTrade],
    cash_events: &[CashEvent],
    starting_capital: f64,
    window_start: Option<NaiveDate>,
) -> f64 {
    let Some(from) = window_start else {
        return starting_capital;
    };

    let pnl_before: f64 = trades
        .iter()
        .filter(|t| t.sell_date < from)
        .map(|t| t.pnl)
        .sum();
    let cash_before: f64 = cash_events
        .iter()
        .filter(|e| e.date < from)
        .map(|e| e.amount)
        .sum();

    starting_capital + pnl_before + cash_before
}

/// Known current balance minus all P&L and cash flows dated on or after the
/// window start. Algebraic complement of [`forward_capital`]: the two agree
/// whenever the balance is consistent with the recorded history.
pub fn backward_capital(
    trades: &[MatchedTrade],
    cash_events: &[CashEvent],
    current_balance: f64,
    window_start: Option<NaiveDate>,
) -> f64 {
    let in_window = |date: NaiveDate| match window_start {
        Some(from) => date >= from,
        None => true,
    };

    let pnl_after: f64 = trades
        .iter()
        .filter(|t| in_window(t.sell_date))
        .map(|t| t.pnl)
        .sum();
    let cash_after: f64 = cash_events
        .iter()
        .filter(|e| in_window(e.date))
        .map(|e| e.amount)
        .sum();

    current_balance - pnl_after - cash_after
}
