//! FIFO lot matching engine.
//!
//! Consumes a normalized execution stream and produces closed round trips.
//! A buy opens a lot in its symbol's FIFO queue; a sell consumes the oldest
//! lots first, emitting one [`MatchedTrade`] per partial consumption. Input
//! is assumed to have passed boundary validation.

use chrono::NaiveDate;
use std::collections::{HashMap, VecDeque};

use super::execution::{Execution, Side};
use super::trade::MatchedTrade;

/// Money-market / cash-sweep instruments. These appear in broker exports as
/// buy/sell pairs but are not tradable positions, so they are dropped before
/// matching.
pub const MONEY_MARKET_SYMBOLS: &[&str] = &["SPAXX", "FDRXX", "FZFXX", "SPRXX", "SWVXX", "VMFXX"];

pub fn is_money_market(symbol: &str) -> bool {
    MONEY_MARKET_SYMBOLS.contains(&symbol)
}

/// An open buy lot awaiting consumption by later sells.
#[derive(Debug, Clone)]
struct Lot {
    date: NaiveDate,
    price: f64,
    remaining: f64,
    original_quantity: f64,
    commission: f64,
    fees: f64,
}

/// A sell (or the residue of one) that found no open lot to close.
/// Typically a broker-export artifact such as an uncovered opening short.
#[derive(Debug, Clone, PartialEq)]
pub struct UnmatchedSell {
    pub date: NaiveDate,
    pub symbol: String,
    pub quantity: f64,
}

/// Full result of a matching pass: the closed trades plus diagnostics for
/// sells that could not be matched.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    pub trades: Vec<MatchedTrade>,
    pub unmatched: Vec<UnmatchedSell>,
}

/// Match executions into round-trip trades, FIFO per symbol.
///
/// Output is deterministic: trades are ordered chronologically by sell date,
/// and within one sell by the FIFO order of the lots it consumed.
pub fn match_executions(executions: &[Execution]) -> Vec<MatchedTrade> {
    match_with_diagnostics(executions).trades
}

/// Like [`match_executions`] but also reports unmatched sells.
pub fn match_with_diagnostics(executions: &[Execution]) -> MatchOutcome {
    let mut ordered: Vec<&Execution> = executions
        .iter()
        .filter(|e| !is_money_market(&e.symbol))
        .collect();
    // Stable sort: ties keep original input order.
    ordered.sort_by_key(|e| e.date);

    let mut open_lots: HashMap<String, VecDeque<Lot>> = HashMap::new();
    let mut outcome = MatchOutcome::default();

    for exec in ordered {
        match exec.side {
            Side::Buy => {
                open_lots.entry(exec.symbol.clone()).or_default().push_back(Lot {
                    date: exec.date,
                    price: exec.price,
                    remaining: exec.quantity,
                    original_quantity: exec.quantity,
                    commission: exec.commission,
                    fees: exec.fees,
                });
            }
            Side::Sell => consume_lots(exec, &mut open_lots, &mut outcome),
        }
    }

    outcome
}

fn consume_lots(
    sell: &Execution,
    open_lots: &mut HashMap<String, VecDeque<Lot>>,
    outcome: &mut MatchOutcome,
) {
    let total_sell_quantity = sell.quantity;
    let mut remaining_to_sell = sell.quantity;

    let queue = open_lots.entry(sell.symbol.clone()).or_default();

    while remaining_to_sell > 0.0 {
        let Some(lot) = queue.front_mut() else {
            break;
        };

        let matched_quantity = remaining_to_sell.min(lot.remaining);

        let sell_costs = sell.costs() * (matched_quantity / total_sell_quantity);
        let buy_costs =
            (lot.commission + lot.fees) * (matched_quantity / lot.original_quantity);
        let costs = sell_costs + buy_costs;

        let pnl = (sell.price - lot.price) * matched_quantity - costs;
        let position_size = lot.price * matched_quantity;
        let pnl_percent = if position_size > 0.0 {
            pnl / position_size * 100.0
        } else {
            0.0
        };
        // Same-day round trips clamp to a one-day hold.
        let hold_days = (sell.date - lot.date).num_days().max(1);

        outcome.trades.push(MatchedTrade {
            symbol: sell.symbol.clone(),
            buy_date: lot.date,
            sell_date: sell.date,
            quantity: matched_quantity,
            buy_price: lot.price,
            sell_price: sell.price,
            pnl,
            pnl_percent,
            hold_days,
            costs,
            position_size,
        });

        remaining_to_sell -= matched_quantity;
        lot.remaining -= matched_quantity;
        if lot.remaining <= 0.0 {
            queue.pop_front();
        }
    }

    if remaining_to_sell > 0.0 {
        outcome.unmatched.push(UnmatchedSell {
            date: sell.date,
            symbol: sell.symbol.clone(),
            quantity: remaining_to_sell,
        });
    }
}
