//! Matched round-trip trades.

use chrono::NaiveDate;

/// A closed round trip: one sell (or part of one) matched against one buy lot.
/// Immutable once created by the matching engine.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedTrade {
    pub symbol: String,
    pub buy_date: NaiveDate,
    pub sell_date: NaiveDate,
    pub quantity: f64,
    pub buy_price: f64,
    pub sell_price: f64,
    pub pnl: f64,
    pub pnl_percent: f64,
    pub hold_days: i64,
    pub costs: f64,
    pub position_size: f64,
}

impl MatchedTrade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matched_trade_fields() {
        let trade = MatchedTrade {
            symbol: "AAPL".into(),
            buy_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            sell_date: NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
            quantity: 100.0,
            buy_price: 10.0,
            sell_price: 12.0,
            pnl: 198.5,
            pnl_percent: 19.85,
            hold_days: 5,
            costs: 1.5,
            position_size: 1000.0,
        };
        assert_eq!(trade.symbol, "AAPL");
        assert!(trade.is_win());
        assert_eq!(trade.hold_days, 5);
    }

    #[test]
    fn breakeven_trade_is_not_a_win() {
        let trade = MatchedTrade {
            symbol: "AAPL".into(),
            buy_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            sell_date: NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
            quantity: 10.0,
            buy_price: 10.0,
            sell_price: 10.0,
            pnl: 0.0,
            pnl_percent: 0.0,
            hold_days: 1,
            costs: 0.0,
            position_size: 100.0,
        };
        assert!(!trade.is_win());
    }
}
