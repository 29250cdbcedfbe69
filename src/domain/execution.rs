//! Canonical execution and cash-event records.
//!
//! These are produced by an external normalizer (broker-format parsing is out
//! of scope); the boundary validation here is the last gate before records
//! reach the matching engine, which assumes clean input.

use chrono::NaiveDate;

use super::error::EdgelabError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

/// A single fill as reported by the broker, normalized to canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub date: NaiveDate,
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
    pub commission: f64,
    pub fees: f64,
}

impl Execution {
    pub fn costs(&self) -> f64 {
        self.commission + self.fees
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashEventKind {
    Dividend,
    Interest,
    Deposit,
    Withdrawal,
    Transfer,
}

/// A non-trade cash flow. Used only for equity reconstruction; never
/// participates in lot matching.
#[derive(Debug, Clone, PartialEq)]
pub struct CashEvent {
    pub date: NaiveDate,
    pub kind: CashEventKind,
    pub amount: f64,
    pub symbol: Option<String>,
}

/// Boundary validation: positive finite quantity and price, non-negative
/// finite costs, non-empty symbol. `line` is a 1-based record number used
/// for error reporting.
pub fn validate_execution(exec: &Execution, line: usize) -> Result<(), EdgelabError> {
    if exec.symbol.trim().is_empty() {
        return Err(EdgelabError::InvalidExecution {
            line,
            reason: "symbol is empty".into(),
        });
    }
    if !exec.quantity.is_finite() || exec.quantity <= 0.0 {
        return Err(EdgelabError::InvalidExecution {
            line,
            reason: format!("quantity must be positive, got {}", exec.quantity),
        });
    }
    if !exec.price.is_finite() || exec.price <= 0.0 {
        return Err(EdgelabError::InvalidExecution {
            line,
            reason: format!("price must be positive, got {}", exec.price),
        });
    }
    if !exec.commission.is_finite() || exec.commission < 0.0 {
        return Err(EdgelabError::InvalidExecution {
            line,
            reason: format!("commission must be non-negative, got {}", exec.commission),
        });
    }
    if !exec.fees.is_finite() || exec.fees < 0.0 {
        return Err(EdgelabError::InvalidExecution {
            line,
            reason: format!("fees must be non-negative, got {}", exec.fees),
        });
    }
    Ok(())
}

pub fn validate_cash_event(event: &CashEvent, line: usize) -> Result<(), EdgelabError> {
    if !event.amount.is_finite() {
        return Err(EdgelabError::InvalidCashEvent {
            line,
            reason: format!("amount must be finite, got {}", event.amount),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_execution() -> Execution {
        Execution {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            symbol: "AAPL".into(),
            side: Side::Buy,
            quantity: 100.0,
            price: 10.0,
            commission: 1.0,
            fees: 0.5,
        }
    }

    #[test]
    fn costs_sums_commission_and_fees() {
        let exec = sample_execution();
        assert!((exec.costs() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn valid_execution_passes() {
        assert!(validate_execution(&sample_execution(), 1).is_ok());
    }

    #[test]
    fn zero_quantity_rejected() {
        let mut exec = sample_execution();
        exec.quantity = 0.0;
        assert!(validate_execution(&exec, 1).is_err());
    }

    #[test]
    fn negative_quantity_rejected() {
        let mut exec = sample_execution();
        exec.quantity = -10.0;
        assert!(validate_execution(&exec, 1).is_err());
    }

    #[test]
    fn non_finite_price_rejected() {
        let mut exec = sample_execution();
        exec.price = f64::NAN;
        assert!(validate_execution(&exec, 1).is_err());
        exec.price = f64::INFINITY;
        assert!(validate_execution(&exec, 1).is_err());
    }

    #[test]
    fn empty_symbol_rejected() {
        let mut exec = sample_execution();
        exec.symbol = "  ".into();
        assert!(validate_execution(&exec, 1).is_err());
    }

    #[test]
    fn negative_commission_rejected() {
        let mut exec = sample_execution();
        exec.commission = -1.0;
        assert!(validate_execution(&exec, 1).is_err());
    }

    #[test]
    fn error_reports_record_line() {
        let mut exec = sample_execution();
        exec.quantity = 0.0;
        let err = validate_execution(&exec, 7).unwrap_err();
        assert!(err.to_string().contains("record 7"));
    }

    #[test]
    fn cash_event_nan_amount_rejected() {
        let event = CashEvent {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            kind: CashEventKind::Deposit,
            amount: f64::NAN,
            symbol: None,
        };
        assert!(validate_cash_event(&event, 1).is_err());
    }

    #[test]
    fn cash_event_negative_amount_allowed() {
        let event = CashEvent {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            kind: CashEventKind::Withdrawal,
            amount: -5000.0,
            symbol: None,
        };
        assert!(validate_cash_event(&event, 1).is_ok());
    }
}
