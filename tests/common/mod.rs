#![allow(dead_code)]

use chrono::NaiveDate;
use edgelab::domain::error::EdgelabError;
pub use edgelab::domain::execution::{CashEvent, CashEventKind, Execution, Side};
pub use edgelab::domain::trade::MatchedTrade;
use edgelab::ports::data_port::DataPort;

pub struct MockDataPort {
    pub executions: Vec<Execution>,
    pub cash_events: Vec<CashEvent>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            executions: Vec::new(),
            cash_events: Vec::new(),
            error: None,
        }
    }

    pub fn with_executions(mut self, executions: Vec<Execution>) -> Self {
        self.executions = executions;
        self
    }

    pub fn with_cash_events(mut self, events: Vec<CashEvent>) -> Self {
        self.cash_events = events;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_executions(&self) -> Result<Vec<Execution>, EdgelabError> {
        if let Some(reason) = &self.error {
            return Err(EdgelabError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self.executions.clone())
    }

    fn fetch_cash_events(&self) -> Result<Vec<CashEvent>, EdgelabError> {
        if let Some(reason) = &self.error {
            return Err(EdgelabError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self.cash_events.clone())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn buy(date_str: &str, symbol: &str, quantity: f64, price: f64) -> Execution {
    make_execution(date_str, symbol, Side::Buy, quantity, price, 0.0, 0.0)
}

pub fn sell(date_str: &str, symbol: &str, quantity: f64, price: f64) -> Execution {
    make_execution(date_str, symbol, Side::Sell, quantity, price, 0.0, 0.0)
}

pub fn make_execution(
    date_str: &str,
    symbol: &str,
    side: Side,
    quantity: f64,
    price: f64,
    commission: f64,
    fees: f64,
) -> Execution {
    Execution {
        date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        symbol: symbol.to_string(),
        side,
        quantity,
        price,
        commission,
        fees,
    }
}

pub fn deposit(date_str: &str, amount: f64) -> CashEvent {
    CashEvent {
        date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        kind: CashEventKind::Deposit,
        amount,
        symbol: None,
    }
}
