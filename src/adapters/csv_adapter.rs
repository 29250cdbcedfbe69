//! CSV file data adapter.
//!
//! Reads normalized execution and cash-event files. Executions are expected
//! as `date,symbol,side,quantity,price,commission,fees` with a header row;
//! cash events as `date,type,amount,symbol` where `symbol` may be empty.

use crate::domain::error::EdgelabError;
use crate::domain::execution::{
    validate_cash_event, validate_execution, CashEvent, CashEventKind, Execution, Side,
};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    executions_path: PathBuf,
    cash_events_path: Option<PathBuf>,
}

impl CsvAdapter {
    pub fn new(executions_path: PathBuf, cash_events_path: Option<PathBuf>) -> Self {
        Self {
            executions_path,
            cash_events_path,
        }
    }
}

fn read_file(path: &PathBuf) -> Result<String, EdgelabError> {
    fs::read_to_string(path).map_err(|e| EdgelabError::DataSource {
        reason: format!("failed to read {}: {}", path.display(), e),
    })
}

fn get_field<'a>(
    record: &'a csv::StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<&'a str, EdgelabError> {
    record.get(index).ok_or_else(|| EdgelabError::DataSource {
        reason: format!("record {}: missing {} column", line, name),
    })
}

fn parse_date(value: &str, line: usize) -> Result<NaiveDate, EdgelabError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| EdgelabError::DataSource {
        reason: format!("record {}: invalid date '{}', expected YYYY-MM-DD", line, value),
    })
}

fn parse_number(value: &str, name: &str, line: usize) -> Result<f64, EdgelabError> {
    value.trim().parse().map_err(|_| EdgelabError::DataSource {
        reason: format!("record {}: invalid {} value '{}'", line, name, value),
    })
}

/// Empty cost columns are treated as zero; brokers often omit them.
fn parse_optional_number(value: &str, name: &str, line: usize) -> Result<f64, EdgelabError> {
    if value.trim().is_empty() {
        Ok(0.0)
    } else {
        parse_number(value, name, line)
    }
}

fn parse_side(value: &str, line: usize) -> Result<Side, EdgelabError> {
    match value.trim().to_lowercase().as_str() {
        "buy" | "b" => Ok(Side::Buy),
        "sell" | "s" => Ok(Side::Sell),
        other => Err(EdgelabError::DataSource {
            reason: format!("record {}: unknown side '{}'", line, other),
        }),
    }
}

fn parse_kind(value: &str, line: usize) -> Result<CashEventKind, EdgelabError> {
    match value.trim().to_lowercase().as_str() {
        "dividend" => Ok(CashEventKind::Dividend),
        "interest" => Ok(CashEventKind::Interest),
        "deposit" => Ok(CashEventKind::Deposit),
        "withdrawal" => Ok(CashEventKind::Withdrawal),
        "transfer" => Ok(CashEventKind::Transfer),
        other => Err(EdgelabError::DataSource {
            reason: format!("record {}: unknown cash event type '{}'", line, other),
        }),
    }
}

impl DataPort for CsvAdapter {
    fn fetch_executions(&self) -> Result<Vec<Execution>, EdgelabError> {
        let content = read_file(&self.executions_path)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut executions = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            let line = i + 1;
            let record = result.map_err(|e| EdgelabError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let execution = Execution {
                date: parse_date(get_field(&record, 0, "date", line)?, line)?,
                symbol: get_field(&record, 1, "symbol", line)?.trim().to_string(),
                side: parse_side(get_field(&record, 2, "side", line)?, line)?,
                quantity: parse_number(get_field(&record, 3, "quantity", line)?, "quantity", line)?,
                price: parse_number(get_field(&record, 4, "price", line)?, "price", line)?,
                commission: parse_optional_number(
                    record.get(5).unwrap_or(""),
                    "commission",
                    line,
                )?,
                fees: parse_optional_number(record.get(6).unwrap_or(""), "fees", line)?,
            };

            validate_execution(&execution, line)?;
            executions.push(execution);
        }

        Ok(executions)
    }

    fn fetch_cash_events(&self) -> Result<Vec<CashEvent>, EdgelabError> {
        let Some(path) = &self.cash_events_path else {
            return Ok(Vec::new());
        };

        let content = read_file(path)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut events = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            let line = i + 1;
            let record = result.map_err(|e| EdgelabError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let symbol = record
                .get(3)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            let event = CashEvent {
                date: parse_date(get_field(&record, 0, "date", line)?, line)?,
                kind: parse_kind(get_field(&record, 1, "type", line)?, line)?,
                amount: parse_number(get_field(&record, 2, "amount", line)?, "amount", line)?,
                symbol,
            };

            validate_cash_event(&event, line)?;
            events.push(event);
        }

        Ok(events)
    }
}
