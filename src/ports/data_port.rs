//! Data access port trait.
//!
//! The analysis pipeline consumes raw executions and cash events without
//! knowing where they came from.

use crate::domain::error::EdgelabError;
use crate::domain::execution::{CashEvent, Execution};

pub trait DataPort {
    fn fetch_executions(&self) -> Result<Vec<Execution>, EdgelabError>;

    fn fetch_cash_events(&self) -> Result<Vec<CashEvent>, EdgelabError>;
}
