//! Core domain types and logic.

pub mod execution;
pub mod trade;
pub mod matching;
pub mod equity;
pub mod rmultiple;
pub mod statistics;
pub mod simulation;
pub mod config_validation;
pub mod error;
