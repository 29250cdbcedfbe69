//! Configuration validation.
//!
//! Validates all config fields before analysis or simulation runs.

use crate::domain::error::EdgelabError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), EdgelabError> {
    validate_starting_capital(config)?;
    validate_current_balance(config)?;
    validate_risk_percent(config)?;
    validate_period(config)?;
    Ok(())
}

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), EdgelabError> {
    validate_trials(config)?;
    validate_trades(config)?;
    validate_sizing_method(config)?;
    validate_max_risk_percent(config)?;
    validate_ruin_threshold(config)?;
    Ok(())
}

fn validate_starting_capital(config: &dyn ConfigPort) -> Result<(), EdgelabError> {
    let value = config.get_double("account", "starting_capital", 0.0);
    if value <= 0.0 {
        return Err(EdgelabError::ConfigInvalid {
            section: "account".to_string(),
            key: "starting_capital".to_string(),
            reason: "starting_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_current_balance(config: &dyn ConfigPort) -> Result<(), EdgelabError> {
    // Optional field; only range-checked when present.
    if config.get_string("account", "current_balance").is_none() {
        return Ok(());
    }
    let value = config.get_double("account", "current_balance", 0.0);
    if value < 0.0 {
        return Err(EdgelabError::ConfigInvalid {
            section: "account".to_string(),
            key: "current_balance".to_string(),
            reason: "current_balance must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_risk_percent(config: &dyn ConfigPort) -> Result<(), EdgelabError> {
    let value = config.get_double("risk", "risk_percent", 0.0);
    if value <= 0.0 || value > 100.0 {
        return Err(EdgelabError::ConfigInvalid {
            section: "risk".to_string(),
            key: "risk_percent".to_string(),
            reason: "risk_percent must be between 0 and 100".to_string(),
        });
    }
    Ok(())
}

fn validate_period(config: &dyn ConfigPort) -> Result<(), EdgelabError> {
    let from = parse_optional_date(config, "from_date")?;
    let to = parse_optional_date(config, "to_date")?;

    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(EdgelabError::ConfigInvalid {
                section: "analysis".to_string(),
                key: "from_date".to_string(),
                reason: "from_date must not be after to_date".to_string(),
            });
        }
    }
    Ok(())
}

fn parse_optional_date(
    config: &dyn ConfigPort,
    field: &str,
) -> Result<Option<NaiveDate>, EdgelabError> {
    match config.get_string("analysis", field) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| EdgelabError::ConfigInvalid {
                section: "analysis".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }),
    }
}

fn validate_trials(config: &dyn ConfigPort) -> Result<(), EdgelabError> {
    let value = config.get_int("simulation", "trials", 1000);
    if value < 1 {
        return Err(EdgelabError::ConfigInvalid {
            section: "simulation".to_string(),
            key: "trials".to_string(),
            reason: "trials must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_trades(config: &dyn ConfigPort) -> Result<(), EdgelabError> {
    // Optional override; the trade count otherwise comes from the analyzed
    // history.
    if config.get_string("simulation", "trades").is_none() {
        return Ok(());
    }
    let value = config.get_int("simulation", "trades", 0);
    if value < 1 {
        return Err(EdgelabError::ConfigInvalid {
            section: "simulation".to_string(),
            key: "trades".to_string(),
            reason: "trades must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_sizing_method(config: &dyn ConfigPort) -> Result<(), EdgelabError> {
    let method = config
        .get_string("simulation", "sizing_method")
        .unwrap_or_else(|| "fixed_fractional".to_string());

    match method.as_str() {
        "fixed_fractional" | "fixed_dollar" => Ok(()),
        "fixed_ratio" => {
            let delta = config.get_double("simulation", "fixed_ratio_delta", 0.0);
            if delta <= 0.0 {
                return Err(EdgelabError::ConfigInvalid {
                    section: "simulation".to_string(),
                    key: "fixed_ratio_delta".to_string(),
                    reason: "fixed_ratio_delta must be positive".to_string(),
                });
            }
            Ok(())
        }
        _ => Err(EdgelabError::ConfigInvalid {
            section: "simulation".to_string(),
            key: "sizing_method".to_string(),
            reason: "sizing_method must be fixed_fractional, fixed_dollar or fixed_ratio"
                .to_string(),
        }),
    }
}

fn validate_max_risk_percent(config: &dyn ConfigPort) -> Result<(), EdgelabError> {
    let value = config.get_double("simulation", "max_risk_percent", 10.0);
    if value <= 0.0 || value > 100.0 {
        return Err(EdgelabError::ConfigInvalid {
            section: "simulation".to_string(),
            key: "max_risk_percent".to_string(),
            reason: "max_risk_percent must be between 0 and 100".to_string(),
        });
    }
    Ok(())
}

fn validate_ruin_threshold(config: &dyn ConfigPort) -> Result<(), EdgelabError> {
    let value = config.get_double("simulation", "ruin_threshold_percent", 0.0);
    if !(0.0..100.0).contains(&value) {
        return Err(EdgelabError::ConfigInvalid {
            section: "simulation".to_string(),
            key: "ruin_threshold_percent".to_string(),
            reason: "ruin_threshold_percent must be at least 0 and below 100".to_string(),
        });
    }
    Ok(())
}
