//! Monte Carlo forward simulation of equity trajectories.
//!
//! Each trial draws `trade_count` win/loss outcomes from the supplied win
//! rate and average win/loss R-multiples, applying one of three
//! position-sizing rules. Trials are independent and run in parallel;
//! per-trial seeds are derived from a master seed so results do not depend
//! on thread scheduling. Ruin (equity reaching zero) is a modeled outcome,
//! not an error: a ruined trial freezes at zero for its remaining steps.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;

use super::error::EdgelabError;
use super::statistics::StatisticsSnapshot;

/// Trials per batch between progress/cancellation checkpoints.
const TRIAL_BATCH_SIZE: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizingMethod {
    /// Risk a constant percentage of current equity (compounds).
    FixedFractional,
    /// Risk a constant dollar amount derived from starting capital.
    FixedDollar,
    /// Risk scales up with accumulated profit at a rate set by `delta`,
    /// never below the base risk.
    FixedRatio { delta: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Winning-trade probability in percent.
    pub win_rate: f64,
    pub avg_win_r: f64,
    pub avg_loss_r: f64,
    pub risk_percent: f64,
    pub trade_count: usize,
    pub trial_count: usize,
    pub starting_capital: f64,
    pub sizing: SizingMethod,
    /// Fixed-ratio risk cap as a percentage of current equity.
    pub max_risk_percent: f64,
    /// Equity at or below this percentage of starting capital counts as
    /// ruin. Zero means ruin only at a fully depleted account.
    pub ruin_threshold_percent: f64,
    /// Master seed for reproducible runs; `None` draws one from entropy.
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub fn new(win_rate: f64, avg_win_r: f64, avg_loss_r: f64) -> Self {
        SimulationConfig {
            win_rate,
            avg_win_r,
            avg_loss_r,
            risk_percent: 1.0,
            trade_count: 100,
            trial_count: 1000,
            starting_capital: 100_000.0,
            sizing: SizingMethod::FixedFractional,
            max_risk_percent: 10.0,
            ruin_threshold_percent: 0.0,
            seed: None,
        }
    }

    /// Derive the empirical parameters from a computed statistics snapshot.
    pub fn from_snapshot(snapshot: &StatisticsSnapshot, risk_percent: f64) -> Self {
        SimulationConfig {
            win_rate: snapshot.win_rate,
            avg_win_r: snapshot.avg_win_r,
            avg_loss_r: snapshot.avg_loss_r,
            risk_percent,
            trade_count: snapshot.trade_count.max(1),
            starting_capital: snapshot.period_start_capital,
            ..SimulationConfig::new(snapshot.win_rate, snapshot.avg_win_r, snapshot.avg_loss_r)
        }
    }

    /// Dollar amount at risk for the next trade under the configured sizing
    /// rule.
    pub fn risk_amount(&self, equity: f64) -> f64 {
        let base = self.starting_capital * self.risk_percent / 100.0;
        match self.sizing {
            SizingMethod::FixedFractional => equity * self.risk_percent / 100.0,
            SizingMethod::FixedDollar => base,
            SizingMethod::FixedRatio { delta } => {
                let scaled = (equity - self.starting_capital) / delta + base;
                scaled.max(base).min(equity * self.max_risk_percent / 100.0)
            }
        }
    }
}

/// Validate before the trial loop; pathological inputs are configuration
/// errors, not runtime failures.
pub fn validate_config(config: &SimulationConfig) -> Result<(), EdgelabError> {
    let fail = |reason: String| Err(EdgelabError::SimulationConfig { reason });

    if !(0.0..=100.0).contains(&config.win_rate) {
        return fail(format!("win_rate must be in [0, 100], got {}", config.win_rate));
    }
    if !config.avg_win_r.is_finite() || config.avg_win_r < 0.0 {
        return fail(format!("avg_win_r must be non-negative, got {}", config.avg_win_r));
    }
    if !config.avg_loss_r.is_finite() || config.avg_loss_r < 0.0 {
        return fail(format!("avg_loss_r must be non-negative, got {}", config.avg_loss_r));
    }
    if !config.risk_percent.is_finite() || config.risk_percent <= 0.0 {
        return fail(format!(
            "risk_percent must be positive, got {}",
            config.risk_percent
        ));
    }
    if config.trade_count == 0 {
        return fail("trade_count must be positive".into());
    }
    if config.trial_count == 0 {
        return fail("trial_count must be positive".into());
    }
    if !config.starting_capital.is_finite() || config.starting_capital <= 0.0 {
        return fail(format!(
            "starting_capital must be positive, got {}",
            config.starting_capital
        ));
    }
    if let SizingMethod::FixedRatio { delta } = config.sizing {
        if !delta.is_finite() || delta <= 0.0 {
            return fail(format!("fixed-ratio delta must be positive, got {delta}"));
        }
    }
    if !config.max_risk_percent.is_finite() || config.max_risk_percent <= 0.0 {
        return fail(format!(
            "max_risk_percent must be positive, got {}",
            config.max_risk_percent
        ));
    }
    if !(0.0..100.0).contains(&config.ruin_threshold_percent) {
        return fail(format!(
            "ruin_threshold_percent must be in [0, 100), got {}",
            config.ruin_threshold_percent
        ));
    }
    Ok(())
}

/// Equity bands indexed by trade number (index 0 is the starting capital)
/// plus scalar summaries across all trials.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub p10: Vec<f64>,
    pub p50: Vec<f64>,
    pub p90: Vec<f64>,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
    pub risk_of_ruin: f64,
    pub median_final_equity: f64,
    pub median_max_drawdown_percent: f64,
    pub probability_of_doubling: f64,
    pub trials_run: usize,
}

/// Caller verdict at each batch boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimControl {
    Continue,
    Abort,
}

struct TrialOutcome {
    path: Vec<f64>,
    ruined: bool,
    max_drawdown_percent: f64,
    final_equity: f64,
    doubled: bool,
}

/// Run the full simulation without a progress hook.
pub fn simulate(config: &SimulationConfig) -> Result<SimulationResult, EdgelabError> {
    let result = simulate_with_progress(config, |_, _| SimControl::Continue)?;
    // The always-continue callback never aborts.
    Ok(result.unwrap_or_else(|| unreachable!("simulation aborted without an abort signal")))
}

/// Run trials in batches, invoking `on_batch(completed, total)` between
/// batches. Returning [`SimControl::Abort`] stops the run and yields
/// `Ok(None)`.
pub fn simulate_with_progress(
    config: &SimulationConfig,
    mut on_batch: impl FnMut(usize, usize) -> SimControl,
) -> Result<Option<SimulationResult>, EdgelabError> {
    validate_config(config)?;

    let master_seed = config.seed.unwrap_or_else(|| rand::thread_rng().next_u64());
    let total = config.trial_count;
    let mut outcomes: Vec<TrialOutcome> = Vec::with_capacity(total);

    let mut next = 0usize;
    while next < total {
        let end = (next + TRIAL_BATCH_SIZE).min(total);
        let batch: Vec<TrialOutcome> = (next..end)
            .into_par_iter()
            .map(|trial| {
                let mut rng = StdRng::seed_from_u64(trial_seed(master_seed, trial as u64));
                run_trial(config, &mut rng)
            })
            .collect();
        outcomes.extend(batch);
        next = end;

        if on_batch(next, total) == SimControl::Abort {
            return Ok(None);
        }
    }

    Ok(Some(aggregate(config, &outcomes)))
}

/// SplitMix64 step: decorrelates sequential trial indices into independent
/// stream seeds.
fn trial_seed(master: u64, trial: u64) -> u64 {
    let mut z = master
        .wrapping_add(trial.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn run_trial(config: &SimulationConfig, rng: &mut StdRng) -> TrialOutcome {
    let start = config.starting_capital;
    let win_probability = config.win_rate / 100.0;
    let ruin_amount = start * config.ruin_threshold_percent / 100.0;

    let mut equity = start;
    let mut path = Vec::with_capacity(config.trade_count + 1);
    path.push(equity);

    let mut ruined = equity <= ruin_amount;
    let mut peak = equity;
    let mut max_drawdown_percent = 0.0_f64;
    let mut doubled = false;

    for _ in 0..config.trade_count {
        if equity <= 0.0 {
            // Frozen: trading stopped at ruin.
            path.push(0.0);
            continue;
        }

        let risk = config.risk_amount(equity);
        if rng.gen_range(0.0..1.0) < win_probability {
            equity += risk * config.avg_win_r;
        } else {
            equity -= risk * config.avg_loss_r;
        }
        if equity <= 0.0 {
            equity = 0.0;
        }
        if equity <= ruin_amount {
            ruined = true;
        }
        if equity >= 2.0 * start {
            doubled = true;
        }

        if equity > peak {
            peak = equity;
        } else if peak > 0.0 {
            let dd = (peak - equity) / peak * 100.0;
            if dd > max_drawdown_percent {
                max_drawdown_percent = dd;
            }
        }

        path.push(equity);
    }

    TrialOutcome {
        path,
        ruined,
        max_drawdown_percent,
        final_equity: equity,
        doubled,
    }
}

fn aggregate(config: &SimulationConfig, outcomes: &[TrialOutcome]) -> SimulationResult {
    let steps = config.trade_count + 1;
    let trials = outcomes.len();

    let mut p10 = Vec::with_capacity(steps);
    let mut p50 = Vec::with_capacity(steps);
    let mut p90 = Vec::with_capacity(steps);
    let mut min = Vec::with_capacity(steps);
    let mut max = Vec::with_capacity(steps);

    let mut column = vec![0.0_f64; trials];
    for step in 0..steps {
        for (i, outcome) in outcomes.iter().enumerate() {
            column[i] = outcome.path[step];
        }
        column.sort_by(|a, b| a.total_cmp(b));
        p10.push(percentile_sorted(&column, 0.10));
        p50.push(percentile_sorted(&column, 0.50));
        p90.push(percentile_sorted(&column, 0.90));
        min.push(column[0]);
        max.push(column[trials - 1]);
    }

    let ruined = outcomes.iter().filter(|o| o.ruined).count();
    let doubled = outcomes.iter().filter(|o| o.doubled).count();

    let mut finals: Vec<f64> = outcomes.iter().map(|o| o.final_equity).collect();
    finals.sort_by(|a, b| a.total_cmp(b));
    let mut drawdowns: Vec<f64> = outcomes.iter().map(|o| o.max_drawdown_percent).collect();
    drawdowns.sort_by(|a, b| a.total_cmp(b));

    SimulationResult {
        p10,
        p50,
        p90,
        min,
        max,
        risk_of_ruin: ruined as f64 / trials as f64 * 100.0,
        median_final_equity: percentile_sorted(&finals, 0.50),
        median_max_drawdown_percent: percentile_sorted(&drawdowns, 0.50),
        probability_of_doubling: doubled as f64 / trials as f64 * 100.0,
        trials_run: trials,
    }
}

/// Linear-interpolation percentile over an ascending-sorted slice.
fn percentile_sorted(sorted: &[f64], fraction: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = fraction * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = rank - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}
