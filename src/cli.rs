//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{validate_analysis_config, validate_simulation_config};
use crate::domain::equity::PeriodFilter;
use crate::domain::error::EdgelabError;
use crate::domain::execution::CashEvent;
use crate::domain::matching::{match_with_diagnostics, MatchOutcome};
use crate::domain::simulation::{
    self, SimControl, SimulationConfig, SimulationResult, SizingMethod,
};
use crate::domain::statistics::{compute_statistics, StatisticsSnapshot};
use crate::domain::trade::MatchedTrade;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "edgelab", about = "Trading edge analyzer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze matched trades and print the statistics report
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        executions: PathBuf,
        #[arg(long)]
        cash: Option<PathBuf>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// List matched round-trip trades
    Trades {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        executions: PathBuf,
        #[arg(long)]
        cash: Option<PathBuf>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Run a Monte Carlo simulation from the analyzed history
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        executions: PathBuf,
        #[arg(long)]
        cash: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            config,
            executions,
            cash,
            from,
            to,
        } => run_analyze(&config, executions, cash, from, to),
        Command::Trades {
            config,
            executions,
            cash,
            from,
            to,
        } => run_trades(&config, executions, cash, from, to),
        Command::Simulate {
            config,
            executions,
            cash,
            seed,
        } => run_simulate(&config, executions, cash, seed),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = EdgelabError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Period filter from the `[analysis]` section, overridable from the command
/// line. Config dates are already format-checked by validation.
pub fn build_period_filter(
    adapter: &dyn ConfigPort,
    from_override: Option<NaiveDate>,
    to_override: Option<NaiveDate>,
) -> PeriodFilter {
    let parse = |key: &str| {
        adapter
            .get_string("analysis", key)
            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
    };
    PeriodFilter {
        from: from_override.or_else(|| parse("from_date")),
        to: to_override.or_else(|| parse("to_date")),
    }
}

fn load_and_match(
    executions_path: PathBuf,
    cash_path: Option<PathBuf>,
) -> Result<(MatchOutcome, Vec<CashEvent>), EdgelabError> {
    let data_port = CsvAdapter::new(executions_path, cash_path);
    let executions = data_port.fetch_executions()?;
    let cash_events = data_port.fetch_cash_events()?;

    eprintln!("Loaded {} executions", executions.len());
    let outcome = match_with_diagnostics(&executions);
    if !outcome.unmatched.is_empty() {
        eprintln!(
            "warning: {} sell(s) had no matching buy lot and were skipped",
            outcome.unmatched.len()
        );
    }
    eprintln!("Matched {} round-trip trades", outcome.trades.len());

    Ok((outcome, cash_events))
}

fn compute_snapshot(
    adapter: &dyn ConfigPort,
    trades: &[MatchedTrade],
    cash_events: &[CashEvent],
    filter: &PeriodFilter,
) -> Option<StatisticsSnapshot> {
    let starting_capital = adapter.get_double("account", "starting_capital", 0.0);
    let risk_percent = adapter.get_double("risk", "risk_percent", 1.0);
    let current_balance = adapter
        .get_string("account", "current_balance")
        .map(|_| adapter.get_double("account", "current_balance", 0.0));

    compute_statistics(
        trades,
        cash_events,
        starting_capital,
        risk_percent,
        filter,
        current_balance,
    )
}

fn run_analyze(
    config_path: &PathBuf,
    executions_path: PathBuf,
    cash_path: Option<PathBuf>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_analysis_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 2: Load executions and match trades
    let (outcome, cash_events) = match load_and_match(executions_path, cash_path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Compute statistics over the requested period
    let filter = build_period_filter(&adapter, from, to);
    let snapshot = match compute_snapshot(&adapter, &outcome.trades, &cash_events, &filter) {
        Some(s) => s,
        None => {
            eprintln!("No trades in the selected period");
            return ExitCode::SUCCESS;
        }
    };

    // Stage 4: Print report
    print_report(&snapshot, &filter);
    ExitCode::SUCCESS
}

fn print_report(s: &StatisticsSnapshot, filter: &PeriodFilter) {
    if !filter.is_unbounded() {
        let fmt = |d: Option<NaiveDate>| d.map_or("open".to_string(), |d| d.to_string());
        println!("Period:            {} to {}", fmt(filter.from), fmt(filter.to));
    }
    println!("Trades:            {}", s.trade_count);
    println!(
        "  Winners:         {}  Losers: {}  Breakeven: {}",
        s.winners, s.losers, s.breakeven
    );
    println!("Win Rate:          {:.1}%", s.win_rate);
    println!("Start Capital:     ${:.2}", s.period_start_capital);
    println!("Final Equity:      ${:.2}", s.final_equity);
    println!();
    println!("Expectancy (R):    {:.3}", s.mean_r);
    println!("Std Dev (R):       {:.3}", s.std_r);
    println!("Median (R):        {:.3}", s.median_r);
    println!("SQN:               {:.2}", s.sqn);
    println!("Rating:            {}", s.rating);
    println!("Avg Win (R):       {:.2}", s.avg_win_r);
    println!("Avg Loss (R):      {:.2}", s.avg_loss_r);
    println!("Largest Win (R):   {:.2}", s.largest_win_r);
    println!("Largest Loss (R):  {:.2}", s.largest_loss_r);
    println!("Payoff Ratio:      {}", format_ratio(s.payoff_ratio));
    println!("Profit Factor (R): {}", format_ratio(s.profit_factor_r));
    println!("Skewness:          {:.2}", s.skewness);
    println!("Kurtosis:          {:.2}", s.kurtosis);
    println!("Trades/Month:      {:.1}", s.trades_per_month);
    println!("Expectunity:       {:.2}", s.expectunity);
    println!("Max Drawdown (R):  {:.2}", s.max_drawdown_r);
    println!(
        "Streaks:           {} wins, {} losses",
        s.longest_win_streak, s.longest_loss_streak
    );

    if !s.histogram.is_empty() {
        println!("\nR Distribution:");
        for bin in &s.histogram {
            let tag = if bin.is_win { "win " } else { "loss" };
            println!(
                "  [{:>3} .. {:>3})  {}  {}",
                bin.low,
                bin.low + 1,
                tag,
                "#".repeat(bin.count)
            );
        }
    }

    if !s.by_symbol.is_empty() {
        println!("\nPer-Symbol:");
        for sym in &s.by_symbol {
            let pnl_sign = if sym.total_pnl >= 0.0 { "+" } else { "" };
            println!(
                "  {}:  {} trades, {:.1}% win rate, {:+.2}R, {}${:.0}",
                sym.symbol, sym.trades, sym.win_rate, sym.total_r, pnl_sign, sym.total_pnl
            );
        }
    }

    if !s.by_month.is_empty() {
        println!("\nPer-Month:");
        for m in &s.by_month {
            println!(
                "  {}-{:02}:  {} trades, {:.1}% win rate, {:+.2}R",
                m.year, m.month, m.trades, m.win_rate, m.total_r
            );
        }
    }

    if !s.by_weekday.is_empty() {
        println!("\nPer-Weekday:");
        for w in &s.by_weekday {
            println!(
                "  {}:  {} trades, {:.1}% win rate, {:+.2}R",
                w.weekday, w.trades, w.win_rate, w.total_r
            );
        }
    }
}

fn format_ratio(value: f64) -> String {
    if value.is_infinite() {
        "inf".to_string()
    } else {
        format!("{:.2}", value)
    }
}

fn run_trades(
    config_path: &PathBuf,
    executions_path: PathBuf,
    cash_path: Option<PathBuf>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_analysis_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let (outcome, _) = match load_and_match(executions_path, cash_path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let filter = build_period_filter(&adapter, from, to);

    println!("symbol,buy_date,sell_date,quantity,buy_price,sell_price,pnl,pnl_percent,hold_days,costs");
    for trade in outcome.trades.iter().filter(|t| filter.contains(t.sell_date)) {
        println!(
            "{},{},{},{},{:.4},{:.4},{:.2},{:.2},{},{:.2}",
            trade.symbol,
            trade.buy_date,
            trade.sell_date,
            trade.quantity,
            trade.buy_price,
            trade.sell_price,
            trade.pnl,
            trade.pnl_percent,
            trade.hold_days,
            trade.costs,
        );
    }
    ExitCode::SUCCESS
}

/// Simulation parameters: empirical values from the snapshot, overridable
/// from the `[simulation]` section.
pub fn build_simulation_config(
    adapter: &dyn ConfigPort,
    snapshot: &StatisticsSnapshot,
    seed_override: Option<u64>,
) -> Result<SimulationConfig, EdgelabError> {
    let risk_percent = adapter.get_double("risk", "risk_percent", 1.0);
    let mut config = SimulationConfig::from_snapshot(snapshot, risk_percent);

    config.trial_count = adapter.get_int("simulation", "trials", 1000) as usize;
    if adapter.get_string("simulation", "trades").is_some() {
        config.trade_count = adapter.get_int("simulation", "trades", 100) as usize;
    }
    config.max_risk_percent = adapter.get_double("simulation", "max_risk_percent", 10.0);
    config.ruin_threshold_percent =
        adapter.get_double("simulation", "ruin_threshold_percent", 0.0);

    config.sizing = match adapter
        .get_string("simulation", "sizing_method")
        .unwrap_or_else(|| "fixed_fractional".to_string())
        .as_str()
    {
        "fixed_dollar" => SizingMethod::FixedDollar,
        "fixed_ratio" => SizingMethod::FixedRatio {
            delta: adapter.get_double("simulation", "fixed_ratio_delta", 0.0),
        },
        _ => SizingMethod::FixedFractional,
    };

    config.seed = seed_override.or_else(|| {
        adapter
            .get_string("simulation", "seed")
            .map(|_| adapter.get_int("simulation", "seed", 0) as u64)
    });

    simulation::validate_config(&config)?;
    Ok(config)
}

fn run_simulate(
    config_path: &PathBuf,
    executions_path: PathBuf,
    cash_path: Option<PathBuf>,
    seed: Option<u64>,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_analysis_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_simulation_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 2: Analyze history to extract the empirical edge
    let (outcome, cash_events) = match load_and_match(executions_path, cash_path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let filter = build_period_filter(&adapter, None, None);
    let snapshot = match compute_snapshot(&adapter, &outcome.trades, &cash_events, &filter) {
        Some(s) => s,
        None => {
            eprintln!("error: no trades to derive simulation parameters from");
            return ExitCode::from(5);
        }
    };

    // Stage 3: Build and run the simulation
    let sim_config = match build_simulation_config(&adapter, &snapshot, seed) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Simulating {} trials of {} trades ({:.1}% win rate, avg win {:.2}R, avg loss {:.2}R)",
        sim_config.trial_count,
        sim_config.trade_count,
        sim_config.win_rate,
        sim_config.avg_win_r,
        sim_config.avg_loss_r,
    );

    let result = match simulation::simulate_with_progress(&sim_config, |done, total| {
        eprint!("\r  {}/{} trials", done, total);
        SimControl::Continue
    }) {
        Ok(Some(r)) => {
            eprintln!();
            r
        }
        Ok(None) => {
            eprintln!("\nSimulation aborted");
            return ExitCode::from(5);
        }
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: Print summary
    print_simulation(&sim_config, &result);
    ExitCode::SUCCESS
}

fn print_simulation(config: &SimulationConfig, result: &SimulationResult) {
    let last = result.p50.len() - 1;
    println!("Trials:                 {}", result.trials_run);
    println!("Starting Capital:       ${:.2}", config.starting_capital);
    println!("Median Final Equity:    ${:.2}", result.median_final_equity);
    println!(
        "Final Equity Band:      p10 ${:.2}  p50 ${:.2}  p90 ${:.2}",
        result.p10[last], result.p50[last], result.p90[last]
    );
    println!(
        "Final Equity Range:     ${:.2} to ${:.2}",
        result.min[last], result.max[last]
    );
    println!("Risk of Ruin:           {:.2}%", result.risk_of_ruin);
    println!(
        "Median Max Drawdown:    {:.1}%",
        result.median_max_drawdown_percent
    );
    println!(
        "P(double capital):      {:.1}%",
        result.probability_of_doubling
    );
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_analysis_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_simulation_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!("Configuration is valid");
    ExitCode::SUCCESS
}
