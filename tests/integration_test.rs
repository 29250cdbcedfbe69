//! Integration tests for the execution-to-simulation pipeline.
//!
//! Tests cover:
//! - Full pipeline with mock data port (matching, statistics)
//! - Known R sequence with compounding risk unit
//! - Period filtering with equity reconstruction at the window start
//! - Simulation from an analyzed history with known parameters

mod common;

use common::*;
use edgelab::domain::equity::PeriodFilter;
use edgelab::domain::error::EdgelabError;
use edgelab::domain::matching::{match_executions, match_with_diagnostics};
use edgelab::domain::simulation::{self, SimulationConfig, SizingMethod};
use edgelab::domain::statistics::compute_statistics;
use edgelab::ports::data_port::DataPort;

mod full_analysis_pipeline {
    use super::*;

    #[test]
    fn executions_to_statistics_with_mock_port() {
        let port = MockDataPort::new().with_executions(vec![
            buy("2024-01-02", "AAPL", 100.0, 10.0),
            sell("2024-01-10", "AAPL", 100.0, 12.0),
            buy("2024-02-01", "MSFT", 10.0, 300.0),
            sell("2024-02-20", "MSFT", 10.0, 290.0),
        ]);

        let executions = port.fetch_executions().unwrap();
        let trades = match_executions(&executions);
        assert_eq!(trades.len(), 2);
        assert!((trades[0].pnl - 200.0).abs() < 1e-9);
        assert!((trades[1].pnl - (-100.0)).abs() < 1e-9);

        let snapshot = compute_statistics(
            &trades,
            &[],
            10_000.0,
            1.0,
            &PeriodFilter::default(),
            None,
        )
        .unwrap();

        assert_eq!(snapshot.trade_count, 2);
        assert_eq!(snapshot.winners, 1);
        assert_eq!(snapshot.losers, 1);
        assert!((snapshot.win_rate - 50.0).abs() < 1e-9);
        assert!((snapshot.final_equity - 10_100.0).abs() < 1e-9);
    }

    #[test]
    fn compounding_r_sequence() {
        // 10000 @ 1%: first trade +200 at oneR 100 gives R +2; second trade
        // -102 at oneR 102 gives R -1 exactly.
        let executions = vec![
            buy("2024-01-02", "AAPL", 100.0, 10.0),
            sell("2024-01-10", "AAPL", 100.0, 12.0),
            buy("2024-01-15", "MSFT", 10.0, 100.0),
            sell("2024-01-20", "MSFT", 10.0, 89.8),
        ];
        let trades = match_executions(&executions);
        let snapshot = compute_statistics(
            &trades,
            &[],
            10_000.0,
            1.0,
            &PeriodFilter::default(),
            None,
        )
        .unwrap();

        assert!((snapshot.r_multiples[0] - 2.0).abs() < 1e-9);
        assert!((snapshot.r_multiples[1] - (-1.0)).abs() < 1e-9);
        assert!((snapshot.mean_r - 0.5).abs() < 1e-9);
    }

    #[test]
    fn money_market_sweeps_do_not_pollute_statistics() {
        let executions = vec![
            buy("2024-01-02", "SPAXX", 10_000.0, 1.0),
            sell("2024-01-03", "SPAXX", 10_000.0, 1.0),
            buy("2024-01-02", "AAPL", 100.0, 10.0),
            sell("2024-01-10", "AAPL", 100.0, 12.0),
        ];
        let trades = match_executions(&executions);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].symbol, "AAPL");
    }

    #[test]
    fn unmatched_sells_surface_as_diagnostics() {
        let executions = vec![
            sell("2024-01-02", "TSLA", 50.0, 200.0),
            buy("2024-01-03", "AAPL", 100.0, 10.0),
            sell("2024-01-10", "AAPL", 100.0, 12.0),
        ];
        let outcome = match_with_diagnostics(&executions);
        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.unmatched.len(), 1);
        assert_eq!(outcome.unmatched[0].symbol, "TSLA");
    }

    #[test]
    fn data_port_errors_propagate() {
        let port = MockDataPort::new().with_error("connection refused");
        let err = port.fetch_executions().unwrap_err();
        assert!(matches!(err, EdgelabError::DataSource { .. }));
    }
}

mod period_filtering {
    use super::*;

    #[test]
    fn window_reconstructs_capital_forward() {
        // January earns 1000; February analysis must start from 11000 so a
        // 110 pnl is exactly +1R at 1% risk.
        let executions = vec![
            buy("2024-01-02", "AAPL", 100.0, 10.0),
            sell("2024-01-10", "AAPL", 100.0, 20.0),
            buy("2024-02-01", "MSFT", 10.0, 100.0),
            sell("2024-02-15", "MSFT", 10.0, 111.0),
        ];
        let trades = match_executions(&executions);
        let filter = PeriodFilter {
            from: Some(date(2024, 2, 1)),
            to: None,
        };
        let snapshot =
            compute_statistics(&trades, &[], 10_000.0, 1.0, &filter, None).unwrap();

        assert_eq!(snapshot.trade_count, 1);
        assert!((snapshot.period_start_capital - 11_000.0).abs() < 1e-9);
        assert!((snapshot.r_multiples[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn window_reconstructs_capital_backward_from_balance() {
        let executions = vec![
            buy("2024-02-01", "MSFT", 10.0, 100.0),
            sell("2024-02-15", "MSFT", 10.0, 110.0),
        ];
        let trades = match_executions(&executions);
        let events = vec![deposit("2024-02-20", 5_000.0)];
        let filter = PeriodFilter {
            from: Some(date(2024, 2, 1)),
            to: None,
        };
        // Balance already reflects the trade and the deposit.
        let snapshot = compute_statistics(
            &trades,
            &events,
            10_000.0,
            1.0,
            &filter,
            Some(17_100.0),
        )
        .unwrap();

        assert!((snapshot.period_start_capital - 12_000.0).abs() < 1e-9);
    }

    #[test]
    fn deposits_shift_window_capital() {
        let executions = vec![
            buy("2024-02-05", "AAPL", 100.0, 10.0),
            sell("2024-02-15", "AAPL", 100.0, 12.0),
        ];
        let trades = match_executions(&executions);
        let events = vec![deposit("2024-01-15", 10_000.0)];
        let filter = PeriodFilter {
            from: Some(date(2024, 2, 1)),
            to: None,
        };
        let snapshot =
            compute_statistics(&trades, &events, 10_000.0, 1.0, &filter, None).unwrap();

        assert!((snapshot.period_start_capital - 20_000.0).abs() < 1e-9);
        // 200 pnl against a 200 risk unit.
        assert!((snapshot.r_multiples[0] - 1.0).abs() < 1e-9);
    }
}

mod simulation_from_history {
    use super::*;

    #[test]
    fn snapshot_feeds_simulation() {
        let executions = vec![
            buy("2024-01-02", "AAPL", 100.0, 10.0),
            sell("2024-01-10", "AAPL", 100.0, 12.0),
            buy("2024-01-15", "MSFT", 10.0, 100.0),
            sell("2024-01-20", "MSFT", 10.0, 89.8),
        ];
        let trades = match_executions(&executions);
        let snapshot = compute_statistics(
            &trades,
            &[],
            10_000.0,
            1.0,
            &PeriodFilter::default(),
            None,
        )
        .unwrap();

        let config = SimulationConfig {
            trial_count: 500,
            trade_count: 100,
            seed: Some(7),
            ..SimulationConfig::from_snapshot(&snapshot, 1.0)
        };
        assert!((config.win_rate - 50.0).abs() < 1e-9);
        assert!((config.avg_win_r - 2.0).abs() < 1e-9);
        assert!((config.avg_loss_r - 1.0).abs() < 1e-9);
        assert!((config.starting_capital - 10_000.0).abs() < 1e-9);

        let result = simulation::simulate(&config).unwrap();
        assert_eq!(result.p50.len(), 101);
        assert_eq!(result.trials_run, 500);
        assert!(result.risk_of_ruin >= 0.0 && result.risk_of_ruin <= 100.0);
    }

    #[test]
    fn perfect_history_never_ruins() {
        let executions = vec![
            buy("2024-01-02", "AAPL", 100.0, 10.0),
            sell("2024-01-10", "AAPL", 100.0, 12.0),
            buy("2024-01-15", "AAPL", 100.0, 10.0),
            sell("2024-01-25", "AAPL", 100.0, 12.0),
        ];
        let trades = match_executions(&executions);
        let snapshot = compute_statistics(
            &trades,
            &[],
            10_000.0,
            1.0,
            &PeriodFilter::default(),
            None,
        )
        .unwrap();
        assert!((snapshot.win_rate - 100.0).abs() < 1e-9);

        let config = SimulationConfig {
            trial_count: 200,
            trade_count: 50,
            seed: Some(11),
            ..SimulationConfig::from_snapshot(&snapshot, 1.0)
        };
        let result = simulation::simulate(&config).unwrap();
        assert!((result.risk_of_ruin - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sizing_methods_diverge_on_same_seed() {
        let base = SimulationConfig {
            trial_count: 300,
            trade_count: 80,
            starting_capital: 10_000.0,
            seed: Some(3),
            ..SimulationConfig::new(55.0, 1.8, 1.0)
        };
        let fractional = simulation::simulate(&base).unwrap();
        let dollar = simulation::simulate(&SimulationConfig {
            sizing: SizingMethod::FixedDollar,
            ..base.clone()
        })
        .unwrap();
        let ratio = simulation::simulate(&SimulationConfig {
            sizing: SizingMethod::FixedRatio { delta: 500.0 },
            ..base.clone()
        })
        .unwrap();

        // Same outcome draws, different sizing, different equity paths.
        assert_ne!(fractional.p50, dollar.p50);
        assert_ne!(fractional.p50, ratio.p50);
    }
}
