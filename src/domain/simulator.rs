//! Trade simulation over a set of lifecycle records.
//!
//! Records are replayed in discovery order. For each one the entry filter and
//! sizer decide whether to open a position, then the exit resolver closes it
//! against the same record. All run state lives in a [`Simulation`], so two
//! runs never share capital or positions.

use tracing::debug;

use super::entry_filter;
use super::exit_resolver::resolve_exits;
use super::lifecycle::LifecycleRecord;
use super::portfolio::Portfolio;
use super::position::{OpenPosition, Trade};
use super::sizing;
use super::strategy::StrategyDefinition;

/// Replay `records` under `strategy` and return the trade ledger.
pub fn simulate(
    records: &[LifecycleRecord],
    strategy: &StrategyDefinition,
    initial_capital: f64,
) -> Vec<Trade> {
    let mut sim = Simulation::new(strategy, initial_capital);
    sim.run(records);
    sim.into_trades()
}

/// Sort by discovery time, breaking ties by mint so the order is total.
pub fn sort_records(records: &[LifecycleRecord]) -> Vec<&LifecycleRecord> {
    let mut ordered: Vec<&LifecycleRecord> = records.iter().collect();
    ordered.sort_by(|a, b| {
        a.discovered_at
            .cmp(&b.discovered_at)
            .then_with(|| a.token_mint.cmp(&b.token_mint))
    });
    ordered
}

pub struct Simulation<'a> {
    strategy: &'a StrategyDefinition,
    portfolio: Portfolio,
}

impl<'a> Simulation<'a> {
    pub fn new(strategy: &'a StrategyDefinition, initial_capital: f64) -> Self {
        Simulation {
            strategy,
            portfolio: Portfolio::new(initial_capital),
        }
    }

    pub fn run(&mut self, records: &[LifecycleRecord]) {
        for record in sort_records(records) {
            self.process(record);
        }
        debug!(
            equity = self.equity(),
            open = self.open_position_count(),
            trades = self.portfolio.closed_trades.len(),
            "simulation finished"
        );
    }

    /// Handle one record: maybe enter, then resolve exits for any open
    /// position on the same token.
    pub fn process(&mut self, record: &LifecycleRecord) {
        self.try_enter(record);

        let Some(position) = self.portfolio.get_position_mut(&record.token_mint) else {
            return;
        };
        let fills = resolve_exits(position, record, &self.strategy.exit);
        let trades: Vec<Trade> = fills.iter().map(|fill| position.close(fill)).collect();
        let closed = position.is_closed();

        for trade in trades {
            debug!(
                mint = %trade.token_mint,
                reason = %trade.exit_reason,
                percent = trade.percent_closed,
                price = trade.exit_price,
                pnl = trade.profit_loss,
                "fill"
            );
            self.portfolio.record_trade(trade);
        }

        if closed {
            self.portfolio.remove_position(&record.token_mint);
        }
    }

    fn try_enter(&mut self, record: &LifecycleRecord) {
        if self.portfolio.was_entered(&record.token_mint) {
            debug!(mint = %record.token_mint, "already traded this run, skipping entry");
            return;
        }
        if !record.has_valid_entry_price() {
            debug!(mint = %record.token_mint, price = record.initial_price, "unusable entry price");
            return;
        }
        if !entry_filter::passes(record, &self.strategy.entry) {
            return;
        }

        let capital = self.portfolio.cash;
        let notional = sizing::size(
            &self.strategy.sizing,
            capital,
            self.portfolio.position_count(),
        );
        if !(notional > 0.0 && notional <= capital) {
            debug!(mint = %record.token_mint, notional, capital, "entry rejected by sizer");
            return;
        }

        let id = self.portfolio.next_position_id();
        debug!(mint = %record.token_mint, id, notional, "open position");
        self.portfolio.add_position(OpenPosition::open(id, record, notional));
    }

    pub fn capital(&self) -> f64 {
        self.portfolio.cash
    }

    pub fn open_position_count(&self) -> usize {
        self.portfolio.position_count()
    }

    pub fn open_notional(&self) -> f64 {
        self.portfolio.open_notional()
    }

    pub fn equity(&self) -> f64 {
        self.portfolio.total_equity()
    }

    pub fn trades(&self) -> &[Trade] {
        &self.portfolio.closed_trades
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.portfolio.closed_trades
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lifecycle::Outcome;
    use crate::domain::lifecycle::test_support::record;
    use crate::domain::position::ExitReason;
    use crate::domain::strategy::test_support::single_rung_strategy;
    use crate::domain::strategy::{SizingMethod, TakeProfitLevel};

    #[test]
    fn empty_records_empty_ledger() {
        let strategy = single_rung_strategy();
        assert!(simulate(&[], &strategy, 10_000.0).is_empty());
    }

    #[test]
    fn doubling_record_books_one_win() {
        let strategy = single_rung_strategy();
        let mut sim = Simulation::new(&strategy, 10_000.0);
        sim.run(&[record("AAA", 1_000)]);

        let trades = sim.trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].exit_reason, ExitReason::Win);
        assert!((trades[0].exit_price - 2.0).abs() < 1e-12);
        assert!((trades[0].profit_loss - 1_000.0).abs() < 1e-9);
        assert!((sim.capital() - 11_000.0).abs() < 1e-9);
        assert!((sim.equity() - 11_000.0).abs() < 1e-9);
        assert_eq!(sim.open_position_count(), 0);
    }

    #[test]
    fn rug_record_exits_at_final_price() {
        let mut strategy = single_rung_strategy();
        strategy.exit.exit_on_rug_signal = true;
        let mut r = record("AAA", 1_000);
        r.outcome = Outcome::Rug;
        r.final_price = 0.1;

        let trades = simulate(&[r], &strategy, 10_000.0);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].exit_reason, ExitReason::RugExit);
        assert!((trades[0].exit_price - 0.1).abs() < 1e-12);
        assert!((trades[0].profit_loss - (-900.0)).abs() < 1e-9);
    }

    #[test]
    fn zero_concurrency_never_enters() {
        let mut strategy = single_rung_strategy();
        strategy.sizing.max_concurrent_positions = Some(0);
        let records = vec![record("AAA", 1), record("BBB", 2)];
        assert!(simulate(&records, &strategy, 10_000.0).is_empty());
    }

    #[test]
    fn records_processed_in_discovery_order() {
        let mut strategy = single_rung_strategy();
        strategy.sizing.method = SizingMethod::PercentOfCapital;
        strategy.sizing.percent_of_capital = Some(10.0);

        let mut late = record("ZZZ", 5_000);
        late.peak_price = 1.0;
        late.final_price = 0.5;
        let early = record("AAA", 1_000);

        let trades = simulate(&[late, early], &strategy, 10_000.0);
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].token_mint, "AAA");
        // first entry sized off 10_000, second off 11_000
        assert!((trades[0].notional - 1_000.0).abs() < 1e-9);
        assert!((trades[1].notional - 1_100.0).abs() < 1e-9);
    }

    #[test]
    fn token_is_not_reentered() {
        let strategy = single_rung_strategy();
        let records = vec![record("AAA", 1_000), record("AAA", 2_000)];
        let trades = simulate(&records, &strategy, 10_000.0);
        assert_eq!(trades.len(), 1);
    }

    #[test]
    fn unusable_entry_price_skipped() {
        let strategy = single_rung_strategy();
        let mut r = record("AAA", 1_000);
        r.initial_price = 0.0;
        assert!(simulate(&[r], &strategy, 10_000.0).is_empty());
    }

    #[test]
    fn insufficient_capital_clamps_notional() {
        let strategy = single_rung_strategy();
        let trades = simulate(&[record("AAA", 1_000)], &strategy, 400.0);
        assert_eq!(trades.len(), 1);
        assert!((trades[0].notional - 400.0).abs() < 1e-9);
    }

    #[test]
    fn partial_ladder_produces_multiple_trades_for_one_position() {
        let mut strategy = single_rung_strategy();
        strategy.exit.take_profit_levels = vec![
            TakeProfitLevel {
                percent_gain: 50.0,
                sell_percent: 50.0,
            },
            TakeProfitLevel {
                percent_gain: 400.0,
                sell_percent: 100.0,
            },
        ];
        let trades = simulate(&[record("AAA", 1_000)], &strategy, 10_000.0);
        assert_eq!(trades.len(), 2);
        assert!(trades.iter().all(|t| t.position_id == trades[0].position_id));
        let percent: f64 = trades.iter().map(|t| t.percent_closed).sum();
        assert!((percent - 100.0).abs() < 1e-9);
        // 500 @ +50% and 500 @ +50% (final 1.5)
        let pnl: f64 = trades.iter().map(|t| t.profit_loss).sum();
        assert!((pnl - 500.0).abs() < 1e-9);
    }

    #[test]
    fn filtered_records_produce_no_trades() {
        let mut strategy = single_rung_strategy();
        strategy.entry.min_holders = Some(100);
        let mut r = record("AAA", 1_000);
        r.initial_holders = Some(10);
        assert!(simulate(&[r], &strategy, 10_000.0).is_empty());
    }
}
