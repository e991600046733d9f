//! Per-run position book and capital.

use std::collections::{HashMap, HashSet};

use super::position::{OpenPosition, Trade};

/// Capital and open positions owned by exactly one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub positions: HashMap<String, OpenPosition>,
    pub closed_trades: Vec<Trade>,
    entered: HashSet<String>,
    next_position_id: u64,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            positions: HashMap::new(),
            closed_trades: Vec::new(),
            entered: HashSet::new(),
            next_position_id: 1,
        }
    }

    pub fn next_position_id(&mut self) -> u64 {
        let id = self.next_position_id;
        self.next_position_id += 1;
        id
    }

    /// Commit the position's notional and track it by mint.
    pub fn add_position(&mut self, position: OpenPosition) {
        self.cash -= position.notional;
        self.entered.insert(position.token_mint.clone());
        self.positions.insert(position.token_mint.clone(), position);
    }

    pub fn get_position_mut(&mut self, mint: &str) -> Option<&mut OpenPosition> {
        self.positions.get_mut(mint)
    }

    /// True once a token has been entered in this run, open or not.
    pub fn was_entered(&self, mint: &str) -> bool {
        self.entered.contains(mint)
    }

    pub fn remove_position(&mut self, mint: &str) -> Option<OpenPosition> {
        self.positions.remove(mint)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Return the fill's notional plus its P&L to cash and log the trade.
    pub fn record_trade(&mut self, trade: Trade) {
        self.cash += trade.notional + trade.profit_loss;
        self.closed_trades.push(trade);
    }

    /// Notional still committed to open positions.
    pub fn open_notional(&self) -> f64 {
        self.positions
            .values()
            .map(|p| p.notional * p.remaining_percent / 100.0)
            .sum()
    }

    /// Cash plus notional still committed to open positions.
    pub fn total_equity(&self) -> f64 {
        self.cash + self.open_notional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lifecycle::test_support::record;
    use crate::domain::position::{ExitReason, Fill};

    fn sample_position(portfolio: &mut Portfolio, mint: &str, notional: f64) -> OpenPosition {
        let id = portfolio.next_position_id();
        OpenPosition::open(id, &record(mint, 0), notional)
    }

    #[test]
    fn new_portfolio() {
        let portfolio = Portfolio::new(10_000.0);
        assert!((portfolio.cash - 10_000.0).abs() < f64::EPSILON);
        assert!(portfolio.positions.is_empty());
        assert!(portfolio.closed_trades.is_empty());
        assert_eq!(portfolio.position_count(), 0);
    }

    #[test]
    fn position_ids_are_sequential() {
        let mut portfolio = Portfolio::new(10_000.0);
        assert_eq!(portfolio.next_position_id(), 1);
        assert_eq!(portfolio.next_position_id(), 2);
    }

    #[test]
    fn add_position_deducts_cash() {
        let mut portfolio = Portfolio::new(10_000.0);
        let pos = sample_position(&mut portfolio, "AAA", 1_000.0);
        portfolio.add_position(pos);

        assert!((portfolio.cash - 9_000.0).abs() < f64::EPSILON);
        assert_eq!(portfolio.position_count(), 1);
        assert!(portfolio.was_entered("AAA"));
        assert!((portfolio.total_equity() - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn removed_position_is_still_marked_entered() {
        let mut portfolio = Portfolio::new(10_000.0);
        let pos = sample_position(&mut portfolio, "AAA", 1_000.0);
        portfolio.add_position(pos);
        assert!(portfolio.remove_position("AAA").is_some());
        assert_eq!(portfolio.position_count(), 0);
        assert!(portfolio.was_entered("AAA"));
        assert!(portfolio.remove_position("AAA").is_none());
    }

    #[test]
    fn record_trade_credits_notional_and_pnl() {
        let mut portfolio = Portfolio::new(10_000.0);
        let pos = sample_position(&mut portfolio, "AAA", 1_000.0);
        portfolio.add_position(pos);

        let trade = portfolio
            .get_position_mut("AAA")
            .unwrap()
            .close(&Fill {
                percent: 50.0,
                price: 2.0,
                time: 100,
                reason: ExitReason::Win,
            });
        portfolio.record_trade(trade);

        // 9000 + 500 notional + 500 profit
        assert!((portfolio.cash - 10_000.0).abs() < 1e-9);
        assert!((portfolio.open_notional() - 500.0).abs() < 1e-9);
        assert_eq!(portfolio.closed_trades.len(), 1);
    }
}
