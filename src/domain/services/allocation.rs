//! Proportional profit allocation for the pooled consortium account.
//!
//! Each recorded profit is split among the clients that had joined by that
//! date, weighted by invested capital. Shares are recomputed per date, so a
//! client's weight moves as others join, and a late joiner earns nothing for
//! earlier dates.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::domain::entities::client::{Client, ProfitEntry};

/// One client's cut of a single profit entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Allocation {
    pub client_id: i64,
    /// Fraction of the profit, 0.0 to 1.0
    pub share: f64,
    pub allocated: f64,
}

/// Allocations for every client on one profit date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationPoint {
    pub date: NaiveDate,
    pub total_profit: f64,
    pub allocations: Vec<Allocation>,
    /// Running total per client, after this date
    pub cumulative: Vec<ClientGain>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClientGain {
    pub client_id: i64,
    pub cumulative_gain: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientPerformance {
    pub client_id: i64,
    pub name: String,
    pub invested: f64,
    pub join_date: NaiveDate,
    pub cumulative_gain: f64,
    /// `cumulative_gain / invested * 100`, 0 when nothing is invested
    pub return_pct: f64,
    pub current_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSeries {
    pub points: Vec<AllocationPoint>,
    pub performance: Vec<ClientPerformance>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PoolSummary {
    pub client_count: usize,
    pub total_invested: f64,
    pub total_profit: f64,
    pub pool_value: f64,
}

/// Sum of invested capital over clients active on `date`.
pub fn active_total(date: NaiveDate, clients: &[Client]) -> f64 {
    clients
        .iter()
        .filter(|c| c.is_active_on(date))
        .map(|c| c.invested)
        .sum()
}

/// Split `total_profit` booked on `date` across `clients`.
///
/// Every client appears in the result, in roster order; inactive clients get
/// a zero share. If no capital is active the whole result is zero.
pub fn allocate(date: NaiveDate, total_profit: f64, clients: &[Client]) -> Vec<Allocation> {
    let active = active_total(date, clients);

    clients
        .iter()
        .map(|client| {
            let share = if client.is_active_on(date) && active > 0.0 {
                client.invested / active
            } else {
                0.0
            };
            Allocation {
                client_id: client.id,
                share,
                allocated: total_profit * share,
            }
        })
        .collect()
}

pub fn return_pct(cumulative_gain: f64, invested: f64) -> f64 {
    if invested > 0.0 {
        cumulative_gain / invested * 100.0
    } else {
        0.0
    }
}

/// Walk the profit entries in date order and accumulate each client's gain.
pub fn allocation_series(profits: &[ProfitEntry], clients: &[Client]) -> AllocationSeries {
    let mut ordered: Vec<&ProfitEntry> = profits.iter().collect();
    ordered.sort_by_key(|p| p.profit_date);

    let mut running: HashMap<i64, f64> = clients.iter().map(|c| (c.id, 0.0)).collect();
    let mut points = Vec::with_capacity(ordered.len());

    for entry in ordered {
        let total_profit = entry.total_profit.value();
        let allocations = allocate(entry.profit_date, total_profit, clients);

        for allocation in &allocations {
            *running.entry(allocation.client_id).or_insert(0.0) += allocation.allocated;
        }

        let cumulative = clients
            .iter()
            .map(|c| ClientGain {
                client_id: c.id,
                cumulative_gain: running.get(&c.id).copied().unwrap_or(0.0),
            })
            .collect();

        points.push(AllocationPoint {
            date: entry.profit_date,
            total_profit,
            allocations,
            cumulative,
        });
    }

    let performance = clients
        .iter()
        .map(|c| {
            let gain = running.get(&c.id).copied().unwrap_or(0.0);
            ClientPerformance {
                client_id: c.id,
                name: c.name.clone(),
                invested: c.invested,
                join_date: c.join_date,
                cumulative_gain: gain,
                return_pct: return_pct(gain, c.invested),
                current_value: c.invested + gain,
            }
        })
        .collect();

    AllocationSeries {
        points,
        performance,
    }
}

pub fn pool_summary(clients: &[Client], profits: &[ProfitEntry]) -> PoolSummary {
    let total_invested: f64 = clients.iter().map(|c| c.invested).sum();
    let total_profit: f64 = profits.iter().map(|p| p.total_profit.value()).sum();
    PoolSummary {
        client_count: clients.len(),
        total_invested,
        total_profit,
        pool_value: total_invested + total_profit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::pnl::PnL;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    fn client(id: i64, invested: f64, joined: u32) -> Client {
        Client {
            id,
            name: format!("client-{}", id),
            invested,
            join_date: day(joined),
            note: String::new(),
        }
    }

    fn profit(id: i64, d: u32, amount: f64) -> ProfitEntry {
        ProfitEntry {
            id,
            profit_date: day(d),
            total_profit: PnL::new(amount).unwrap(),
            note: String::new(),
        }
    }

    #[test]
    fn test_two_clients_example() {
        let clients = vec![client(1, 100.0, 1), client(2, 300.0, 1)];
        let result = allocate(day(2), 40.0, &clients);

        assert_eq!(result[0].allocated, 10.0);
        assert_eq!(result[1].allocated, 30.0);
        assert_eq!(result[0].share, 0.25);
    }

    #[test]
    fn test_inactive_client_gets_nothing() {
        let clients = vec![client(1, 100.0, 1), client(2, 300.0, 10)];
        let result = allocate(day(5), 40.0, &clients);
        assert_eq!(result[0].allocated, 40.0);
        assert_eq!(result[1].allocated, 0.0);
        assert_eq!(result[1].share, 0.0);
    }

    #[test]
    fn test_no_active_capital_allocates_zero() {
        let clients = vec![client(1, 0.0, 1), client(2, 50.0, 20)];
        let result = allocate(day(5), 99.0, &clients);
        assert!(result.iter().all(|a| a.allocated == 0.0 && a.share == 0.0));
        assert!(allocate(day(5), 10.0, &[]).is_empty());
    }

    #[test]
    fn test_allocations_sum_to_profit() {
        let clients = vec![
            client(1, 123.45, 1),
            client(2, 0.1, 2),
            client(3, 9876.5, 3),
            client(4, 1.0, 28),
        ];
        for (d, amount) in [(3, 17.77), (4, -250.0), (27, 0.03), (28, 1e6)] {
            let total: f64 = allocate(day(d), amount, &clients)
                .iter()
                .map(|a| a.allocated)
                .sum();
            assert!((total - amount).abs() < 1e-6 * amount.abs().max(1.0));
        }
    }

    #[test]
    fn test_series_reweights_as_clients_join() {
        let clients = vec![client(1, 100.0, 1), client(2, 100.0, 5)];
        let profits = vec![profit(2, 6, 20.0), profit(1, 3, 10.0)];

        let series = allocation_series(&profits, &clients);

        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[0].date, day(3));
        assert_eq!(series.points[0].allocations[0].allocated, 10.0);
        assert_eq!(series.points[0].allocations[1].allocated, 0.0);
        assert_eq!(series.points[1].allocations[0].allocated, 10.0);
        assert_eq!(series.points[1].allocations[1].allocated, 10.0);
        assert_eq!(series.points[1].cumulative[0].cumulative_gain, 20.0);

        let a = &series.performance[0];
        assert_eq!(a.cumulative_gain, 20.0);
        assert_eq!(a.return_pct, 20.0);
        assert_eq!(a.current_value, 120.0);
        assert_eq!(series.performance[1].cumulative_gain, 10.0);
    }

    #[test]
    fn test_late_joiner_has_zero_gain() {
        let clients = vec![client(1, 500.0, 1), client(2, 500.0, 28)];
        let profits = vec![profit(1, 2, 50.0), profit(2, 10, -20.0)];

        let series = allocation_series(&profits, &clients);
        let late = &series.performance[1];
        assert_eq!(late.cumulative_gain, 0.0);
        assert_eq!(late.return_pct, 0.0);
        assert_eq!(series.performance[0].cumulative_gain, 30.0);
    }

    #[test]
    fn test_return_pct_zero_invested() {
        assert_eq!(return_pct(15.0, 0.0), 0.0);
    }

    #[test]
    fn test_pool_summary() {
        let summary = pool_summary(
            &[client(1, 100.0, 1), client(2, 300.0, 1)],
            &[profit(1, 2, 40.0), profit(2, 3, -10.0)],
        );
        assert_eq!(summary.client_count, 2);
        assert_eq!(summary.total_invested, 400.0);
        assert_eq!(summary.total_profit, 30.0);
        assert_eq!(summary.pool_value, 430.0);
    }
}
