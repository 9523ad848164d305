use serde::Serialize;

use crate::domain::entities::holding::Holding;
use crate::domain::services::statistics::TradingStatistics;
use crate::domain::value_objects::pnl::PnL;

/// Headline numbers for the dashboard: balance, realized and floating PnL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PortfolioOverview {
    pub initial_balance: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub total_pnl: f64,
    pub portfolio_value: f64,
    /// Total PnL as a percentage of the initial balance
    pub change_pct: f64,
    pub open_positions: usize,
    pub closed_positions: usize,
}

/// Totals over the open (floating) positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FloatingSummary {
    /// Sum of quantity × entry price
    pub total_cost: f64,
    /// Sum of quantity × current price
    pub total_current_value: f64,
    pub total_unrealized_pnl: f64,
    pub profitable_positions: usize,
    pub losing_positions: usize,
    pub open_positions: usize,
}

/// An open holding with its derived values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenPosition {
    #[serde(flatten)]
    pub holding: Holding,
    pub cost_basis: f64,
    pub current_value: f64,
    /// Price move since entry, in percent
    pub pnl_percent: f64,
}

impl From<&Holding> for OpenPosition {
    fn from(holding: &Holding) -> Self {
        Self {
            cost_basis: holding.cost_basis(),
            current_value: holding.current_value(),
            pnl_percent: holding.pnl_percent(),
            holding: holding.clone(),
        }
    }
}

fn open_holdings(holdings: &[Holding]) -> impl Iterator<Item = &Holding> {
    holdings.iter().filter(|h| h.is_open())
}

/// Sum of floating PnL over open holdings only.
pub fn total_unrealized_pnl(holdings: &[Holding]) -> PnL {
    open_holdings(holdings).map(|h| h.unrealized_pnl).sum()
}

pub fn floating_summary(holdings: &[Holding]) -> FloatingSummary {
    open_holdings(holdings).fold(
        FloatingSummary {
            total_unrealized_pnl: total_unrealized_pnl(holdings).value(),
            ..Default::default()
        },
        |mut summary, h| {
            summary.total_cost += h.cost_basis();
            summary.total_current_value += h.current_value();
            summary.profitable_positions += usize::from(h.unrealized_pnl.is_profit());
            summary.losing_positions += usize::from(h.unrealized_pnl.is_loss());
            summary.open_positions += 1;
            summary
        },
    )
}

/// Open holdings with cost, value and percent move filled in.
pub fn open_positions(holdings: &[Holding]) -> Vec<OpenPosition> {
    open_holdings(holdings).map(OpenPosition::from).collect()
}

pub fn portfolio_overview(
    stats: &TradingStatistics,
    holdings: &[Holding],
    initial_balance: f64,
) -> PortfolioOverview {
    let unrealized_pnl = total_unrealized_pnl(holdings).value();
    let realized_pnl = stats.net_pnl;
    let total_pnl = realized_pnl + unrealized_pnl;
    let change_pct = if initial_balance > 0.0 {
        total_pnl / initial_balance * 100.0
    } else {
        0.0
    };
    let open_positions = open_holdings(holdings).count();

    PortfolioOverview {
        initial_balance,
        realized_pnl,
        unrealized_pnl,
        total_pnl,
        portfolio_value: initial_balance + total_pnl,
        change_pct,
        open_positions,
        closed_positions: holdings.len() - open_positions,
    }
}
