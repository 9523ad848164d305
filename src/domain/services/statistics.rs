//! Daily PnL statistics over the spot and futures journals.
//!
//! Every figure here is computed on *daily* sums: all trades booked on the
//! same calendar date collapse into one number before being classified as a
//! winning, losing or breakeven day.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::entities::trade::{FuturesRecord, JournalEntry, SpotTrade};

/// Symbol used for futures rows in per-symbol breakdowns.
pub const FUTURES_SYMBOL: &str = "Futures";

/// Summary metrics for a set of trades
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradingStatistics {
    /// Sum of all positive daily results
    pub total_profit: f64,
    /// Absolute sum of all negative daily results
    pub total_loss: f64,
    /// `total_profit - total_loss`
    pub net_pnl: f64,
    /// Sum of spot volume; futures rows carry none
    pub trading_volume: f64,
    /// Winning days over all days, 0.0 to 100.0
    pub win_rate: f64,
    pub winning_days: usize,
    pub losing_days: usize,
    pub breakeven_days: usize,
    /// Mean of the winning daily sums
    pub avg_profit: f64,
    /// Mean of the losing daily sums, as a positive number
    pub avg_loss: f64,
    /// `avg_profit / avg_loss`, 0 when there is no loss
    pub profit_loss_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyPnl {
    pub date: NaiveDate,
    pub pnl: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortfolioPoint {
    pub date: NaiveDate,
    pub daily_pnl: f64,
    pub cumulative_pnl: f64,
    pub portfolio_value: f64,
}

/// Highest and lowest portfolio value over the history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortfolioRange {
    pub peak_value: f64,
    pub lowest_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyVolume {
    pub date: NaiveDate,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolSummary {
    pub symbol: String,
    pub total_pnl: f64,
    pub avg_pnl: f64,
    pub trades: usize,
}

/// Totals for a single market's chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub total: f64,
    pub average: f64,
    pub win_rate: f64,
}

/// Group `(date, pnl)` points by date and sum them, ascending by date.
pub fn daily_pnl<I>(entries: I) -> Vec<DailyPnl>
where
    I: IntoIterator<Item = (NaiveDate, f64)>,
{
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (date, pnl) in entries {
        *by_date.entry(date).or_insert(0.0) += pnl;
    }
    by_date
        .into_iter()
        .map(|(date, pnl)| DailyPnl { date, pnl })
        .collect()
}

fn points<E: JournalEntry>(rows: &[E]) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
    rows.iter().map(|row| (row.date(), row.pnl().value()))
}

/// Daily sums over the union of both journals.
pub fn combined_daily_pnl(spot: &[SpotTrade], futures: &[FuturesRecord]) -> Vec<DailyPnl> {
    daily_pnl(points(spot).chain(points(futures)))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Aggregate statistics over spot and futures records.
///
/// Never fails; empty input yields an all-zero result.
pub fn calculate_statistics(spot: &[SpotTrade], futures: &[FuturesRecord]) -> TradingStatistics {
    let daily = combined_daily_pnl(spot, futures);
    if daily.is_empty() {
        return TradingStatistics::default();
    }

    let profits: Vec<f64> = daily.iter().map(|d| d.pnl).filter(|p| *p > 0.0).collect();
    let losses: Vec<f64> = daily.iter().map(|d| d.pnl).filter(|p| *p < 0.0).collect();
    let breakeven_days = daily.iter().filter(|d| d.pnl == 0.0).count();

    let total_profit: f64 = profits.iter().sum();
    let total_loss = losses.iter().sum::<f64>().abs();

    let winning_days = profits.len();
    let losing_days = losses.len();
    let win_rate = winning_days as f64 / daily.len() as f64 * 100.0;

    let avg_profit = mean(&profits);
    let avg_loss = mean(&losses).abs();
    let profit_loss_ratio = if avg_loss > 0.0 {
        avg_profit / avg_loss
    } else {
        0.0
    };

    let trading_volume = spot
        .iter()
        .filter_map(|t| t.volume())
        .chain(futures.iter().filter_map(|f| f.volume()))
        .sum();

    TradingStatistics {
        total_profit,
        total_loss,
        net_pnl: total_profit - total_loss,
        trading_volume,
        win_rate,
        winning_days,
        losing_days,
        breakeven_days,
        avg_profit,
        avg_loss,
        profit_loss_ratio,
    }
}

/// Portfolio value after each trading day, starting from `initial_balance`.
pub fn portfolio_history(
    spot: &[SpotTrade],
    futures: &[FuturesRecord],
    initial_balance: f64,
) -> Vec<PortfolioPoint> {
    let mut cumulative = 0.0;
    combined_daily_pnl(spot, futures)
        .into_iter()
        .map(|day| {
            cumulative += day.pnl;
            PortfolioPoint {
                date: day.date,
                daily_pnl: day.pnl,
                cumulative_pnl: cumulative,
                portfolio_value: initial_balance + cumulative,
            }
        })
        .collect()
}

/// Highest daily PnL; the earliest date wins a tie.
pub fn best_day(history: &[PortfolioPoint]) -> Option<PortfolioPoint> {
    history
        .iter()
        .copied()
        .max_by(|a, b| a.daily_pnl.total_cmp(&b.daily_pnl).then(b.date.cmp(&a.date)))
}

/// Lowest daily PnL; the earliest date wins a tie.
pub fn worst_day(history: &[PortfolioPoint]) -> Option<PortfolioPoint> {
    history
        .iter()
        .copied()
        .min_by(|a, b| a.daily_pnl.total_cmp(&b.daily_pnl).then(a.date.cmp(&b.date)))
}

/// Peak and trough of the portfolio value; `None` without history.
pub fn portfolio_range(history: &[PortfolioPoint]) -> Option<PortfolioRange> {
    let first = history.first()?.portfolio_value;
    Some(history.iter().fold(
        PortfolioRange {
            peak_value: first,
            lowest_value: first,
        },
        |range, p| PortfolioRange {
            peak_value: range.peak_value.max(p.portfolio_value),
            lowest_value: range.lowest_value.min(p.portfolio_value),
        },
    ))
}

/// Traded volume per date, ascending. Rows without a volume are skipped, so
/// dates with only futures records do not appear.
pub fn daily_volume(spot: &[SpotTrade], futures: &[FuturesRecord]) -> Vec<DailyVolume> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let rows = spot
        .iter()
        .filter_map(|t| Some((t.date(), t.volume()?)))
        .chain(futures.iter().filter_map(|f| Some((f.date(), f.volume()?))));
    for (date, volume) in rows {
        *by_date.entry(date).or_insert(0.0) += volume;
    }
    by_date
        .into_iter()
        .map(|(date, volume)| DailyVolume { date, volume })
        .collect()
}

/// Per-symbol totals. Futures rows are grouped under [`FUTURES_SYMBOL`].
pub fn symbol_breakdown(spot: &[SpotTrade], futures: &[FuturesRecord]) -> Vec<SymbolSummary> {
    let mut by_symbol: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

    let rows = spot
        .iter()
        .map(|t| (t.symbol().unwrap_or(FUTURES_SYMBOL), t.pnl().value()))
        .chain(
            futures
                .iter()
                .map(|f| (f.symbol().unwrap_or(FUTURES_SYMBOL), f.pnl().value())),
        );

    for (symbol, pnl) in rows {
        let entry = by_symbol.entry(symbol).or_insert((0.0, 0));
        entry.0 += pnl;
        entry.1 += 1;
    }

    by_symbol
        .into_iter()
        .map(|(symbol, (total, trades))| SymbolSummary {
            symbol: symbol.to_string(),
            total_pnl: total,
            avg_pnl: total / trades as f64,
            trades,
        })
        .collect()
}

/// Total, average and share of positive days for one market's daily series.
pub fn series_summary(daily: &[DailyPnl]) -> SeriesSummary {
    if daily.is_empty() {
        return SeriesSummary::default();
    }
    let total: f64 = daily.iter().map(|d| d.pnl).sum();
    let wins = daily.iter().filter(|d| d.pnl > 0.0).count();
    SeriesSummary {
        total,
        average: total / daily.len() as f64,
        win_rate: wins as f64 / daily.len() as f64 * 100.0,
    }
}

/// Daily series for one journal, e.g. the spot-only chart.
pub fn daily_series<E: JournalEntry>(rows: &[E]) -> Vec<DailyPnl> {
    daily_pnl(points(rows))
}

/// One point per row, in date order, without merging same-day rows. The
/// futures chart reports its figures per record.
pub fn entry_series<E: JournalEntry>(rows: &[E]) -> Vec<DailyPnl> {
    let mut series: Vec<DailyPnl> = points(rows)
        .map(|(date, pnl)| DailyPnl { date, pnl })
        .collect();
    series.sort_by_key(|p| p.date);
    series
}
