//! Journal workflows: load the files, compute, write them back.
//!
//! Every mutation reloads the affected collection from disk, changes it in
//! memory and overwrites the file. Mutations inside one process are serialized
//! by `write_lock`, held from the load until the last save. Reads take no lock;
//! saves replace files by rename so a reader never sees a partial write.

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use super::ServiceError;
use crate::domain::entities::balance::Balance;
use crate::domain::entities::holding::{next_holding_id, ClosedPosition, Holding, NewHolding};
use crate::domain::entities::trade::{FuturesRecord, NewFuturesRecord, NewSpotTrade, SpotTrade};
use crate::domain::errors::JournalError;
use crate::domain::services::calendar::{calendar_month, CalendarMonth};
use crate::domain::services::portfolio::{
    floating_summary, open_positions, portfolio_overview, FloatingSummary, OpenPosition,
    PortfolioOverview,
};
use crate::domain::services::statistics::{
    best_day, calculate_statistics, combined_daily_pnl, daily_series, daily_volume, entry_series,
    portfolio_history, portfolio_range, series_summary, symbol_breakdown, worst_day, DailyVolume,
    PortfolioPoint, PortfolioRange, SeriesSummary, SymbolSummary, TradingStatistics,
};
use crate::domain::value_objects::price::Price;
use crate::persistence::json_store::JsonStore;

/// Everything persisted for one journal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JournalSnapshot {
    pub spot: Vec<SpotTrade>,
    pub futures: Vec<FuturesRecord>,
    pub holdings: Vec<Holding>,
    pub balance: Balance,
}

/// Which trades feed a calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    #[default]
    All,
    Spot,
    Futures,
}

/// Aggregated view served to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub overview: PortfolioOverview,
    pub statistics: TradingStatistics,
    pub history: Vec<PortfolioPoint>,
    /// Peak and lowest portfolio value, absent without history
    pub portfolio_range: Option<PortfolioRange>,
    pub best_day: Option<PortfolioPoint>,
    pub worst_day: Option<PortfolioPoint>,
    pub symbols: Vec<SymbolSummary>,
    /// Figures over daily sums
    pub spot_summary: SeriesSummary,
    /// Figures over individual records
    pub futures_summary: SeriesSummary,
    pub daily_volume: Vec<DailyVolume>,
    pub floating: FloatingSummary,
    pub open_holdings: Vec<OpenPosition>,
}

impl Dashboard {
    pub fn from_snapshot(snapshot: &JournalSnapshot) -> Self {
        let initial_balance = snapshot.balance.initial_balance;
        let statistics = calculate_statistics(&snapshot.spot, &snapshot.futures);
        let history = portfolio_history(&snapshot.spot, &snapshot.futures, initial_balance);

        Dashboard {
            overview: portfolio_overview(&statistics, &snapshot.holdings, initial_balance),
            portfolio_range: portfolio_range(&history),
            best_day: best_day(&history),
            worst_day: worst_day(&history),
            symbols: symbol_breakdown(&snapshot.spot, &snapshot.futures),
            spot_summary: series_summary(&daily_series(&snapshot.spot)),
            futures_summary: series_summary(&entry_series(&snapshot.futures)),
            daily_volume: daily_volume(&snapshot.spot, &snapshot.futures),
            floating: floating_summary(&snapshot.holdings),
            open_holdings: open_positions(&snapshot.holdings),
            statistics,
            history,
        }
    }
}

pub struct JournalService {
    store: JsonStore,
    write_lock: Mutex<()>,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl JournalService {
    pub fn new(store: JsonStore) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn load_snapshot(&self) -> Result<JournalSnapshot, ServiceError> {
        Ok(JournalSnapshot {
            spot: self.store.load_spot().await?,
            futures: self.store.load_futures().await?,
            holdings: self.store.load_holdings().await?,
            balance: self.store.load_balance().await?,
        })
    }

    pub async fn spot_trades(&self) -> Result<Vec<SpotTrade>, ServiceError> {
        Ok(self.store.load_spot().await?)
    }

    pub async fn futures_records(&self) -> Result<Vec<FuturesRecord>, ServiceError> {
        Ok(self.store.load_futures().await?)
    }

    pub async fn holdings(&self) -> Result<Vec<Holding>, ServiceError> {
        Ok(self.store.load_holdings().await?)
    }

    pub async fn balance(&self) -> Result<Balance, ServiceError> {
        Ok(self.store.load_balance().await?)
    }

    pub async fn add_spot_trade(&self, input: NewSpotTrade) -> Result<SpotTrade, ServiceError> {
        let trade = SpotTrade::from_input(input, now())?;

        let _guard = self.write_lock.lock().await;
        let mut trades = self.store.load_spot().await?;
        trades.push(trade.clone());
        self.store.save_spot(&trades).await?;

        info!("Logged {} spot trade on {}: {}", trade.symbol, trade.date, trade.pnl);
        Ok(trade)
    }

    /// Replace the trade at `index`, keeping its original timestamp.
    pub async fn replace_spot_trade(
        &self,
        index: usize,
        input: NewSpotTrade,
    ) -> Result<SpotTrade, ServiceError> {
        let _guard = self.write_lock.lock().await;
        let mut trades = self.store.load_spot().await?;
        let slot = trades
            .get_mut(index)
            .ok_or(JournalError::TradeNotFound(index))?;

        let trade = SpotTrade::from_input(input, slot.timestamp)?;
        *slot = trade.clone();
        self.store.save_spot(&trades).await?;

        info!("Replaced spot trade #{}", index);
        Ok(trade)
    }

    pub async fn add_futures_record(
        &self,
        input: NewFuturesRecord,
    ) -> Result<FuturesRecord, ServiceError> {
        let record = FuturesRecord::from_input(input, now())?;

        let _guard = self.write_lock.lock().await;
        let mut records = self.store.load_futures().await?;
        records.push(record.clone());
        self.store.save_futures(&records).await?;

        info!("Logged futures PnL on {}: {}", record.date, record.pnl);
        Ok(record)
    }

    pub async fn add_holding(&self, input: NewHolding) -> Result<Holding, ServiceError> {
        let timestamp = now();

        let _guard = self.write_lock.lock().await;
        let mut holdings = self.store.load_holdings().await?;
        let id = next_holding_id(timestamp, &holdings);
        let holding = Holding::open(id, input, timestamp)?;
        holdings.push(holding.clone());
        self.store.save_holdings(&holdings).await?;

        info!("Opened holding {} ({})", holding.id, holding.symbol);
        Ok(holding)
    }

    pub async fn update_holding_price(&self, id: &str, price: f64) -> Result<Holding, ServiceError> {
        let price = Price::new(price)?;

        let _guard = self.write_lock.lock().await;
        let mut holdings = self.store.load_holdings().await?;
        let holding = holdings
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| JournalError::HoldingNotFound(id.to_string()))?;
        holding.update_price(price)?;
        let updated = holding.clone();
        self.store.save_holdings(&holdings).await?;

        info!("Marked holding {} at {}", id, price.value());
        Ok(updated)
    }

    /// Close an open holding and append the resulting trade to the spot journal.
    pub async fn close_holding(
        &self,
        id: &str,
        close_price: f64,
        close_date: NaiveDate,
    ) -> Result<ClosedPosition, ServiceError> {
        let close_price = Price::new(close_price)?;

        let _guard = self.write_lock.lock().await;
        let mut holdings = self.store.load_holdings().await?;
        let holding = holdings
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| JournalError::HoldingNotFound(id.to_string()))?;
        let closed = holding.close(close_price, close_date, now())?;

        let mut trades = self.store.load_spot().await?;
        trades.push(closed.trade.clone());
        self.store.save_spot_and_holdings(&trades, &holdings).await?;

        info!("Closed holding {} with realized PnL {}", id, closed.realized_pnl);
        Ok(closed)
    }

    pub async fn set_balance(&self, initial_balance: f64) -> Result<Balance, ServiceError> {
        let balance = Balance::new(initial_balance)?;

        let _guard = self.write_lock.lock().await;
        self.store.save_balance(&balance).await?;

        info!("Initial balance set to {:.2}", balance.initial_balance);
        Ok(balance)
    }

    pub async fn clear_spot(&self) -> Result<(), ServiceError> {
        let _guard = self.write_lock.lock().await;
        self.store.save_spot(&[]).await?;
        info!("Cleared spot journal");
        Ok(())
    }

    pub async fn clear_futures(&self) -> Result<(), ServiceError> {
        let _guard = self.write_lock.lock().await;
        self.store.save_futures(&[]).await?;
        info!("Cleared futures journal");
        Ok(())
    }

    pub async fn clear_holdings(&self) -> Result<(), ServiceError> {
        let _guard = self.write_lock.lock().await;
        self.store.save_holdings(&[]).await?;
        info!("Cleared holdings");
        Ok(())
    }

    pub async fn reset_balance(&self) -> Result<(), ServiceError> {
        let _guard = self.write_lock.lock().await;
        self.store.save_balance(&Balance::default()).await?;
        info!("Reset initial balance");
        Ok(())
    }

    pub async fn dashboard(&self) -> Result<Dashboard, ServiceError> {
        let snapshot = self.load_snapshot().await?;
        Ok(Dashboard::from_snapshot(&snapshot))
    }

    pub async fn calendar(
        &self,
        year: i32,
        month: u32,
        market: Market,
    ) -> Result<CalendarMonth, ServiceError> {
        let daily = match market {
            Market::All => {
                let spot = self.store.load_spot().await?;
                let futures = self.store.load_futures().await?;
                combined_daily_pnl(&spot, &futures)
            }
            Market::Spot => daily_series(&self.store.load_spot().await?),
            Market::Futures => daily_series(&self.store.load_futures().await?),
        };
        Ok(calendar_month(&daily, year, month)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::holding::HoldingStatus;
    use crate::domain::entities::trade::PositionSide;
    use std::sync::Arc;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn spot(d: u32, symbol: &str, pnl: f64) -> NewSpotTrade {
        NewSpotTrade {
            date: date(d),
            symbol: symbol.to_string(),
            position: PositionSide::Long,
            entry_price: 100.0,
            exit_price: 110.0,
            volume: 1000.0,
            pnl,
            notes: String::new(),
        }
    }

    fn futures(d: u32, pnl: f64) -> NewFuturesRecord {
        NewFuturesRecord {
            date: date(d),
            pnl,
            notes: String::new(),
        }
    }

    fn holding(symbol: &str, quantity: f64, entry: f64) -> NewHolding {
        NewHolding {
            symbol: symbol.to_string(),
            quantity,
            entry_price: entry,
            current_price: 0.0,
            entry_date: date(1),
            notes: "swing".to_string(),
        }
    }

    fn service(dir: &tempfile::TempDir) -> JournalService {
        JournalService::new(JsonStore::new(dir.path()))
    }

    #[tokio::test]
    async fn test_empty_journal_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let dashboard = service(&dir).dashboard().await.unwrap();

        assert_eq!(dashboard.statistics, TradingStatistics::default());
        assert!(dashboard.history.is_empty());
        assert!(dashboard.best_day.is_none());
        assert!(dashboard.portfolio_range.is_none());
        assert!(dashboard.daily_volume.is_empty());
        assert_eq!(dashboard.floating, FloatingSummary::default());
        assert_eq!(dashboard.overview.portfolio_value, 0.0);
    }

    #[tokio::test]
    async fn test_dashboard_combines_markets() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);

        svc.set_balance(1000.0).await.unwrap();
        svc.add_spot_trade(spot(1, "BTC", 30.0)).await.unwrap();
        svc.add_futures_record(futures(1, 20.0)).await.unwrap();
        svc.add_spot_trade(spot(2, "ETH", -20.0)).await.unwrap();
        svc.add_futures_record(futures(3, 50.0)).await.unwrap();

        let dashboard = svc.dashboard().await.unwrap();
        assert_eq!(dashboard.statistics.total_profit, 100.0);
        assert_eq!(dashboard.statistics.total_loss, 20.0);
        assert_eq!(dashboard.statistics.net_pnl, 80.0);
        assert_eq!(dashboard.overview.portfolio_value, 1080.0);
        assert_eq!(dashboard.history.len(), 3);
        assert_eq!(dashboard.best_day.unwrap().date, date(1));
        assert_eq!(dashboard.worst_day.unwrap().date, date(2));
        assert_eq!(dashboard.symbols.len(), 3);
        assert_eq!(dashboard.futures_summary.total, 70.0);

        // Portfolio values: 1050, 1030, 1080
        let range = dashboard.portfolio_range.unwrap();
        assert_eq!(range.peak_value, 1080.0);
        assert_eq!(range.lowest_value, 1030.0);

        let volume_dates: Vec<NaiveDate> = dashboard.daily_volume.iter().map(|v| v.date).collect();
        assert_eq!(volume_dates, vec![date(1), date(2)]);
        assert_eq!(dashboard.daily_volume[0].volume, 1000.0);
    }

    #[tokio::test]
    async fn test_futures_summary_is_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);

        svc.add_futures_record(futures(1, 30.0)).await.unwrap();
        svc.add_futures_record(futures(1, -10.0)).await.unwrap();
        svc.add_futures_record(futures(2, 20.0)).await.unwrap();
        svc.add_futures_record(futures(3, -40.0)).await.unwrap();

        let summary = svc.dashboard().await.unwrap().futures_summary;
        assert_eq!(summary.total, 0.0);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.win_rate, 50.0);
    }

    #[tokio::test]
    async fn test_dashboard_floating_positions() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);

        let winner = svc.add_holding(holding("SOL", 4.0, 20.0)).await.unwrap();
        svc.update_holding_price(&winner.id, 25.0).await.unwrap();
        let loser = svc.add_holding(holding("DOT", 10.0, 5.0)).await.unwrap();
        svc.update_holding_price(&loser.id, 4.0).await.unwrap();
        let gone = svc.add_holding(holding("ADA", 1.0, 1.0)).await.unwrap();
        svc.close_holding(&gone.id, 2.0, date(3)).await.unwrap();

        let dashboard = svc.dashboard().await.unwrap();
        let floating = dashboard.floating;
        assert_eq!(floating.total_cost, 130.0);
        assert_eq!(floating.total_current_value, 140.0);
        assert_eq!(floating.total_unrealized_pnl, 10.0);
        assert_eq!(floating.profitable_positions, 1);
        assert_eq!(floating.open_positions, 2);

        let sol = dashboard
            .open_holdings
            .iter()
            .find(|p| p.holding.symbol == "SOL")
            .unwrap();
        assert_eq!(sol.pnl_percent, 25.0);
        assert_eq!(sol.current_value, 100.0);
    }

    #[tokio::test]
    async fn test_failed_close_leaves_journal_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        let opened = svc.add_holding(holding("ADA", 10.0, 2.0)).await.unwrap();

        std::fs::create_dir(dir.path().join("holdings_data.json.tmp")).unwrap();
        let result = svc.close_holding(&opened.id, 3.0, date(9)).await;
        assert!(matches!(result, Err(ServiceError::Store(_))));

        let snapshot = svc.load_snapshot().await.unwrap();
        assert!(snapshot.spot.is_empty());
        assert!(snapshot.holdings[0].is_open());
    }

    #[tokio::test]
    async fn test_replace_spot_trade() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);

        let original = svc.add_spot_trade(spot(1, "BTC", 30.0)).await.unwrap();
        let replaced = svc.replace_spot_trade(0, spot(1, "SOL", 5.0)).await.unwrap();
        assert_eq!(replaced.timestamp, original.timestamp);
        assert_eq!(svc.spot_trades().await.unwrap(), vec![replaced]);

        let missing = svc.replace_spot_trade(3, spot(1, "SOL", 5.0)).await;
        assert!(matches!(
            missing,
            Err(ServiceError::Domain(JournalError::TradeNotFound(3)))
        ));
    }

    #[tokio::test]
    async fn test_invalid_trade_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);

        let result = svc.add_spot_trade(spot(1, "   ", 1.0)).await;
        assert!(matches!(result, Err(ServiceError::Domain(JournalError::Validation(_)))));
        assert!(svc.spot_trades().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_holding_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);

        let opened = svc.add_holding(holding("ADA", 10.0, 2.0)).await.unwrap();
        assert_eq!(opened.unrealized_pnl.value(), 0.0);

        let marked = svc.update_holding_price(&opened.id, 2.5).await.unwrap();
        assert_eq!(marked.unrealized_pnl.value(), 5.0);
        assert_eq!(svc.dashboard().await.unwrap().overview.unrealized_pnl, 5.0);

        let closed = svc.close_holding(&opened.id, 3.0, date(9)).await.unwrap();
        assert_eq!(closed.realized_pnl.value(), 10.0);

        let snapshot = svc.load_snapshot().await.unwrap();
        assert_eq!(snapshot.holdings[0].status, HoldingStatus::Closed);
        assert_eq!(snapshot.spot.len(), 1);
        assert_eq!(snapshot.spot[0].pnl.value(), 10.0);
        assert_eq!(snapshot.spot[0].volume.value(), 30.0);
        assert_eq!(snapshot.spot[0].date, date(9));

        let dashboard = Dashboard::from_snapshot(&snapshot);
        assert!(dashboard.open_holdings.is_empty());
        assert_eq!(dashboard.overview.closed_positions, 1);
    }

    #[tokio::test]
    async fn test_closing_twice_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);

        let opened = svc.add_holding(holding("ADA", 10.0, 2.0)).await.unwrap();
        svc.close_holding(&opened.id, 3.0, date(9)).await.unwrap();

        let again = svc.close_holding(&opened.id, 4.0, date(10)).await;
        assert!(matches!(
            again,
            Err(ServiceError::Domain(JournalError::HoldingAlreadyClosed(_)))
        ));
        assert_eq!(svc.spot_trades().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_holding() {
        let dir = tempfile::tempdir().unwrap();
        let result = service(&dir).update_holding_price("nope", 1.0).await;
        assert!(matches!(
            result,
            Err(ServiceError::Domain(JournalError::HoldingNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_holding_ids_unique_within_one_second() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);

        let a = svc.add_holding(holding("A", 1.0, 1.0)).await.unwrap();
        let b = svc.add_holding(holding("B", 1.0, 1.0)).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let svc = Arc::new(service(&dir));

        let tasks: Vec<_> = (0..10)
            .map(|i| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.add_futures_record(futures(1, i as f64)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(svc.futures_records().await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_clear_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);

        svc.set_balance(500.0).await.unwrap();
        svc.add_spot_trade(spot(1, "BTC", 1.0)).await.unwrap();
        svc.add_futures_record(futures(1, 1.0)).await.unwrap();
        svc.add_holding(holding("ADA", 1.0, 1.0)).await.unwrap();

        svc.clear_spot().await.unwrap();
        svc.clear_futures().await.unwrap();
        svc.clear_holdings().await.unwrap();
        svc.reset_balance().await.unwrap();

        assert_eq!(svc.load_snapshot().await.unwrap(), JournalSnapshot::default());
    }

    #[tokio::test]
    async fn test_negative_balance_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(service(&dir).set_balance(-1.0).await.is_err());
    }

    #[tokio::test]
    async fn test_calendar_by_market() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);

        svc.add_spot_trade(spot(1, "BTC", 30.0)).await.unwrap();
        svc.add_futures_record(futures(1, 20.0)).await.unwrap();

        assert_eq!(svc.calendar(2024, 5, Market::All).await.unwrap().month_pnl, 50.0);
        assert_eq!(svc.calendar(2024, 5, Market::Spot).await.unwrap().month_pnl, 30.0);
        assert_eq!(svc.calendar(2024, 5, Market::Futures).await.unwrap().month_pnl, 20.0);
        assert!(svc.calendar(2024, 0, Market::All).await.is_err());
    }
}
