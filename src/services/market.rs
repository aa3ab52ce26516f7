//! 大盘概览
//!
//! 定期刷新 SPY、QQQ、DIA 三只指数 ETF 的行情快照

use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::models::StockQuote;
use crate::services::refresh::RefreshTask;
use crate::services::stock::calculations::is_positive;
use crate::services::stock::common::{MARKET_INDICES, MARKET_STALE_SECS};
use crate::services::stock_service::QuoteService;

struct MarketSnapshot {
    quotes: Vec<StockQuote>,
    refreshed_at: Instant,
}

/// 大盘概览服务
pub struct MarketOverview {
    service: Arc<QuoteService>,
    snapshot: RwLock<Option<MarketSnapshot>>,
}

impl MarketOverview {
    pub fn new(service: Arc<QuoteService>) -> Self {
        Self {
            service,
            snapshot: RwLock::new(None),
        }
    }

    /// 重新获取指数行情并更新快照
    pub async fn refresh(&self) -> Vec<StockQuote> {
        let quotes = self.service.get_multiple_quotes(&MARKET_INDICES).await;
        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *snapshot = Some(MarketSnapshot {
            quotes: quotes.clone(),
            refreshed_at: Instant::now(),
        });
        quotes
    }

    /// 当前快照，超过陈旧窗口或尚未生成时返回 None
    pub fn fresh_snapshot(&self) -> Option<Vec<StockQuote>> {
        let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        snapshot
            .as_ref()
            .filter(|s| s.refreshed_at.elapsed() < Duration::from_secs(MARKET_STALE_SECS))
            .map(|s| s.quotes.clone())
    }

    /// 获取大盘行情，快照不可用时按需刷新
    pub async fn current(&self) -> Vec<StockQuote> {
        match self.fresh_snapshot() {
            Some(quotes) => quotes,
            None => self.refresh().await,
        }
    }

    /// 启动后台刷新，返回的句柄需由调用方持有
    pub fn start_refresh(self: &Arc<Self>) -> RefreshTask {
        let overview = Arc::clone(self);
        RefreshTask::spawn("market-overview", Duration::from_secs(MARKET_STALE_SECS), move || {
            let overview = Arc::clone(&overview);
            async move {
                let quotes = overview.refresh().await;
                let advancing = quotes.iter().filter(|q| is_positive(q.change_percent)).count();
                log::debug!("大盘概览已刷新: {} 条，上涨 {} 条", quotes.len(), advancing);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::stock::MockDataService;

    fn overview() -> Arc<MarketOverview> {
        let service = Arc::new(QuoteService::demo(Arc::new(MockDataService::new())));
        Arc::new(MarketOverview::new(service))
    }

    #[tokio::test]
    async fn test_current_fetches_on_demand() {
        let overview = overview();
        assert!(overview.fresh_snapshot().is_none());

        let quotes = overview.current().await;
        let symbols: Vec<&str> = quotes.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["SPY", "QQQ", "DIA"]);

        let cached = overview.fresh_snapshot().unwrap();
        assert_eq!(cached, quotes);
    }

    #[tokio::test]
    async fn test_background_refresh_fills_snapshot() {
        let overview = overview();
        let mut task = overview.start_refresh();

        for _ in 0..50 {
            if overview.fresh_snapshot().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(overview.fresh_snapshot().is_some());

        task.cancel();
        assert!(!task.is_running());
    }
}
