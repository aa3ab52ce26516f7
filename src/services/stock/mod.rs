//! 股票行情获取模块
//!
//! 实时数据来自 Alpha Vantage，失败或未配置时由模拟数据服务兜底

pub mod alpha_vantage;
pub mod calculations;
pub mod common;
pub mod error;
pub mod mock;
pub mod validation;

use async_trait::async_trait;

use crate::models::{StockHistoricalData, StockQuote, StockSearchResult, TimeRange};

pub use alpha_vantage::AlphaVantageClient;
pub use error::QuoteResult;
pub use mock::MockDataService;

/// 实时行情数据源
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// 获取单只股票行情
    async fn fetch_quote(&self, symbol: &str) -> QuoteResult<StockQuote>;

    /// 按关键字搜索股票代码
    async fn search_symbols(&self, query: &str) -> QuoteResult<Vec<StockSearchResult>>;

    /// 获取历史K线，按日期升序
    async fn fetch_historical_data(
        &self,
        symbol: &str,
        range: TimeRange,
    ) -> QuoteResult<Vec<StockHistoricalData>>;
}
