//! 行情服务
//!
//! 对外提供统一的行情接口：
//! - Demo 模式（未配置 API Key）：直接使用模拟数据
//! - Live 模式：优先请求实时接口，任何失败都回退到模拟数据，调用方不会收到错误

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;

use crate::config::ApiConfig;
use crate::models::{
    CacheStatus, ServiceMode, ServiceStatus, StockHistoricalData, StockQuote, StockSearchResult,
    TimeRange,
};
use crate::services::stock::calculations::volatility;
use crate::services::stock::validation::sanitize_symbol;
use crate::services::stock::{AlphaVantageClient, MockDataService, QuoteResult, QuoteSource};

/// 回退链：先执行主数据源，失败时记录警告并改用兜底结果
pub async fn with_fallback<T, Fut, F>(operation: &str, primary: Fut, fallback: F) -> T
where
    Fut: Future<Output = QuoteResult<T>>,
    F: FnOnce() -> T,
{
    match primary.await {
        Ok(value) => value,
        Err(e) => {
            let kind = if e.is_transport() { "网络" } else { "数据" };
            log::warn!("{} 实时接口{}错误，回退到模拟数据: {}", operation, kind, e);
            fallback()
        }
    }
}

/// 行情服务
pub struct QuoteService {
    /// 实时数据源，Demo 模式下为空
    live: Option<Arc<dyn QuoteSource>>,
    /// 模拟数据服务
    mock: Arc<MockDataService>,
    has_api_key: bool,
}

impl QuoteService {
    /// 根据配置创建服务，模式在此确定，之后不再变化
    pub fn from_config(config: &ApiConfig, mock: Arc<MockDataService>) -> anyhow::Result<Self> {
        if !config.has_api_key() {
            log::info!("未配置可用的 API Key，使用 Demo 模式（模拟数据）");
            return Ok(Self::demo(mock));
        }

        log::info!("已配置 API Key，使用 Live 模式（{}）", config.base_url);
        let client = AlphaVantageClient::new(config)?;
        Ok(Self::live(Arc::new(client), mock))
    }

    /// Demo 模式
    pub fn demo(mock: Arc<MockDataService>) -> Self {
        Self {
            live: None,
            mock,
            has_api_key: false,
        }
    }

    /// Live 模式，使用给定的实时数据源
    pub fn live(source: Arc<dyn QuoteSource>, mock: Arc<MockDataService>) -> Self {
        Self {
            live: Some(source),
            mock,
            has_api_key: true,
        }
    }

    pub fn mode(&self) -> ServiceMode {
        if self.live.is_some() {
            ServiceMode::Live
        } else {
            ServiceMode::Demo
        }
    }

    /// 服务状态，供前端显示数据来源
    pub fn get_service_status(&self) -> ServiceStatus {
        ServiceStatus {
            mode: self.mode(),
            has_api_key: self.has_api_key,
        }
    }

    /// 获取单只股票行情
    pub async fn get_quote(&self, symbol: &str) -> StockQuote {
        let symbol = sanitize_symbol(symbol);
        match &self.live {
            None => self.mock.generate_quote(&symbol),
            Some(live) => {
                with_fallback(
                    &format!("行情 {}", symbol),
                    live.fetch_quote(&symbol),
                    || self.mock.generate_quote(&symbol),
                )
                .await
            }
        }
    }

    /// 搜索股票代码
    pub async fn search_symbols(&self, query: &str) -> Vec<StockSearchResult> {
        match &self.live {
            None => self.mock.search_symbols(query),
            Some(live) => {
                with_fallback(
                    &format!("搜索 {:?}", query),
                    live.search_symbols(query),
                    || self.mock.search_symbols(query),
                )
                .await
            }
        }
    }

    /// 获取历史K线
    pub async fn get_historical_data(
        &self,
        symbol: &str,
        range: TimeRange,
    ) -> Vec<StockHistoricalData> {
        let symbol = sanitize_symbol(symbol);
        let history = match &self.live {
            None => self.mock.generate_historical_data(&symbol, range),
            Some(live) => {
                with_fallback(
                    &format!("历史数据 {} {}", symbol, range),
                    live.fetch_historical_data(&symbol, range),
                    || self.mock.generate_historical_data(&symbol, range),
                )
                .await
            }
        };

        if log::log_enabled!(log::Level::Debug) {
            let closes: Vec<f64> = history.iter().map(|bar| bar.close).collect();
            log::debug!(
                "历史数据 {} {}: {} 条，收盘价标准差 {:.2}",
                symbol,
                range,
                history.len(),
                volatility(&closes)
            );
        }
        history
    }

    /// 批量获取行情，各代码并发请求，结果顺序与输入一致
    pub async fn get_multiple_quotes<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<StockQuote> {
        join_all(symbols.iter().map(|symbol| self.get_quote(symbol.as_ref()))).await
    }

    /// 模拟价格缓存状态
    pub fn cache_status(&self) -> CacheStatus {
        self.mock.cache_status()
    }

    /// 清空模拟价格缓存
    pub fn clear_cache(&self) {
        self.mock.clear_cache();
    }
}

// ==================== 测试模块 ====================
