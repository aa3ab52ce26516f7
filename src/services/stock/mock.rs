//! 模拟行情数据服务
//!
//! 无 API Key 或实时接口失败时使用，不依赖网络，
//! 为任意股票代码生成内部一致的行情、搜索结果和历史K线。
//! 同一代码在 30 秒缓存窗口内返回相同价格。

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::{TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{CacheStatus, StockHistoricalData, StockQuote, StockSearchResult, TimeRange};

use super::calculations::{change, change_percent, round2};
use super::common::{market_now, MOCK_SEARCH_LIMIT, PRICE_CACHE_TTL};

/// 行业板块，决定模拟价格的波动率
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sector {
    Technology,
    Healthcare,
    Financial,
    Energy,
    ConsumerGoods,
    Retail,
    Automotive,
    Entertainment,
    ECommerce,
    Etf,
}

impl Sector {
    /// 日波动率
    pub fn volatility(&self) -> f64 {
        match self {
            Sector::Technology => 0.025,
            Sector::Healthcare => 0.018,
            Sector::Financial => 0.022,
            Sector::Energy => 0.03,
            Sector::ConsumerGoods => 0.015,
            Sector::Retail => 0.02,
            Sector::Automotive => 0.035,
            Sector::Entertainment => 0.025,
            Sector::ECommerce => 0.03,
            Sector::Etf => 0.012,
        }
    }

    /// 搜索结果中的证券类型
    pub fn security_type(&self) -> &'static str {
        match self {
            Sector::Etf => "ETF",
            _ => "Equity",
        }
    }
}

/// 已知股票的基础信息
#[derive(Debug, Clone, Copy)]
pub struct StockProfile {
    pub symbol: &'static str,
    pub name: &'static str,
    pub base_price: f64,
    pub sector: Sector,
}

const fn profile(
    symbol: &'static str,
    name: &'static str,
    base_price: f64,
    sector: Sector,
) -> StockProfile {
    StockProfile {
        symbol,
        name,
        base_price,
        sector,
    }
}

/// 内置股票参考表
pub const STOCK_DATABASE: [StockProfile; 21] = [
    profile("AAPL", "Apple Inc.", 175.0, Sector::Technology),
    profile("GOOGL", "Alphabet Inc.", 140.0, Sector::Technology),
    profile("MSFT", "Microsoft Corporation", 380.0, Sector::Technology),
    profile("TSLA", "Tesla, Inc.", 250.0, Sector::Automotive),
    profile("AMZN", "Amazon.com, Inc.", 145.0, Sector::ECommerce),
    profile("META", "Meta Platforms, Inc.", 320.0, Sector::Technology),
    profile("NVDA", "NVIDIA Corporation", 450.0, Sector::Technology),
    profile("NFLX", "Netflix, Inc.", 400.0, Sector::Entertainment),
    profile("SPY", "SPDR S&P 500 ETF Trust", 450.0, Sector::Etf),
    profile("QQQ", "Invesco QQQ Trust", 380.0, Sector::Etf),
    profile("DIA", "SPDR Dow Jones Industrial Average ETF Trust", 340.0, Sector::Etf),
    profile("JPM", "JPMorgan Chase & Co.", 150.0, Sector::Financial),
    profile("JNJ", "Johnson & Johnson", 160.0, Sector::Healthcare),
    profile("V", "Visa Inc.", 240.0, Sector::Financial),
    profile("PG", "Procter & Gamble Co.", 155.0, Sector::ConsumerGoods),
    profile("UNH", "UnitedHealth Group Inc.", 520.0, Sector::Healthcare),
    profile("HD", "Home Depot Inc.", 330.0, Sector::Retail),
    profile("MA", "Mastercard Inc.", 380.0, Sector::Financial),
    profile("BAC", "Bank of America Corp.", 35.0, Sector::Financial),
    profile("XOM", "Exxon Mobil Corp.", 110.0, Sector::Energy),
    profile("WMT", "Walmart Inc.", 160.0, Sector::Retail),
];

/// 成交量较大的热门股票
const POPULAR_STOCKS: [&str; 6] = ["AAPL", "TSLA", "NVDA", "AMZN", "GOOGL", "MSFT"];
const POPULAR_BASE_VOLUME: f64 = 50_000_000.0;
const DEFAULT_BASE_VOLUME: f64 = 5_000_000.0;

/// 日内开盘价/高低价的波动幅度
const INTRADAY_VOLATILITY: f64 = 0.01;
/// 未知股票默认按科技板块波动
const DEFAULT_SECTOR: Sector = Sector::Technology;

/// 查找已知股票
pub fn lookup(symbol: &str) -> Option<&'static StockProfile> {
    STOCK_DATABASE.iter().find(|p| p.symbol == symbol)
}

#[derive(Debug, Clone, Copy)]
struct CachedPrice {
    price: f64,
    /// 该价格对应的基准价；未知股票的基准价随机生成后在此固定
    base_price: f64,
    timestamp: Instant,
}

struct GeneratorState {
    rng: StdRng,
    price_cache: HashMap<String, CachedPrice>,
}

/// 模拟行情数据服务
///
/// 价格缓存与随机数发生器由同一把锁保护，
/// 并发请求同一代码时不会各自生成不同价格
pub struct MockDataService {
    state: Mutex<GeneratorState>,
}

impl MockDataService {
    /// 创建新的模拟数据服务实例
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// 使用固定种子创建，便于测试复现
    #[cfg(test)]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            state: Mutex::new(GeneratorState {
                rng,
                price_cache: HashMap::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, GeneratorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== 行情 ====================

    /// 生成单只股票行情
    pub fn generate_quote(&self, symbol: &str) -> StockQuote {
        let symbol = symbol.trim().to_uppercase();
        let stock = lookup(&symbol);
        let name = stock
            .map(|s| s.name.to_string())
            .unwrap_or_else(|| format!("{} Corporation", symbol));
        let sector = stock.map(|s| s.sector).unwrap_or(DEFAULT_SECTOR);

        let mut state = self.state();
        let now = Instant::now();
        let cached = state.price_cache.get(&symbol).copied();

        let (price, base_price) = match cached {
            Some(entry) if now.duration_since(entry.timestamp) < PRICE_CACHE_TTL => {
                log::debug!("模拟价格缓存命中: {}", symbol);
                (entry.price, entry.base_price)
            }
            _ => {
                let base_price = stock
                    .map(|s| s.base_price)
                    .or_else(|| cached.map(|entry| entry.base_price))
                    .unwrap_or_else(|| random_base_price(&mut state.rng));
                let swing =
                    (state.rng.random::<f64>() - 0.5) * 2.0 * sector.volatility() * base_price;
                let price = (base_price + swing).max(base_price * 0.5);

                state.price_cache.insert(
                    symbol.clone(),
                    CachedPrice {
                        price,
                        base_price,
                        timestamp: now,
                    },
                );
                (price, base_price)
            }
        };

        let previous_close = base_price;
        let day_range = INTRADAY_VOLATILITY * base_price;
        let open = base_price + (state.rng.random::<f64>() - 0.5) * day_range;
        let high = price.max(open) + state.rng.random::<f64>() * day_range;
        let low = price.min(open) - state.rng.random::<f64>() * day_range;
        let volume = realistic_volume(&mut state.rng, &symbol);

        StockQuote {
            name,
            price: round2(price),
            change: round2(change(price, previous_close)),
            change_percent: round2(change_percent(price, previous_close)),
            open: Some(round2(open)),
            high: Some(round2(high)),
            low: Some(round2(low)),
            previous_close: Some(round2(previous_close)),
            volume: Some(volume),
            market_cap: None,
            last_updated: market_now().format("%Y-%m-%d").to_string(),
            symbol,
        }
    }

    // ==================== 搜索 ====================

    /// 在参考表中按代码或名称模糊搜索（不区分大小写）
    pub fn search_symbols(&self, query: &str) -> Vec<StockSearchResult> {
        let query = query.to_lowercase();

        STOCK_DATABASE
            .iter()
            .filter(|s| {
                s.symbol.to_lowercase().contains(&query) || s.name.to_lowercase().contains(&query)
            })
            .take(MOCK_SEARCH_LIMIT)
            .map(|s| StockSearchResult {
                symbol: s.symbol.to_string(),
                name: s.name.to_string(),
                security_type: s.sector.security_type().to_string(),
                region: "United States".to_string(),
                currency: "USD".to_string(),
            })
            .collect()
    }

    // ==================== 历史K线 ====================

    /// 生成历史K线，按时间升序，最后一条为当前周期
    ///
    /// 随机游走模型：每步波动率为板块波动率的 0.5~1.5 倍，
    /// 整条序列带一个 ±0.01% 的微小趋势，收盘价不低于前收的 80%
    pub fn generate_historical_data(
        &self,
        symbol: &str,
        range: TimeRange,
    ) -> Vec<StockHistoricalData> {
        let symbol = symbol.trim().to_uppercase();
        let stock = lookup(&symbol);
        let volatility = stock.map(|s| s.sector).unwrap_or(DEFAULT_SECTOR).volatility();

        let mut state = self.state();
        let cached_base = state.price_cache.get(&symbol).map(|entry| entry.base_price);
        let base_price = match (stock, cached_base) {
            (Some(s), _) => s.base_price,
            (None, Some(base)) => base,
            (None, None) => random_base_price(&mut state.rng),
        };

        let points = range.points();
        let now = Utc::now();
        let trend = 1.0 + (state.rng.random::<f64>() * 0.0002 - 0.0001);
        let mut current_price = base_price;
        let mut data = Vec::with_capacity(points);

        for i in (0..points as i64).rev() {
            let date = if range.is_intraday() {
                (now - TimeDelta::hours(i)).format("%Y-%m-%dT%H:%M").to_string()
            } else {
                (now - TimeDelta::days(i)).format("%Y-%m-%d").to_string()
            };

            let step_volatility = volatility * (0.5 + state.rng.random::<f64>());
            let delta = (state.rng.random::<f64>() - 0.5) * 2.0 * step_volatility * current_price;
            let open = current_price;
            let close = ((current_price + delta) * trend).max(current_price * 0.8);

            let spread = (close - open).abs() * (1.0 + state.rng.random::<f64>());
            let high = open.max(close) + spread * 0.3;
            let low = open.min(close) - spread * 0.3;

            data.push(StockHistoricalData {
                date,
                open: round2(open),
                high: round2(high),
                low: round2(low),
                close: round2(close),
                volume: realistic_volume(&mut state.rng, &symbol),
            });

            current_price = close;
        }

        data
    }

    // ==================== 缓存 ====================

    /// 清空价格缓存
    pub fn clear_cache(&self) {
        self.state().price_cache.clear();
    }

    /// 缓存状态
    pub fn cache_status(&self) -> CacheStatus {
        let state = self.state();
        let mut keys: Vec<String> = state.price_cache.keys().cloned().collect();
        keys.sort();
        CacheStatus {
            size: keys.len(),
            keys,
        }
    }

    /// 将缓存条目的时间戳前移，模拟缓存过期
    #[cfg(test)]
    pub fn backdate_cache_entry(&self, symbol: &str, age: std::time::Duration) -> bool {
        let mut state = self.state();
        match state.price_cache.get_mut(&symbol.to_uppercase()) {
            Some(entry) => match entry.timestamp.checked_sub(age) {
                Some(ts) => {
                    entry.timestamp = ts;
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    #[cfg(test)]
    fn cached_timestamp(&self, symbol: &str) -> Option<Instant> {
        self.state().price_cache.get(symbol).map(|e| e.timestamp)
    }
}

impl Default for MockDataService {
    fn default() -> Self {
        Self::new()
    }
}

/// 未知股票的随机基准价，范围 [10, 500)
fn random_base_price(rng: &mut StdRng) -> f64 {
    rng.random_range(10..500) as f64
}

/// 按热门程度生成成交量，基准量的 50%~150%
fn realistic_volume(rng: &mut StdRng, symbol: &str) -> u64 {
    let base = if POPULAR_STOCKS.contains(&symbol) {
        POPULAR_BASE_VOLUME
    } else {
        DEFAULT_BASE_VOLUME
    };
    (base * (0.5 + rng.random::<f64>())).floor() as u64
}

// ==================== 测试模块 ====================
