//! 公共常量和辅助函数

use chrono::{DateTime, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Tz;
use std::time::Duration;

// ==================== Alpha Vantage API 常量 ====================

/// Alpha Vantage 统一查询入口
pub const ALPHA_VANTAGE_API: &str = "https://www.alphavantage.co/query";
/// 实时行情
pub const FUNCTION_GLOBAL_QUOTE: &str = "GLOBAL_QUOTE";
/// 代码搜索
pub const FUNCTION_SYMBOL_SEARCH: &str = "SYMBOL_SEARCH";
/// 日内K线
pub const FUNCTION_INTRADAY: &str = "TIME_SERIES_INTRADAY";
/// 日K线
pub const FUNCTION_DAILY: &str = "TIME_SERIES_DAILY";
/// 日内K线采样间隔
pub const INTRADAY_INTERVAL: &str = "5min";
/// 占位用的 API Key，视为未配置
pub const PLACEHOLDER_API_KEY: &str = "demo";

/// 实时搜索最多返回条数
pub const LIVE_SEARCH_LIMIT: usize = 10;
/// 模拟搜索最多返回条数
pub const MOCK_SEARCH_LIMIT: usize = 8;

// ==================== 缓存与新鲜度 ====================

/// 模拟价格缓存有效期
pub const PRICE_CACHE_TTL: Duration = Duration::from_millis(30_000);
/// 行情查询的陈旧窗口（秒）
pub const QUOTE_STALE_SECS: u64 = 30;
/// 搜索结果的陈旧窗口（秒）
pub const SEARCH_STALE_SECS: u64 = 5 * 60;
/// 历史数据的陈旧窗口（秒）
pub const HISTORY_STALE_SECS: u64 = 5 * 60;
/// 大盘概览的陈旧窗口及刷新周期（秒）
pub const MARKET_STALE_SECS: u64 = 60;

/// 大盘概览使用的指数 ETF
pub const MARKET_INDICES: [&str; 3] = ["SPY", "QQQ", "DIA"];

/// 判断 API Key 是否可用（非空、非占位值）
pub fn is_usable_api_key(key: &str) -> bool {
    !key.trim().is_empty() && key != PLACEHOLDER_API_KEY
}

/// 获取美东市场时间
pub fn market_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&New_York)
}
