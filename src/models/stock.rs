//! 股票数据模型
//!
//! 定义行情、搜索结果、历史K线及服务状态等数据结构，
//! 字段以 camelCase 序列化，与前端类型保持一致

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 股票实时行情
///
/// 模拟数据路径保证 high ≥ max(open, price)、low ≤ min(open, price)；
/// 实时接口的数据按原样信任
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    /// 股票代码（大写）
    pub symbol: String,
    /// 股票名称
    pub name: String,
    /// 当前价格
    pub price: f64,
    /// 涨跌额（price - previousClose）
    pub change: f64,
    /// 涨跌幅（百分比）
    pub change_percent: f64,
    /// 开盘价
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    /// 最高价
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    /// 最低价
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    /// 昨收价
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
    /// 成交量
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    /// 市值
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    /// 更新日期（日期或日期时间字符串）
    pub last_updated: String,
}

/// 股票搜索结果
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StockSearchResult {
    /// 股票代码
    pub symbol: String,
    /// 股票名称
    pub name: String,
    /// 证券类型，如 "Equity"、"ETF"
    #[serde(rename = "type")]
    pub security_type: String,
    /// 所属地区
    pub region: String,
    /// 交易币种
    pub currency: String,
}

/// 股票历史K线数据
///
/// 按日期升序排列，每个采样周期一条
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StockHistoricalData {
    /// 日期（日内数据包含小时）
    pub date: String,
    /// 开盘价
    pub open: f64,
    /// 最高价
    pub high: f64,
    /// 最低价
    pub low: f64,
    /// 收盘价
    pub close: f64,
    /// 成交量
    pub volume: u64,
}

/// 历史数据时间范围
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1W")]
    OneWeek,
    #[default]
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "1Y")]
    OneYear,
}

impl TimeRange {
    pub const ALL: [TimeRange; 5] = [
        TimeRange::OneDay,
        TimeRange::OneWeek,
        TimeRange::OneMonth,
        TimeRange::ThreeMonths,
        TimeRange::OneYear,
    ];

    /// 范围代码，如 "1M"
    pub fn code(&self) -> &'static str {
        match self {
            TimeRange::OneDay => "1D",
            TimeRange::OneWeek => "1W",
            TimeRange::OneMonth => "1M",
            TimeRange::ThreeMonths => "3M",
            TimeRange::OneYear => "1Y",
        }
    }

    /// 该范围应返回的数据点数量
    ///
    /// 1D 按交易日 5 分钟间隔计 78 个点
    pub fn points(&self) -> usize {
        match self {
            TimeRange::OneDay => 78,
            TimeRange::OneWeek => 7,
            TimeRange::OneMonth => 30,
            TimeRange::ThreeMonths => 90,
            TimeRange::OneYear => 365,
        }
    }

    /// 是否为日内范围
    pub fn is_intraday(&self) -> bool {
        matches!(self, TimeRange::OneDay)
    }

    /// 宽松解析：无法识别的代码回退为默认范围（30 个点，按日采样）
    pub fn from_code(code: &str) -> Self {
        code.parse().unwrap_or_else(|_| {
            log::debug!("未知时间范围 {:?}，使用默认范围 1M", code);
            TimeRange::default()
        })
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL
            .iter()
            .copied()
            .find(|range| range.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("无效的时间范围: {}", s))
    }
}

/// 数据模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    /// 模拟数据
    Demo,
    /// 实时数据
    Live,
}

/// 行情服务状态，供前端显示 "Live Data" / "Demo Mode"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub mode: ServiceMode,
    pub has_api_key: bool,
}

/// 模拟数据价格缓存状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatus {
    pub size: usize,
    pub keys: Vec<String>,
}

/// 历史数据查询参数
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// 时间范围代码（1D/1W/1M/3M/1Y）
    pub range: Option<String>,
}

/// 搜索查询参数
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// 关键字
    pub q: String,
}

/// 批量行情查询参数
#[derive(Debug, Deserialize)]
pub struct QuotesQuery {
    /// 逗号分隔的股票代码
    pub symbols: String,
}
