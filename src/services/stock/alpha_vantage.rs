//! Alpha Vantage 行情接口实现
//!
//! 提供实时行情、代码搜索、历史K线数据
//! 对接 https://www.alphavantage.co/query

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::{Map, Value};
use url::Url;

use crate::config::ApiConfig;
use crate::models::{StockHistoricalData, StockQuote, StockSearchResult, TimeRange};

use super::common::{
    is_usable_api_key, market_now, FUNCTION_DAILY, FUNCTION_GLOBAL_QUOTE, FUNCTION_INTRADAY,
    FUNCTION_SYMBOL_SEARCH, INTRADAY_INTERVAL, LIVE_SEARCH_LIMIT,
};
use super::error::{QuoteError, QuoteResult};
use super::QuoteSource;

/// 紧凑模式下日K线接口最多返回的条数
const COMPACT_OUTPUT_POINTS: usize = 100;

/// Alpha Vantage 客户端
///
/// 未配置可用 API Key 时不应被调用，调用方需先检查 [`AlphaVantageClient::is_configured`]
pub struct AlphaVantageClient {
    /// HTTP 客户端（带超时）
    client: Client,
    base_url: Url,
    api_key: String,
    /// 单次请求最多尝试次数
    max_retries: u32,
    /// 重试退避基数
    retry_delay: Duration,
}

impl AlphaVantageClient {
    /// 根据 API 配置创建客户端
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        let base_url = Url::parse(&config.base_url)?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            max_retries: config.max_retries.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// 是否配置了可用的 API Key
    pub fn is_configured(&self) -> bool {
        is_usable_api_key(&self.api_key)
    }

    fn api_key(&self) -> QuoteResult<&str> {
        if !self.is_configured() {
            return Err(QuoteError::Config("实时数据需要 Alpha Vantage API Key".to_string()));
        }
        Ok(&self.api_key)
    }

    /// 组装请求地址，参数自动编码
    fn build_url(&self, params: &[(&str, &str)]) -> QuoteResult<Url> {
        let api_key = self.api_key()?;
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .extend_pairs(params.iter().copied())
            .append_pair("apikey", api_key);
        Ok(url)
    }

    /// 发送 GET 请求，失败时重试
    ///
    /// - 2xx 立即返回
    /// - 429 且仍有剩余次数：等待 `retry_delay × 第几次尝试` 后重试
    /// - 其它非 2xx：直接失败
    /// - 网络错误：固定等待 `retry_delay` 后重试，次数用尽后返回错误
    pub async fn fetch_with_retry(&self, url: Url) -> QuoteResult<Response> {
        let retries = self.max_retries;

        for attempt in 1..=retries {
            match self.client.get(url.clone()).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response)
                    if response.status() == StatusCode::TOO_MANY_REQUESTS && attempt < retries =>
                {
                    let wait = self.retry_delay * attempt;
                    log::warn!("行情接口限流 (429)，{:?} 后进行第 {} 次尝试", wait, attempt + 1);
                    tokio::time::sleep(wait).await;
                }
                Ok(response) => return Err(QuoteError::Status(response.status())),
                Err(e) if attempt < retries => {
                    log::warn!("行情接口请求失败: {}，{:?} 后重试", e.without_url(), self.retry_delay);
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(QuoteError::Transport(e.without_url())),
            }
        }

        Err(QuoteError::data("超过最大重试次数"))
    }

    /// 请求并解析 JSON，检查接口返回的错误信息
    async fn fetch_json(&self, params: &[(&str, &str)]) -> QuoteResult<Value> {
        let url = self.build_url(params)?;
        let response = self.fetch_with_retry(url).await?;
        // 读取失败属于网络错误，内容无法解析属于数据错误
        let body = response.text().await.map_err(|e| QuoteError::Transport(e.without_url()))?;
        let data: Value = serde_json::from_str(&body)
            .map_err(|e| QuoteError::data(format!("响应不是有效 JSON: {}", e)))?;
        check_provider_errors(&data)?;
        Ok(data)
    }

    /// 获取单只股票实时行情
    pub async fn fetch_quote(&self, symbol: &str) -> QuoteResult<StockQuote> {
        let data = self
            .fetch_json(&[("function", FUNCTION_GLOBAL_QUOTE), ("symbol", symbol)])
            .await?;
        parse_quote(&data, symbol)
    }

    /// 按关键字搜索股票代码
    pub async fn search_symbols(&self, query: &str) -> QuoteResult<Vec<StockSearchResult>> {
        let data = self
            .fetch_json(&[("function", FUNCTION_SYMBOL_SEARCH), ("keywords", query)])
            .await?;
        parse_search_results(&data)
    }

    /// 获取历史K线，1D 使用 5 分钟日内接口，其它使用日K线接口
    pub async fn fetch_historical_data(
        &self,
        symbol: &str,
        range: TimeRange,
    ) -> QuoteResult<Vec<StockHistoricalData>> {
        let mut params = vec![("symbol", symbol)];
        if range.is_intraday() {
            params.push(("function", FUNCTION_INTRADAY));
            params.push(("interval", INTRADAY_INTERVAL));
        } else {
            params.push(("function", FUNCTION_DAILY));
            if range.points() > COMPACT_OUTPUT_POINTS {
                params.push(("outputsize", "full"));
            }
        }

        let data = self.fetch_json(&params).await?;
        parse_historical_data(&data, range)
    }
}

#[async_trait]
impl QuoteSource for AlphaVantageClient {
    async fn fetch_quote(&self, symbol: &str) -> QuoteResult<StockQuote> {
        AlphaVantageClient::fetch_quote(self, symbol).await
    }

    async fn search_symbols(&self, query: &str) -> QuoteResult<Vec<StockSearchResult>> {
        AlphaVantageClient::search_symbols(self, query).await
    }

    async fn fetch_historical_data(
        &self,
        symbol: &str,
        range: TimeRange,
    ) -> QuoteResult<Vec<StockHistoricalData>> {
        AlphaVantageClient::fetch_historical_data(self, symbol, range).await
    }
}

// ==================== 响应解析 ====================

/// 检查 "Error Message" 与限流提示 "Note"
fn check_provider_errors(data: &Value) -> QuoteResult<()> {
    if let Some(message) = data.get("Error Message") {
        let message = message.as_str().map(str::to_string).unwrap_or_else(|| message.to_string());
        return Err(QuoteError::Data(message));
    }
    if data.get("Note").is_some() {
        return Err(QuoteError::data("API rate limit exceeded. Please try again later."));
    }
    Ok(())
}

fn field_str<'a>(obj: &'a Map<String, Value>, key: &str) -> QuoteResult<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| QuoteError::data(format!("缺少字段 {}", key)))
}

fn parse_number<T: std::str::FromStr>(raw: &str, key: &str) -> QuoteResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| QuoteError::data(format!("字段 {} 不是有效数字: {:?}", key, raw)))
}

fn field_num<T: std::str::FromStr>(obj: &Map<String, Value>, key: &str) -> QuoteResult<T> {
    parse_number(field_str(obj, key)?, key)
}

/// 可选数字字段：缺失返回 None，格式错误返回 Data 错误
fn optional_num<T: std::str::FromStr>(
    obj: &Map<String, Value>,
    key: &str,
) -> QuoteResult<Option<T>> {
    match obj.get(key).and_then(Value::as_str) {
        Some(raw) => parse_number(raw, key).map(Some),
        None => Ok(None),
    }
}

/// 解析 GLOBAL_QUOTE 响应
fn parse_quote(data: &Value, symbol: &str) -> QuoteResult<StockQuote> {
    let quote = data
        .get("Global Quote")
        .and_then(Value::as_object)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| QuoteError::data("Invalid symbol or no data available"))?;

    let percent = field_str(quote, "10. change percent")?;
    let change_percent = parse_number(percent.trim().trim_end_matches('%'), "10. change percent")?;

    Ok(StockQuote {
        symbol: quote
            .get("01. symbol")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| symbol.to_uppercase()),
        // 行情接口不提供公司名称
        name: symbol.to_string(),
        price: field_num(quote, "05. price")?,
        change: field_num(quote, "09. change")?,
        change_percent,
        open: optional_num(quote, "02. open")?,
        high: optional_num(quote, "03. high")?,
        low: optional_num(quote, "04. low")?,
        previous_close: optional_num(quote, "08. previous close")?,
        volume: optional_num(quote, "06. volume")?,
        market_cap: None,
        last_updated: quote
            .get("07. latest trading day")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| market_now().format("%Y-%m-%d").to_string()),
    })
}

/// 解析 SYMBOL_SEARCH 响应，最多取前 10 条
fn parse_search_results(data: &Value) -> QuoteResult<Vec<StockSearchResult>> {
    let Some(matches) = data.get("bestMatches").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    matches
        .iter()
        .take(LIVE_SEARCH_LIMIT)
        .map(|item| {
            let obj = item
                .as_object()
                .ok_or_else(|| QuoteError::data("搜索结果格式错误"))?;
            let text = |key: &str| {
                obj.get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };

            Ok(StockSearchResult {
                symbol: field_str(obj, "1. symbol")?.to_string(),
                name: field_str(obj, "2. name")?.to_string(),
                security_type: text("3. type"),
                region: text("4. region"),
                currency: text("8. currency"),
            })
        })
        .collect()
}

/// 解析时间序列响应，接口按时间倒序返回，取前 N 条后反转为升序
fn parse_historical_data(data: &Value, range: TimeRange) -> QuoteResult<Vec<StockHistoricalData>> {
    let series = data
        .as_object()
        .and_then(|obj| obj.iter().find(|(key, _)| key.contains("Time Series")))
        .and_then(|(_, value)| value.as_object())
        .ok_or_else(|| QuoteError::data("No time series data found"))?;

    let mut history = series
        .iter()
        .take(range.points())
        .map(|(date, values)| {
            let bar = values
                .as_object()
                .ok_or_else(|| QuoteError::data(format!("{} 的K线格式错误", date)))?;
            Ok(StockHistoricalData {
                date: date.clone(),
                open: field_num(bar, "1. open")?,
                high: field_num(bar, "2. high")?,
                low: field_num(bar, "3. low")?,
                close: field_num(bar, "4. close")?,
                volume: field_num(bar, "5. volume")?,
            })
        })
        .collect::<QuoteResult<Vec<_>>>()?;

    history.reverse();
    Ok(history)
}

// ==================== 测试模块 ====================
