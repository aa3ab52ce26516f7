//! 自选股数据模型

use serde::{Deserialize, Serialize};

/// 自选股条目
///
/// 每个股票代码最多一条
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    /// 股票代码
    pub symbol: String,
    /// 股票名称
    pub name: String,
    /// 加入时间（RFC 3339, UTC）
    pub added_at: String,
}

/// 添加自选股请求体
#[derive(Debug, Deserialize)]
pub struct AddWatchlistItem {
    pub symbol: String,
    pub name: String,
}
