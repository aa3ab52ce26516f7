//! 行情计算函数

/// 涨跌幅（百分比），昨收为 0 时返回 0
pub fn change_percent(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

/// 涨跌额
pub fn change(current: f64, previous: f64) -> f64 {
    current - previous
}

/// 是否上涨，平盘不算上涨
pub fn is_positive(change_percent: f64) -> bool {
    change_percent > 0.0
}

/// 价格序列的总体标准差，少于 2 个点时返回 0
pub fn volatility(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }

    let n = prices.len() as f64;
    let mean = prices.iter().sum::<f64>() / n;
    let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;

    variance.sqrt()
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
