//! 行情获取错误类型

use reqwest::StatusCode;
use thiserror::Error;

/// 行情获取链路的错误
///
/// Transport/Status 为网络层错误，Data 为数据形态错误，
/// Config 只会在实时客户端读取凭证时出现
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("HTTP 请求失败: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP 状态错误 {0}")]
    Status(StatusCode),
    #[error("数据错误: {0}")]
    Data(String),
    #[error("配置错误: {0}")]
    Config(String),
}

impl QuoteError {
    pub fn data(message: impl Into<String>) -> Self {
        QuoteError::Data(message.into())
    }

    /// 是否为网络层错误
    pub fn is_transport(&self) -> bool {
        matches!(self, QuoteError::Transport(_) | QuoteError::Status(_))
    }
}

pub type QuoteResult<T> = std::result::Result<T, QuoteError>;
