//! 统一响应信封
//!
//! 所有接口返回 `{success, data, message, timestamp}`，失败时 data 为 null

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// UTC 时间戳，精确到毫秒
fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    /// 成功时的负载
    pub data: Option<T>,
    /// 提示信息，失败时为错误原因
    pub message: String,
    /// 生成响应的时间（RFC 3339, UTC）
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
            timestamp: utc_timestamp(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
            timestamp: utc_timestamp(),
        }
    }

    /// 替换提示信息，用于成功但需要说明的情况（如重复添加）
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let ok = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(ok["data"], serde_json::json!([1, 2]));
        assert!(ok["timestamp"].as_str().unwrap().ends_with('Z'));

        let err = serde_json::to_value(ApiResponse::<()>::error("无效的股票代码: A1")).unwrap();
        assert_eq!(err["success"], false);
        assert!(err["data"].is_null());
        assert_eq!(err["message"], "无效的股票代码: A1");
    }

    #[test]
    fn test_with_message_keeps_data() {
        let response = ApiResponse::success("AAPL").with_message("AAPL 已在自选股中");
        assert!(response.success);
        assert_eq!(response.data, Some("AAPL"));
        assert_eq!(response.message, "AAPL 已在自选股中");
    }
}
