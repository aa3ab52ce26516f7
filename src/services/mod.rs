//! 业务逻辑服务模块
//!
//! 封装行情获取、自选股存储和定时刷新逻辑

pub mod market;         // 大盘概览
pub mod refresh;        // 定时刷新任务
pub mod stock;          // 行情数据源
pub mod stock_service;  // 行情服务（实时/模拟回退）
pub mod watchlist;      // 自选股存储
