//! 股票行情后端服务
//!
//! 提供行情、搜索、历史K线、大盘概览和自选股的 RESTful API 服务
//! 数据来源：Alpha Vantage，未配置或请求失败时使用模拟数据

mod config;     // 配置加载
mod handlers;   // HTTP 请求处理器
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use crate::config::AppConfig;
use crate::services::market::MarketOverview;
use crate::services::stock::MockDataService;
use crate::services::stock_service::QuoteService;
use crate::services::watchlist::WatchlistStore;

/// 应用程序入口
///
/// 组装各服务实例并启动 HTTP 服务器，默认监听 0.0.0.0:8080
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let (config, notes) = AppConfig::load();

    // 初始化日志系统，RUST_LOG 优先，其次使用配置中的日志级别
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));

    log::info!("启动股票行情后端服务");
    for note in &notes {
        note.log();
    }

    let mock = Arc::new(MockDataService::new());
    let quote_service = Arc::new(QuoteService::from_config(&config.api, mock)?);
    let watchlist = web::Data::new(WatchlistStore::load(&config.storage.data_dir));
    log::info!("自选股文件: {}", watchlist.path().display());
    let market = Arc::new(MarketOverview::new(Arc::clone(&quote_service)));

    // 大盘概览后台刷新，服务器退出后停止
    let mut market_refresh = market.start_refresh();

    let quote_data = web::Data::from(quote_service);
    let market_data = web::Data::from(market);

    let bind_addr = config.bind_addr();
    log::info!("监听地址 {}", bind_addr);

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())  // 添加请求日志中间件
            .app_data(quote_data.clone())
            .app_data(market_data.clone())
            .app_data(watchlist.clone())
            .configure(handlers::config)  // 配置路由
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(&bind_addr)?.run().await?;

    if market_refresh.is_running() {
        market_refresh.cancel();
    }
    log::info!("服务已停止");
    Ok(())
}
