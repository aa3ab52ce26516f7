pub mod stock;
pub mod watchlist;
pub mod market;
pub mod health;

use actix_web::http::header::{CacheControl, CacheDirective};
use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::config)
            .configure(stock::config)
            .configure(market::config)
            .configure(watchlist::config)
    );
}

/// 按陈旧窗口生成 Cache-Control 头
pub(crate) fn max_age(secs: u64) -> CacheControl {
    CacheControl(vec![CacheDirective::Public, CacheDirective::MaxAge(secs as u32)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::market::MarketOverview;
    use crate::services::stock::MockDataService;
    use crate::services::stock_service::QuoteService;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use serde_json::Value;
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_health_and_market_routes() {
        let service = Arc::new(QuoteService::demo(Arc::new(MockDataService::new())));
        let overview = web::Data::new(MarketOverview::new(Arc::clone(&service)));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(service))
                .app_data(overview)
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "healthy");
        assert_eq!(body["data"]["mode"], "demo");

        let req = test::TestRequest::get().uri("/api/v1/market/overview").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CACHE_CONTROL).unwrap(), "public, max-age=60");

        let body: Value = test::read_body_json(resp).await;
        let symbols: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["symbol"].as_str().unwrap())
            .collect();
        assert_eq!(symbols, vec!["SPY", "QQQ", "DIA"]);
    }
}
