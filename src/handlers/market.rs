use actix_web::{web, HttpResponse, Result};
use crate::handlers::max_age;
use crate::models::ApiResponse;
use crate::services::market::MarketOverview;
use crate::services::stock::common::MARKET_STALE_SECS;

pub async fn get_market_overview(overview: web::Data<MarketOverview>) -> Result<HttpResponse> {
    let quotes = overview.current().await;
    Ok(HttpResponse::Ok()
        .insert_header(max_age(MARKET_STALE_SECS))
        .json(ApiResponse::success(quotes)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/market/overview", web::get().to(get_market_overview));
}
