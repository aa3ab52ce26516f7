use actix_web::{web, HttpResponse, Result};
use serde::Serialize;

use crate::models::{ApiResponse, ServiceMode};
use crate::services::stock_service::QuoteService;

#[derive(Serialize)]
struct HealthInfo {
    status: &'static str,
    mode: ServiceMode,
}

pub async fn health_check(service: web::Data<QuoteService>) -> Result<HttpResponse> {
    let response = ApiResponse::success(HealthInfo {
        status: "healthy",
        mode: service.mode(),
    });
    Ok(HttpResponse::Ok().json(response))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
