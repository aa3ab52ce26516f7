use actix_web::{web, HttpResponse, Result};
use crate::handlers::max_age;
use crate::models::{
    ApiResponse, HistoryQuery, QuotesQuery, SearchQuery, StockHistoricalData, StockQuote,
    StockSearchResult, TimeRange,
};
use crate::services::stock::common::{HISTORY_STALE_SECS, QUOTE_STALE_SECS, SEARCH_STALE_SECS};
use crate::services::stock::validation::{
    is_valid_query, is_valid_symbol, sanitize_query, sanitize_symbol,
};
use crate::services::stock_service::QuoteService;

fn invalid_symbol<T>(symbol: &str) -> HttpResponse
where
    T: serde::Serialize,
{
    HttpResponse::BadRequest().json(ApiResponse::<T>::error(format!("无效的股票代码: {}", symbol)))
}

pub async fn get_service_status(service: web::Data<QuoteService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(service.get_service_status())))
}

pub async fn get_stock_quote(
    service: web::Data<QuoteService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let symbol = sanitize_symbol(&path.into_inner());
    if !is_valid_symbol(&symbol) {
        return Ok(invalid_symbol::<StockQuote>(&symbol));
    }

    let quote = service.get_quote(&symbol).await;
    Ok(HttpResponse::Ok()
        .insert_header(max_age(QUOTE_STALE_SECS))
        .json(ApiResponse::success(quote)))
}

pub async fn get_stock_quotes(
    service: web::Data<QuoteService>,
    query: web::Query<QuotesQuery>,
) -> Result<HttpResponse> {
    let symbols: Vec<String> = query
        .symbols
        .split(',')
        .map(sanitize_symbol)
        .filter(|s| !s.is_empty())
        .collect();

    if let Some(bad) = symbols.iter().find(|s| !is_valid_symbol(s)) {
        return Ok(invalid_symbol::<Vec<StockQuote>>(bad));
    }

    let quotes = service.get_multiple_quotes(symbols.as_slice()).await;
    Ok(HttpResponse::Ok()
        .insert_header(max_age(QUOTE_STALE_SECS))
        .json(ApiResponse::success(quotes)))
}

pub async fn search_stocks(
    service: web::Data<QuoteService>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    if !is_valid_query(&query.q) {
        let response = ApiResponse::<Vec<StockSearchResult>>::error("搜索关键字不能为空");
        return Ok(HttpResponse::BadRequest().json(response));
    }

    let results = service.search_symbols(&sanitize_query(&query.q)).await;
    Ok(HttpResponse::Ok()
        .insert_header(max_age(SEARCH_STALE_SECS))
        .json(ApiResponse::success(results)))
}

pub async fn get_stock_history(
    service: web::Data<QuoteService>,
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse> {
    let symbol = sanitize_symbol(&path.into_inner());
    if !is_valid_symbol(&symbol) {
        return Ok(invalid_symbol::<Vec<StockHistoricalData>>(&symbol));
    }

    let range = query.range.as_deref().map(TimeRange::from_code).unwrap_or_default();
    let history = service.get_historical_data(&symbol, range).await;
    Ok(HttpResponse::Ok()
        .insert_header(max_age(HISTORY_STALE_SECS))
        .json(ApiResponse::success(history)))
}

pub async fn get_cache_status(service: web::Data<QuoteService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(service.cache_status())))
}

pub async fn clear_cache(service: web::Data<QuoteService>) -> Result<HttpResponse> {
    service.clear_cache();
    Ok(HttpResponse::Ok().json(ApiResponse::success(service.cache_status())))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/stocks")
            .route("/status", web::get().to(get_service_status))
            .route("/search", web::get().to(search_stocks))
            .route("/quotes", web::get().to(get_stock_quotes))
            .route("/cache", web::get().to(get_cache_status))
            .route("/cache", web::delete().to(clear_cache))
            .route("/{symbol}", web::get().to(get_stock_quote))
            .route("/{symbol}/history", web::get().to(get_stock_history))
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::stock::MockDataService;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use serde_json::Value;
    use std::sync::Arc;

    fn demo_service() -> web::Data<QuoteService> {
        web::Data::new(QuoteService::demo(Arc::new(MockDataService::new())))
    }

    #[actix_web::test]
    async fn test_quote_endpoint() {
        let app = test::init_service(App::new().app_data(demo_service()).configure(config)).await;

        let req = test::TestRequest::get().uri("/stocks/aapl").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=30"
        );

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["symbol"], "AAPL");
        assert!(body["data"]["price"].as_f64().unwrap() > 0.0);
    }

    #[actix_web::test]
    async fn test_invalid_symbol_is_rejected() {
        let app = test::init_service(App::new().app_data(demo_service()).configure(config)).await;

        let req = test::TestRequest::get().uri("/stocks/TOOLONG1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/stocks/quotes?symbols=AAPL,BRK.B").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/stocks/search?q=%20%20").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_search_and_status_endpoints() {
        let app = test::init_service(App::new().app_data(demo_service()).configure(config)).await;

        let req = test::TestRequest::get().uri("/stocks/search?q=appl").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let results = body["data"].as_array().unwrap();
        assert!(results.iter().any(|r| r["symbol"] == "AAPL" && r["type"] == "Equity"));

        let req = test::TestRequest::get().uri("/stocks/status").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["mode"], "demo");
        assert_eq!(body["data"]["hasApiKey"], false);
    }

    #[actix_web::test]
    async fn test_history_and_batch_endpoints() {
        let app = test::init_service(App::new().app_data(demo_service()).configure(config)).await;

        let req = test::TestRequest::get().uri("/stocks/MSFT/history?range=1W").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 7);

        let req = test::TestRequest::get().uri("/stocks/MSFT/history?range=bogus").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 30);

        let req = test::TestRequest::get()
            .uri("/stocks/quotes?symbols=spy,%20qqq,,DIA")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let symbols: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["symbol"].as_str().unwrap())
            .collect();
        assert_eq!(symbols, vec!["SPY", "QQQ", "DIA"]);

        let req = test::TestRequest::get().uri("/stocks/cache").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["size"], 3);

        let req = test::TestRequest::delete().uri("/stocks/cache").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["size"], 0);
    }
}
