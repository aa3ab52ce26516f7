use actix_web::{web, HttpResponse, Result};
use crate::models::{AddWatchlistItem, ApiResponse, WatchlistItem};
use crate::services::stock::validation::{is_valid_symbol, sanitize_symbol};
use crate::services::watchlist::WatchlistStore;

fn storage_error(store: &WatchlistStore, e: anyhow::Error) -> HttpResponse {
    log::error!("自选股保存失败 ({}): {:#}", store.path().display(), e);
    let response = ApiResponse::<Vec<WatchlistItem>>::error(e.to_string());
    HttpResponse::InternalServerError().json(response)
}

fn already_listed(store: &WatchlistStore, symbol: &str) -> HttpResponse {
    let message = format!("{} 已在自选股中", symbol);
    let response = ApiResponse::success(store.list()).with_message(message);
    HttpResponse::Ok().json(response)
}

pub async fn list_watchlist(store: web::Data<WatchlistStore>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(store.list())))
}

pub async fn add_to_watchlist(
    store: web::Data<WatchlistStore>,
    body: web::Json<AddWatchlistItem>,
) -> Result<HttpResponse> {
    let symbol = sanitize_symbol(&body.symbol);
    if !is_valid_symbol(&symbol) {
        let message = format!("无效的股票代码: {}", symbol);
        let response = ApiResponse::<Vec<WatchlistItem>>::error(message);
        return Ok(HttpResponse::BadRequest().json(response));
    }
    if store.contains(&symbol) {
        return Ok(already_listed(&store, &symbol));
    }

    let name = if body.name.trim().is_empty() {
        symbol.as_str()
    } else {
        body.name.as_str()
    };

    // 并发添加时以存储层的判重结果为准
    match store.add(&symbol, name) {
        Ok(true) => Ok(HttpResponse::Created().json(ApiResponse::success(store.list()))),
        Ok(false) => Ok(already_listed(&store, &symbol)),
        Err(e) => Ok(storage_error(&store, e)),
    }
}

pub async fn remove_from_watchlist(
    store: web::Data<WatchlistStore>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let symbol = sanitize_symbol(&path.into_inner());

    match store.remove(&symbol) {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success(store.list()))),
        Ok(false) => {
            let message = format!("{} 不在自选股中", symbol);
            let response = ApiResponse::<Vec<WatchlistItem>>::error(message);
            Ok(HttpResponse::NotFound().json(response))
        }
        Err(e) => Ok(storage_error(&store, e)),
    }
}

pub async fn clear_watchlist(store: web::Data<WatchlistStore>) -> Result<HttpResponse> {
    match store.clear() {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success(store.list()))),
        Err(e) => Ok(storage_error(&store, e)),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/watchlist")
            .route("", web::get().to(list_watchlist))
            .route("", web::post().to(add_to_watchlist))
            .route("", web::delete().to(clear_watchlist))
            .route("/{symbol}", web::delete().to(remove_from_watchlist))
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn store() -> (web::Data<WatchlistStore>, std::path::PathBuf) {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let dir = std::env::temp_dir()
            .join(format!("watchlist-handler-{}-{}", std::process::id(), nanos));
        (web::Data::new(WatchlistStore::load(&dir)), dir)
    }

    #[actix_web::test]
    async fn test_watchlist_lifecycle() {
        let (store, dir) = store();
        let app =
            test::init_service(App::new().app_data(store.clone()).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/watchlist")
            .set_json(json!({ "symbol": "aapl", "name": "Apple Inc." }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        // 重复添加不改变列表长度
        let req = test::TestRequest::post()
            .uri("/watchlist")
            .set_json(json!({ "symbol": "AAPL", "name": "Apple Inc." }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["symbol"], "AAPL");
        assert!(body["data"][0]["addedAt"].is_string());
        assert_eq!(body["message"], "AAPL 已在自选股中");

        let req = test::TestRequest::delete().uri("/watchlist/TSLA").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete().uri("/watchlist/aapl").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(store.list().is_empty());

        std::fs::remove_dir_all(dir).ok();
    }

    #[actix_web::test]
    async fn test_add_invalid_symbol_and_clear() {
        let (store, dir) = store();
        let app =
            test::init_service(App::new().app_data(store.clone()).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/watchlist")
            .set_json(json!({ "symbol": "NOT A SYMBOL", "name": "" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        store.add("SPY", "SPDR S&P 500 ETF Trust").unwrap();
        store.add("QQQ", "").unwrap();

        let req = test::TestRequest::delete().uri("/watchlist").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"].as_array().unwrap().is_empty());
        assert!(WatchlistStore::load(&dir).list().is_empty());

        std::fs::remove_dir_all(dir).ok();
    }
}
