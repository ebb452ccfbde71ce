//! HTTP API
//!
//! - `GET /api/statistics`
//! - `GET /api/startIndexing`
//! - `GET /api/stopIndexing`
//! - `POST /api/indexPage` with form field `url`
//! - `GET /api/search?query=..&site=..&offset=..&limit=..`

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Form, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::Result;
use crate::search::SearchOptions;
use crate::service::{ApiResponse, Empty, SearchEngineService};

#[derive(Debug, Deserialize)]
pub struct IndexPageForm {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    pub site: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

fn respond<T: Serialize>(result: Result<ApiResponse<T>>) -> Response {
    match result {
        Ok(response) if response.result => (StatusCode::OK, Json(response)).into_response(),
        Ok(response) => (StatusCode::BAD_REQUEST, Json(response)).into_response(),
        Err(e) => {
            error!("Request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error(e.to_string())),
            )
                .into_response()
        }
    }
}

async fn handle_statistics(Extension(service): Extension<Arc<SearchEngineService>>) -> Response {
    respond(service.statistics().await)
}

async fn handle_start_indexing(
    Extension(service): Extension<Arc<SearchEngineService>>,
) -> Response {
    respond(service.start_indexing().await)
}

async fn handle_stop_indexing(
    Extension(service): Extension<Arc<SearchEngineService>>,
) -> Response {
    respond(service.stop_indexing().await)
}

async fn handle_index_page(
    Extension(service): Extension<Arc<SearchEngineService>>,
    Form(form): Form<IndexPageForm>,
) -> Response {
    respond(service.index_page(&form.url).await)
}

async fn handle_search(
    Extension(service): Extension<Arc<SearchEngineService>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let defaults = SearchOptions::default();
    let options = SearchOptions {
        site: params.site.filter(|site| !site.trim().is_empty()),
        offset: params.offset.unwrap_or(defaults.offset),
        limit: params.limit.unwrap_or(defaults.limit),
    };
    respond(service.search(&params.query, &options).await)
}

pub fn router(service: Arc<SearchEngineService>) -> Router {
    Router::new()
        .route("/api/statistics", get(handle_statistics))
        .route("/api/startIndexing", get(handle_start_indexing))
        .route("/api/stopIndexing", get(handle_stop_indexing))
        .route("/api/indexPage", post(handle_index_page))
        .route("/api/search", get(handle_search))
        .layer(Extension(service))
}

/// Serve the API until the process is interrupted
pub async fn serve(service: Arc<SearchEngineService>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, router(service)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::{AppConfig, SiteConfig};
    use crate::index::database::tests::setup_test_db;

    async fn spawn_server() -> (String, tempfile::TempDir) {
        let (db, temp_dir) = setup_test_db().await.unwrap();
        let config = AppConfig {
            sites: vec![SiteConfig {
                name: "Example".to_string(),
                url: "https://example.com".to_string(),
            }],
            ..Default::default()
        };
        let service = Arc::new(SearchEngineService::with_database(config, db).unwrap());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(service)).await.unwrap();
        });
        (format!("http://{}", addr), temp_dir)
    }

    #[tokio::test]
    async fn test_statistics_endpoint() {
        let (base, _temp_dir) = spawn_server().await;

        let response = reqwest::get(format!("{}/api/statistics", base))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let json: serde_json::Value = response.json().await.unwrap();
        assert_eq!(json["result"], true);
        assert_eq!(json["statistics"]["total"]["sites"], 1);
        assert_eq!(json["statistics"]["detailed"][0]["name"], "Example");
    }

    #[tokio::test]
    async fn test_search_endpoint_errors() {
        let (base, _temp_dir) = spawn_server().await;

        let response = reqwest::get(format!("{}/api/search?query=", base))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let json: serde_json::Value = response.json().await.unwrap();
        assert_eq!(json["result"], false);
        assert_eq!(json["error"], "empty search query");

        let response = reqwest::get(format!("{}/api/search?query=fox&limit=5", base))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let json: serde_json::Value = response.json().await.unwrap();
        assert_eq!(json["count"], 0);
    }

    #[tokio::test]
    async fn test_stop_and_index_page_endpoints() {
        let (base, _temp_dir) = spawn_server().await;
        let client = reqwest::Client::new();

        let json: serde_json::Value = client
            .get(format!("{}/api/stopIndexing", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(json["error"], "indexing is not running");

        let json: serde_json::Value = client
            .post(format!("{}/api/indexPage", base))
            .form(&[("url", "https://other.com/page")])
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(json["error"], "page is outside the configured sites");
    }
}
