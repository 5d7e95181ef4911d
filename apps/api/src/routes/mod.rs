pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::scraper::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/debug/demo-mode", get(handlers::handle_demo_mode))
        // Scraping
        .route("/api/scrape-job", post(handlers::handle_scrape_job))
        .route("/api/crawl-site", post(handlers::handle_crawl_site))
        .route(
            "/api/crawl-status/:job_id",
            get(handlers::handle_crawl_status),
        )
        .route(
            "/api/scrape-and-import",
            post(handlers::handle_scrape_and_import),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use sqlx::{postgres::PgPoolOptions, PgPool};
    use tower::ServiceExt;

    use crate::config::{Config, ScraperConfig};
    use crate::scraper::client::FirecrawlClient;
    use crate::scraper::fixtures;
    use crate::scraper::import::scratch_pool;

    /// Demo-mode state. The lazy pool never connects unless a route imports.
    fn demo_state() -> AppState {
        demo_state_with(
            PgPoolOptions::new()
                .connect_lazy("postgres://localhost/unused")
                .unwrap(),
        )
    }

    fn demo_state_with(db: PgPool) -> AppState {
        let scraper = ScraperConfig::demo();
        AppState {
            db,
            scraper: FirecrawlClient::new(&scraper).unwrap(),
            config: Config {
                database_url: "postgres://localhost/unused".to_string(),
                port: 0,
                rust_log: "info".to_string(),
                scraper,
            },
        }
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        send_to(demo_state(), request).await
    }

    async fn send_to(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_demo_mode_status_does_not_leak_key() {
        let (status, body) =
            send(Request::get("/api/debug/demo-mode").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["demo_mode"], true);
        assert_eq!(body["api_key_configured"], false);
        assert_eq!(body["demo_jobs_count"], 3);
    }

    #[tokio::test]
    async fn test_scrape_job_in_demo_mode() {
        let (status, body) =
            send(post_json("/api/scrape-job", json!({"url": "https://jobs.test"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["job_count"], 1);
        assert_eq!(body["url"], "https://jobs.test");

        let title = body["jobs"][0]["title"].as_str().unwrap();
        assert!(fixtures::find_by_title(title).is_some());
        assert!(body.get("jobs_added").is_none());
    }

    #[tokio::test]
    async fn test_scrape_job_requires_url() {
        let (status, body) = send(post_json("/api/scrape-job", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "URL is required");

        let (status, _) = send(post_json("/api/scrape-and-import", json!({"url": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_crawl_site_in_demo_mode_resolves_at_once() {
        let (status, body) = send(post_json(
            "/api/crawl-site",
            json!({"url": "https://jobs.test", "limit": 2}),
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["pages_crawled"], 2);
        assert_eq!(body["job_count"], 2);
        assert!(body.get("auto_add").is_none());
    }

    #[tokio::test]
    async fn test_crawl_status_in_demo_mode() {
        let (status, body) = send(
            Request::get("/api/crawl-status/demo_crawl_1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["data"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_scrape_and_import_stores_rows() {
        let pool = scratch_pool().await;
        let (status, body) = send_to(
            demo_state_with(pool.clone()),
            post_json(
                "/api/scrape-and-import",
                json!({"url": "https://jobs.test", "employer_id": 5}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Successfully imported 1 jobs");

        let row = &body["jobs"][0];
        assert_eq!(row["employer_id"], 5);
        let fixture = fixtures::find_by_title(row["title"].as_str().unwrap()).unwrap();
        assert_eq!(row["location"], fixture.location);
        assert!(row["salary_min"].as_f64().is_some());
        assert!(body["imported_at"].is_string());
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_auto_add_reports_jobs_added() {
        let pool = scratch_pool().await;
        let state = demo_state_with(pool.clone());

        let (status, body) = send_to(
            state.clone(),
            post_json(
                "/api/scrape-job",
                json!({"url": "https://jobs.test", "auto_add": true}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["jobs_added"], 1);

        let (status, body) = send_to(
            state.clone(),
            post_json(
                "/api/crawl-site",
                json!({"url": "https://jobs.test", "limit": 2, "auto_add": true}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["auto_add"], true);
        assert_eq!(body["jobs_added"], 2);

        let (status, body) = send_to(
            state,
            Request::get("/api/crawl-status/demo_crawl_1?auto_add=true")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["jobs_added"], 3);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs WHERE employer_id = 1")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 6);
    }
}
