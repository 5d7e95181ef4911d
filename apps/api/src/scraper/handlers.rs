//! Axum route handlers for the scraping API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::job::JobRow;
use crate::scraper::fixtures::DEMO_JOBS;
use crate::scraper::import::{import_jobs, DEFAULT_EMPLOYER_ID};
use crate::scraper::service::{
    crawl_job_site, get_crawl_results, jobs_from_pages, scrape_job_page, CrawlSiteResult,
    Outcome, ScrapedJobs, DEFAULT_SITE_CRAWL_LIMIT,
};
use crate::scraper::types::CrawlStatusReport;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

fn default_employer_id() -> i32 {
    DEFAULT_EMPLOYER_ID
}

fn default_crawl_limit() -> usize {
    DEFAULT_SITE_CRAWL_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct ScrapeJobRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub auto_add: bool,
    #[serde(default = "default_employer_id")]
    pub employer_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct CrawlSiteRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_crawl_limit")]
    pub limit: usize,
    #[serde(default)]
    pub auto_add: bool,
    #[serde(default = "default_employer_id")]
    pub employer_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct CrawlStatusQuery {
    #[serde(default)]
    pub auto_add: bool,
    #[serde(default = "default_employer_id")]
    pub employer_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeAndImportRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_employer_id")]
    pub employer_id: i32,
}

/// A scrape/crawl result plus what was done with it.
#[derive(Debug, Serialize)]
pub struct ImportingResponse<T> {
    #[serde(flatten)]
    pub result: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_add: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs_added: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    pub jobs: Vec<JobRow>,
    pub imported_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DemoModeResponse {
    pub demo_mode: bool,
    pub api_key_configured: bool,
    pub base_url: String,
    pub demo_jobs_count: usize,
}

fn require_url(url: &str) -> Result<&str, AppError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::Validation("URL is required".to_string()));
    }
    Ok(url)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/scrape-job
///
/// Scrapes one page and returns the jobs found on it. With `auto_add`, the
/// jobs are also inserted for `employer_id`.
pub async fn handle_scrape_job(
    State(state): State<AppState>,
    Json(req): Json<ScrapeJobRequest>,
) -> Result<Json<ImportingResponse<Outcome<ScrapedJobs>>>, AppError> {
    let url = require_url(&req.url)?;
    let result = scrape_job_page(&state.scraper, url).await;

    let jobs_added = match (&result, req.auto_add) {
        (Ok(scraped), true) if !scraped.jobs.is_empty() => {
            Some(import_jobs(&state.db, req.employer_id, &scraped.jobs).await?.len())
        }
        _ => None,
    };

    Ok(Json(ImportingResponse {
        result: result.into(),
        auto_add: None,
        jobs_added,
    }))
}

/// POST /api/crawl-site
///
/// Starts a crawl. Asynchronous crawls answer with a job id for
/// `/api/crawl-status/:job_id`; crawls that finish at once carry their jobs,
/// which `auto_add` imports immediately.
pub async fn handle_crawl_site(
    State(state): State<AppState>,
    Json(req): Json<CrawlSiteRequest>,
) -> Result<Json<ImportingResponse<Outcome<CrawlSiteResult>>>, AppError> {
    let url = require_url(&req.url)?;
    let result = crawl_job_site(&state.scraper, url, req.limit).await;

    let jobs_added = match (&result, req.auto_add) {
        (Ok(CrawlSiteResult::Finished(crawled)), true) if !crawled.jobs.is_empty() => {
            Some(import_jobs(&state.db, req.employer_id, &crawled.jobs).await?.len())
        }
        _ => None,
    };

    Ok(Json(ImportingResponse {
        result: result.into(),
        auto_add: req.auto_add.then_some(true),
        jobs_added,
    }))
}

/// GET /api/crawl-status/:job_id
///
/// Passes the crawl's status through. With `?auto_add=true`, a completed
/// crawl's jobs are imported.
pub async fn handle_crawl_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<CrawlStatusQuery>,
) -> Result<Json<ImportingResponse<Outcome<CrawlStatusReport>>>, AppError> {
    let result = get_crawl_results(&state.scraper, &job_id).await;

    let jobs_added = match (&result, query.auto_add) {
        (Ok(report), true) if report.is_completed() => {
            let pages = report.data.as_deref().unwrap_or_default();
            // The status payload does not name the crawled site.
            let jobs = jobs_from_pages(pages, None);
            if jobs.is_empty() {
                None
            } else {
                Some(import_jobs(&state.db, query.employer_id, &jobs).await?.len())
            }
        }
        _ => None,
    };

    Ok(Json(ImportingResponse {
        result: result.into(),
        auto_add: None,
        jobs_added,
    }))
}

/// POST /api/scrape-and-import
///
/// Scrapes a page and imports every job found. Responds 201 with the stored
/// rows, or 400 with the failure result when the scrape fails.
pub async fn handle_scrape_and_import(
    State(state): State<AppState>,
    Json(req): Json<ScrapeAndImportRequest>,
) -> Result<Response, AppError> {
    let url = require_url(&req.url)?;

    let scraped = match scrape_job_page(&state.scraper, url).await {
        Ok(scraped) => scraped,
        Err(failure) => return Ok((StatusCode::BAD_REQUEST, Json(failure)).into_response()),
    };

    let jobs = import_jobs(&state.db, req.employer_id, &scraped.jobs).await?;

    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            success: true,
            message: format!("Successfully imported {} jobs", jobs.len()),
            jobs,
            imported_at: scraped.scraped_at,
        }),
    )
        .into_response())
}

/// GET /api/debug/demo-mode
pub async fn handle_demo_mode(State(state): State<AppState>) -> Json<DemoModeResponse> {
    let scraper = &state.config.scraper;
    Json(DemoModeResponse {
        demo_mode: state.scraper.is_demo(),
        api_key_configured: scraper.usable_api_key().is_some(),
        base_url: scraper.base_url.clone(),
        demo_jobs_count: DEMO_JOBS.len(),
    })
}
