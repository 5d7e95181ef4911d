/// Scrape client: the single point of contact with the external Firecrawl service.
///
/// Every operation makes at most one outbound request, bounded by its own
/// timeout, and never retries. Failures come back as `ScrapeFailure` values
/// carrying the message and the URL or crawl id they concern.
///
/// Without a usable API key the client runs in demo mode and answers from the
/// built-in fixtures without touching the network.
use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, ser::SerializeMap, Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::scraper::fixtures::{self, DEMO_JOBS};
use crate::scraper::types::{CrawlJobHandle, CrawlStatus, CrawlStatusReport, CrawledPage, RawPage};

const SCRAPE_TIMEOUT: Duration = Duration::from_secs(30);
const CRAWL_TIMEOUT: Duration = Duration::from_secs(60);
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_MAX_DEPTH: u32 = 2;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("FIRECRAWL_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Scrape service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from scrape service: {0}")]
    InvalidResponse(String),
}

/// What a failed operation was about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureTarget {
    Url(String),
    JobId(String),
}

/// Failure result of a client operation.
/// Serializes as `{"success": false, "error": ..., "url" | "jobId": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}")]
pub struct ScrapeFailure {
    pub error: String,
    pub target: FailureTarget,
}

impl ScrapeFailure {
    pub fn for_url(url: &str, error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
            target: FailureTarget::Url(url.to_string()),
        }
    }

    pub fn for_job(job_id: &str, error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
            target: FailureTarget::JobId(job_id.to_string()),
        }
    }
}

impl Serialize for ScrapeFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("success", &false)?;
        map.serialize_entry("error", &self.error)?;
        match &self.target {
            FailureTarget::Url(url) => map.serialize_entry("url", url)?,
            FailureTarget::JobId(job_id) => map.serialize_entry("jobId", job_id)?,
        }
        map.end()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    markdown: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CrawlRequest<'a> {
    url: &'a str,
    limit: usize,
    max_depth: u32,
    markdown: bool,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    success: Option<bool>,
    error: Option<String>,
    data: Option<PageData>,
    markdown: Option<String>,
    content: Option<String>,
    #[serde(rename = "pageTitle")]
    page_title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageData {
    markdown: Option<String>,
    content: Option<String>,
    metadata: Option<PageMetadata>,
}

#[derive(Debug, Deserialize)]
struct PageMetadata {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrawlResponse {
    success: Option<bool>,
    error: Option<String>,
    #[serde(rename = "jobId")]
    job_id: Option<String>,
    data: Option<Vec<CrawledPage>>,
}

impl ScrapeResponse {
    fn into_page(self, url: &str) -> Result<RawPage, ScrapeError> {
        if self.success == Some(false) {
            return Err(ScrapeError::InvalidResponse(
                self.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        let (data_markdown, data_content, data_title) = match self.data {
            Some(d) => (d.markdown, d.content, d.metadata.and_then(|m| m.title)),
            None => (None, None, None),
        };

        let content = data_markdown
            .or(self.markdown)
            .or(data_content)
            .or(self.content)
            .unwrap_or_default();

        Ok(RawPage {
            url: url.to_string(),
            content,
            title: data_title.or(self.page_title),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FirecrawlClient {
    client: Client,
    base_url: String,
    /// `None` means demo mode.
    api_key: Option<String>,
}

impl FirecrawlClient {
    /// Builds a client from explicit configuration.
    /// Fails only when live mode is forced without a usable key.
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let api_key = if config.is_demo() {
            info!("No Firecrawl API key configured, scraping in demo mode");
            None
        } else {
            Some(
                config
                    .usable_api_key()
                    .ok_or(ScrapeError::MissingApiKey)?
                    .to_string(),
            )
        };

        Ok(Self {
            client: Client::builder().build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn is_demo(&self) -> bool {
        self.api_key.is_none()
    }

    /// Fetches one page as markdown.
    pub async fn fetch_page(&self, url: &str) -> Result<RawPage, ScrapeFailure> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(fixtures::random_demo_job().to_page(url));
        };

        debug!("Scraping {url}");
        let request = self
            .client
            .post(format!("{}/scrape", self.base_url))
            .bearer_auth(api_key)
            .timeout(SCRAPE_TIMEOUT)
            .json(&ScrapeRequest {
                url,
                markdown: true,
            });

        self.send::<ScrapeResponse>(request)
            .await
            .and_then(|response| response.into_page(url))
            .map_err(|e| ScrapeFailure::for_url(url, e))
    }

    /// Starts a multi-page crawl. The service may answer with an id to poll
    /// or with results straight away; demo crawls always complete at once.
    pub async fn start_crawl(
        &self,
        url: &str,
        limit: usize,
        max_depth: u32,
    ) -> Result<CrawlJobHandle, ScrapeFailure> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(CrawlJobHandle::Completed {
                job_id: Some(format!("demo_crawl_{}", Utc::now().timestamp())),
                pages: demo_pages(Some(url), limit),
            });
        };

        debug!("Starting crawl of {url} (limit={limit}, max_depth={max_depth})");
        let request = self
            .client
            .post(format!("{}/crawl", self.base_url))
            .bearer_auth(api_key)
            .timeout(CRAWL_TIMEOUT)
            .json(&CrawlRequest {
                url,
                limit,
                max_depth,
                markdown: true,
            });

        let response = self
            .send::<CrawlResponse>(request)
            .await
            .map_err(|e| ScrapeFailure::for_url(url, e))?;

        if response.success == Some(false) {
            return Err(ScrapeFailure::for_url(
                url,
                response.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        Ok(match response.job_id {
            Some(job_id) => CrawlJobHandle::Processing { job_id },
            None => CrawlJobHandle::Completed {
                job_id: None,
                pages: response.data.unwrap_or_default(),
            },
        })
    }

    /// Checks on a crawl started earlier and returns the service's payload as is.
    pub async fn poll_crawl(&self, job_id: &str) -> Result<CrawlStatusReport, ScrapeFailure> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(CrawlStatusReport {
                success: Some(true),
                status: Some("completed".to_string()),
                data: Some(demo_pages(None, DEMO_JOBS.len())),
                extra: Default::default(),
            });
        };

        debug!("Polling crawl {job_id}");
        let request = self
            .client
            .get(format!("{}/crawl/{}", self.base_url, job_id))
            .bearer_auth(api_key)
            .timeout(STATUS_TIMEOUT);

        self.send(request)
            .await
            .map_err(|e| ScrapeFailure::for_job(job_id, e))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ScrapeError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Firecrawl returned {}: {}", status, body);
            return Err(ScrapeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// Fixture pages for demo crawls, each already carrying its extracted job.
fn demo_pages(url: Option<&str>, limit: usize) -> Vec<CrawledPage> {
    DEMO_JOBS
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, job)| {
            let page_url = match url {
                Some(url) => format!("{url}?page={}", i + 1),
                None => format!("demo://fixtures/{}", i + 1),
            };
            CrawledPage {
                markdown: Some(job.markdown()),
                jobs: Some(vec![job.to_extracted(&page_url)]),
                url: Some(page_url),
                ..Default::default()
            }
        })
        .collect()
}
