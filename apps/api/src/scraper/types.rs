//! Data carried between the scrape client, the extractor and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Work-location policy of a posting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteType {
    FullyRemote,
    #[default]
    Hybrid,
    OnSite,
}

impl RemoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteType::FullyRemote => "fully_remote",
            RemoteType::Hybrid => "hybrid",
            RemoteType::OnSite => "on_site",
        }
    }
}

/// Raw textual content of one fetched page. Consumed immediately by the extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPage {
    pub url: String,
    pub content: String,
    pub title: Option<String>,
}

/// A job posting pulled out of page text. Not yet tied to a persisted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedJob {
    pub title: String,
    pub description: String,
    pub location: String,
    pub remote_type: RemoteType,
    pub salary_range: Option<String>,
    pub source_url: String,
    pub scraped_at: DateTime<Utc>,
}

/// Lifecycle of an asynchronous crawl on the external service.
///
/// The service reports more states than we care about ("active", "scraping",
/// "paused", ...); anything that is not terminal collapses into `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStatus {
    Processing,
    Completed,
    Failed,
}

impl CrawlStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CrawlStatus::Completed | CrawlStatus::Failed)
    }
}

impl From<&str> for CrawlStatus {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "completed" => CrawlStatus::Completed,
            "failed" | "cancelled" => CrawlStatus::Failed,
            _ => CrawlStatus::Processing,
        }
    }
}

/// One page of a crawl result. Unknown service fields are kept in `extra`
/// so status payloads pass through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawledPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Jobs already extracted for this page (demo crawls carry them).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<Vec<ExtractedJob>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CrawledPage {
    /// Markdown if present, otherwise plain content.
    pub fn text(&self) -> &str {
        self.markdown
            .as_deref()
            .or(self.content.as_deref())
            .unwrap_or_default()
    }
}

/// Handle of a crawl: its opaque id and where it stands. Failed crawls never
/// produce a handle; they come back as a `ScrapeFailure`.
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlJobHandle {
    /// The service accepted the crawl and handed back an id to poll.
    Processing { job_id: String },
    /// Results are already available, either from the service or from demo fixtures.
    Completed {
        job_id: Option<String>,
        pages: Vec<CrawledPage>,
    },
}

impl CrawlJobHandle {
    pub fn status(&self) -> CrawlStatus {
        match self {
            CrawlJobHandle::Processing { .. } => CrawlStatus::Processing,
            CrawlJobHandle::Completed { .. } => CrawlStatus::Completed,
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            CrawlJobHandle::Processing { job_id } => Some(job_id),
            CrawlJobHandle::Completed { job_id, .. } => job_id.as_deref(),
        }
    }
}

/// Status payload of a crawl, as returned by the service. Fields are kept as
/// sent so the payload serializes back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlStatusReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<CrawledPage>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CrawlStatusReport {
    pub fn crawl_status(&self) -> Option<CrawlStatus> {
        self.status.as_deref().map(CrawlStatus::from)
    }

    /// A missing `success` flag counts as success.
    pub fn is_completed(&self) -> bool {
        self.success != Some(false) && self.crawl_status() == Some(CrawlStatus::Completed)
    }
}
