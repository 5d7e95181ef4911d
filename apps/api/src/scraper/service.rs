//! Scrape-and-extract flows exposed to the HTTP layer.
//!
//! Each flow makes one client call, runs the extractor over whatever came back
//! and shapes the result the way API callers expect it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::scraper::client::{FirecrawlClient, ScrapeFailure, DEFAULT_MAX_DEPTH};
use crate::scraper::extractor::extract_jobs;
use crate::scraper::fixtures;
use crate::scraper::types::{
    CrawlJobHandle, CrawlStatus, CrawlStatusReport, CrawledPage, ExtractedJob,
};

pub const DEFAULT_SITE_CRAWL_LIMIT: usize = 10;

/// Either a successful payload or the failure result, serialized flat.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome<T> {
    Success(T),
    Failure(ScrapeFailure),
}

impl<T> From<Result<T, ScrapeFailure>> for Outcome<T> {
    fn from(result: Result<T, ScrapeFailure>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(failure) => Outcome::Failure(failure),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedJobs {
    pub success: bool,
    pub url: String,
    pub jobs: Vec<ExtractedJob>,
    pub job_count: usize,
    pub page_title: String,
    pub scraped_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlStarted {
    pub success: bool,
    pub status: &'static str,
    #[serde(rename = "jobId")]
    pub job_id: String,
    pub url: String,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawledJobs {
    pub success: bool,
    pub url: String,
    pub jobs: Vec<ExtractedJob>,
    pub job_count: usize,
    pub pages_crawled: usize,
    pub crawled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CrawlSiteResult {
    /// The service is crawling in the background; poll with the job id.
    Started(CrawlStarted),
    /// Results were available right away.
    Finished(CrawledJobs),
}

/// Scrapes one page and extracts the jobs on it.
pub async fn scrape_job_page(
    client: &FirecrawlClient,
    url: &str,
) -> Result<ScrapedJobs, ScrapeFailure> {
    let page = client.fetch_page(url).await?;

    // Demo pages map back to their full fixture record.
    let demo_job = page
        .title
        .as_deref()
        .filter(|_| client.is_demo())
        .and_then(fixtures::find_by_title);

    let jobs: Vec<ExtractedJob> = match demo_job {
        Some(job) => vec![job.to_extracted(url)],
        None => extract_jobs(&page.content, url).collect(),
    };

    info!("Scraped {url}: {} job(s) found", jobs.len());

    Ok(ScrapedJobs {
        success: true,
        url: url.to_string(),
        job_count: jobs.len(),
        jobs,
        page_title: page.title.unwrap_or_else(|| "Unknown".to_string()),
        scraped_at: Utc::now(),
    })
}

/// Starts a crawl of a job site. Returns the job id when the service crawls
/// asynchronously, otherwise the jobs extracted from every returned page.
pub async fn crawl_job_site(
    client: &FirecrawlClient,
    url: &str,
    limit: usize,
) -> Result<CrawlSiteResult, ScrapeFailure> {
    let handle = client.start_crawl(url, limit, DEFAULT_MAX_DEPTH).await?;
    debug!(
        "Crawl of {url} is {:?} (job {:?})",
        handle.status(),
        handle.job_id()
    );

    match handle {
        CrawlJobHandle::Processing { job_id } => {
            info!("Crawl of {url} started as {job_id}");
            Ok(CrawlSiteResult::Started(CrawlStarted {
                success: true,
                status: "crawling",
                job_id,
                url: url.to_string(),
                message: "Crawl started. Use jobId to check status.",
            }))
        }
        CrawlJobHandle::Completed { pages, .. } => {
            let jobs = jobs_from_pages(&pages, Some(url));
            info!(
                "Crawl of {url} finished: {} page(s), {} job(s)",
                pages.len(),
                jobs.len()
            );
            Ok(CrawlSiteResult::Finished(CrawledJobs {
                success: true,
                url: url.to_string(),
                job_count: jobs.len(),
                jobs,
                pages_crawled: pages.len(),
                crawled_at: Utc::now(),
            }))
        }
    }
}

/// Checks on an asynchronous crawl.
pub async fn get_crawl_results(
    client: &FirecrawlClient,
    job_id: &str,
) -> Result<CrawlStatusReport, ScrapeFailure> {
    let report = client.poll_crawl(job_id).await?;
    if let Some(status) = report.crawl_status().filter(CrawlStatus::is_terminal) {
        info!("Crawl {job_id} is {status:?}");
    }
    Ok(report)
}

/// Jobs a page already carries, or the ones extracted from its text.
/// Pages without their own URL are attributed to `fallback_url`, or get an
/// empty `source_url` when there is none.
pub fn jobs_from_pages(pages: &[CrawledPage], fallback_url: Option<&str>) -> Vec<ExtractedJob> {
    pages
        .iter()
        .flat_map(|page| match &page.jobs {
            Some(jobs) => jobs.clone(),
            None => {
                let source = page.url.as_deref().or(fallback_url).unwrap_or_default();
                extract_jobs(page.text(), source).collect()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;
    use crate::scraper::types::RemoteType;
    use serde_json::json;

    fn demo_client() -> FirecrawlClient {
        FirecrawlClient::new(&ScraperConfig::demo()).unwrap()
    }

    #[tokio::test]
    async fn test_demo_scrape_returns_one_fixture_job() {
        let result = scrape_job_page(&demo_client(), "https://jobs.test")
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.job_count, 1);

        let fixture = fixtures::find_by_title(&result.page_title).unwrap();
        assert_eq!(result.jobs[0].title, fixture.title);
        assert_eq!(result.jobs[0].location, fixture.location);
        assert_eq!(result.jobs[0].source_url, "https://jobs.test");
    }

    #[tokio::test]
    async fn test_demo_crawl_resolves_with_carried_jobs() {
        let result = crawl_job_site(&demo_client(), "https://jobs.test", 10)
            .await
            .unwrap();
        let CrawlSiteResult::Finished(crawled) = result else {
            panic!("demo crawl should finish synchronously");
        };
        assert_eq!(crawled.pages_crawled, 3);
        assert_eq!(crawled.job_count, 3);
        assert_eq!(crawled.jobs[1].title, "DevOps Engineer");
        assert_eq!(crawled.jobs[1].remote_type, RemoteType::FullyRemote);
    }

    #[test]
    fn test_jobs_from_pages_extracts_when_not_carried() {
        let pages = vec![
            CrawledPage {
                url: Some("https://jobs.test/a".to_string()),
                markdown: Some(
                    "# Backend Engineer\nDesign and run the services behind our marketplace.".to_string(),
                ),
                ..Default::default()
            },
            CrawledPage {
                content: Some("# Tiny\nNope".to_string()),
                ..Default::default()
            },
        ];
        let jobs = jobs_from_pages(&pages, Some("https://jobs.test"));
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Backend Engineer");
        assert_eq!(jobs[0].source_url, "https://jobs.test/a");
    }

    #[test]
    fn test_jobs_from_pages_without_any_url_leaves_source_empty() {
        let pages = vec![CrawledPage {
            markdown: Some(
                "# Data Engineer\nBuild the pipelines that feed our reporting warehouse.".to_string(),
            ),
            ..Default::default()
        }];
        let jobs = jobs_from_pages(&pages, None);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].source_url, "");

        let jobs = jobs_from_pages(&pages, Some("https://jobs.test"));
        assert_eq!(jobs[0].source_url, "https://jobs.test");
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let started = Outcome::from(Ok::<_, ScrapeFailure>(CrawlSiteResult::Started(
            CrawlStarted {
                success: true,
                status: "crawling",
                job_id: "j1".to_string(),
                url: "https://jobs.test".to_string(),
                message: "Crawl started. Use jobId to check status.",
            },
        )));
        let value = serde_json::to_value(&started).unwrap();
        assert_eq!(value["status"], "crawling");
        assert_eq!(value["jobId"], "j1");

        let failed = Outcome::<ScrapedJobs>::from(Err(ScrapeFailure::for_url(
            "https://jobs.test",
            "timed out",
        )));
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"success": false, "error": "timed out", "url": "https://jobs.test"})
        );
    }
}
