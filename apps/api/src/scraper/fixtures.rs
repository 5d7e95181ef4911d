//! Built-in postings served when no scraping credential is configured.

use chrono::Utc;

use crate::scraper::types::{ExtractedJob, RawPage, RemoteType};

pub struct DemoJob {
    pub title: &'static str,
    pub description: &'static str,
    pub location: &'static str,
    pub remote_type: RemoteType,
    pub salary_range: &'static str,
}

pub static DEMO_JOBS: [DemoJob; 3] = [
    DemoJob {
        title: "Senior Full-Stack Engineer",
        description: "We're looking for a senior full-stack engineer with 5+ years of experience. You'll work on scalable web applications using React, Python, and AWS.",
        location: "San Francisco, CA",
        remote_type: RemoteType::Hybrid,
        salary_range: "$150,000 - $200,000",
    },
    DemoJob {
        title: "DevOps Engineer",
        description: "Join our infrastructure team to design and maintain cloud systems. Experience with Kubernetes, Docker, and CI/CD pipelines required.",
        location: "New York, NY",
        remote_type: RemoteType::FullyRemote,
        salary_range: "$120,000 - $160,000",
    },
    DemoJob {
        title: "Product Manager",
        description: "Lead product strategy and roadmap for our SaaS platform. You'll work cross-functionally with engineering and design teams.",
        location: "Remote",
        remote_type: RemoteType::FullyRemote,
        salary_range: "$140,000 - $180,000",
    },
];

impl DemoJob {
    /// `# title\n\ndescription`
    pub fn markdown(&self) -> String {
        format!("# {}\n\n{}", self.title, self.description)
    }

    pub fn to_page(&self, url: &str) -> RawPage {
        RawPage {
            url: url.to_string(),
            content: self.markdown(),
            title: Some(self.title.to_string()),
        }
    }

    pub fn to_extracted(&self, source_url: &str) -> ExtractedJob {
        ExtractedJob {
            title: self.title.to_string(),
            description: self.description.to_string(),
            location: self.location.to_string(),
            remote_type: self.remote_type,
            salary_range: Some(self.salary_range.to_string()),
            source_url: source_url.to_string(),
            scraped_at: Utc::now(),
        }
    }
}

/// Picks one fixture pseudo-randomly.
pub fn random_demo_job() -> &'static DemoJob {
    &DEMO_JOBS[fastrand::usize(..DEMO_JOBS.len())]
}

pub fn find_by_title(title: &str) -> Option<&'static DemoJob> {
    DEMO_JOBS.iter().find(|job| job.title == title)
}
