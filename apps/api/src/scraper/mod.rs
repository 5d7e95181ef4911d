// Job scraping: fetch pages through Firecrawl (or demo fixtures), pull job
// postings out of the markdown, optionally import them into `jobs`.

pub mod client;
pub mod extractor;
pub mod fixtures;
pub mod handlers;
pub mod import;
pub mod service;
pub mod types;
