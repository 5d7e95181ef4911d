use sqlx::PgPool;

use crate::config::Config;
use crate::scraper::client::FirecrawlClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Built once from `config.scraper`; demo or live is fixed at startup.
    pub scraper: FirecrawlClient,
}
