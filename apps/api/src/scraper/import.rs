//! Persists extracted jobs into the `jobs` table.
//!
//! Expects the job board's table to exist with at least:
//! `job_id SERIAL`, `employer_id INT`, `title VARCHAR NOT NULL`, `description TEXT`,
//! `location VARCHAR`, `remote_type VARCHAR`, `salary_min NUMERIC`,
//! `salary_max NUMERIC`, `is_active BOOLEAN`, `created_at TIMESTAMP`.
//!
//! `created_at` has no server default there, so it is written here. Returned
//! columns are cast to the types `JobRow` decodes; the casts also accept
//! `DOUBLE PRECISION` salaries and `TIMESTAMPTZ` timestamps.

use sqlx::PgPool;
use tracing::info;

use crate::models::job::JobRow;
use crate::scraper::extractor::salary_bounds;
use crate::scraper::types::ExtractedJob;

pub const DEFAULT_EMPLOYER_ID: i32 = 1;

/// Column values for one imported job.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub employer_id: i32,
    pub title: String,
    pub description: String,
    pub location: String,
    pub remote_type: &'static str,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
}

impl NewJob {
    pub fn from_extracted(employer_id: i32, job: &ExtractedJob) -> Self {
        let bounds = job.salary_range.as_deref().and_then(salary_bounds);
        Self {
            employer_id,
            title: job.title.clone(),
            description: job.description.clone(),
            location: job.location.clone(),
            remote_type: job.remote_type.as_str(),
            salary_min: bounds.map(|(min, _)| min),
            salary_max: bounds.map(|(_, max)| max),
        }
    }
}

/// Inserts all jobs in one transaction; nothing is stored if any insert fails.
pub async fn import_jobs(
    pool: &PgPool,
    employer_id: i32,
    jobs: &[ExtractedJob],
) -> Result<Vec<JobRow>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut rows = Vec::with_capacity(jobs.len());

    for job in jobs {
        let new_job = NewJob::from_extracted(employer_id, job);
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs
                (employer_id, title, description, location, remote_type,
                 salary_min, salary_max, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, now())
            RETURNING job_id, employer_id, title, description, location, remote_type,
                      salary_min::float8 AS salary_min,
                      salary_max::float8 AS salary_max,
                      COALESCE(is_active, TRUE) AS is_active,
                      COALESCE(created_at::timestamptz, now()) AS created_at
            "#,
        )
        .bind(new_job.employer_id)
        .bind(&new_job.title)
        .bind(&new_job.description)
        .bind(&new_job.location)
        .bind(new_job.remote_type)
        .bind(new_job.salary_min)
        .bind(new_job.salary_max)
        .fetch_one(&mut *tx)
        .await?;
        rows.push(row);
    }

    tx.commit().await?;
    info!("Imported {} job(s) for employer {employer_id}", rows.len());
    Ok(rows)
}

/// Connection to `DATABASE_URL` with a session-local `jobs` table typed like
/// the job board's schema. Single connection so the temp table stays visible.
#[cfg(test)]
pub(crate) async fn scratch_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .expect("connect to DATABASE_URL");
    sqlx::query(
        r#"
        CREATE TEMPORARY TABLE jobs (
            job_id SERIAL PRIMARY KEY,
            employer_id INTEGER,
            title VARCHAR NOT NULL,
            description TEXT,
            location VARCHAR,
            remote_type VARCHAR,
            salary_min NUMERIC,
            salary_max NUMERIC,
            is_active BOOLEAN,
            created_at TIMESTAMP,
            updated_at TIMESTAMP
        )
        "#,
    )
    .execute(&pool)
    .await
    .expect("create scratch jobs table");
    pool
}
