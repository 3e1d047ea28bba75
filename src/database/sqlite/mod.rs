use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use crate::database::sqlite::models::{DocumentVectorLink, NewDocumentVectorLink};
use crate::database::sqlite::queries::DocumentVectorQueries;


pub mod models;
pub mod queries;

pub type DbPool = Pool<Sqlite>;

/// Relational store for document/vector linkage rows.
#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    #[inline]
    pub async fn new<P: AsRef<Path>>(database_url: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_url)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    #[inline]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    #[inline]
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    /// Bulk-create linkage rows for a freshly ingested document.
    #[inline]
    pub async fn create_links(&self, links: &[NewDocumentVectorLink]) -> Result<()> {
        DocumentVectorQueries::create_many(&self.pool, links).await
    }

    #[inline]
    pub async fn links_for_document(&self, document_id: &str) -> Result<Vec<DocumentVectorLink>> {
        DocumentVectorQueries::list_by_document(&self.pool, document_id).await
    }

    #[inline]
    pub async fn link_by_vector_id(&self, vector_id: &str) -> Result<Option<DocumentVectorLink>> {
        DocumentVectorQueries::get_by_vector_id(&self.pool, vector_id).await
    }

    #[inline]
    pub async fn delete_links_for_document(&self, document_id: &str) -> Result<u64> {
        DocumentVectorQueries::delete_by_document(&self.pool, document_id).await
    }

    #[inline]
    pub async fn count_links_for_workspace(&self, workspace_id: &str) -> Result<i64> {
        DocumentVectorQueries::count_for_workspace(&self.pool, workspace_id).await
    }

    #[inline]
    pub async fn count_links(&self) -> Result<i64> {
        DocumentVectorQueries::count_all(&self.pool).await
    }

    /// Optimize database performance by running VACUUM and ANALYZE
    #[inline]
    pub async fn optimize(&self) -> Result<()> {
        info!("Optimizing database performance");

        sqlx::query("VACUUM")
            .execute(&self.pool)
            .await
            .context("Failed to vacuum database")?;

        sqlx::query("ANALYZE")
            .execute(&self.pool)
            .await
            .context("Failed to analyze database")?;

        debug!("Database optimization completed");
        Ok(())
    }
}
