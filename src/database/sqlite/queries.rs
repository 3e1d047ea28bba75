use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

use super::models::{DocumentVectorLink, NewDocumentVectorLink};

const SELECT_COLUMNS: &str = "SELECT id, doc_id, vector_id, document_id, workspace_id, \
                              organization_id, created_date FROM document_vectors";

pub struct DocumentVectorQueries;

impl DocumentVectorQueries {
    /// Insert all rows inside one transaction; either every link lands or
    /// none do.
    #[inline]
    pub async fn create_many(pool: &SqlitePool, links: &[NewDocumentVectorLink]) -> Result<()> {
        if links.is_empty() {
            return Ok(());
        }

        let mut tx = pool
            .begin()
            .await
            .context("Failed to begin linkage transaction")?;

        for link in links {
            sqlx::query(
                "INSERT INTO document_vectors \
                 (doc_id, vector_id, document_id, workspace_id, organization_id) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&link.doc_id)
            .bind(&link.vector_id)
            .bind(&link.document_id)
            .bind(&link.workspace_id)
            .bind(&link.organization_id)
            .execute(&mut *tx)
            .await
            .context("Failed to insert document vector link")?;
        }

        tx.commit()
            .await
            .context("Failed to commit linkage transaction")?;

        debug!("Inserted {} document vector links", links.len());
        Ok(())
    }

    #[inline]
    pub async fn list_by_document(
        pool: &SqlitePool,
        document_id: &str,
    ) -> Result<Vec<DocumentVectorLink>> {
        let links = sqlx::query_as::<_, DocumentVectorLink>(&format!(
            "{SELECT_COLUMNS} WHERE document_id = ? ORDER BY id"
        ))
        .bind(document_id)
        .fetch_all(pool)
        .await
        .context("Failed to list links by document")?;

        Ok(links)
    }

    #[inline]
    pub async fn get_by_vector_id(
        pool: &SqlitePool,
        vector_id: &str,
    ) -> Result<Option<DocumentVectorLink>> {
        let link = sqlx::query_as::<_, DocumentVectorLink>(&format!(
            "{SELECT_COLUMNS} WHERE vector_id = ?"
        ))
        .bind(vector_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get link by vector id")?;

        Ok(link)
    }

    /// Delete all links for a document, returning how many rows were removed.
    #[inline]
    pub async fn delete_by_document(pool: &SqlitePool, document_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM document_vectors WHERE document_id = ?")
            .bind(document_id)
            .execute(pool)
            .await
            .context("Failed to delete links by document")?;

        Ok(result.rows_affected())
    }

    #[inline]
    pub async fn count_for_workspace(pool: &SqlitePool, workspace_id: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM document_vectors WHERE workspace_id = ?")
                .bind(workspace_id)
                .fetch_one(pool)
                .await
                .context("Failed to count links for workspace")?;

        Ok(count)
    }

    #[inline]
    pub async fn count_all(pool: &SqlitePool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM document_vectors")
            .fetch_one(pool)
            .await
            .context("Failed to count links")?;

        Ok(count)
    }
}
