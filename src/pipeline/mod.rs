
use anyhow::{Context, Result};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::chunking::split_text;
use crate::config::Config;
use crate::database::sqlite::Database;
use crate::database::sqlite::models::NewDocumentVectorLink;
use crate::document::Document;
use crate::embeddings::openai::OpenAiClient;
use crate::storage::{self, CachedVector};
use crate::vectordb::{PineconeClient, VectorRecord};

/// Terminal state of one document ingestion.
///
/// `success: false` carries the failure reason; the orchestrator never
/// returns an error or panics past its boundary, so a loop over many
/// documents keeps going after one of them fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub success: bool,
    pub message: Option<String>,
}

impl IngestOutcome {
    #[inline]
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    #[inline]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Drives the chunk → embed → upsert → linkage → cache pipeline for single
/// documents.
pub struct IngestionPipeline {
    config: Config,
    database: Database,
    embedder: OpenAiClient,
    index_client: PineconeClient,
}

impl IngestionPipeline {
    #[inline]
    pub async fn new(config: Config) -> Result<Self> {
        let database = Database::new(config.database_path())
            .await
            .context("Failed to initialize linkage database")?;

        let embedder =
            OpenAiClient::new(&config.openai).context("Failed to initialize embedding client")?;

        let index_client = PineconeClient::new(&config.pinecone)
            .context("Failed to initialize vector index client")?;

        Ok(Self {
            config,
            database,
            embedder,
            index_client,
        })
    }

    /// The linkage store, for callers that need to audit or delete links.
    #[inline]
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Ingest one document into the given namespace.
    ///
    /// Linkage rows are recorded only after the index write succeeds, so no
    /// link ever refers to a vector that never reached the index. The cache
    /// snapshot is written last, under the document's derived filename.
    #[inline]
    pub async fn ingest_document(&self, namespace: &str, document: &Document) -> IngestOutcome {
        match self.run(namespace, document).await {
            Ok(vector_count) => {
                info!(
                    "Ingested document {} into namespace '{}' ({} vectors)",
                    document.id, namespace, vector_count
                );
                IngestOutcome::success()
            }
            Err(e) => {
                error!("Failed to ingest document {}: {:#}", document.id, e);
                IngestOutcome::failure(format!("{:#}", e))
            }
        }
    }

    /// Ingest a batch of documents sequentially, one outcome per document,
    /// continuing past individual failures.
    #[inline]
    pub async fn ingest_documents(
        &self,
        namespace: &str,
        documents: &[Document],
    ) -> Vec<IngestOutcome> {
        let mut outcomes = Vec::with_capacity(documents.len());
        for document in documents {
            outcomes.push(self.ingest_document(namespace, document).await);
        }
        outcomes
    }

    async fn run(&self, namespace: &str, document: &Document) -> Result<usize> {
        let chunks = split_text(&document.page_content, &self.config.chunking);
        if chunks.is_empty() {
            anyhow::bail!("document produced no chunks");
        }
        debug!("Chunks created from document: {}", chunks.len());

        let vectors = self
            .embedder
            .embed_many(&chunks)
            .context("embedding failed")?
            .ok_or_else(|| anyhow::anyhow!("embedding failed"))?;

        if vectors.len() < chunks.len() {
            // No partial ingestion of a subset of chunks.
            anyhow::bail!("embedding failed");
        }

        let mut records = Vec::with_capacity(chunks.len());
        let mut links = Vec::with_capacity(chunks.len());
        let mut cache_entries = Vec::with_capacity(chunks.len());

        for (chunk, values) in chunks.iter().zip(vectors) {
            let vector_id = Uuid::new_v4().to_string();
            let metadata = document.vector_metadata(chunk);

            records.push(VectorRecord {
                id: vector_id.clone(),
                values: values.clone(),
                metadata: metadata.clone(),
            });
            links.push(NewDocumentVectorLink::for_document(document, &vector_id));
            cache_entries.push(CachedVector {
                vector_db_id: vector_id,
                values,
                metadata,
            });
        }

        let index = self.index_client.connect()?;
        index
            .upsert_in_batches(namespace, &records)
            .context("index write failed")?;

        self.database
            .create_links(&links)
            .await
            .context("failed to record document vector links")?;

        storage::store_vector_cache(
            &self.config.cache_dir_path(),
            &document.vector_filename(),
            &cache_entries,
        )
        .await
        .context("failed to cache vector snapshot")?;

        Ok(records.len())
    }
}
