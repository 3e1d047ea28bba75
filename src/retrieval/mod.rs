
use serde_json::Value;
use tracing::debug;

use crate::VectorPipeError;
use crate::vectordb::{PineconeClient, QueryMatch};

/// Number of matches requested when the caller has no preference.
pub const DEFAULT_TOP_K: usize = 4;

/// Uniform envelope for similarity query results: four index-aligned
/// sequences with one entry per match, in the index's returned order
/// (descending score).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub vector_ids: Vec<String>,
    pub context_texts: Vec<String>,
    pub source_documents: Vec<QueryMatch>,
    pub scores: Vec<f32>,
}

/// Similarity retrieval over a namespaced vector index.
///
/// Unlike ingestion, retrieval is a request/response call: remote failures
/// propagate to the caller instead of degrading to an empty result.
#[derive(Debug, Clone)]
pub struct Retriever {
    client: PineconeClient,
}

impl Retriever {
    #[inline]
    pub fn new(client: PineconeClient) -> Self {
        Self { client }
    }

    /// Query the namespace for the `top_k` nearest vectors and reshape the
    /// ranked matches into a [`QueryResult`].
    ///
    /// Vector values are excluded from the response payload; callers only
    /// need ids, scores, and metadata. A match without metadata contributes
    /// an empty context text rather than failing the query.
    #[inline]
    pub fn similarity_search(
        &self,
        namespace: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<QueryResult, VectorPipeError> {
        let index = self.client.connect()?;
        let matches = index.query(namespace, query_vector, top_k, true)?;

        debug!(
            "Similarity query in namespace '{}' returned {} matches",
            namespace,
            matches.len()
        );

        let mut result = QueryResult::default();
        for m in matches {
            result.vector_ids.push(m.id.clone());
            result.context_texts.push(context_text(&m));
            result.scores.push(m.score);
            result.source_documents.push(m);
        }

        Ok(result)
    }

    /// Fetch stored metadata for specific vector ids, one entry per found
    /// vector in the order the ids were requested.
    #[inline]
    pub fn metadata_for(
        &self,
        namespace: &str,
        vector_ids: &[String],
    ) -> Result<Vec<Value>, VectorPipeError> {
        let index = self.client.connect()?;
        let mut fetched = index.fetch(namespace, vector_ids)?;

        let mut entries = Vec::with_capacity(fetched.len());
        for id in vector_ids {
            let Some(vector) = fetched.remove(id) else {
                continue;
            };

            let mut entry = match vector.metadata {
                Some(Value::Object(map)) => map,
                _ => serde_json::Map::new(),
            };
            entry.insert("vectorId".to_string(), Value::String(vector.id));
            entries.push(Value::Object(entry));
        }

        Ok(entries)
    }
}

fn context_text(m: &QueryMatch) -> String {
    m.metadata
        .as_ref()
        .and_then(|metadata| metadata.get("text"))
        .and_then(|text| text.as_str())
        .unwrap_or_default()
        .to_string()
}
