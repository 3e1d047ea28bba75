// Vector index clients
// Wire types shared by index implementations plus the Pinecone REST client.

pub mod pinecone;

pub use pinecone::{PineconeClient, PineconeIndex, UPSERT_BATCH_SIZE};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single vector written to the index: externally visible id, embedding
/// values, and the metadata stored alongside them. Written once at ingestion
/// time and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: serde_json::Value,
}

/// Index-wide statistics as reported by `describe_index_stats`.
///
/// `dimension` is optional on the wire; callers that need a concrete value
/// substitute [`crate::embeddings::openai::DEFAULT_EMBEDDING_DIMENSION`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexStats {
    pub dimension: Option<u32>,
    #[serde(alias = "totalVectorCount")]
    pub total_record_count: Option<u64>,
    pub namespaces: HashMap<String, NamespaceStats>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct NamespaceStats {
    pub vector_count: u64,
}

/// One entry of a namespace listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceSummary {
    pub name: String,
    pub count: u64,
}

/// Details of a single namespace, or `None` from lookups when the namespace
/// has never received a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceInfo {
    pub name: String,
    pub vector_count: u64,
}

/// One ranked match from a similarity query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Option<serde_json::Value>,
}

/// A vector fetched by id; only metadata is returned.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchedVector {
    pub id: String,
    pub metadata: Option<serde_json::Value>,
}

/// Control-plane description of an index, including readiness.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexDescription {
    pub name: Option<String>,
    pub dimension: Option<u32>,
    pub metric: Option<String>,
    pub ready: bool,
    pub state: Option<String>,
    pub host: Option<String>,
}
