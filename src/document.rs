use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document handed to the ingestion pipeline by the owning service.
///
/// `id` is the source document identifier; `document_id` is the row id of
/// the document in the owning relational store. Both are carried into the
/// linkage rows written per chunk so stored vectors can be mapped back for
/// deletion and auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub document_id: String,
    pub workspace_id: String,
    pub organization_id: String,
    pub page_content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    /// Deterministic filename for this document's cached vector snapshot.
    #[inline]
    pub fn vector_filename(&self) -> String {
        format!("{}-{}.json", self.document_id, self.id)
    }

    /// Metadata stored alongside each of this document's vectors: the
    /// caller-supplied metadata fields plus the chunk text.
    #[inline]
    pub fn vector_metadata(&self, chunk_text: &str) -> Value {
        let mut metadata = self.metadata.clone();
        metadata.insert("text".to_string(), Value::String(chunk_text.to_string()));
        Value::Object(metadata)
    }
}
