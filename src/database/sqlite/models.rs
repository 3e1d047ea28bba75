use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Persisted mapping from a document chunk to its stored vector.
///
/// One row exists per vector written to the index; rows are created after a
/// successful index write and deleted when the owning document is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DocumentVectorLink {
    pub id: i64,
    pub doc_id: String,
    pub vector_id: String,
    pub document_id: String,
    pub workspace_id: String,
    pub organization_id: String,
    pub created_date: NaiveDateTime,
}

/// Insert form of [`DocumentVectorLink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocumentVectorLink {
    pub doc_id: String,
    pub vector_id: String,
    pub document_id: String,
    pub workspace_id: String,
    pub organization_id: String,
}

impl NewDocumentVectorLink {
    /// Build the linkage row for one (document, vector) pair.
    #[inline]
    pub fn for_document(document: &crate::document::Document, vector_id: &str) -> Self {
        Self {
            doc_id: document.id.clone(),
            vector_id: vector_id.to_string(),
            document_id: document.document_id.clone(),
            workspace_id: document.workspace_id.clone(),
            organization_id: document.organization_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn link_is_built_from_document_identity() {
        let document = crate::document::Document {
            id: "d1".to_string(),
            document_id: "7".to_string(),
            workspace_id: "w1".to_string(),
            organization_id: "o1".to_string(),
            page_content: String::new(),
            metadata: Map::new(),
        };

        let link = NewDocumentVectorLink::for_document(&document, "v-abc");

        assert_eq!(link.doc_id, "d1");
        assert_eq!(link.vector_id, "v-abc");
        assert_eq!(link.document_id, "7");
        assert_eq!(link.workspace_id, "w1");
        assert_eq!(link.organization_id, "o1");
    }
}
