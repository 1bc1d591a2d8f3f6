//! Child objects: results stored under a case

use crate::client::SearchClient;
use crate::error::{ExplorerError, Result};
use crate::objects::document::Document;
use crate::response::RawHit;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Whether an object belongs to one realization or aggregates many
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildKind {
    Realization { id: i64 },
    Aggregation { operation: String },
    /// Neither realization nor aggregation metadata (case-level objects)
    Unspecified,
}

impl ChildKind {
    /// Derive the kind from `fmu.realization` / `fmu.aggregation` metadata
    fn from_document(doc: &Document) -> Result<Self> {
        if let Some(operation) = doc.get_property(&["fmu", "aggregation", "operation"]) {
            let operation = operation.as_str().ok_or_else(|| {
                ExplorerError::MalformedResponse(format!(
                    "object {}: fmu.aggregation.operation is not a string",
                    doc.id()
                ))
            })?;
            return Ok(ChildKind::Aggregation {
                operation: operation.to_string(),
            });
        }

        if let Some(id) = doc.get_property(&["fmu", "realization", "id"]) {
            let id = id.as_i64().ok_or_else(|| {
                ExplorerError::MalformedResponse(format!(
                    "object {}: fmu.realization.id is not an integer",
                    doc.id()
                ))
            })?;
            return Ok(ChildKind::Realization { id });
        }

        Ok(ChildKind::Unspecified)
    }
}

/// A single result artifact under a case, with its blob fetched on demand
pub struct Child {
    client: Arc<dyn SearchClient>,
    document: Document,
    kind: ChildKind,
    blob: OnceCell<Bytes>,
}

impl std::fmt::Debug for Child {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Child")
            .field("document", &self.document)
            .field("kind", &self.kind)
            .field("blob_fetched", &self.blob.initialized())
            .finish()
    }
}

impl Child {
    pub fn from_hit(client: Arc<dyn SearchClient>, hit: RawHit) -> Result<Self> {
        let document = Document::from(hit);
        let kind = ChildKind::from_document(&document)?;
        Ok(Self {
            client,
            document,
            kind,
            blob: OnceCell::new(),
        })
    }

    pub fn uuid(&self) -> &str {
        self.document.id()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn kind(&self) -> &ChildKind {
        &self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.document.get_str(&["data", "name"])
    }

    pub fn tagname(&self) -> Option<&str> {
        self.document.get_str(&["data", "tagname"])
    }

    pub fn content(&self) -> Option<&str> {
        self.document.get_str(&["data", "content"])
    }

    pub fn iteration(&self) -> Option<&str> {
        self.document.get_str(&["fmu", "iteration", "name"])
    }

    pub fn iteration_id(&self) -> Option<i64> {
        self.document.get_i64(&["fmu", "iteration", "id"])
    }

    pub fn realization(&self) -> Option<i64> {
        match self.kind {
            ChildKind::Realization { id } => Some(id),
            _ => None,
        }
    }

    pub fn operation(&self) -> Option<&str> {
        match &self.kind {
            ChildKind::Aggregation { operation } => Some(operation),
            _ => None,
        }
    }

    pub fn stage(&self) -> Option<&str> {
        self.document.get_str(&["fmu", "context", "stage"])
    }

    pub fn format(&self) -> Option<&str> {
        self.document.get_str(&["data", "format"])
    }

    /// Case this object belongs to
    pub fn parent_case(&self) -> Option<&str> {
        self.document.get_str(&["_sumo", "parent_object"])
    }

    /// Object blob, fetched at most once
    pub async fn blob(&self) -> Result<Bytes> {
        let blob = self
            .blob
            .get_or_try_init(|| async {
                debug!(object_id = self.uuid(), "Fetching blob");
                self.client.get_blob(self.uuid()).await
            })
            .await?;
        Ok(blob.clone())
    }
}
