use crate::store::value::Fields;
use crate::types::ProbeResult;
use async_trait::async_trait;
use std::fmt;

/// Location of a document: `<collection>/<document>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    pub collection: String,
    pub document: String,
}

impl DocumentPath {
    pub fn new(collection: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            document: document.into(),
        }
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.document)
    }
}

/// The two remote operations the probe needs from a document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Replace the document at `path` with `fields`, creating it if absent.
    /// No merge with prior contents.
    async fn set_document(&self, path: &DocumentPath, fields: &Fields) -> ProbeResult<()>;

    /// Current contents of the document, or `None` when it does not exist.
    async fn get_document(&self, path: &DocumentPath) -> ProbeResult<Option<Fields>>;
}
