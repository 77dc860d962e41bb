use crate::core::error::Result;
use crate::core::types::Document;
use crate::index::inverted::IndexStatistics;
use crate::search::request::SearchRequest;
use crate::search::results::ResultSet;

/// Storage and execution contract shared by search backends. Mutations are
/// visible to the next search; `commit` is the flush point for backends
/// that buffer.
pub trait SearchBackend: Send + Sync {
    /// Store `doc` under `key`, fully replacing any previous document
    fn index(&self, key: &str, doc: Document) -> Result<()>;

    /// Index documents carrying a `key` field. Documents without one are
    /// skipped; returns how many were stored.
    fn index_batch(&self, docs: Vec<Document>) -> Result<usize>;

    fn search(&self, request: &SearchRequest) -> Result<ResultSet>;

    /// Whether `key` existed
    fn delete(&self, key: &str) -> bool;

    fn clear(&self);

    fn commit(&self) -> Result<()>;

    fn statistics(&self) -> IndexStatistics;

    /// Live documents containing `term` in any field
    fn doc_frequency(&self, term: &str) -> usize;

    /// Stored values of `field` starting with `prefix`, case-insensitively
    fn suggest(&self, prefix: &str, field: &str, limit: usize) -> Vec<String>;

    fn name(&self) -> &str;
}
