//! Full-text search over bibliographic records.
//!
//! Records are flattened into [`Document`]s by the indexing pipeline, stored
//! in an in-memory inverted index and queried with a Lucene-like query
//! language supporting boolean logic, phrases, fields, wildcards, fuzzy
//! terms, ranges and boosts.

pub mod core;
pub mod analysis;
pub mod schema;
pub mod writer;
pub mod query;
pub mod index;
pub mod scoring;
pub mod search;

pub use crate::core::config::Config;
pub use crate::core::engine::{SearchEngine, SearchOptions};
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::types::{Document, FieldValue};
pub use crate::query::ast::QueryNode;
pub use crate::query::parser::QueryParser;
pub use crate::search::backend::SearchBackend;
pub use crate::search::executor::MemoryBackend;
pub use crate::search::request::{SearchRequest, SortOrder};
pub use crate::search::results::ResultSet;
pub use crate::writer::record::{BibliographicRecord, Record};
