use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;
use regex::Regex;
use roaring::RoaringBitmap;
use serde::Serialize;
use crate::core::error::{Error, Result};
use crate::core::types::{DocId, Document};

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("static pattern"));

/// Bookkeeping fields stamped at index time. They are stored and can be
/// filtered, sorted and range-queried, but never feed the term index.
pub fn is_system_field(field: &str) -> bool {
    field.starts_with('_') || matches!(field, "indexed_at" | "added" | "modified")
}

/// Lowercased `\w+` runs of `text`, as stored in the term index
pub fn index_tokens(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

/// Inverted index structure. Keys map to dense internal ids so postings
/// can live in roaring bitmaps.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    key_to_id: HashMap<String, DocId>,
    id_to_key: HashMap<DocId, String>,
    documents: HashMap<DocId, Document>,
    term_index: BTreeMap<String, RoaringBitmap>,
    field_values: BTreeMap<String, BTreeMap<String, RoaringBitmap>>,
    live: RoaringBitmap,
    next_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStatistics {
    pub documents: usize,
    pub terms: usize,
    pub fields: usize,
    pub memory_bytes: usize,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.key_to_id.contains_key(key)
    }

    /// Store `doc` under `key`, replacing every association of a previous
    /// document with the same key.
    pub fn insert(&mut self, key: &str, doc: Document) -> Result<DocId> {
        let doc_id = match self.key_to_id.get(key) {
            Some(&existing) => {
                if let Some(old) = self.documents.remove(&existing) {
                    self.unindex(existing, &old);
                }
                existing
            }
            None => {
                let id = DocId(self.next_id);
                self.next_id = self
                    .next_id
                    .checked_add(1)
                    .ok_or_else(|| Error::index("Document id space exhausted"))?;
                self.key_to_id.insert(key.to_string(), id);
                self.id_to_key.insert(id, key.to_string());
                id
            }
        };

        self.index_document(doc_id, &doc);
        self.documents.insert(doc_id, doc);
        self.live.insert(doc_id.0);
        Ok(doc_id)
    }

    /// Remove the document for `key`, pruning emptied buckets
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(doc_id) = self.key_to_id.remove(key) else {
            return false;
        };
        self.id_to_key.remove(&doc_id);
        self.live.remove(doc_id.0);
        if let Some(doc) = self.documents.remove(&doc_id) {
            self.unindex(doc_id, &doc);
        }
        true
    }

    pub fn clear(&mut self) {
        *self = InvertedIndex::default();
    }

    pub fn doc_id(&self, key: &str) -> Option<DocId> {
        self.key_to_id.get(key).copied()
    }

    pub fn key(&self, doc_id: DocId) -> Option<&str> {
        self.id_to_key.get(&doc_id).map(String::as_str)
    }

    pub fn document(&self, doc_id: DocId) -> Option<&Document> {
        self.documents.get(&doc_id)
    }

    pub fn document_by_key(&self, key: &str) -> Option<&Document> {
        self.doc_id(key).and_then(|id| self.document(id))
    }

    /// Every live document id
    pub fn all_docs(&self) -> &RoaringBitmap {
        &self.live
    }

    pub fn postings(&self, term: &str) -> Option<&RoaringBitmap> {
        self.term_index.get(term)
    }

    /// Indexed terms in lexicographic order
    pub fn terms(&self) -> impl Iterator<Item = (&str, &RoaringBitmap)> {
        self.term_index.iter().map(|(t, p)| (t.as_str(), p))
    }

    /// Indexed terms starting with `prefix`
    pub fn terms_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a RoaringBitmap)> + 'a {
        self.term_index
            .range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
            .take_while(move |(t, _)| t.starts_with(prefix))
            .map(|(t, p)| (t.as_str(), p))
    }

    pub fn term_count(&self) -> usize {
        self.term_index.len()
    }

    /// Value buckets of `field`, for facets and suggestions
    pub fn field_values(&self, field: &str) -> Option<&BTreeMap<String, RoaringBitmap>> {
        self.field_values.get(field)
    }

    pub fn statistics(&self) -> IndexStatistics {
        IndexStatistics {
            documents: self.documents.len(),
            terms: self.term_index.len(),
            fields: self.field_values.len(),
            memory_bytes: self.estimate_memory(),
        }
    }

    fn index_document(&mut self, doc_id: DocId, doc: &Document) {
        for (field, value) in doc.iter() {
            if !is_system_field(field) {
                for token in index_tokens(&value.to_string()) {
                    self.term_index.entry(token).or_default().insert(doc_id.0);
                }
            }

            let buckets = self.field_values.entry(field.to_string()).or_default();
            for item in value.index_values() {
                buckets.entry(item).or_default().insert(doc_id.0);
            }
        }
    }

    fn unindex(&mut self, doc_id: DocId, doc: &Document) {
        for (field, value) in doc.iter() {
            if !is_system_field(field) {
                for token in index_tokens(&value.to_string()) {
                    if let Some(postings) = self.term_index.get_mut(&token) {
                        postings.remove(doc_id.0);
                        if postings.is_empty() {
                            self.term_index.remove(&token);
                        }
                    }
                }
            }

            if let Some(buckets) = self.field_values.get_mut(field) {
                for item in value.index_values() {
                    if let Some(postings) = buckets.get_mut(&item) {
                        postings.remove(doc_id.0);
                        if postings.is_empty() {
                            buckets.remove(&item);
                        }
                    }
                }
                if buckets.is_empty() {
                    self.field_values.remove(field);
                }
            }
        }
    }

    fn estimate_memory(&self) -> usize {
        let mut size = std::mem::size_of::<Self>();

        for key in self.key_to_id.keys() {
            size += 2 * key.len() + std::mem::size_of::<DocId>() * 3;
        }
        for doc in self.documents.values() {
            for (field, value) in doc.iter() {
                size += field.len() + value.to_string().len() + std::mem::size_of::<Document>();
            }
        }
        for (term, postings) in &self.term_index {
            size += term.len() + postings.serialized_size();
        }
        for (field, buckets) in &self.field_values {
            size += field.len();
            for (value, postings) in buckets {
                size += value.len() + postings.serialized_size();
            }
        }
        size
    }
}
