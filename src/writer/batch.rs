use rayon::prelude::*;
use serde::{Serialize, Deserialize};
use tracing::{info, warn};
use crate::core::types::Document;
use crate::writer::indexer::RecordIndexer;
use crate::writer::record::BibliographicRecord;

pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub processed_count: usize,
    pub error_count: usize,
    pub total_errors: usize,  // Individual messages; one record may yield several
}

/// Batch driver over a [`RecordIndexer`] with running counters
pub struct IndexingPipeline {
    pub indexer: RecordIndexer,
    pub batch_size: usize,
    processed_count: usize,
    error_count: usize,
    errors: Vec<String>,
}

impl IndexingPipeline {
    pub fn new(indexer: RecordIndexer, batch_size: usize) -> Self {
        IndexingPipeline {
            indexer,
            batch_size: batch_size.max(1),
            processed_count: 0,
            error_count: 0,
            errors: Vec::new(),
        }
    }

    /// Index `records`, optionally rejecting documents that fail validation.
    /// Failures are counted and recorded as `"Entry <key>: <message>"`.
    pub fn process_records<R: BibliographicRecord>(&mut self, records: &[R], validate: bool) -> Vec<Document> {
        let indexer = &self.indexer;
        let results: Vec<(&str, Result<Document, Vec<String>>)> = records
            .par_iter()
            .map(|record| {
                let outcome = match indexer.index_record(record) {
                    Ok(doc) => {
                        let problems = if validate { indexer.validate_document(&doc) } else { Vec::new() };
                        if problems.is_empty() { Ok(doc) } else { Err(problems) }
                    }
                    Err(err) => Err(vec![err.context]),
                };
                (record.key(), outcome)
            })
            .collect();

        let mut documents = Vec::with_capacity(results.len());
        for (key, outcome) in results {
            match outcome {
                Ok(doc) => {
                    self.processed_count += 1;
                    documents.push(doc);
                }
                Err(problems) => {
                    self.error_count += 1;
                    for problem in problems {
                        warn!("Entry {}: {}", key, problem);
                        self.errors.push(format!("Entry {}: {}", key, problem));
                    }
                }
            }
        }

        documents
    }

    /// Process fixed-size chunks, calling `callback(batch_index, total_batches, documents)`
    /// after each one. Batch indices start at 1. Returns the number of documents produced.
    pub fn process_in_batches<R, F>(&mut self, records: &[R], mut callback: F) -> usize
    where
        R: BibliographicRecord,
        F: FnMut(usize, usize, &[Document]),
    {
        let total_batches = records.len().div_ceil(self.batch_size);
        let mut produced = 0;

        for (i, chunk) in records.chunks(self.batch_size).enumerate() {
            let documents = self.process_records(chunk, true);
            produced += documents.len();

            info!(
                batch = i + 1,
                total_batches,
                documents = documents.len(),
                "indexing progress: {}%",
                (i + 1) * 100 / total_batches
            );
            callback(i + 1, total_batches, &documents);
        }

        produced
    }

    pub fn statistics(&self) -> PipelineStats {
        PipelineStats {
            processed_count: self.processed_count,
            error_count: self.error_count,
            total_errors: self.errors.len(),
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn reset_statistics(&mut self) {
        self.processed_count = 0;
        self.error_count = 0;
        self.errors.clear();
    }
}
