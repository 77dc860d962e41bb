use serde::{Serialize, Deserialize};
use crate::index::inverted::IndexStatistics;
use crate::query::cache::CacheStats;
use crate::writer::batch::PipelineStats;

/// Engine statistics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatistics {
    // General info
    pub backend: String,
    pub uptime_secs: u64,

    // Index metrics
    pub total_documents: usize,
    pub total_terms: usize,
    pub field_count: usize,
    pub index_size_bytes: usize,

    // Query metrics
    pub cache_stats: CacheStats,
    pub query_count: u64,
    pub queries_per_second: f64,

    // Write metrics
    pub write_count: u64,
    pub pipeline: PipelineStats,
}

impl EngineStatistics {
    pub fn new(
        backend: &str,
        uptime_secs: u64,
        index: IndexStatistics,
        cache_stats: CacheStats,
        query_count: u64,
        write_count: u64,
        pipeline: PipelineStats,
    ) -> Self {
        let queries_per_second = if uptime_secs == 0 {
            query_count as f64
        } else {
            query_count as f64 / uptime_secs as f64
        };

        EngineStatistics {
            backend: backend.to_string(),
            uptime_secs,
            total_documents: index.documents,
            total_terms: index.terms,
            field_count: index.fields,
            index_size_bytes: index.memory_bytes,
            cache_stats,
            query_count,
            queries_per_second,
            write_count,
            pipeline,
        }
    }
}
