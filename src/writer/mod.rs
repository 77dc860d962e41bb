pub mod batch;
pub mod indexer;
pub mod record;
