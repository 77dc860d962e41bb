pub mod analyzer;
pub mod filter;
pub mod filters;
pub mod processor;
pub mod spelling;
pub mod synonyms;
pub mod token;
pub mod tokenizer;
