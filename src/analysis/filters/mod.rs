pub mod accent;
pub mod camelcase;
pub mod length;
pub mod lowercase;
pub mod ngram;
pub mod stemmer;
pub mod stopword;
