pub mod scorer;
pub mod ranker;
