pub mod backend;
pub mod executor;
pub mod facets;
pub mod fuzzy;
pub mod highlight;
pub mod request;
pub mod results;
