pub mod striped;

pub use striped::{FileRegistration, Occurrence, SearchIndex, DEFAULT_BUCKETS};
