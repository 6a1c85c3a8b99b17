//! Retrieval for Docent: corpus building and storage, vector ranking, and
//! context selection.

pub mod builder;
pub mod retriever;
pub mod selection;
pub mod store;
pub mod vector;

pub use builder::{SourceRecord, build_corpus, load_records};
pub use retriever::{Retrieval, Retriever};
pub use selection::{build_context_block, select};
pub use store::{HashReport, content_hash, load_corpus, save_corpus, verify_hashes};
pub use vector::{cosine_similarity, distance, l2_distance, rank};
