//! # Docent Core
//!
//! Domain types, collaborator traits, and error definitions for the Docent
//! grounded chat runtime. This crate has **no runtime dependencies** beyond
//! serialization and error derives; it defines the model every other crate
//! implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (embedding model, completion model, console)
//! is a trait here. Implementations live in their own crates, which keeps
//! the turn pipeline testable with scripted stubs.

pub mod channel;
pub mod corpus;
pub mod error;
pub mod message;
pub mod provider;
pub mod retrieval;

// Re-export key types at crate root for ergonomics
pub use channel::{BufferedOutput, InputSource, OutputSink};
pub use corpus::{CORPUS_EMBEDDING_KEY, Corpus, Document};
pub use error::{ChannelError, CorpusError, Error, ProviderError};
pub use message::{Role, SessionId, Transcript, Turn};
pub use provider::{EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, Usage};
pub use retrieval::{ContextPolicy, DistanceMetric};
