//! Embedding and completion providers for Docent.
//!
//! All providers implement the `docent_core::Provider` trait.
//! The router builds the configured provider from `AppConfig`.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::build_from_config;
