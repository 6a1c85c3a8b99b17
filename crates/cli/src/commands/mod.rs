pub mod chat;
pub mod config_cmd;
pub mod corpus;

use std::path::{Path, PathBuf};

use docent_config::AppConfig;

/// Load config from `path` with env overrides, then apply command-line flags.
///
/// Flags win over both the file and the environment, and the result is
/// validated again so an out-of-range flag fails before any work starts.
pub fn load_config(
    path: &Path,
    corpus: Option<PathBuf>,
    context_limit: Option<usize>,
) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config =
        AppConfig::load_with_overrides(path).map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(corpus) = corpus {
        config.retrieval.corpus_path = corpus;
    }
    if let Some(limit) = context_limit {
        config.retrieval.context_limit = limit;
    }

    config.validate()?;
    Ok(config)
}
