//! `docent corpus` — Build and check corpus files.

use std::path::Path;

use docent_config::AppConfig;
use docent_retrieval::{build_corpus, load_corpus, load_records, save_corpus, verify_hashes};

pub async fn build(
    config: &AppConfig,
    input: &Path,
    output: &Path,
    batch_size: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = load_records(input)?;
    println!(
        "Embedding {} records with {}...",
        records.len(),
        config.retrieval.embedding_model
    );

    let provider = docent_providers::build_from_config(config)?;
    let corpus = build_corpus(
        provider.as_ref(),
        &config.retrieval.embedding_model,
        records,
        batch_size,
    )
    .await?;

    save_corpus(output, corpus.documents())?;
    println!(
        "Wrote {} documents ({} dimensions) to {}",
        corpus.len(),
        corpus.dimension(),
        output.display()
    );
    Ok(())
}

pub fn check(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let corpus = load_corpus(path)?;
    let report = verify_hashes(&corpus);

    println!("Corpus:        {}", path.display());
    println!("Documents:     {}", corpus.len());
    println!("Dimension:     {}", corpus.dimension());
    println!("Verified:      {}", report.verified);
    if !report.missing.is_empty() {
        println!("No hash:       {:?}", report.missing);
    }
    if !report.unverifiable.is_empty() {
        println!("Other digest:  {:?}", report.unverifiable);
    }

    if report.is_clean() {
        println!("OK");
        Ok(())
    } else {
        println!("Mismatched:    {:?}", report.mismatched);
        Err(format!("{} document(s) changed since the corpus was built", report.mismatched.len()).into())
    }
}
