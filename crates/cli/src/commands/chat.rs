//! `docent chat` — Interactive or single-message grounded chat.

use std::sync::Arc;

use docent_agent::{ChatSession, SessionSettings, TurnOutcome, counter_from_config};
use docent_channels::{ConsoleInput, ConsoleOutput};
use docent_config::AppConfig;
use docent_retrieval::{Retriever, load_corpus, verify_hashes};
use tracing::warn;

pub async fn run(config: AppConfig, message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    // Fail before loading anything if the key is missing
    if !config.has_api_key() && config.provider == "openai" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    DOCENT_API_KEY=sk-...   (takes priority)");
        eprintln!("    OPENAI_API_KEY=sk-...");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let corpus_path = &config.retrieval.corpus_path;
    let corpus = load_corpus(corpus_path)
        .map_err(|e| format!("Failed to load corpus: {e}"))?;

    let report = verify_hashes(&corpus);
    if !report.is_clean() {
        warn!(
            path = %corpus_path.display(),
            mismatched = ?report.mismatched,
            "Corpus text does not match stored hashes; run `docent corpus check`"
        );
    }

    let documents = corpus.len();
    let retriever = Arc::new(
        Retriever::new(Arc::new(corpus), config.retrieval.context_limit)
            .with_metric(config.retrieval.metric)
            .with_policy(config.retrieval.policy),
    );
    let provider = docent_providers::build_from_config(&config)?;
    let counter = counter_from_config(&config);
    let mut session = ChatSession::new(
        SessionSettings::from_config(&config),
        retriever,
        provider,
        counter,
    );

    if let Some(msg) = message {
        // Single message mode
        if let TurnOutcome::Reply { text, budget, .. } = session.handle_input(&msg).await? {
            if !budget.fits {
                eprintln!(
                    "  Warning: this turn needs {} tokens, over the budget of {}",
                    budget.tokens, config.budget.max_tokens
                );
            }
            println!("{text}");
        }
    } else {
        // Interactive mode
        println!("{}", config.persona.greeting);
        eprintln!(
            "  Corpus: {} ({} documents) | Model: {} | Type 'exit' to quit.",
            corpus_path.display(),
            documents,
            config.chat_model
        );

        let mut input = ConsoleInput::stdin();
        let mut output = ConsoleOutput::stdio();
        session.run(&mut input, &mut output).await?;
    }

    Ok(())
}
