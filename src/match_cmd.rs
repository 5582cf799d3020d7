//! The matching run: stored control texts × regulation catalog → ranked,
//! persisted matches.
//!
//! One run loads the catalog and the embedding model once, scores every
//! non-blank control against the full clause corpus, prints the ranked
//! matches, and persists them keyed by document id.

use anyhow::{bail, Result};

use crate::catalog;
use crate::config::Config;
use crate::db;
use crate::embedding;
use crate::matcher::Matcher;
use crate::models::MatchSet;
use crate::results;
use crate::store;

pub async fn run_match(
    config: &Config,
    company: Option<String>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let catalog = catalog::load(&config.catalog.path, config.catalog.stale_after_days)?;

    let pool = db::connect(config).await?;
    let controls = store::fetch_control_texts(&pool, company.as_deref()).await?;

    if catalog.is_empty() && controls.is_empty() {
        pool.close().await;
        bail!("Nothing to match: the regulation catalog and the document store are both empty.");
    }

    if controls.is_empty() {
        println!("No control documents with extracted text. Run `ccm ingest` first.");
        pool.close().await;
        return Ok(());
    }

    let clause_count: usize = catalog.values().map(|r| r.clauses.len()).sum();

    // Model load and scoring are blocking; keep them off the async executor.
    let embedding_config = config.embedding.clone();
    let top_k = config.matching.top_k;

    let match_sets: Vec<MatchSet> = tokio::task::spawn_blocking(move || {
        let provider = embedding::create_provider(&embedding_config)?;
        let matcher = Matcher::new(provider.as_ref(), top_k);
        matcher.match_controls(&controls, &catalog)
    })
    .await??;

    if json {
        println!("{}", serde_json::to_string_pretty(&match_sets)?);
    } else {
        print_match_sets(&match_sets);
    }

    let persisted = if dry_run {
        0
    } else {
        results::persist_matches(&pool, &match_sets).await?
    };

    if !json {
        println!("match{}", if dry_run { " (dry-run)" } else { "" });
        println!("  controls scored: {}", match_sets.len());
        println!("  clauses in catalog: {}", clause_count);
        if !dry_run {
            println!("  results persisted: {}", persisted);
        }
        println!("ok");
    }

    pool.close().await;
    Ok(())
}

fn print_match_sets(match_sets: &[MatchSet]) {
    for set in match_sets {
        println!(
            "document {} — \"{}\"",
            set.document_id,
            excerpt(&set.control_text, 72)
        );
        if set.matches.is_empty() {
            println!("    (no clauses in catalog)");
        }
        for (i, m) in set.matches.iter().enumerate() {
            println!(
                "    {}. [{:.3}] {} / {}",
                i + 1,
                m.similarity_score,
                m.regulation,
                m.clause_id
            );
            println!("       \"{}\"", excerpt(&m.clause_text, 88));
        }
        println!();
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ");
    let trimmed = cleaned.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_leaves_short_text_alone() {
        assert_eq!(excerpt("short text", 20), "short text");
    }

    #[test]
    fn excerpt_truncates_and_flattens_newlines() {
        let text = "line one\nline two that keeps going for a while";
        let result = excerpt(text, 12);
        assert_eq!(result, "line one lin...");
    }
}
