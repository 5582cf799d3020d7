//! Reporting commands: document listings, persisted results, gap analysis.
//!
//! These read-only views are the CLI surface consumed in place of the
//! original dashboard; external tooling can build on the same queries.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::results;
use crate::store;

/// List a company's documents, newest first.
pub async fn run_documents(config: &Config, company: &str, branch: Option<String>) -> Result<()> {
    let pool = db::connect(config).await?;
    let documents = store::fetch_documents(&pool, company, branch.as_deref()).await?;

    if documents.is_empty() {
        println!("No documents found.");
        pool.close().await;
        return Ok(());
    }

    for doc in &documents {
        println!(
            "{}. {} ({} KB, {})",
            doc.id, doc.original_filename, doc.file_size_kb, doc.file_type
        );
        println!("    company: {} / {}", doc.company_name, doc.branch_location);
        println!("    uploaded: {}", format_ts(doc.uploaded_at));
        println!("    path: {}", doc.stored_path);
        println!();
    }

    pool.close().await;
    Ok(())
}

/// Show persisted matches for one document, highest score first.
pub async fn run_results(config: &Config, document_id: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let matches = results::fetch_results(&pool, document_id).await?;

    if matches.is_empty() {
        println!("No results for document {}.", document_id);
        pool.close().await;
        return Ok(());
    }

    println!("--- Results for document {} ---", document_id);
    for (i, m) in matches.iter().enumerate() {
        println!(
            "{}. [{:.3}] {} / {}",
            i + 1,
            m.similarity_score,
            m.regulation_name,
            m.clause_id
        );
        println!("    \"{}\"", m.clause_text);
        println!("    processed: {}", format_ts(m.processed_at));
    }

    pool.close().await;
    Ok(())
}

/// List matches below the gap threshold, weakest first.
///
/// The threshold is presentation policy, not a matching invariant: it comes
/// from `[matching] gap_threshold` and can be overridden per invocation.
pub async fn run_gaps(config: &Config, threshold_override: Option<f32>) -> Result<()> {
    let threshold = threshold_override.unwrap_or(config.matching.gap_threshold);
    if !(0.0..=1.0).contains(&threshold) {
        anyhow::bail!("Gap threshold must be in [0.0, 1.0]");
    }

    let pool = db::connect(config).await?;
    let gaps = results::fetch_gaps(&pool, threshold).await?;

    if gaps.is_empty() {
        println!("No gaps below threshold {:.2}.", threshold);
        pool.close().await;
        return Ok(());
    }

    println!("--- Gaps (score < {:.2}) ---", threshold);
    for gap in &gaps {
        println!(
            "[{:.3}] {} / {} — document {} ({}, {})",
            gap.similarity_score,
            gap.regulation_name,
            gap.clause_id,
            gap.document_id,
            gap.original_filename,
            gap.company_name
        );
    }
    println!("{} gap(s).", gaps.len());

    pool.close().await;
    Ok(())
}

/// Show the loaded regulation catalog.
pub async fn run_catalog_show(config: &Config) -> Result<()> {
    let catalog = crate::catalog::load(&config.catalog.path, config.catalog.stale_after_days)?;

    if catalog.is_empty() {
        println!("Catalog is empty.");
        return Ok(());
    }

    for (name, regulation) in &catalog {
        println!("{} — {}", name, regulation.description);
        for (clause_id, text) in &regulation.clauses {
            println!("    {}: {}", clause_id, text);
        }
        println!();
    }

    Ok(())
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}
