//! Ingestion orchestration: files on disk → extracted text → document store.
//!
//! Each file is processed independently: an extraction or storage failure
//! aborts that document only and the batch continues. Documents whose text
//! is empty after trimming are never persisted as processed.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::config::Config;
use crate::db;
use crate::extract;
use crate::store;

pub async fn run_ingest(
    config: &Config,
    paths: &[PathBuf],
    company: &str,
    branch: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let files = collect_files(paths)?;

    if dry_run {
        println!("ingest (dry-run)");
        println!("  files found: {}", files.len());
        for file in &files {
            println!("  - {}", file.display());
        }
        return Ok(());
    }

    let pool = db::connect(config).await?;

    let mut saved = 0u64;
    let mut skipped_empty = 0u64;
    let mut failed = 0u64;

    for file in &files {
        let text = match extract::extract_text(file) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %file.display(), error = %e, "extraction failed; skipping document");
                failed += 1;
                continue;
            }
        };

        if text.is_empty() {
            warn!(path = %file.display(), "no extractable text; skipping document");
            skipped_empty += 1;
            continue;
        }

        let filename = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match store::save_document(&pool, company, branch.as_deref(), &filename, file, &text).await
        {
            Ok(document_id) => {
                println!("  saved {} (document {})", filename, document_id);
                saved += 1;
            }
            Err(e) => {
                warn!(path = %file.display(), error = %e, "save failed; skipping document");
                failed += 1;
            }
        }
    }

    println!("ingest");
    println!("  files found: {}", files.len());
    println!("  documents saved: {}", saved);
    println!("  skipped (empty text): {}", skipped_empty);
    println!("  failed: {}", failed);
    println!("ok");

    pool.close().await;
    Ok(())
}

/// Expand the given paths into a sorted list of supported files.
///
/// Files are taken as-is (unsupported extensions surface as extraction
/// errors so the user sees them); directories are walked recursively and
/// filtered to the supported formats.
fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let include_set = supported_globs()?;
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path) {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let rel = entry.path().strip_prefix(path).unwrap_or(entry.path());
                if include_set.is_match(rel.to_string_lossy().as_ref()) {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else {
            files.push(path.clone());
        }
    }

    files.sort();
    Ok(files)
}

fn supported_globs() -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in ["**/*.pdf", "**/*.docx", "**/*.txt"] {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn directories_are_walked_and_filtered() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "alpha").unwrap();
        fs::write(tmp.path().join("b.md"), "ignored").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("sub").join("c.docx"), "beta").unwrap();

        let files = collect_files(&[tmp.path().to_path_buf()]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "c.docx"]);
    }

    #[test]
    fn explicit_files_are_kept_as_given() {
        let tmp = TempDir::new().unwrap();
        let odd = tmp.path().join("policy.markdown");
        fs::write(&odd, "text").unwrap();

        let files = collect_files(&[odd.clone()]).unwrap();
        assert_eq!(files, vec![odd]);
    }
}
