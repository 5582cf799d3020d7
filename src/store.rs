//! Document store: persisted metadata and extracted text for control
//! documents.
//!
//! Documents are append-only within a run. Every fetch that feeds matching
//! returns the text paired with its document id, so downstream stages never
//! have to re-derive the id from content.

use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::models::{ControlText, Document, DEFAULT_BRANCH};

/// Persistence failure in the document or result store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage operation failed: {0}")]
    Db(#[from] sqlx::Error),
    #[error("failed to stat stored file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Persist a document's metadata and extracted text, returning its id.
///
/// File size (KB) and file type (lowercased extension) are computed from the
/// stored file. Callers must not pass blank text — ingestion filters empty
/// extractions before saving. A duplicate extracted text (same SHA-256) is
/// saved but logged, since identical texts make results ambiguous to human
/// reviewers.
pub async fn save_document(
    pool: &SqlitePool,
    company: &str,
    branch: Option<&str>,
    filename: &str,
    stored_path: &Path,
    text: &str,
) -> Result<i64, StorageError> {
    let metadata = std::fs::metadata(stored_path).map_err(|source| StorageError::Io {
        path: stored_path.display().to_string(),
        source,
    })?;
    let file_size_kb = (metadata.len() / 1024) as i64;

    let file_type = stored_path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let text_hash = hash_text(text);

    let duplicates: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE text_hash = ?")
            .bind(&text_hash)
            .fetch_one(pool)
            .await?;
    if duplicates > 0 {
        warn!(
            filename = %filename,
            "document text is identical to {} already-stored document(s)", duplicates
        );
    }

    let now = chrono::Utc::now().timestamp();

    let result = sqlx::query(
        r#"
        INSERT INTO documents (
            company_name, branch_location, original_filename, stored_path,
            uploaded_at, extracted_text, text_hash, file_size_kb, file_type
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(company)
    .bind(branch.unwrap_or(DEFAULT_BRANCH))
    .bind(filename)
    .bind(stored_path.display().to_string())
    .bind(now)
    .bind(text)
    .bind(&text_hash)
    .bind(file_size_kb)
    .bind(&file_type)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Fetch all control texts with their document ids, in insertion order.
///
/// Only documents whose extracted text is non-null and non-blank after
/// trimming are returned; optionally filtered by company.
pub async fn fetch_control_texts(
    pool: &SqlitePool,
    company: Option<&str>,
) -> Result<Vec<ControlText>, StorageError> {
    let rows = match company {
        Some(name) => {
            sqlx::query(
                "SELECT id, extracted_text FROM documents \
                 WHERE extracted_text IS NOT NULL AND company_name = ? ORDER BY id",
            )
            .bind(name)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT id, extracted_text FROM documents \
                 WHERE extracted_text IS NOT NULL ORDER BY id",
            )
            .fetch_all(pool)
            .await?
        }
    };

    let controls: Vec<ControlText> = rows
        .iter()
        .filter_map(|row| {
            let text: String = row.get("extracted_text");
            if text.trim().is_empty() {
                return None;
            }
            Some(ControlText {
                document_id: row.get("id"),
                text,
            })
        })
        .collect();

    Ok(controls)
}

/// Fetch a company's documents, newest first.
///
/// Exact-match filter on branch when given.
pub async fn fetch_documents(
    pool: &SqlitePool,
    company: &str,
    branch: Option<&str>,
) -> Result<Vec<Document>, StorageError> {
    let rows = match branch {
        Some(b) => {
            sqlx::query(
                "SELECT id, company_name, branch_location, original_filename, stored_path, \
                        uploaded_at, extracted_text, file_size_kb, file_type \
                 FROM documents WHERE company_name = ? AND branch_location = ? \
                 ORDER BY uploaded_at DESC, id DESC",
            )
            .bind(company)
            .bind(b)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT id, company_name, branch_location, original_filename, stored_path, \
                        uploaded_at, extracted_text, file_size_kb, file_type \
                 FROM documents WHERE company_name = ? \
                 ORDER BY uploaded_at DESC, id DESC",
            )
            .bind(company)
            .fetch_all(pool)
            .await?
        }
    };

    let documents: Vec<Document> = rows
        .iter()
        .map(|row| Document {
            id: row.get("id"),
            company_name: row.get("company_name"),
            branch_location: row.get("branch_location"),
            original_filename: row.get("original_filename"),
            stored_path: row.get("stored_path"),
            uploaded_at: row.get("uploaded_at"),
            extracted_text: row.get("extracted_text"),
            file_size_kb: row.get("file_size_kb"),
            file_type: row.get("file_type"),
        })
        .collect();

    Ok(documents)
}

fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
