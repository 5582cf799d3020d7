//! Result store: persisted (document, regulation, clause, score) tuples.
//!
//! Append-only. Each match set carries the document id it was scored for;
//! a set whose id no longer resolves to a stored document is skipped with a
//! logged warning rather than failing the batch.

use sqlx::{Row, SqlitePool};
use tracing::warn;

use crate::models::{GapRow, MatchSet, StoredMatch};
use crate::store::StorageError;

/// Persist match sets, one row per match, returning the rows inserted.
///
/// Rows for one set are written in a single transaction. Sets whose
/// document id does not exist are skipped (logged, never an error).
pub async fn persist_matches(
    pool: &SqlitePool,
    match_sets: &[MatchSet],
) -> Result<u64, StorageError> {
    let mut inserted = 0u64;

    for set in match_sets {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE id = ?")
            .bind(set.document_id)
            .fetch_one(pool)
            .await?;

        if exists == 0 {
            warn!(
                document_id = set.document_id,
                "skipping match set: no stored document with this id"
            );
            continue;
        }

        let now = chrono::Utc::now().timestamp();
        let mut tx = pool.begin().await?;

        for m in &set.matches {
            sqlx::query(
                r#"
                INSERT INTO match_results (
                    document_id, regulation_name, clause_id, clause_text,
                    similarity_score, processed_at
                ) VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(set.document_id)
            .bind(&m.regulation)
            .bind(&m.clause_id)
            .bind(&m.clause_text)
            .bind(m.similarity_score)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            inserted += 1;
        }

        tx.commit().await?;
    }

    Ok(inserted)
}

/// Fetch persisted matches for one document, highest score first.
pub async fn fetch_results(
    pool: &SqlitePool,
    document_id: i64,
) -> Result<Vec<StoredMatch>, StorageError> {
    let rows = sqlx::query(
        "SELECT document_id, regulation_name, clause_id, clause_text, \
                similarity_score, processed_at \
         FROM match_results WHERE document_id = ? \
         ORDER BY similarity_score DESC, id ASC",
    )
    .bind(document_id)
    .fetch_all(pool)
    .await?;

    let matches: Vec<StoredMatch> = rows
        .iter()
        .map(|row| StoredMatch {
            document_id: row.get("document_id"),
            regulation_name: row.get("regulation_name"),
            clause_id: row.get("clause_id"),
            clause_text: row.get("clause_text"),
            similarity_score: row.get("similarity_score"),
            processed_at: row.get("processed_at"),
        })
        .collect();

    Ok(matches)
}

/// Fetch matches scoring below `threshold`, weakest first.
///
/// These are the coverage gaps: control/clause pairs where the best the
/// matcher could find is still a weak signal.
pub async fn fetch_gaps(pool: &SqlitePool, threshold: f32) -> Result<Vec<GapRow>, StorageError> {
    let rows = sqlx::query(
        "SELECT m.document_id, d.original_filename, d.company_name, \
                m.regulation_name, m.clause_id, m.similarity_score \
         FROM match_results m \
         JOIN documents d ON d.id = m.document_id \
         WHERE m.similarity_score < ? \
         ORDER BY m.similarity_score ASC, m.id ASC",
    )
    .bind(threshold)
    .fetch_all(pool)
    .await?;

    let gaps: Vec<GapRow> = rows
        .iter()
        .map(|row| GapRow {
            document_id: row.get("document_id"),
            original_filename: row.get("original_filename"),
            company_name: row.get("company_name"),
            regulation_name: row.get("regulation_name"),
            clause_id: row.get("clause_id"),
            similarity_score: row.get("similarity_score"),
        })
        .collect();

    Ok(gaps)
}
