use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Create documents table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_name TEXT NOT NULL,
            branch_location TEXT NOT NULL DEFAULT 'Headquarters',
            original_filename TEXT NOT NULL,
            stored_path TEXT NOT NULL,
            uploaded_at INTEGER NOT NULL,
            extracted_text TEXT,
            text_hash TEXT,
            file_size_kb INTEGER NOT NULL,
            file_type TEXT NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create match_results table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS match_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            document_id INTEGER NOT NULL,
            regulation_name TEXT NOT NULL,
            clause_id TEXT NOT NULL,
            clause_text TEXT NOT NULL,
            similarity_score REAL NOT NULL,
            processed_at INTEGER NOT NULL,
            FOREIGN KEY (document_id) REFERENCES documents(id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_company ON documents(company_name)")
        .execute(&pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_documents_uploaded_at ON documents(uploaded_at DESC)",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_match_results_document_id ON match_results(document_id)",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_match_results_score ON match_results(similarity_score)",
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}
