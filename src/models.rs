//! Core data models used throughout Compliance Checkmate.
//!
//! These types represent the documents, control texts, and scored matches
//! that flow through the ingestion and matching pipeline.

use serde::Serialize;

/// Branch used when a document is ingested without an explicit branch.
pub const DEFAULT_BRANCH: &str = "Headquarters";

/// Control document metadata stored in SQLite.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Document {
    pub id: i64,
    pub company_name: String,
    pub branch_location: String,
    pub original_filename: String,
    pub stored_path: String,
    pub uploaded_at: i64,
    pub extracted_text: Option<String>,
    pub file_size_kb: i64,
    pub file_type: String,
}

/// A control text paired with the id of the document it came from.
///
/// The id travels with the text through scoring and persistence, so a
/// match is never correlated back to its document by content.
#[derive(Debug, Clone)]
pub struct ControlText {
    pub document_id: i64,
    pub text: String,
}

/// One clause matched against a control, with its similarity score.
#[derive(Debug, Clone, Serialize)]
pub struct ClauseMatch {
    pub regulation: String,
    pub regulation_description: String,
    pub clause_id: String,
    pub clause_text: String,
    pub similarity_score: f32,
}

/// Ranked matches for a single control text, highest score first.
#[derive(Debug, Clone, Serialize)]
pub struct MatchSet {
    pub document_id: i64,
    pub control_text: String,
    pub matches: Vec<ClauseMatch>,
}

/// A persisted match row, as read back from the result store.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct StoredMatch {
    pub document_id: i64,
    pub regulation_name: String,
    pub clause_id: String,
    pub clause_text: String,
    pub similarity_score: f32,
    pub processed_at: i64,
}

/// A low-scoring match joined with its document, for gap reporting.
#[derive(Debug, Clone)]
pub struct GapRow {
    pub document_id: i64,
    pub original_filename: String,
    pub company_name: String,
    pub regulation_name: String,
    pub clause_id: String,
    pub similarity_score: f32,
}
