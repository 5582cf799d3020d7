//! Regulation catalog loading and validation.
//!
//! The catalog is a JSON mapping of regulation name to description plus
//! clause map. Loading is fail-soft: a malformed catalog logs a warning and
//! yields an empty catalog, which callers must treat as a valid (degenerate)
//! outcome. A missing catalog file is seeded with a small default set so
//! subsequent loads are stable.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::SystemTime;
use thiserror::Error;
use tracing::warn;

/// One regulatory framework: a description and its clauses keyed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regulation {
    pub description: String,
    pub clauses: BTreeMap<String, String>,
}

/// Mapping from regulation name to its entry.
///
/// BTreeMap iteration order is the canonical clause flattening order, which
/// makes tie-breaks during ranking deterministic across loads.
pub type RegulationCatalog = BTreeMap<String, Regulation>;

/// One clause from the flattened catalog, carrying its regulation context.
#[derive(Debug, Clone)]
pub struct ClauseRef {
    pub regulation: String,
    pub regulation_description: String,
    pub clause_id: String,
    pub text: String,
}

/// Structural validation failure for a regulation source.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog root must be a JSON object")]
    NotAnObject,
    #[error("regulation '{regulation}' must be a JSON object")]
    EntryNotAnObject { regulation: String },
    #[error("regulation '{regulation}' is missing required field '{field}'")]
    MissingField {
        regulation: String,
        field: &'static str,
    },
    #[error("regulation '{regulation}': 'clauses' must be a mapping of clause id to text")]
    ClausesNotAMapping { regulation: String },
    #[error("regulation '{regulation}' has an empty clause id")]
    EmptyClauseId { regulation: String },
    #[error("regulation '{regulation}', clause '{clause_id}': clause text must be a string")]
    ClauseNotAString {
        regulation: String,
        clause_id: String,
    },
}

/// Load the regulation catalog from `path`.
///
/// Missing file: the default catalog is written to `path` first, so the next
/// load reads the same data. Malformed content: logged and recovered to an
/// empty catalog. A source older than `stale_after_days` logs a non-fatal
/// staleness warning. Only I/O failures propagate as errors.
pub fn load(path: &Path, stale_after_days: i64) -> Result<RegulationCatalog> {
    if !path.exists() {
        seed_default(path)?;
    }

    check_staleness(path, stale_after_days);

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog: {}", path.display()))?;

    let value: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "catalog is not valid JSON; using empty catalog");
            return Ok(RegulationCatalog::new());
        }
    };

    if let Err(e) = validate(&value) {
        warn!(path = %path.display(), error = %e, "catalog failed validation; using empty catalog");
        return Ok(RegulationCatalog::new());
    }

    // Validation guarantees the shape, so this deserialize cannot fail.
    let catalog: RegulationCatalog = serde_json::from_value(value)
        .with_context(|| format!("Failed to deserialize catalog: {}", path.display()))?;

    Ok(catalog)
}

/// Validate the raw JSON structure of a regulation source.
///
/// Every top-level entry must be an object with a string `description` and a
/// `clauses` mapping of non-empty clause ids to string texts.
pub fn validate(value: &serde_json::Value) -> Result<(), CatalogError> {
    let root = value.as_object().ok_or(CatalogError::NotAnObject)?;

    for (name, entry) in root {
        let entry = entry
            .as_object()
            .ok_or_else(|| CatalogError::EntryNotAnObject {
                regulation: name.clone(),
            })?;

        match entry.get("description") {
            Some(d) if d.is_string() => {}
            _ => {
                return Err(CatalogError::MissingField {
                    regulation: name.clone(),
                    field: "description",
                })
            }
        }

        let clauses = match entry.get("clauses") {
            Some(c) => c,
            None => {
                return Err(CatalogError::MissingField {
                    regulation: name.clone(),
                    field: "clauses",
                })
            }
        };

        let clauses = clauses
            .as_object()
            .ok_or_else(|| CatalogError::ClausesNotAMapping {
                regulation: name.clone(),
            })?;

        for (clause_id, text) in clauses {
            if clause_id.trim().is_empty() {
                return Err(CatalogError::EmptyClauseId {
                    regulation: name.clone(),
                });
            }
            if !text.is_string() {
                return Err(CatalogError::ClauseNotAString {
                    regulation: name.clone(),
                    clause_id: clause_id.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Flatten the catalog into the fixed ordered clause list used for scoring.
///
/// The order (regulation name, then clause id) is the tie-break order during
/// ranking: on equal scores the earlier clause wins.
pub fn flatten(catalog: &RegulationCatalog) -> Vec<ClauseRef> {
    let mut clauses = Vec::new();
    for (name, regulation) in catalog {
        for (clause_id, text) in &regulation.clauses {
            clauses.push(ClauseRef {
                regulation: name.clone(),
                regulation_description: regulation.description.clone(),
                clause_id: clause_id.clone(),
                text: text.clone(),
            });
        }
    }
    clauses
}

/// The sample catalog written when no regulation source exists yet.
pub fn default_catalog() -> RegulationCatalog {
    let mut catalog = RegulationCatalog::new();

    catalog.insert(
        "GDPR".to_string(),
        Regulation {
            description: "General Data Protection Regulation (EU)".to_string(),
            clauses: BTreeMap::from([
                (
                    "GDPR_1".to_string(),
                    "Personal data must be processed lawfully, fairly and transparently."
                        .to_string(),
                ),
                (
                    "GDPR_2".to_string(),
                    "Data must be collected for specified, explicit and legitimate purposes."
                        .to_string(),
                ),
            ]),
        },
    );

    catalog.insert(
        "DPDP".to_string(),
        Regulation {
            description: "Digital Personal Data Protection Act (India)".to_string(),
            clauses: BTreeMap::from([
                (
                    "DPDP_1".to_string(),
                    "Personal data can be processed only for lawful purpose.".to_string(),
                ),
                (
                    "DPDP_2".to_string(),
                    "Data fiduciaries must ensure accuracy and completeness of data.".to_string(),
                ),
            ]),
        },
    );

    catalog.insert(
        "HIPAA".to_string(),
        Regulation {
            description: "Health Insurance Portability and Accountability Act (US)".to_string(),
            clauses: BTreeMap::from([
                (
                    "HIPAA_1".to_string(),
                    "Covered entities must safeguard protected health information against unauthorized disclosure."
                        .to_string(),
                ),
                (
                    "HIPAA_2".to_string(),
                    "Access to protected health information must be limited to the minimum necessary."
                        .to_string(),
                ),
            ]),
        },
    );

    catalog
}

fn seed_default(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(&default_catalog())?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write default catalog: {}", path.display()))?;

    Ok(())
}

fn check_staleness(path: &Path, stale_after_days: i64) {
    let modified = std::fs::metadata(path).and_then(|m| m.modified());
    let Ok(modified) = modified else {
        return;
    };

    let age_secs = SystemTime::now()
        .duration_since(modified)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    if age_secs > stale_after_days * 86_400 {
        warn!(
            path = %path.display(),
            age_days = age_secs / 86_400,
            "regulation catalog has not been updated in over {} days",
            stale_after_days
        );
    }
}
