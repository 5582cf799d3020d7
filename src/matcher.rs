//! Ranking of control texts against the flattened clause corpus.
//!
//! The catalog is flattened once per run into a fixed ordered clause list;
//! that order doubles as the tie-break order when similarity scores are
//! equal (first-seen wins). Blank control texts are skipped entirely, so
//! callers must not assume one match set per input control.

use anyhow::Result;

use crate::catalog::{self, RegulationCatalog};
use crate::embedding::EmbeddingProvider;
use crate::models::{ClauseMatch, ControlText, MatchSet};
use crate::scorer;

pub struct Matcher<'a> {
    provider: &'a dyn EmbeddingProvider,
    top_k: usize,
}

impl<'a> Matcher<'a> {
    pub fn new(provider: &'a dyn EmbeddingProvider, top_k: usize) -> Self {
        Self { provider, top_k }
    }

    /// Match each non-blank control against every clause in the catalog.
    ///
    /// Clause embeddings are computed once for the whole run. Each result's
    /// matches are the top `top_k` clauses by descending score; a catalog
    /// with fewer clauses yields fewer matches. An empty catalog yields one
    /// empty match set per non-blank control.
    pub fn match_controls(
        &self,
        controls: &[ControlText],
        catalog: &RegulationCatalog,
    ) -> Result<Vec<MatchSet>> {
        let clauses = catalog::flatten(catalog);
        let clause_texts: Vec<String> = clauses.iter().map(|c| c.text.clone()).collect();
        let clause_vectors = self.provider.embed(&clause_texts)?;

        let mut results = Vec::new();

        for control in controls {
            if control.text.trim().is_empty() {
                continue;
            }

            let scores = scorer::score_against(self.provider, &control.text, &clause_vectors)?;

            // Sort indices by score descending; flattened order breaks ties.
            let mut ranked: Vec<usize> = (0..scores.len()).collect();
            ranked.sort_by(|&a, &b| {
                scores[b]
                    .partial_cmp(&scores[a])
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.cmp(&b))
            });
            ranked.truncate(self.top_k);

            let matches: Vec<ClauseMatch> = ranked
                .into_iter()
                .map(|idx| ClauseMatch {
                    regulation: clauses[idx].regulation.clone(),
                    regulation_description: clauses[idx].regulation_description.clone(),
                    clause_id: clauses[idx].clause_id.clone(),
                    clause_text: clauses[idx].text.clone(),
                    similarity_score: scores[idx],
                })
                .collect();

            results.push(MatchSet {
                document_id: control.document_id,
                control_text: control.text.clone(),
                matches,
            });
        }

        Ok(results)
    }
}
