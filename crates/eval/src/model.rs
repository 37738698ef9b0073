//! Per-tag-bundle model building: one formal context and one cluster set
//! for every tag bundle seen in training.

use std::collections::BTreeMap;
use std::time::Instant;

use rand::Rng;
use tracing::debug;

use morph_core::cluster::deterministic_clusters;
use morph_core::edits::edits_between;
use morph_core::fca::{FormalContext, Implication};
use morph_core::horn::pac_basis;
use morph_core::ostia::Ostia;

/// How lemma clusters are derived from a concept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClusterKind {
    /// PAC implication basis via HORN1.
    Pac { epsilon: f64, delta: f64 },
    /// Group lemmas by identical edit-token sets.
    Deterministic,
}

/// The trained model for one tag bundle: the concept, its clusters, and an
/// identity transducer per cluster for path scoring.
pub struct TagModel {
    pub concept: FormalContext,
    pub clusters: Vec<Implication>,
    pub machines: Vec<Ostia>,
}

/// Build a concept from the word pairs of one tag bundle.
pub fn concept_from_pairs(pairs: &[(String, String)]) -> FormalContext {
    let mut concept = FormalContext::new();
    for (source, target) in pairs {
        if source.contains('*') || target.contains('*') {
            continue;
        }
        for edit in edits_between(source, target) {
            concept.add_relation(edit, source.clone());
        }
    }
    concept
}

/// Build the per-tag models for a whole training set.
///
/// Every cluster's word set gets its own identity transducer up front, so
/// the test loop scores against prebuilt machines.
pub fn build_tag_models<R: Rng>(
    pairs_by_tag: &BTreeMap<String, Vec<(String, String)>>,
    kind: ClusterKind,
    mut rng: R,
) -> BTreeMap<String, TagModel> {
    let mut models = BTreeMap::new();
    for (tag, pairs) in pairs_by_tag {
        let concept = concept_from_pairs(pairs);
        concept.trace_summary();
        let clusters = if concept.objects().is_empty() {
            Vec::new()
        } else {
            let start = Instant::now();
            let clusters: Vec<Implication> = match kind {
                ClusterKind::Pac { epsilon, delta } => {
                    pac_basis(&concept, epsilon, delta, &mut rng)
                        .into_iter()
                        .collect()
                }
                ClusterKind::Deterministic => deterministic_clusters(&concept),
            };
            debug!(
                tag = tag.as_str(),
                clusters = clusters.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "clustered tag bundle"
            );
            clusters
        };
        let machines = clusters
            .iter()
            .map(|cluster| Ostia::from_words(&cluster.conclusion))
            .collect();
        models.insert(
            tag.clone(),
            TagModel {
                concept,
                clusters,
                machines,
            },
        );
    }
    models
}
