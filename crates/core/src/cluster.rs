//! Deterministic clustering: the non-learning alternative to the PAC basis.

use std::collections::BTreeMap;

use crate::edits::EditToken;
use crate::fca::{FormalContext, Implication};

/// Group lemmas by their exact edit-operation sets.
///
/// Groups are ordered by descending size (ties keep ascending operation-key
/// order); each becomes an implication from the lemma that introduced the
/// group to the whole sorted group.
pub fn deterministic_clusters(context: &FormalContext) -> Vec<Implication> {
    let mut groups: BTreeMap<Vec<EditToken>, Vec<String>> = BTreeMap::new();
    for lemma in context.attributes_first_seen() {
        let ops = context.objects_of(lemma);
        groups.entry(ops).or_default().push(lemma.clone());
    }

    let mut ordered: Vec<Vec<String>> = groups.into_values().collect();
    ordered.sort_by_key(|group| std::cmp::Reverse(group.len()));

    ordered
        .into_iter()
        .map(|group| Implication::new([group[0].clone()], group))
        .collect()
}
