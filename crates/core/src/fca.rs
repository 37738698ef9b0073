//! Formal Concept Analysis over a bipartite relation between edit tokens
//! (objects) and lemmas (attributes).
//!
//! The relation is stored as two sorted adjacency maps so every enumeration
//! is deterministic and reproducible across runs.

use std::collections::{BTreeMap, BTreeSet};

use crate::edits::EditToken;

/// A set of attributes (lemmas).
pub type AttrSet = BTreeSet<String>;
/// A set of objects (edit tokens).
pub type ObjectSet = BTreeSet<EditToken>;

/// An attribute implication `premise -> conclusion`, both sides sorted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Implication {
    pub premise: Vec<String>,
    pub conclusion: Vec<String>,
}

impl Implication {
    /// Build an implication, sorting and deduplicating both sides.
    pub fn new<P, C>(premise: P, conclusion: C) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let premise: BTreeSet<String> = premise.into_iter().map(Into::into).collect();
        let conclusion: BTreeSet<String> = conclusion.into_iter().map(Into::into).collect();
        Implication {
            premise: premise.into_iter().collect(),
            conclusion: conclusion.into_iter().collect(),
        }
    }

    /// An attribute set respects `premise -> conclusion` iff it does not
    /// contain the whole premise, or contains the whole conclusion.
    pub fn respected_by(&self, attrs: &AttrSet) -> bool {
        !self.premise.iter().all(|a| attrs.contains(a))
            || self.conclusion.iter().all(|a| attrs.contains(a))
    }
}

/// A set of implications.
pub type Basis = BTreeSet<Implication>;

/// An attribute set is a model of a set of implications iff it respects
/// every one of them.
pub fn is_model<'a, I>(attrs: &AttrSet, implications: I) -> bool
where
    I: IntoIterator<Item = &'a Implication>,
{
    implications.into_iter().all(|imp| imp.respected_by(attrs))
}

/// The implications of `basis` violated by `attrs`.
pub fn violated_by(basis: &Basis, attrs: &AttrSet) -> Basis {
    basis
        .iter()
        .filter(|imp| !imp.respected_by(attrs))
        .cloned()
        .collect()
}

/// Replace every violated implication `p -> c` by `p -> c ∩ attrs`, leaving
/// the rest unchanged.
pub fn narrow_conclusions(basis: &Basis, violated: &Basis, attrs: &AttrSet) -> Basis {
    basis
        .iter()
        .map(|imp| {
            if violated.contains(imp) {
                let narrowed = imp.conclusion.iter().filter(|a| attrs.contains(*a)).cloned();
                Implication::new(imp.premise.clone(), narrowed)
            } else {
                imp.clone()
            }
        })
        .collect()
}

/// All subsets of `master` of size 1 and up, enumerated size-ascending and
/// lexicographically within each size.
pub fn all_subsets<T: Clone>(master: &[T]) -> Vec<Vec<T>> {
    let mut subsets = Vec::new();
    for size in 1..=master.len() {
        combinations(master, size, 0, &mut Vec::new(), &mut subsets);
    }
    subsets
}

fn combinations<T: Clone>(
    master: &[T],
    size: usize,
    start: usize,
    current: &mut Vec<T>,
    out: &mut Vec<Vec<T>>,
) {
    if current.len() == size {
        out.push(current.clone());
        return;
    }
    for i in start..master.len() {
        current.push(master[i].clone());
        combinations(master, size, i + 1, current, out);
        current.pop();
    }
}

/// The formal context: which lemmas each edit token was derived from.
///
/// Attribute arrival order is recorded so the deterministic clusterer can
/// name each group after the lemma that introduced it; all enumerations
/// remain sorted.
#[derive(Debug, Clone, Default)]
pub struct FormalContext {
    by_object: BTreeMap<EditToken, AttrSet>,
    by_attribute: BTreeMap<String, ObjectSet>,
    attribute_order: Vec<String>,
}

impl FormalContext {
    pub fn new() -> Self {
        FormalContext::default()
    }

    pub fn add_object(&mut self, object: EditToken) {
        self.by_object.entry(object).or_default();
    }

    pub fn add_attribute(&mut self, attribute: impl Into<String>) {
        let attribute = attribute.into();
        if !self.by_attribute.contains_key(&attribute) {
            self.attribute_order.push(attribute.clone());
        }
        self.by_attribute.entry(attribute).or_default();
    }

    /// Add a relation; idempotent, and both endpoints are added implicitly.
    pub fn add_relation(&mut self, object: EditToken, attribute: impl Into<String>) {
        let attribute = attribute.into();
        self.add_attribute(attribute.clone());
        self.by_object
            .entry(object.clone())
            .or_default()
            .insert(attribute.clone());
        self.by_attribute.entry(attribute).or_default().insert(object);
    }

    pub fn add_relations<I>(&mut self, relations: I)
    where
        I: IntoIterator<Item = (EditToken, String)>,
    {
        for (object, attribute) in relations {
            self.add_relation(object, attribute);
        }
    }

    /// All objects, sorted.
    pub fn objects(&self) -> Vec<EditToken> {
        self.by_object.keys().cloned().collect()
    }

    /// All attributes, sorted.
    pub fn attributes(&self) -> Vec<String> {
        self.by_attribute.keys().cloned().collect()
    }

    /// All attributes in the order they first appeared.
    pub fn attributes_first_seen(&self) -> &[String] {
        &self.attribute_order
    }

    /// The attributes related to one object, sorted.
    pub fn attributes_of(&self, object: &EditToken) -> Vec<String> {
        self.by_object
            .get(object)
            .map(|attrs| attrs.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The objects related to one attribute, sorted.
    pub fn objects_of(&self, attribute: &str) -> Vec<EditToken> {
        self.by_attribute
            .get(attribute)
            .map(|objects| objects.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn relation_count(&self) -> usize {
        self.by_object.values().map(BTreeSet::len).sum()
    }

    /// A' -- the attributes shared by every object in `objects`. The empty
    /// object set yields the full attribute set.
    pub fn intent(&self, objects: &ObjectSet) -> AttrSet {
        let mut iter = objects.iter();
        let Some(first) = iter.next() else {
            return self.by_attribute.keys().cloned().collect();
        };
        let mut shared = self.by_object.get(first).cloned().unwrap_or_default();
        for object in iter {
            let attrs = self.by_object.get(object).cloned().unwrap_or_default();
            shared = shared.intersection(&attrs).cloned().collect();
        }
        shared
    }

    /// B' -- the objects shared by every attribute in `attrs`. The empty
    /// attribute set yields the full object set.
    pub fn extent(&self, attrs: &AttrSet) -> ObjectSet {
        let mut iter = attrs.iter();
        let Some(first) = iter.next() else {
            return self.by_object.keys().cloned().collect();
        };
        let mut shared = self.by_attribute.get(first).cloned().unwrap_or_default();
        for attr in iter {
            let objects = self.by_attribute.get(attr).cloned().unwrap_or_default();
            shared = shared.intersection(&objects).cloned().collect();
        }
        shared
    }

    /// A'' -- closure of an object set.
    pub fn objects_closure(&self, objects: &ObjectSet) -> ObjectSet {
        self.extent(&self.intent(objects))
    }

    /// B'' -- closure of an attribute set.
    pub fn attributes_closure(&self, attrs: &AttrSet) -> AttrSet {
        self.intent(&self.extent(attrs))
    }

    /// An implication is valid in the context iff the premise extent is a
    /// subset of the conclusion extent.
    pub fn valid_implication(&self, imp: &Implication) -> bool {
        let premise_prime = self.extent(&to_attr_set(&imp.premise));
        let conclusion_prime = self.extent(&to_attr_set(&imp.conclusion));
        premise_prime.is_subset(&conclusion_prime)
    }

    /// All attribute subsets equal to their own closure. Exhaustive; only
    /// sensible on small contexts.
    pub fn set_of_intents(&self) -> BTreeSet<Vec<String>> {
        all_subsets(&self.attributes())
            .into_iter()
            .filter(|subset| {
                let set: AttrSet = subset.iter().cloned().collect();
                self.attributes_closure(&set) == set
            })
            .collect()
    }

    /// All attribute subsets closed under the given implications. Exhaustive.
    pub fn models(&self, implications: &Basis) -> BTreeSet<Vec<String>> {
        all_subsets(&self.attributes())
            .into_iter()
            .filter(|subset| {
                let set: AttrSet = subset.iter().cloned().collect();
                is_model(&set, implications)
            })
            .collect()
    }

    /// All valid implications between attribute subsets. Exhaustive.
    pub fn theory(&self) -> Basis {
        let subsets = all_subsets(&self.attributes());
        let mut valid = Basis::new();
        for (i, left) in subsets.iter().enumerate() {
            for right in subsets.iter().skip(i + 1) {
                let forward = Implication::new(left.clone(), right.clone());
                if self.valid_implication(&forward) {
                    valid.insert(forward);
                    continue;
                }
                let backward = Implication::new(right.clone(), left.clone());
                if self.valid_implication(&backward) {
                    valid.insert(backward);
                }
            }
        }
        valid
    }

    /// A set of implications is a basis iff its models are exactly the
    /// intents of the context.
    pub fn is_basis(&self, implications: &Basis) -> bool {
        self.models(implications) == self.set_of_intents()
    }

    /// First implication `p -> c` whose premise is not contained in `attrs`
    /// and whose restriction `attrs ∩ p` is not closed.
    pub fn find_non_member(&self, basis: &Basis, attrs: &AttrSet) -> Option<Implication> {
        for imp in basis {
            let restricted: AttrSet = imp
                .premise
                .iter()
                .filter(|a| attrs.contains(*a))
                .cloned()
                .collect();
            let premise_contained = restricted.len() == imp.premise.len();
            if !premise_contained && self.attributes_closure(&restricted) != restricted {
                return Some(imp.clone());
            }
        }
        None
    }

    /// Drop implications whose conclusion extent is empty or duplicates one
    /// already kept.
    pub fn clean_hypothesis(&self, basis: &Basis) -> Basis {
        let mut seen: BTreeSet<Vec<EditToken>> = BTreeSet::new();
        let mut cleaned = Basis::new();
        for imp in basis {
            let shared: Vec<EditToken> = self
                .extent(&to_attr_set(&imp.conclusion))
                .into_iter()
                .collect();
            if !shared.is_empty() && seen.insert(shared) {
                cleaned.insert(imp.clone());
            }
        }
        cleaned
    }

    /// Trace a brief overview of the context at the most detailed level.
    pub fn trace_summary(&self) {
        tracing::trace!(
            objects = self.by_object.len(),
            attributes = self.by_attribute.len(),
            relations = self.relation_count(),
            "concept overview"
        );
        for object in self.by_object.keys() {
            tracing::trace!("object {} : {:?}", object, self.attributes_of(object));
        }
    }
}

/// Collect a sorted slice of attributes into a set.
pub fn to_attr_set(attrs: &[String]) -> AttrSet {
    attrs.iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ing_context() -> FormalContext {
        let mut ctx = FormalContext::new();
        for lemma in ["walk", "talk", "jump"] {
            ctx.add_relation(EditToken::insert("ing"), lemma);
        }
        ctx.add_relation(EditToken::insert("ed"), "walk");
        ctx.add_relation(EditToken::insert("ed"), "talk");
        ctx
    }

    fn attrs(names: &[&str]) -> AttrSet {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn add_relation_is_idempotent() {
        let mut ctx = FormalContext::new();
        ctx.add_relation(EditToken::insert("ing"), "walk");
        ctx.add_relation(EditToken::insert("ing"), "walk");
        assert_eq!(ctx.relation_count(), 1);
        assert_eq!(ctx.objects().len(), 1);
        assert_eq!(ctx.attributes(), vec!["walk".to_string()]);
    }

    #[test]
    fn intent_of_empty_set_is_all_attributes() {
        let ctx = ing_context();
        let intent = ctx.intent(&ObjectSet::new());
        assert_eq!(intent, attrs(&["jump", "talk", "walk"]));
    }

    #[test]
    fn extent_of_empty_set_is_all_objects() {
        let ctx = ing_context();
        assert_eq!(ctx.extent(&AttrSet::new()).len(), 2);
    }

    #[test]
    fn extent_intersects_attribute_neighborhoods() {
        let ctx = ing_context();
        let shared = ctx.extent(&attrs(&["walk", "jump"]));
        assert_eq!(shared, [EditToken::insert("ing")].into_iter().collect());
        let shared = ctx.extent(&attrs(&["walk", "talk"]));
        assert_eq!(shared.len(), 2);
    }

    #[test]
    fn closure_is_extensive_monotone_idempotent() {
        let ctx = ing_context();
        let sets = [
            attrs(&[]),
            attrs(&["walk"]),
            attrs(&["walk", "talk"]),
            attrs(&["jump"]),
            attrs(&["jump", "talk", "walk"]),
        ];
        for set in &sets {
            let once = ctx.attributes_closure(set);
            // extensive
            assert!(set.is_subset(&once));
            // idempotent
            assert_eq!(ctx.attributes_closure(&once), once);
        }
        // monotone: {walk} ⊆ {walk, jump}
        let small = ctx.attributes_closure(&attrs(&["walk"]));
        let large = ctx.attributes_closure(&attrs(&["walk", "jump"]));
        assert!(small.is_subset(&large));
    }

    #[test]
    fn respected_by_follows_the_definition() {
        let imp = Implication::new(["walk"], ["walk", "talk"]);
        assert!(imp.respected_by(&attrs(&["jump"])));
        assert!(imp.respected_by(&attrs(&["walk", "talk"])));
        assert!(!imp.respected_by(&attrs(&["walk"])));
    }

    #[test]
    fn violated_by_selects_only_broken_implications() {
        let basis: Basis = [
            Implication::new(["walk"], ["talk"]),
            Implication::new(["jump"], ["talk"]),
        ]
        .into_iter()
        .collect();
        let violated = violated_by(&basis, &attrs(&["walk"]));
        assert_eq!(violated.len(), 1);
        assert!(violated.contains(&Implication::new(["walk"], ["talk"])));
    }

    #[test]
    fn narrow_conclusions_intersects_with_the_counterexample() {
        let broken = Implication::new(["walk"], ["talk", "jump"]);
        let basis: Basis = [broken.clone()].into_iter().collect();
        let violated = basis.clone();
        let narrowed = narrow_conclusions(&basis, &violated, &attrs(&["walk", "jump"]));
        assert_eq!(narrowed.len(), 1);
        assert!(narrowed.contains(&Implication::new(["walk"], ["jump"])));
    }

    #[test]
    fn find_non_member_spots_unclosed_restrictions() {
        let ctx = ing_context();
        // walk's closure is {talk, walk}; the restriction {walk} of the
        // premise below is not closed, so the implication is reported.
        let basis: Basis = [Implication::new(["walk", "jump"], ["talk"])]
            .into_iter()
            .collect();
        let found = ctx.find_non_member(&basis, &attrs(&["walk"]));
        assert_eq!(found, Some(Implication::new(["walk", "jump"], ["talk"])));
    }

    #[test]
    fn clean_hypothesis_keeps_distinct_nonempty_extents() {
        let ctx = ing_context();
        let basis: Basis = [
            Implication::new(["walk"], ["walk", "talk"]),
            Implication::new(["talk"], ["talk", "walk"]),
            Implication::new(["jump"], ["absent"]),
        ]
        .into_iter()
        .collect();
        let cleaned = ctx.clean_hypothesis(&basis);
        assert_eq!(cleaned.len(), 1);
        assert!(cleaned.len() <= basis.len());
    }

    #[test]
    fn all_subsets_enumerates_size_ascending() {
        let subsets = all_subsets(&["a", "b", "c"]);
        assert_eq!(subsets.len(), 7);
        assert_eq!(subsets[0], vec!["a"]);
        assert_eq!(subsets[3], vec!["a", "b"]);
        assert_eq!(subsets[6], vec!["a", "b", "c"]);
    }

    #[test]
    fn theory_contains_only_valid_implications() {
        let ctx = ing_context();
        for imp in ctx.theory() {
            assert!(ctx.valid_implication(&imp));
        }
    }

    #[test]
    fn set_of_intents_are_closed() {
        let ctx = ing_context();
        for intent in ctx.set_of_intents() {
            let set: AttrSet = intent.iter().cloned().collect();
            assert_eq!(ctx.attributes_closure(&set), set);
        }
    }
}
