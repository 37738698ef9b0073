//! Finite-state transducer storage: a directed multigraph of integer state
//! ids with labeled arcs, plus a tag-membership map for contextual
//! restriction.
//!
//! State ids are stable across merges; sentinels 0 (initial) and -1 (final)
//! are ordinary states with reserved ids.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::all_simple_paths;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;

/// State identifier. Builders hand out positive ids; the sentinels are 0
/// and -1.
pub type StateId = i64;

/// Initial sentinel state.
pub const INITIAL: StateId = 0;
/// Final sentinel state.
pub const FINAL: StateId = -1;

/// Arc identifier, stable while the arc exists.
pub type ArcId = EdgeIndex;

/// The input/output label pair carried by an arc. Either side may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArcLabel {
    pub input: String,
    pub output: String,
}

impl ArcLabel {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        ArcLabel {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// One arc of the transducer, as returned by the enumeration methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arc {
    pub id: ArcId,
    pub from: StateId,
    pub to: StateId,
    pub label: ArcLabel,
}

/// A labeled directed multigraph with a tag-membership side table.
#[derive(Debug, Clone, Default)]
pub struct Fst {
    graph: StableDiGraph<StateId, ArcLabel>,
    nodes: BTreeMap<StateId, NodeIndex>,
    tags: BTreeMap<String, BTreeSet<StateId>>,
}

impl Fst {
    pub fn new() -> Self {
        Fst::default()
    }

    fn index(&self, id: StateId) -> Option<NodeIndex> {
        self.nodes.get(&id).copied()
    }

    /// Add a fresh state with id `max(existing) + 1` (1 when empty).
    pub fn add_state(&mut self) -> StateId {
        let id = self
            .nodes
            .keys()
            .next_back()
            .map(|max| max + 1)
            .unwrap_or(1);
        self.ensure_state(id);
        id
    }

    /// Add a state with a specific id; idempotent.
    pub fn ensure_state(&mut self, id: StateId) {
        if !self.nodes.contains_key(&id) {
            let idx = self.graph.add_node(id);
            self.nodes.insert(id, idx);
        }
    }

    pub fn contains_state(&self, id: StateId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// All state ids, ascending.
    pub fn states(&self) -> Vec<StateId> {
        self.nodes.keys().copied().collect()
    }

    pub fn state_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn arc_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Register a tag with no members yet; idempotent.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.entry(tag.into()).or_default();
    }

    /// Mark a state as belonging to a tag's contextual subgraph.
    pub fn tag_state(&mut self, tag: impl Into<String>, id: StateId) {
        self.tags.entry(tag.into()).or_default().insert(id);
    }

    /// All known tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        self.tags.keys().cloned().collect()
    }

    /// The states registered under one tag, if known.
    pub fn tag_members(&self, tag: &str) -> Option<&BTreeSet<StateId>> {
        self.tags.get(tag)
    }

    /// Add an arc; both endpoints are created if missing. Parallel arcs with
    /// different labels are permitted.
    pub fn add_arc(
        &mut self,
        from: StateId,
        input: impl Into<String>,
        output: impl Into<String>,
        to: StateId,
    ) -> ArcId {
        self.ensure_state(from);
        self.ensure_state(to);
        let (a, b) = (self.nodes[&from], self.nodes[&to]);
        self.graph.add_edge(a, b, ArcLabel::new(input, output))
    }

    /// Whether an arc with exactly this shape already exists.
    pub fn has_arc(&self, from: StateId, label: &ArcLabel, to: StateId) -> bool {
        let (Some(a), Some(b)) = (self.index(from), self.index(to)) else {
            return false;
        };
        self.graph
            .edges_directed(a, Direction::Outgoing)
            .any(|e| e.target() == b && e.weight() == label)
    }

    /// All arcs, in arc-id order.
    pub fn arcs(&self) -> Vec<Arc> {
        let mut arcs: Vec<Arc> = self
            .graph
            .edge_references()
            .map(|e| Arc {
                id: e.id(),
                from: self.graph[e.source()],
                to: self.graph[e.target()],
                label: e.weight().clone(),
            })
            .collect();
        arcs.sort_by_key(|arc| arc.id.index());
        arcs
    }

    /// Outgoing arcs of one state, in arc-id order.
    pub fn arcs_from(&self, id: StateId) -> Vec<Arc> {
        let Some(idx) = self.index(id) else {
            return Vec::new();
        };
        let mut arcs: Vec<Arc> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| Arc {
                id: e.id(),
                from: id,
                to: self.graph[e.target()],
                label: e.weight().clone(),
            })
            .collect();
        arcs.sort_by_key(|arc| arc.id.index());
        arcs
    }

    /// Incoming arcs of one state, in arc-id order.
    pub fn arcs_into(&self, id: StateId) -> Vec<Arc> {
        let Some(idx) = self.index(id) else {
            return Vec::new();
        };
        let mut arcs: Vec<Arc> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| Arc {
                id: e.id(),
                from: self.graph[e.source()],
                to: id,
                label: e.weight().clone(),
            })
            .collect();
        arcs.sort_by_key(|arc| arc.id.index());
        arcs
    }

    pub fn arc_label(&self, id: ArcId) -> Option<&ArcLabel> {
        self.graph.edge_weight(id)
    }

    pub fn set_arc_output(&mut self, id: ArcId, output: String) {
        if let Some(label) = self.graph.edge_weight_mut(id) {
            label.output = output;
        }
    }

    /// The endpoints of an arc, if it exists.
    pub fn arc_endpoints(&self, id: ArcId) -> Option<(StateId, StateId)> {
        self.graph
            .edge_endpoints(id)
            .map(|(a, b)| (self.graph[a], self.graph[b]))
    }

    /// The first arc (lowest arc id) between two states.
    pub fn arc_between(&self, from: StateId, to: StateId) -> Option<ArcLabel> {
        self.arcs_from(from)
            .into_iter()
            .find(|arc| arc.to == to)
            .map(|arc| arc.label)
    }

    /// Remove a state, its arcs, and its tag memberships.
    pub fn remove_state(&mut self, id: StateId) {
        if let Some(idx) = self.nodes.remove(&id) {
            self.graph.remove_node(idx);
        }
        for members in self.tags.values_mut() {
            members.remove(&id);
        }
    }

    /// Redirect every arc of `remove` onto `keep` (labels preserved, arcs
    /// that become exact duplicates collapsed), transfer tag memberships,
    /// and delete `remove`.
    pub fn merge_states(&mut self, keep: StateId, remove: StateId) {
        if keep == remove || !self.contains_state(remove) {
            return;
        }
        self.ensure_state(keep);

        let incoming: Vec<Arc> = self.arcs_into(remove);
        let outgoing: Vec<Arc> = self.arcs_from(remove);

        let tagged: Vec<String> = self
            .tags
            .iter()
            .filter(|(_, members)| members.contains(&remove))
            .map(|(tag, _)| tag.clone())
            .collect();

        self.remove_state(remove);

        for arc in incoming {
            // Self-loops show up in both lists; handle them once, below.
            if arc.from == remove {
                continue;
            }
            if !self.has_arc(arc.from, &arc.label, keep) {
                self.add_arc(arc.from, arc.label.input, arc.label.output, keep);
            }
        }
        for arc in outgoing {
            let to = if arc.to == remove { keep } else { arc.to };
            if !self.has_arc(keep, &arc.label, to) {
                self.add_arc(keep, arc.label.input, arc.label.output, to);
            }
        }
        for tag in tagged {
            self.tag_state(tag, keep);
        }
    }

    /// Restrict the transducer to the states shared by every given tag.
    ///
    /// Unknown tags impose no restriction; the sentinels are always
    /// retained. Arcs are induced.
    pub fn contextual_subgraph(&self, tags: &[String]) -> Fst {
        let mut keep: BTreeSet<StateId> = self.nodes.keys().copied().collect();
        for tag in tags {
            if let Some(members) = self.tags.get(tag) {
                keep = keep.intersection(members).copied().collect();
            }
        }
        for sentinel in [INITIAL, FINAL] {
            if self.contains_state(sentinel) {
                keep.insert(sentinel);
            }
        }

        let mut sub = Fst::new();
        for id in &keep {
            sub.ensure_state(*id);
        }
        for arc in self.arcs() {
            if keep.contains(&arc.from) && keep.contains(&arc.to) {
                sub.add_arc(arc.from, arc.label.input, arc.label.output, arc.to);
            }
        }
        for (tag, members) in &self.tags {
            sub.add_tag(tag.clone());
            for id in members.intersection(&keep) {
                sub.tag_state(tag.clone(), *id);
            }
        }
        sub
    }

    /// All simple paths from the initial to the final sentinel, as state-id
    /// sequences.
    pub fn simple_paths(&self) -> Vec<Vec<StateId>> {
        let (Some(from), Some(to)) = (self.index(INITIAL), self.index(FINAL)) else {
            return Vec::new();
        };
        all_simple_paths::<Vec<NodeIndex>, _, std::collections::hash_map::RandomState>(
            &self.graph,
            from,
            to,
            0,
            None,
        )
            .map(|path| path.into_iter().map(|idx| self.graph[idx]).collect())
            .collect()
    }

    /// Concatenate the input labels along a path, reading the first arc
    /// between each consecutive state pair.
    pub fn word_from_path(&self, path: &[StateId]) -> String {
        let mut word = String::new();
        for pair in path.windows(2) {
            if let Some(label) = self.arc_between(pair[0], pair[1]) {
                word.push_str(&label.input);
            }
        }
        word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_ids_are_max_plus_one() {
        let mut fst = Fst::new();
        assert_eq!(fst.add_state(), 1);
        assert_eq!(fst.add_state(), 2);
        fst.ensure_state(10);
        assert_eq!(fst.add_state(), 11);
    }

    #[test]
    fn sentinels_sort_before_builder_states() {
        let mut fst = Fst::new();
        fst.add_state();
        fst.ensure_state(INITIAL);
        fst.ensure_state(FINAL);
        assert_eq!(fst.states(), vec![FINAL, INITIAL, 1]);
    }

    #[test]
    fn parallel_arcs_with_different_labels_are_kept() {
        let mut fst = Fst::new();
        fst.add_arc(1, "a", "x", 2);
        fst.add_arc(1, "a", "y", 2);
        assert_eq!(fst.arcs_from(1).len(), 2);
    }

    #[test]
    fn merge_redirects_arcs_and_collapses_duplicates() {
        let mut fst = Fst::new();
        fst.ensure_state(INITIAL);
        fst.add_arc(INITIAL, "a", "", 1);
        fst.add_arc(INITIAL, "a", "", 2);
        fst.add_arc(1, "b", "b", 3);
        fst.add_arc(2, "b", "b", 3);
        fst.merge_states(2, 1);
        assert!(!fst.contains_state(1));
        // 0 -a-> 2 deduplicated, 2 -b-> 3 deduplicated.
        assert_eq!(fst.arcs_from(INITIAL).len(), 1);
        assert_eq!(fst.arcs_from(2).len(), 1);
    }

    #[test]
    fn merge_turns_cross_arcs_into_self_loops() {
        let mut fst = Fst::new();
        fst.add_arc(1, "a", "a", 2);
        fst.merge_states(2, 1);
        let arcs = fst.arcs_from(2);
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].to, 2);
    }

    #[test]
    fn merge_transfers_tag_membership() {
        let mut fst = Fst::new();
        fst.ensure_state(1);
        fst.ensure_state(2);
        fst.tag_state("PRS", 1);
        fst.merge_states(2, 1);
        assert!(fst.tag_members("PRS").is_some_and(|m| m.contains(&2)));
        assert!(fst.tag_members("PRS").is_some_and(|m| !m.contains(&1)));
    }

    #[test]
    fn contextual_subgraph_intersects_tag_members() {
        let mut fst = Fst::new();
        fst.ensure_state(INITIAL);
        fst.ensure_state(FINAL);
        for id in [1, 2, 3] {
            fst.ensure_state(id);
        }
        fst.tag_state("V", 1);
        fst.tag_state("V", 2);
        fst.tag_state("PRS", 2);
        fst.tag_state("PRS", 3);

        let sub = fst.contextual_subgraph(&["V".to_string(), "PRS".to_string()]);
        assert_eq!(sub.states(), vec![FINAL, INITIAL, 2]);
    }

    #[test]
    fn unknown_tag_does_not_restrict() {
        let mut fst = Fst::new();
        fst.ensure_state(1);
        let sub = fst.contextual_subgraph(&["NOPE".to_string()]);
        assert_eq!(sub.states(), vec![1]);
    }

    #[test]
    fn simple_paths_and_path_words() {
        let mut fst = Fst::new();
        fst.ensure_state(INITIAL);
        fst.ensure_state(FINAL);
        fst.add_arc(INITIAL, "a", "a", 1);
        fst.add_arc(1, "b", "b", FINAL);
        fst.add_arc(INITIAL, "c", "c", FINAL);

        let mut words: Vec<String> = fst
            .simple_paths()
            .iter()
            .map(|p| fst.word_from_path(p))
            .collect();
        words.sort();
        assert_eq!(words, vec!["ab".to_string(), "c".to_string()]);
    }
}
