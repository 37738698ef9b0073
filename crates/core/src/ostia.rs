//! Onward Subsequential Transducer Inference: prefix-tree construction from
//! training triples, then state merging with push-back repair.
//!
//! The merge loop tries every pair of interior states in ascending id
//! order, cloning the transducer before each attempt so an unrepairable
//! merge can be rolled back wholesale.

use tracing::{debug, trace};

use crate::fst::{Arc, ArcId, Fst, StateId, FINAL, INITIAL};
use crate::text::{common_prefix, drop_prefix, drop_suffix, io_chunks};

/// Terminal chunk appended to every input/output chunk sequence.
const TERMINAL: &str = "#";
/// Terminator used by the input-only prefix tree.
const WORD_END: &str = ">";

/// A pair of outgoing arcs of one state that share an input label, blocking
/// determinism. The lower-id target comes first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub state: StateId,
    pub input: String,
    pub first_output: String,
    pub first_target: StateId,
    pub first_arc: ArcId,
    pub second_output: String,
    pub second_target: StateId,
    pub second_arc: ArcId,
}

/// An inferred subsequential transducer.
#[derive(Debug, Clone)]
pub struct Ostia {
    fst: Fst,
}

impl Ostia {
    /// Build from (input, tags, output) triples: an onward prefix tree of
    /// I/O chunks, then the state-merging loop.
    pub fn from_triples(triples: &[(String, Vec<String>, String)]) -> Self {
        let mut fst = Fst::new();
        let mut entry_arcs: Vec<(String, String, StateId)> = Vec::new();
        let mut exit_arcs: Vec<(StateId, String, String)> = Vec::new();

        for (input, tags, output) in triples {
            for tag in tags {
                fst.add_tag(tag.clone());
            }
            let mut chunks = io_chunks(input, output);
            chunks.push((TERMINAL.to_string(), TERMINAL.to_string()));

            let last = chunks.len() - 1;
            let mut prev: StateId = INITIAL;
            for (i, (input_chunk, output_chunk)) in chunks.into_iter().enumerate() {
                if i == 0 {
                    let to = fst.add_state();
                    for tag in tags {
                        fst.tag_state(tag.clone(), to);
                    }
                    entry_arcs.push((input_chunk, output_chunk, to));
                    prev = to;
                } else if i == last {
                    for tag in tags {
                        fst.tag_state(tag.clone(), prev);
                    }
                    exit_arcs.push((prev, input_chunk, output_chunk));
                } else {
                    let from = prev;
                    let to = fst.add_state();
                    for tag in tags {
                        fst.tag_state(tag.clone(), from);
                        fst.tag_state(tag.clone(), to);
                    }
                    fst.add_arc(from, input_chunk, output_chunk, to);
                    prev = to;
                }
            }
        }

        fst.ensure_state(INITIAL);
        fst.ensure_state(FINAL);
        for tag in fst.tags() {
            fst.tag_state(tag.clone(), INITIAL);
            fst.tag_state(tag, FINAL);
        }
        for (input_chunk, output_chunk, to) in entry_arcs {
            fst.add_arc(INITIAL, input_chunk, output_chunk, to);
        }
        for (from, input_chunk, output_chunk) in exit_arcs {
            fst.add_arc(from, input_chunk, output_chunk, FINAL);
        }
        debug!(
            states = fst.state_count(),
            arcs = fst.arc_count(),
            "formed transducer prefix tree"
        );

        Ostia { fst: infer(fst) }
    }

    /// Build from bare words: an identity prefix tree with a word-end
    /// terminator, then the state-merging loop.
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Self {
        let mut fst = Fst::new();
        let mut entry_arcs: Vec<(String, StateId)> = Vec::new();
        let mut exit_arcs: Vec<(StateId, String)> = Vec::new();

        for word in words {
            let mut chunks: Vec<String> =
                word.as_ref().chars().map(|c| c.to_string()).collect();
            chunks.push(WORD_END.to_string());

            let last = chunks.len() - 1;
            let mut prev: StateId = INITIAL;
            for (i, chunk) in chunks.into_iter().enumerate() {
                if i == 0 {
                    let to = fst.add_state();
                    entry_arcs.push((chunk, to));
                    prev = to;
                } else if i == last {
                    exit_arcs.push((prev, chunk));
                } else {
                    let from = prev;
                    let to = fst.add_state();
                    fst.add_arc(from, chunk.clone(), chunk, to);
                    prev = to;
                }
            }
        }

        fst.ensure_state(INITIAL);
        fst.ensure_state(FINAL);
        for (chunk, to) in entry_arcs {
            fst.add_arc(INITIAL, chunk.clone(), chunk, to);
        }
        for (from, chunk) in exit_arcs {
            fst.add_arc(from, chunk.clone(), chunk, FINAL);
        }
        debug!(
            states = fst.state_count(),
            arcs = fst.arc_count(),
            "formed identity prefix tree"
        );

        Ostia { fst: infer(fst) }
    }

    pub fn fst(&self) -> &Fst {
        &self.fst
    }

    /// Wrap an existing transducer without running inference.
    #[cfg(test)]
    pub(crate) fn from_fst_unchecked(fst: Fst) -> Self {
        Ostia { fst }
    }

    /// True when no two outgoing arcs of any state share an input label.
    pub fn is_subsequential(&self) -> bool {
        find_violation(&self.fst).is_none()
    }

    pub fn find_violation(&self) -> Option<Violation> {
        find_violation(&self.fst)
    }
}

/// Interior (non-sentinel) states, ascending.
fn interior_states(fst: &Fst) -> Vec<StateId> {
    fst.states().into_iter().filter(|s| *s > 0).collect()
}

/// Smallest interior state strictly above `a`, or `a` when none remains.
fn next_state(fst: &Fst, a: StateId) -> StateId {
    interior_states(fst)
        .into_iter()
        .find(|s| *s > a)
        .unwrap_or(a)
}

/// The state-merging loop. Every interior pair (p, q) with p < q is tried
/// in ascending order; the lower state merges into the higher. Violations
/// introduced by a merge are repaired by pushing back the disagreeing
/// output tails and merging the two targets; unrepairable violations roll
/// the whole attempt back to the pre-merge snapshot.
fn infer(mut fst: Fst) -> Fst {
    let Some(&first) = interior_states(&fst).first() else {
        return fst;
    };

    let mut q = first;
    while q < interior_states(&fst).last().copied().unwrap_or(q) {
        q = next_state(&fst, q);
        let mut p = interior_states(&fst).first().copied().unwrap_or(q);
        while p < q {
            // A repair merge can absorb q itself; nothing left to merge into.
            if !fst.contains_state(q) {
                break;
            }
            let snapshot = fst.clone();
            fst.merge_states(q, p);
            trace!(q, p, "merge attempt");

            let mut repairable = true;
            while let Some(v) = find_violation(&fst) {
                let final_disagreement =
                    v.first_output != v.second_output && v.input == TERMINAL;
                let premature = v.first_target < q
                    && !v.first_output.starts_with(&v.second_output);
                if final_disagreement || premature || v.first_target == v.second_target {
                    repairable = false;
                    break;
                }
                let u = common_prefix(&[&v.first_output, &v.second_output]);
                push_back(&mut fst, &drop_prefix(&v.first_output, &u), v.first_arc);
                push_back(&mut fst, &drop_prefix(&v.second_output, &u), v.second_arc);
                fst.merge_states(v.second_target, v.first_target);
            }

            if !repairable || find_violation(&fst).is_some() {
                trace!(q, p, "merge rolled back");
                fst = snapshot;
            }
            p = next_state(&fst, p);
        }
    }
    fst
}

/// First pair of outgoing arcs sharing an input label, scanning states in
/// ascending id order and arcs in arc-id order. The returned pair is
/// normalized so the lower-id target comes first.
fn find_violation(fst: &Fst) -> Option<Violation> {
    for state in fst.states() {
        let arcs = fst.arcs_from(state);
        for i in 0..arcs.len() {
            for j in i + 1..arcs.len() {
                if arcs[i].label.input != arcs[j].label.input {
                    continue;
                }
                let (a, b) = if arcs[i].to <= arcs[j].to {
                    (&arcs[i], &arcs[j])
                } else {
                    (&arcs[j], &arcs[i])
                };
                return Some(violation_of(state, a, b));
            }
        }
    }
    None
}

fn violation_of(state: StateId, first: &Arc, second: &Arc) -> Violation {
    Violation {
        state,
        input: first.label.input.clone(),
        first_output: first.label.output.clone(),
        first_target: first.to,
        first_arc: first.id,
        second_output: second.label.output.clone(),
        second_target: second.to,
        second_arc: second.id,
    }
}

/// Remove `element` as a suffix of the arc's output and prepend it to the
/// output of every arc leaving the arc's target, preserving the
/// concatenated output along any path through the arc.
fn push_back(fst: &mut Fst, element: &str, arc: ArcId) {
    if element.is_empty() {
        return;
    }
    let Some((_, target)) = fst.arc_endpoints(arc) else {
        return;
    };
    if let Some(label) = fst.arc_label(arc) {
        let trimmed = drop_suffix(&label.output, element);
        fst.set_arc_output(arc, trimmed);
    }
    for out in fst.arcs_from(target) {
        fst.set_arc_output(out.id, format!("{element}{}", out.label.output));
    }
}
