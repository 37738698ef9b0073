//! morph-core: inflection-learning core library.
//!
//! Two inference engines over (lemma, tag bundle, form) training triples:
//!
//! - a Formal Concept Analysis lattice with a PAC-style implication-basis
//!   learner (Angluin's HORN1 driven by an approximate equivalence oracle),
//!   clustering lemmas that share the same edit operations, and
//! - an OSTIA transducer builder inferring a subsequential FST by state
//!   merging with push-back, plus a closest-path matcher for inference.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`FormalContext`] -- the object/attribute relation and its closures
//! - [`pac_basis()`] / [`deterministic_clusters()`] -- the two cluster paths
//! - [`Ostia`] -- transducer inference and closest-path matching
//! - [`EditToken`] / [`edits_between()`] / [`inflect()`] -- the edit algebra
//! - [`align()`] / [`levenshtein()`] -- alignment and distance
//!
//! The crate performs no I/O; file parsing and pipeline dispatch live in
//! the collaborator crates.

pub mod align;
pub mod cluster;
pub mod edits;
pub mod fca;
pub mod fst;
pub mod horn;
pub mod matcher;
pub mod oracle;
pub mod ostia;
pub mod text;

pub use align::{align, levenshtein, levenshtein_with_costs, Alignment, StemSplit};
pub use cluster::deterministic_clusters;
pub use edits::{edits_between, inflect, EditKind, EditToken};
pub use fca::{Basis, FormalContext, Implication};
pub use fst::{Fst, StateId, FINAL, INITIAL};
pub use horn::{horn1, pac_basis};
pub use oracle::{is_member, li_times, Answer, ApproxEquivalence};
pub use ostia::Ostia;
pub use text::iter_lcs;
