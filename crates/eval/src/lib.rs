//! morph-eval: the collaborator surface around morph-core.
//!
//! Loads TAB-separated training and dev files, builds per-tag models
//! (concept + clusters) or a single transducer, and evaluates exact
//! word-match accuracy on the dev set. All file I/O lives here; the core
//! engines stay pure.

pub mod dataset;
pub mod model;
pub mod pipeline;

pub use dataset::{available_languages, dev_file, training_file, DatasetError};
pub use model::{build_tag_models, concept_from_pairs, ClusterKind, TagModel};
pub use pipeline::{run, PipelineKind, Report, RunOptions};
