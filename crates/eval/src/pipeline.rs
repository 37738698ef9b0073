//! The three inflection pipelines and their accuracy reports.

use std::collections::BTreeMap;
use std::path::PathBuf;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use morph_core::edits::inflect;
use morph_core::fca::to_attr_set;
use morph_core::levenshtein;
use morph_core::ostia::Ostia;

use crate::dataset::{self, DatasetError};
use crate::model::{build_tag_models, ClusterKind, TagModel};

/// Which pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Deterministic,
    Ostia,
    PacOstia,
}

impl PipelineKind {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineKind::Deterministic => "deterministic",
            PipelineKind::Ostia => "ostia",
            PipelineKind::PacOstia => "pac_ostia",
        }
    }
}

/// Run parameters shared by all pipelines.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub data_dir: PathBuf,
    pub language: String,
    pub quality: String,
    /// Accuracy tolerance for the PAC basis.
    pub epsilon: f64,
    /// Confidence tolerance for the PAC basis.
    pub delta: f64,
}

/// Final accuracy report of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub language: String,
    pub quality: String,
    pub pipeline: String,
    pub correct: usize,
    pub total: usize,
    pub accuracy: f64,
}

impl Report {
    fn new(kind: PipelineKind, opts: &RunOptions, correct: usize, total: usize) -> Self {
        let accuracy = if total == 0 {
            0.0
        } else {
            100.0 * correct as f64 / total as f64
        };
        Report {
            language: opts.language.clone(),
            quality: opts.quality.clone(),
            pipeline: kind.name().to_string(),
            correct,
            total,
            accuracy,
        }
    }

    /// The one-line stdout contract.
    pub fn summary_line(&self) -> String {
        format!(
            "Exact word-match accuracy for {}-{}: {}",
            self.language, self.quality, self.accuracy
        )
    }
}

/// Run one pipeline end to end.
pub fn run<R: Rng>(kind: PipelineKind, opts: &RunOptions, rng: R) -> Result<Report, DatasetError> {
    match kind {
        PipelineKind::Deterministic => {
            cluster_accuracy(kind, ClusterKind::Deterministic, opts, rng)
        }
        PipelineKind::PacOstia => cluster_accuracy(
            kind,
            ClusterKind::Pac {
                epsilon: opts.epsilon,
                delta: opts.delta,
            },
            opts,
            rng,
        ),
        PipelineKind::Ostia => transducer_accuracy(opts),
    }
}

/// Shared evaluation loop of the two cluster pipelines: score the test word
/// against every cluster's transducer, inflect with the winning cluster's
/// shared operations.
fn cluster_accuracy<R: Rng>(
    kind: PipelineKind,
    clusters: ClusterKind,
    opts: &RunOptions,
    rng: R,
) -> Result<Report, DatasetError> {
    let train = dataset::training_file(&opts.data_dir, &opts.language, &opts.quality);
    let pairs = dataset::load_pairs_by_tag(&train)?;
    let models = build_tag_models(&pairs, clusters, rng);
    let dev = dataset::load_dev(&dataset::dev_file(&opts.data_dir, &opts.language))?;

    let mut correct = 0;
    let mut total = 0;
    for (source, metadata, expected) in &dev {
        let Some(model) = models.get(metadata) else {
            // Unknown tag bundle: predict the source unchanged.
            if source == expected {
                correct += 1;
            }
            total += 1;
            continue;
        };
        if model.clusters.is_empty() {
            if source == expected {
                correct += 1;
            }
            total += 1;
            continue;
        }

        let predicted = match kind {
            PipelineKind::Deterministic => predict_widest_cluster(model, source),
            _ => predict_first_minimum(model, source),
        };

        if &predicted == expected {
            correct += 1;
            info!("{} + {}: expected and found {}", source, metadata, predicted);
        } else {
            info!(
                "{} + {}: expected {} but found {}",
                source, metadata, expected, predicted
            );
        }
        total += 1;
    }

    Ok(Report::new(kind, opts, correct, total))
}

/// Score every cluster; among minimal scores pick the cluster with the most
/// shared operations, then inflect with those operations.
fn predict_widest_cluster(model: &TagModel, source: &str) -> String {
    let scores: Vec<(f64, String)> = model
        .machines
        .iter()
        .map(|machine| machine.matches_any_path(source))
        .collect();
    let Some(min_score) = scores
        .iter()
        .map(|(score, _)| *score)
        .min_by(|a, b| a.total_cmp(b))
    else {
        return source.to_string();
    };
    let candidates: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|(_, (score, _))| *score == min_score)
        .map(|(i, _)| i)
        .collect();

    let mut chosen = candidates[0];
    if candidates.len() > 1 {
        let mut max_operations = 0;
        for &i in &candidates {
            let operations = model
                .concept
                .extent(&to_attr_set(&model.clusters[i].conclusion));
            if operations.len() > max_operations {
                max_operations = operations.len();
                chosen = i;
            }
        }
    }

    debug!(
        "due to {} with score {}",
        scores[chosen].1, scores[chosen].0
    );
    let operations: Vec<_> = model
        .concept
        .extent(&to_attr_set(&model.clusters[chosen].conclusion))
        .into_iter()
        .collect();
    inflect(source, &operations)
}

/// Score every cluster; the first minimal score wins.
fn predict_first_minimum(model: &TagModel, source: &str) -> String {
    let scores: Vec<(f64, String)> = model
        .machines
        .iter()
        .map(|machine| machine.matches_any_path(source))
        .collect();
    let Some(min_score) = scores
        .iter()
        .map(|(score, _)| *score)
        .min_by(|a, b| a.total_cmp(b))
    else {
        return source.to_string();
    };
    let Some(chosen) = scores.iter().position(|(score, _)| *score == min_score) else {
        return source.to_string();
    };

    debug!(
        "due to {} with score {}",
        scores[chosen].1, scores[chosen].0
    );
    let operations: Vec<_> = model
        .concept
        .extent(&to_attr_set(&model.clusters[chosen].conclusion))
        .into_iter()
        .collect();
    inflect(source, &operations)
}

/// The transducer pipeline: one FST over all training triples, predictions
/// by closest-path replay.
fn transducer_accuracy(opts: &RunOptions) -> Result<Report, DatasetError> {
    let train = dataset::training_file(&opts.data_dir, &opts.language, &opts.quality);
    let triples = dataset::load_triples(&train)?;
    let model = Ostia::from_triples(&triples);
    let dev = dataset::load_dev(&dataset::dev_file(&opts.data_dir, &opts.language))?;

    let mut correct = 0;
    let mut total = 0;
    let mut miss_distances: BTreeMap<u64, usize> = BTreeMap::new();
    for (source, metadata, expected) in &dev {
        let tags: Vec<String> = metadata.split(';').map(str::to_string).collect();
        let (predicted, _closest) = model.fit_closest_path(source, &tags);
        if &predicted == expected {
            correct += 1;
            info!("{} + {}: expected and received {}", source, metadata, predicted);
        } else {
            let distance = levenshtein(expected, &predicted).cost as u64;
            *miss_distances.entry(distance).or_insert(0) += 1;
            info!(
                "{} + {}: expected {}, but received {}",
                source, metadata, expected, predicted
            );
        }
        total += 1;
    }
    for (&distance, &count) in &miss_distances {
        debug!(distance, count, "missed predictions at edit distance");
    }

    Ok(Report::new(PipelineKind::Ostia, opts, correct, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;
    use tempfile::TempDir;

    fn dataset_dir(train: &str, dev: &str) -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("english-train-low"), train).expect("write train");
        fs::write(dir.path().join("english-dev"), dev).expect("write dev");
        dir
    }

    fn options(dir: &TempDir) -> RunOptions {
        RunOptions {
            data_dir: dir.path().to_path_buf(),
            language: "english".to_string(),
            quality: "low".to_string(),
            epsilon: 1.0,
            delta: 1.0,
        }
    }

    const ING_TRAIN: &str =
        "walk\twalking\tPRS\ntalk\ttalking\tPRS\njump\tjumping\tPRS\n";

    #[test]
    fn deterministic_pipeline_inflects_an_unseen_lemma() {
        let dir = dataset_dir(ING_TRAIN, "ring\tringing\tPRS\n");
        let report = run(
            PipelineKind::Deterministic,
            &options(&dir),
            StdRng::seed_from_u64(0),
        )
        .expect("report");
        assert_eq!(report.correct, 1);
        assert_eq!(report.total, 1);
        assert_eq!(report.accuracy, 100.0);
    }

    #[test]
    fn pac_pipeline_inflects_an_unseen_lemma() {
        let dir = dataset_dir(ING_TRAIN, "ring\tringing\tPRS\n");
        let report = run(
            PipelineKind::PacOstia,
            &options(&dir),
            StdRng::seed_from_u64(42),
        )
        .expect("report");
        assert_eq!(report.correct, 1);
        assert_eq!(report.total, 1);
    }

    #[test]
    fn unknown_tag_bundle_falls_back_to_the_source() {
        let dir = dataset_dir(ING_TRAIN, "walk\twalk\tNOPE\nring\tringing\tNOPE\n");
        let report = run(
            PipelineKind::Deterministic,
            &options(&dir),
            StdRng::seed_from_u64(0),
        )
        .expect("report");
        // "walk" == expected under the fallback, "ring" is not.
        assert_eq!(report.correct, 1);
        assert_eq!(report.total, 2);
    }

    #[test]
    fn empty_training_set_scores_nothing() {
        let dir = dataset_dir("", "ring\tringing\tPRS\n");
        let report = run(
            PipelineKind::Deterministic,
            &options(&dir),
            StdRng::seed_from_u64(0),
        )
        .expect("report");
        assert_eq!(report.correct, 0);
        assert_eq!(report.total, 1);
        assert_eq!(report.accuracy, 0.0);
    }

    #[test]
    fn ostia_pipeline_reports_over_the_whole_dev_set() {
        let dir = dataset_dir(ING_TRAIN, "walk\twalking\tPRS\nring\tringing\tPRS\n");
        let report = run(
            PipelineKind::Ostia,
            &options(&dir),
            StdRng::seed_from_u64(0),
        )
        .expect("report");
        assert_eq!(report.total, 2);
        assert_eq!(report.pipeline, "ostia");
    }

    #[test]
    fn report_serializes_for_json_output() {
        let report = Report {
            language: "english".to_string(),
            quality: "low".to_string(),
            pipeline: "deterministic".to_string(),
            correct: 1,
            total: 2,
            accuracy: 50.0,
        };
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["pipeline"], "deterministic");
        assert_eq!(json["accuracy"], 50.0);
    }

    #[test]
    fn summary_line_matches_the_stdout_contract() {
        let report = Report {
            language: "english".to_string(),
            quality: "low".to_string(),
            pipeline: "deterministic".to_string(),
            correct: 1,
            total: 1,
            accuracy: 100.0,
        };
        assert_eq!(
            report.summary_line(),
            "Exact word-match accuracy for english-low: 100"
        );
    }

    #[test]
    fn missing_training_file_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let result = run(
            PipelineKind::Deterministic,
            &options(&dir),
            StdRng::seed_from_u64(0),
        );
        assert!(result.is_err());
    }
}
