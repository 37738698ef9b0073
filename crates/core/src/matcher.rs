//! Closest-path matching and inference-time inflection over a transducer.

use tracing::trace;

use crate::align::{align, levenshtein};
use crate::fst::Fst;
use crate::ostia::Ostia;

impl Ostia {
    /// Score every simple path's input word against `word` and return the
    /// best `(score, path_word)`.
    ///
    /// Scores are the summed prefix/suffix/root edit distances of the
    /// aligned pair, normalized by the length of `word`; the running
    /// minimum starts at that length, and the word itself is returned when
    /// nothing beats it. The path terminator is dropped before scoring.
    pub fn matches_any_path(&self, word: &str) -> (f64, String) {
        let word_len = word.chars().count();
        if word_len == 0 {
            return (0.0, word.to_string());
        }

        let fst = self.fst();
        let mut min_score = word_len as f64;
        let mut closest = word.to_string();
        for path in fst.simple_paths() {
            let path_word = fst.word_from_path(&path);
            let trimmed: String = {
                let mut chars: Vec<char> = path_word.chars().collect();
                chars.pop();
                chars.into_iter().collect()
            };
            let score = path_score(&trimmed, word, word_len);
            if score < min_score {
                min_score = score;
                closest = trimmed;
            }
        }
        (min_score, closest)
    }

    /// Restrict to the tag-conditioned subgraph, find the closest path, and
    /// replay it over `source` to produce the predicted form.
    ///
    /// Returns `(prediction, closest_path_word)`; when no path scores below
    /// the source length the source itself is returned unchanged with an
    /// empty path word.
    pub fn fit_closest_path(&self, source: &str, tags: &[String]) -> (String, String) {
        let source_len = source.chars().count();
        if source_len == 0 {
            return (source.to_string(), String::new());
        }

        let sub = self.fst().contextual_subgraph(tags);
        let paths = sub.simple_paths();
        let words: Vec<String> = paths.iter().map(|p| sub.word_from_path(p)).collect();

        let mut min_score = source_len as f64;
        let mut best: Option<usize> = None;
        for (i, path_word) in words.iter().enumerate() {
            let score = path_score(path_word, source, source_len);
            if score < min_score {
                min_score = score;
                best = Some(i);
            }
        }
        let Some(chosen) = best else {
            return (source.to_string(), String::new());
        };
        trace!(
            closest = words[chosen].as_str(),
            score = min_score,
            "replaying closest path"
        );

        let prediction = replay_path(&sub, &paths[chosen], source);
        (prediction, words[chosen].clone())
    }
}

/// Summed prefix/suffix/root edit distance of the aligned pair, normalized
/// by the target word length.
fn path_score(path_word: &str, word: &str, word_len: usize) -> f64 {
    let (left, right) = align(path_word, word);
    let total = levenshtein(&left.prefix, &right.prefix).cost
        + levenshtein(&left.suffix, &right.suffix).cost
        + levenshtein(&left.root, &right.root).cost;
    total / word_len as f64
}

/// Walk a path emitting the prediction: identity arcs copy one source
/// character, input-empty arcs emit their output, output-empty arcs skip a
/// source character. Any unconsumed source tail is appended.
fn replay_path(fst: &Fst, path: &[i64], source: &str) -> String {
    let src: Vec<char> = source.chars().collect();
    let mut cursor = 0usize;
    let mut prediction = String::new();

    for pair in path.windows(2) {
        let Some(label) = fst.arc_between(pair[0], pair[1]) else {
            continue;
        };
        if label.input == label.output && cursor < src.len() {
            prediction.push(src[cursor]);
            cursor += 1;
        } else if label.input.is_empty() {
            prediction.push_str(&label.output);
        } else if label.output.is_empty() {
            cursor += 1;
        }
    }
    if cursor < src.len() {
        prediction.extend(&src[cursor..]);
    }
    prediction
}
