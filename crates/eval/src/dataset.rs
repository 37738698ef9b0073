//! Training and dev file parsing.
//!
//! Both file kinds are UTF-8 with one TAB-separated record per line:
//! `source \t target \t metadata`, metadata being a `;`-delimited tag
//! bundle. Records with a `*` in either word are skipped by design;
//! malformed records are skipped with a level-1 trace.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

/// Errors surfaced by the dataset layer. Everything here is fatal to the
/// caller; skippable conditions never produce an error.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The data file could not be read at all.
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Path of the training file for a language/quality pair.
pub fn training_file(data_dir: &Path, language: &str, quality: &str) -> PathBuf {
    data_dir.join(format!("{language}-train-{quality}"))
}

/// Path of the dev file for a language.
pub fn dev_file(data_dir: &Path, language: &str) -> PathBuf {
    data_dir.join(format!("{language}-dev"))
}

/// Languages with training data available, discovered by listing the
/// high-quality training files.
pub fn available_languages(data_dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(data_dir) else {
        return Vec::new();
    };
    let mut languages: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter_map(|name| {
            name.strip_suffix("-train-high")
                .map(|language| language.to_string())
        })
        .collect();
    languages.sort();
    languages
}

/// Training pairs grouped under their full tag-bundle string.
pub fn load_pairs_by_tag(
    path: &Path,
) -> Result<BTreeMap<String, Vec<(String, String)>>, DatasetError> {
    let mut pairs: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
    for (source, target, metadata) in read_records(path)? {
        pairs.entry(metadata).or_default().push((source, target));
    }
    Ok(pairs)
}

/// Training triples `(source, tag list, target)`, sorted by source.
pub fn load_triples(path: &Path) -> Result<Vec<(String, Vec<String>, String)>, DatasetError> {
    let mut triples: Vec<(String, Vec<String>, String)> = read_records(path)?
        .into_iter()
        .map(|(source, target, metadata)| {
            let tags = metadata.split(';').map(str::to_string).collect();
            (source, tags, target)
        })
        .collect();
    triples.sort_by(|a, b| a.0.cmp(&b.0));
    info!("providing all words in structured manner, to the transducer");
    Ok(triples)
}

/// Dev records `(source, tag bundle, expected form)`, sorted by source.
pub fn load_dev(path: &Path) -> Result<Vec<(String, String, String)>, DatasetError> {
    let mut records: Vec<(String, String, String)> = read_records(path)?
        .into_iter()
        .map(|(source, target, metadata)| (source, metadata, target))
        .collect();
    records.sort_by(|a, b| a.0.cmp(&b.0));
    info!("providing all test words in structured manner");
    Ok(records)
}

/// Read and filter the raw `(source, target, metadata)` records of a file.
fn read_records(path: &Path) -> Result<Vec<(String, String, String)>, DatasetError> {
    let content = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut records = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let mut fields = line.splitn(3, '\t');
        let (Some(source), Some(target), Some(metadata)) =
            (fields.next(), fields.next(), fields.next())
        else {
            info!(
                "skipping malformed record at {}:{}",
                path.display(),
                lineno + 1
            );
            continue;
        };
        let metadata = metadata.trim_end();
        if source.is_empty() || target.is_empty() || metadata.is_empty() {
            info!(
                "skipping malformed record at {}:{}",
                path.display(),
                lineno + 1
            );
            continue;
        }
        if source.contains('*') || target.contains('*') {
            continue;
        }
        records.push((source.to_string(), target.to_string(), metadata.to_string()));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write");
        file
    }

    #[test]
    fn pairs_group_under_the_full_tag_bundle() {
        let file = file_with("walk\twalking\tV;PRS\ntalk\ttalking\tV;PRS\nwalk\twalked\tV;PST\n");
        let pairs = load_pairs_by_tag(file.path()).expect("parsed");
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs["V;PRS"].len(), 2);
        assert_eq!(
            pairs["V;PRS"][0],
            ("walk".to_string(), "walking".to_string())
        );
        assert_eq!(pairs["V;PST"].len(), 1);
    }

    #[test]
    fn starred_words_are_skipped() {
        let file = file_with("wal*k\twalking\tV\nwalk\twalking\tV\n");
        let pairs = load_pairs_by_tag(file.path()).expect("parsed");
        assert_eq!(pairs["V"].len(), 1);
    }

    #[test]
    fn malformed_records_are_skipped() {
        let file = file_with("missingfields\nwalk\twalking\tV\n\t\t\nok\tfine\t\n");
        let pairs = load_pairs_by_tag(file.path()).expect("parsed");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs["V"].len(), 1);
    }

    #[test]
    fn triples_split_the_tag_bundle_and_sort_by_source() {
        let file = file_with("zebra\tzebras\tN;PL\napple\tapples\tN;PL\n");
        let triples = load_triples(file.path()).expect("parsed");
        assert_eq!(triples[0].0, "apple");
        assert_eq!(triples[0].1, vec!["N".to_string(), "PL".to_string()]);
        assert_eq!(triples[1].0, "zebra");
    }

    #[test]
    fn dev_records_keep_the_bundle_unsplit() {
        let file = file_with("walk\twalking\tV;PRS\n");
        let dev = load_dev(file.path()).expect("parsed");
        assert_eq!(
            dev,
            vec![(
                "walk".to_string(),
                "V;PRS".to_string(),
                "walking".to_string()
            )]
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let missing = Path::new("/nonexistent/english-train-low");
        assert!(load_pairs_by_tag(missing).is_err());
    }

    #[test]
    fn languages_are_discovered_from_high_quality_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        for name in ["english-train-high", "polish-train-high", "english-dev"] {
            std::fs::write(dir.path().join(name), "").expect("write");
        }
        assert_eq!(
            available_languages(dir.path()),
            vec!["english".to_string(), "polish".to_string()]
        );
    }
}
