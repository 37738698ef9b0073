//! Edit tokens: the unordered insert/delete operations a word pair implies.

use std::fmt;

use crate::text::iter_lcs;

/// Which side of the pair an edit chunk came from. `Delete` sorts before
/// `Insert`, matching the lexicographic order of the serialized forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EditKind {
    Delete,
    Insert,
}

/// A single edit operation over a non-empty chunk of code points.
///
/// Serialized as `delete_<chunk>` / `insert_<chunk>`; equality and ordering
/// are structural and agree with the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EditToken {
    pub kind: EditKind,
    pub chunk: String,
}

impl EditToken {
    pub fn insert(chunk: impl Into<String>) -> Self {
        EditToken {
            kind: EditKind::Insert,
            chunk: chunk.into(),
        }
    }

    pub fn delete(chunk: impl Into<String>) -> Self {
        EditToken {
            kind: EditKind::Delete,
            chunk: chunk.into(),
        }
    }
}

impl fmt::Display for EditToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EditKind::Delete => write!(f, "delete_{}", self.chunk),
            EditKind::Insert => write!(f, "insert_{}", self.chunk),
        }
    }
}

/// Derive the edit tokens turning `source` into `target`, via iterative
/// LCS subtraction. Deletions come first, then insertions.
pub fn edits_between(source: &str, target: &str) -> Vec<EditToken> {
    let split = iter_lcs(source, target);
    let mut edits: Vec<EditToken> = split.deleted.into_iter().map(EditToken::delete).collect();
    edits.extend(split.added.into_iter().map(EditToken::insert));
    edits
}

/// Apply a set of edit operations to a word.
///
/// Operations are applied in their serialized sort order, so all deletions
/// run before any insertion. A deletion removes its chunk only when it is a
/// literal right-suffix of the current word.
pub fn inflect(word: &str, ops: &[EditToken]) -> String {
    let mut ordered: Vec<&EditToken> = ops.iter().collect();
    ordered.sort();

    let mut word = word.to_string();
    for op in ordered {
        match op.kind {
            EditKind::Delete => {
                if let Some(stripped) = word.strip_suffix(&op.chunk) {
                    word = stripped.to_string();
                }
            }
            EditKind::Insert => word.push_str(&op.chunk),
        }
    }
    word
}
