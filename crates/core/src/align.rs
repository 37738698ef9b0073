//! Levenshtein alignment with traceback, and the prefix/root/suffix split
//! used as the fingerprint for path scoring.

/// An aligned word pair: two equal-length strings padded with `_` fillers,
/// plus the total edit cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub source: String,
    pub target: String,
    pub cost: f64,
}

/// Edit distance with unit costs. See [`levenshtein_with_costs`].
pub fn levenshtein(s: &str, t: &str) -> Alignment {
    levenshtein_with_costs(s, t, 1.0, 1.0, 1.0)
}

/// Iterative dynamic-programming edit distance over code points, with a
/// traceback producing the aligned pair.
///
/// `d[i][j]` is the cost of aligning the suffixes `s[i..]` and `t[j..]`, so
/// the traceback walks forward from the front. Ties prefer keep/substitute,
/// then insertion (filler in the source), then deletion (filler in the
/// target).
pub fn levenshtein_with_costs(s: &str, t: &str, ins: f64, del: f64, subst: f64) -> Alignment {
    let a: Vec<char> = s.chars().collect();
    let b: Vec<char> = t.chars().collect();
    let n = a.len();
    let m = b.len();

    let mut d = vec![vec![0.0f64; m + 1]; n + 1];
    for i in (0..n).rev() {
        d[i][m] = d[i + 1][m] + del;
    }
    for j in (0..m).rev() {
        d[n][j] = d[n][j + 1] + ins;
    }
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            let keep = d[i + 1][j + 1] + if a[i] == b[j] { 0.0 } else { subst };
            let insert = d[i][j + 1] + ins;
            let delete = d[i + 1][j] + del;
            d[i][j] = keep.min(insert).min(delete);
        }
    }

    let mut source = String::new();
    let mut target = String::new();
    let (mut i, mut j) = (0, 0);
    while i < n || j < m {
        if i == n {
            source.push('_');
            target.push(b[j]);
            j += 1;
        } else if j == m {
            source.push(a[i]);
            target.push('_');
            i += 1;
        } else {
            let keep = d[i + 1][j + 1] + if a[i] == b[j] { 0.0 } else { subst };
            let insert = d[i][j + 1] + ins;
            let delete = d[i + 1][j] + del;
            if keep <= insert && keep <= delete {
                source.push(a[i]);
                target.push(b[j]);
                i += 1;
                j += 1;
            } else if insert <= delete {
                source.push('_');
                target.push(b[j]);
                j += 1;
            } else {
                source.push(a[i]);
                target.push('_');
                i += 1;
            }
        }
    }

    Alignment {
        source,
        target,
        cost: d[0][0],
    }
}

/// The three-way split of one aligned word: the material under the leading
/// filler run, the middle, and the material under the trailing filler run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StemSplit {
    pub prefix: String,
    pub root: String,
    pub suffix: String,
}

/// Align `lemma` and `form` and split both into (prefix, root, suffix) by
/// the maximal leading and trailing filler runs across the two alignments.
/// Fillers are removed from every slice.
pub fn align(lemma: &str, form: &str) -> (StemSplit, StemSplit) {
    let aligned = levenshtein(lemma, form);
    let a: Vec<char> = aligned.source.chars().collect();
    let b: Vec<char> = aligned.target.chars().collect();
    let len = a.len();

    let leading = leading_fillers(&a).max(leading_fillers(&b));
    let trailing = trailing_fillers(&a).max(trailing_fillers(&b));

    (split_at_runs(&a, len, leading, trailing), split_at_runs(&b, len, leading, trailing))
}

fn leading_fillers(chars: &[char]) -> usize {
    chars.iter().take_while(|c| **c == '_').count()
}

fn trailing_fillers(chars: &[char]) -> usize {
    chars.iter().rev().take_while(|c| **c == '_').count()
}

fn split_at_runs(chars: &[char], len: usize, leading: usize, trailing: usize) -> StemSplit {
    let head = leading.min(len);
    let tail = len - trailing.min(len);
    let collect = |range: &[char]| range.iter().filter(|c| **c != '_').collect::<String>();
    StemSplit {
        prefix: collect(&chars[..head]),
        root: collect(&chars[head..tail.max(head)]),
        suffix: collect(&chars[tail.min(len)..]),
    }
}
