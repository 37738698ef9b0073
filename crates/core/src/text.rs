//! String algebra shared by the edit extractor and the transducer builder.
//!
//! Everything here operates on code points (`char`), never bytes. Prefix and
//! suffix removal are literal: an element is removed only when the exact
//! code-point sequence is present at the boundary.

/// Longest common contiguous substring of `s1` and `s2`.
///
/// The literal characters `(` and `)` are stripped from both inputs before
/// searching. Ties are broken toward the leftmost occurrence in `s1`.
pub fn lcs(s1: &str, s2: &str) -> String {
    let a: Vec<char> = s1.chars().filter(|c| *c != '(' && *c != ')').collect();
    let b: Vec<char> = s2.chars().filter(|c| *c != '(' && *c != ')').collect();

    let mut best_start = 0;
    let mut best_len = 0;
    for i in 0..a.len() {
        for j in 0..b.len() {
            let mut k = 0;
            while i + k < a.len() && j + k < b.len() && a[i + k] == b[j + k] {
                k += 1;
            }
            if k > best_len {
                best_len = k;
                best_start = i;
            }
        }
    }
    a[best_start..best_start + best_len].iter().collect()
}

/// Result of [`iter_lcs`]: the extracted common chunks and the leftover
/// fragments on each side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSplit {
    pub common: Vec<String>,
    pub deleted: Vec<String>,
    pub added: Vec<String>,
}

/// Iterative longest-common-substring subtraction.
///
/// Repeatedly removes the LCS of the remaining source/target while it is at
/// least two code points long, splicing `#` into the source and `!` into the
/// target at the first occurrence. The leftover fragments become the deleted
/// (source side) and added (target side) chunks.
pub fn iter_lcs(source: &str, target: &str) -> EditSplit {
    let mut sw1 = source.to_string();
    let mut sw2 = target.to_string();
    let mut common = Vec::new();

    loop {
        let chunk = lcs(&sw1, &sw2);
        if chunk.chars().count() <= 1 {
            break;
        }
        // The chunk is computed on paren-stripped text; if a paren interrupts
        // it in either input, stop rather than loop on the same strings.
        if !sw1.contains(&chunk) || !sw2.contains(&chunk) {
            break;
        }
        sw1 = sw1.replacen(&chunk, "#", 1);
        sw2 = sw2.replacen(&chunk, "!", 1);
        common.push(chunk);
    }

    EditSplit {
        common,
        deleted: fragments(&sw1, '#'),
        added: fragments(&sw2, '!'),
    }
}

fn fragments(s: &str, marker: char) -> Vec<String> {
    s.split(marker)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// Greedy LCS alignment of an input/output word pair into per-character
/// chunks: `(c, c)` for matched regions, `(c, "")` / `("", c)` for unmatched
/// segments. Callers append their own terminal chunk.
pub fn io_chunks(input: &str, output: &str) -> Vec<(String, String)> {
    let mut s1 = input.to_string();
    let mut s2 = output.to_string();
    let mut chunks = Vec::new();

    while !s1.is_empty() || !s2.is_empty() {
        if s1.is_empty() {
            drain_right(&mut s2, &mut chunks);
            continue;
        }
        if s2.is_empty() {
            drain_left(&mut s1, &mut chunks);
            continue;
        }

        let l = lcs(&s1, &s2);
        if l.is_empty() {
            drain_left(&mut s1, &mut chunks);
            continue;
        }
        if s1.starts_with(&l) {
            for c in l.chars() {
                chunks.push((c.to_string(), c.to_string()));
            }
            s1 = skip_chars(&s1, l.chars().count());
            s2 = skip_chars(&s2, l.chars().count());
        } else {
            match s2.find(&l) {
                Some(0) => {
                    if let Some(c) = s1.chars().next() {
                        chunks.push((c.to_string(), String::new()));
                    }
                    s1 = skip_chars(&s1, 1);
                }
                Some(at) => {
                    for c in s2[..at].chars() {
                        chunks.push((String::new(), c.to_string()));
                    }
                    s2 = s2[at..].to_string();
                }
                // Paren-interrupted chunk; emit the rest of the output side.
                None => drain_right(&mut s2, &mut chunks),
            }
        }
    }
    chunks
}

fn drain_left(s1: &mut String, chunks: &mut Vec<(String, String)>) {
    for c in s1.chars() {
        chunks.push((c.to_string(), String::new()));
    }
    s1.clear();
}

fn drain_right(s2: &mut String, chunks: &mut Vec<(String, String)>) {
    for c in s2.chars() {
        chunks.push((String::new(), c.to_string()));
    }
    s2.clear();
}

fn skip_chars(s: &str, n: usize) -> String {
    s.chars().skip(n).collect()
}

/// Longest common prefix of a set of strings.
pub fn common_prefix(strings: &[&str]) -> String {
    let Some(first) = strings.first() else {
        return String::new();
    };
    let mut prefix: Vec<char> = first.chars().collect();
    for s in &strings[1..] {
        let mut len = 0;
        for (a, b) in prefix.iter().zip(s.chars()) {
            if *a != b {
                break;
            }
            len += 1;
        }
        prefix.truncate(len);
    }
    prefix.into_iter().collect()
}

/// Remove `u` as a literal prefix of `v`; `v` is returned unchanged when `u`
/// is not a prefix.
pub fn drop_prefix(v: &str, u: &str) -> String {
    v.strip_prefix(u).unwrap_or(v).to_string()
}

/// Remove `w` as a literal suffix of `v`; `v` is returned unchanged when `w`
/// is not a suffix.
pub fn drop_suffix(v: &str, w: &str) -> String {
    v.strip_suffix(w).unwrap_or(v).to_string()
}
