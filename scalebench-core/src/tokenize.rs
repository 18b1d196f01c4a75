//! Word Tokenization and Frequency Aggregation
//!
//! The tokenization rule is load-bearing for output parity across worker
//! counts: text is case-folded, then every maximal run of Unicode word
//! characters is one token.

use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

fn word_re() -> &'static Regex {
    static WORD_RE: OnceLock<Regex> = OnceLock::new();
    // \w is Unicode-aware by default in this engine
    WORD_RE.get_or_init(|| Regex::new(r"\w+").expect("static pattern"))
}

/// Token statistics for one analyzed file.
///
/// `counts` pairs are ordered by first occurrence in the file so that the
/// downstream merge has a deterministic encounter order for each source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStats {
    /// Path of the analyzed file
    pub path: String,
    /// Total token count
    pub tokens: u64,
    /// Per-token counts, ordered by first occurrence
    pub counts: Vec<(String, u64)>,
}

/// Tokenize a text and count token frequencies.
///
/// Returns the total token count and per-token counts ordered by first
/// occurrence in the text.
pub fn tokenize_counts(text: &str) -> (u64, Vec<(String, u64)>) {
    let lowered = text.to_lowercase();

    let mut total = 0u64;
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut ordered: Vec<(String, u64)> = Vec::new();

    for m in word_re().find_iter(&lowered) {
        total += 1;
        match index.get(m.as_str()) {
            Some(&i) => ordered[i].1 += 1,
            None => {
                index.insert(m.as_str(), ordered.len());
                ordered.push((m.as_str().to_string(), 1));
            }
        }
    }

    (total, ordered)
}

/// Read and tokenize one file.
///
/// The bytes are decoded as UTF-8 with lossy replacement, so decoding never
/// fails; only the read itself can. A read error is fatal to the whole CPU
/// run — the caller does not retry or skip.
pub fn analyze_file(path: &Path) -> std::io::Result<FileStats> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let (tokens, counts) = tokenize_counts(&text);

    Ok(FileStats {
        path: path.to_string_lossy().into_owned(),
        tokens,
        counts,
    })
}

/// Merged word-frequency table, built by absorbing per-file counts in
/// arrival order.
///
/// Each token is stamped with a sequence number when it first enters the
/// table; `top_k` uses that stamp to break count ties, so "first encountered
/// in merge order" is the documented tie-break.
#[derive(Debug, Default)]
pub struct FrequencyTable {
    counts: HashMap<String, (u64, u64)>,
    next_seq: u64,
}

impl FrequencyTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one file's counts into the table, summing per token
    pub fn absorb(&mut self, counts: &[(String, u64)]) {
        for (token, n) in counts {
            match self.counts.get_mut(token) {
                Some(entry) => entry.0 += n,
                None => {
                    self.counts.insert(token.clone(), (*n, self.next_seq));
                    self.next_seq += 1;
                }
            }
        }
    }

    /// Number of distinct tokens
    pub fn unique(&self) -> usize {
        self.counts.len()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().map(|(n, _)| n).sum()
    }

    /// Count for one token, 0 if absent
    pub fn count(&self, token: &str) -> u64 {
        self.counts.get(token).map(|(n, _)| *n).unwrap_or(0)
    }

    /// The `k` most frequent tokens, descending by count, ties broken by
    /// first encounter in merge order
    pub fn top_k(&self, k: usize) -> Vec<(String, u64)> {
        let mut entries: Vec<(&String, u64, u64)> = self
            .counts
            .iter()
            .map(|(token, &(n, seq))| (token, n, seq))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        entries
            .into_iter()
            .take(k)
            .map(|(token, n, _)| (token.clone(), n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_tokenize_case_folds() {
        let (total, counts) = tokenize_counts("Dog dog DOG");
        assert_eq!(total, 3);
        assert_eq!(counts, vec![("dog".to_string(), 3)]);
    }

    #[test]
    fn test_tokenize_splits_on_non_word() {
        let (total, counts) = tokenize_counts("a-b, c.d!");
        assert_eq!(total, 4);
        assert_eq!(counts.len(), 4);
    }

    #[test]
    fn test_tokenize_unicode_words() {
        let (total, counts) = tokenize_counts("zażółć gęślą jaźń");
        assert_eq!(total, 3);
        assert_eq!(counts[0].0, "zażółć");
    }

    #[test]
    fn test_tokenize_first_occurrence_order() {
        let (_, counts) = tokenize_counts("b a b c a b");
        let tokens: Vec<&str> = counts.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tokens, vec!["b", "a", "c"]);
        assert_eq!(counts[0].1, 3);
        assert_eq!(counts[1].1, 2);
        assert_eq!(counts[2].1, 1);
    }

    #[test]
    fn test_analyze_file_lossy_decode() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"ok \xff\xfe ok").unwrap();
        let stats = analyze_file(f.path()).unwrap();
        assert_eq!(stats.counts[0], ("ok".to_string(), 2));
    }

    #[test]
    fn test_analyze_missing_file_is_error() {
        assert!(analyze_file(Path::new("/nonexistent/no.txt")).is_err());
    }

    #[test]
    fn test_merge_conservation() {
        let inputs = ["a b a", "b c", "c c a"];
        let mut table = FrequencyTable::new();
        let mut total = 0;
        for text in inputs {
            let (tokens, counts) = tokenize_counts(text);
            total += tokens;
            table.absorb(&counts);
        }
        assert_eq!(total, 8);
        assert_eq!(table.total(), 8);
        assert_eq!(table.unique(), 3);
        assert_eq!(table.count("a"), 3);
        assert_eq!(table.count("b"), 2);
        assert_eq!(table.count("c"), 3);
    }

    #[test]
    fn test_merge_commutative() {
        let maps: Vec<Vec<(String, u64)>> = ["a b a", "b c", "c c a"]
            .iter()
            .map(|t| tokenize_counts(t).1)
            .collect();

        // All 6 permutations of 3 sources yield identical counts
        let orders = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for order in orders {
            let mut table = FrequencyTable::new();
            for &i in &order {
                table.absorb(&maps[i]);
            }
            assert_eq!(table.count("a"), 3);
            assert_eq!(table.count("b"), 2);
            assert_eq!(table.count("c"), 3);
            assert_eq!(table.total(), 8);
        }
    }

    #[test]
    fn test_top_k_tie_break_is_first_encountered() {
        let mut table = FrequencyTable::new();
        // "x" and "y" end up tied at 2; "x" is merged first
        table.absorb(&[("x".to_string(), 2)]);
        table.absorb(&[("y".to_string(), 2), ("z".to_string(), 5)]);

        let top = table.top_k(3);
        assert_eq!(top[0], ("z".to_string(), 5));
        assert_eq!(top[1], ("x".to_string(), 2));
        assert_eq!(top[2], ("y".to_string(), 2));
    }

    #[test]
    fn test_top_k_truncates() {
        let mut table = FrequencyTable::new();
        table.absorb(&[("a".to_string(), 1), ("b".to_string(), 2)]);
        assert_eq!(table.top_k(1), vec![("b".to_string(), 2)]);
    }
}
