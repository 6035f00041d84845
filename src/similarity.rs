//! Fuzzy name matching between ROM files and cover art.
//!
//! Names are compared after removing parenthesized tags such as `(USA)` or
//! `(Rev 1)`, so region and revision noise does not affect the score.

use regex::Regex;
use std::sync::LazyLock;

/// Lowest score at which a candidate is accepted.
pub const MATCH_THRESHOLD: f64 = 0.75;

static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*?\)").expect("parenthesis pattern is valid"));

/// Strips parenthesized spans, trims, and lowercases `name`.
///
/// # Examples
///
/// ```
/// use romshelf::similarity::normalize_name;
///
/// assert_eq!(normalize_name("Game (USA) (Rev 1)"), "game");
/// assert_eq!(normalize_name("  Super Game  "), "super game");
/// ```
pub fn normalize_name(name: &str) -> String {
    PARENTHESIZED.replace_all(name, "").trim().to_lowercase()
}

/// Ratio of matching characters between `a` and `b`, in `[0.0, 1.0]`.
///
/// Matching characters are found by repeatedly taking the longest common
/// block and recursing on the unmatched text to either side of it. The
/// result is `2 * matched / (len(a) + len(b))`. The pair is ordered before
/// decomposition so the score does not depend on argument order.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_block(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, size)`.
///
/// Ties go to the block starting earliest in `a`, then earliest in `b`.
fn longest_block(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    // current[k]: length of the common run ending at a[i] and b[blo + k - 1]
    let mut previous = vec![0usize; bhi - blo + 1];
    let mut current = vec![0usize; bhi - blo + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            let k = j - blo + 1;
            current[k] = if a[i] == b[j] { previous[k - 1] + 1 } else { 0 };
            if current[k] > best_size {
                best_size = current[k];
                best_i = i + 1 - best_size;
                best_j = j + 1 - best_size;
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    (best_i, best_j, best_size)
}

/// The winning candidate of a [`SimilarityMatcher::best_match`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredMatch<'a> {
    /// Position of the candidate in the input slice.
    pub index: usize,
    pub candidate: &'a str,
    pub score: f64,
}

/// Picks the most similar candidate name for a ROM name.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityMatcher {
    threshold: f64,
}

impl Default for SimilarityMatcher {
    fn default() -> Self {
        Self {
            threshold: MATCH_THRESHOLD,
        }
    }
}

impl SimilarityMatcher {
    pub fn accepts(&self, score: f64) -> bool {
        score >= self.threshold
    }

    /// Scores two raw names after normalizing both.
    pub fn score(&self, left: &str, right: &str) -> f64 {
        similarity_ratio(&normalize_name(left), &normalize_name(right))
    }

    /// Returns the highest-scoring candidate if it reaches the threshold.
    ///
    /// Among equal scores the earliest candidate wins.
    pub fn best_match<'a, S: AsRef<str>>(
        &self,
        rom_base_name: &str,
        candidates: &'a [S],
    ) -> Option<ScoredMatch<'a>> {
        let rom = normalize_name(rom_base_name);
        let mut best: Option<ScoredMatch<'a>> = None;

        for (index, candidate) in candidates.iter().enumerate() {
            let candidate = candidate.as_ref();
            let score = similarity_ratio(&rom, &normalize_name(candidate));
            tracing::trace!(rom = rom_base_name, candidate, score, "scored candidate");
            if best.is_none_or(|current| score > current.score) {
                best = Some(ScoredMatch {
                    index,
                    candidate,
                    score,
                });
            }
        }

        best.filter(|found| self.accepts(found.score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_every_tag() {
        assert_eq!(normalize_name("Game (USA) (Rev 1)"), "game");
        assert_eq!(normalize_name("Game (Europe)"), "game");
        assert_eq!(normalize_name("Zelda (USA) [!]"), "zelda  [!]");
        assert_eq!(normalize_name("A (b (c) d)"), "a  d)");
    }

    #[test]
    fn test_identical_names_score_one() {
        let names = ["zelda"];
        let found = SimilarityMatcher::default().best_match("Zelda", &names).unwrap();
        assert_eq!(found.index, 0);
        assert_eq!(found.score, 1.0);
    }

    #[test]
    fn test_region_tags_ignored() {
        let matcher = SimilarityMatcher::default();
        assert_eq!(matcher.score("Game (USA) (Rev 1)", "Game (Europe)"), 1.0);
    }

    #[test]
    fn test_ratio_values() {
        assert_eq!(similarity_ratio("abcd", "abce"), 0.75);
        assert_eq!(similarity_ratio("abcd", "bcda"), 0.75);
        assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
        assert_eq!(similarity_ratio("", ""), 1.0);
        assert_eq!(similarity_ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_ratio_is_symmetric() {
        let pairs = [
            ("super mario world", "super mario land"),
            ("abcab", "cabca"),
            ("metroid", "metroid fusion"),
            ("tide", "diet"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity_ratio(a, b), similarity_ratio(b, a), "{a} / {b}");
        }
    }

    #[test]
    fn test_threshold_boundary() {
        let matcher = SimilarityMatcher::default();
        assert!(matcher.accepts(0.75));
        assert!(!matcher.accepts(0.7499));

        let exact = ["abce"];
        let found = matcher.best_match("abcd", &exact).unwrap();
        assert_eq!(found.score, 0.75);

        let below = ["abxyz"];
        assert!(matcher.best_match("abcd", &below).is_none());
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let candidates = ["abce", "abcf", "abcd"];
        let found = SimilarityMatcher::default()
            .best_match("abcd (USA)", &candidates)
            .unwrap();
        assert_eq!(found.index, 2);

        let tied = ["abce", "abcf"];
        let found = SimilarityMatcher::default().best_match("abcd", &tied).unwrap();
        assert_eq!(found.index, 0);
        assert_eq!(found.candidate, "abce");
    }

    #[test]
    fn test_unrelated_title_rejected() {
        let candidates = vec!["Metroid".to_string(), "Castlevania".to_string()];
        assert!(SimilarityMatcher::default().best_match("Zelda (USA)", &candidates).is_none());
    }

    #[test]
    fn test_no_candidates() {
        let candidates: [&str; 0] = [];
        assert!(SimilarityMatcher::default().best_match("Zelda", &candidates).is_none());
    }
}
