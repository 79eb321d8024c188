//! Fuzzy matching of release names against tracked titles.
//!
//! Scoring follows LiquidMetal: every character of the abbreviation must be
//! found in order in the candidate. Matched characters score 1, characters
//! skipped before a match at a word start score 0.85 (the one right before
//! the word start scores 1), other skipped characters score 0, and the tail
//! after the last match scores 0.9 when both strings start alike and 0.8
//! otherwise. The result is the best average over all alignments.

const SCORE_NO_MATCH: f64 = 0.0;
const SCORE_MATCH: f64 = 1.0;
const SCORE_TRAILING: f64 = 0.8;
const SCORE_TRAILING_BUT_STARTED: f64 = 0.9;
const SCORE_BUFFER: f64 = 0.85;
const WORD_SEPARATORS: &[char] = &[' ', '\t', '_', '-'];

/// Minimum score (0-100) a release needs to count as a match
pub const MATCH_THRESHOLD: f64 = 60.0;

/// Lowercase, drop non-ASCII, spaces become dots
pub fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == ' ' { '.' } else { c.to_ascii_lowercase() })
        .collect()
}

struct Scorer<'a> {
    original: &'a [char],
    search: Vec<char>,
    abbrev: Vec<char>,
    trailing: f64,
    memo: Vec<Option<Option<f64>>>,
}

impl Scorer<'_> {
    fn is_new_word(&self, index: usize) -> bool {
        index == 0 || WORD_SEPARATORS.contains(&self.original[index - 1])
    }

    /// Score of the run from `start` up to and including a match at `index`
    fn segment(&self, start: usize, index: usize) -> f64 {
        if self.is_new_word(index) {
            if index > start {
                // `index - 1` is the separator, which scores a full point
                SCORE_BUFFER * (index - 1 - start) as f64 + SCORE_MATCH + SCORE_MATCH
            } else {
                SCORE_MATCH
            }
        } else if self.original[index].is_uppercase() {
            SCORE_BUFFER * (index - start) as f64 + SCORE_MATCH
        } else {
            SCORE_NO_MATCH * (index - start) as f64 + SCORE_MATCH
        }
    }

    /// Best total for positions `start..` with `abbrev[k..]` still unmatched
    fn best(&mut self, start: usize, k: usize) -> Option<f64> {
        let n = self.search.len();
        if k == self.abbrev.len() {
            return Some(self.trailing * (n - start) as f64);
        }

        let slot = start * (self.abbrev.len() + 1) + k;
        if let Some(cached) = self.memo[slot] {
            return cached;
        }

        let wanted = self.abbrev[k];
        let mut best: Option<f64> = None;
        for index in start..n {
            if self.search[index] != wanted {
                continue;
            }
            if let Some(rest) = self.best(index + 1, k + 1) {
                let total = self.segment(start, index) + rest;
                best = Some(best.map_or(total, |b| b.max(total)));
            }
        }

        self.memo[slot] = Some(best);
        best
    }
}

/// LiquidMetal score of `abbrev` against `string`, in `0.0..=1.0`
pub fn liquid_metal_score(string: &str, abbrev: &str) -> f64 {
    let search: Vec<char> = string.to_lowercase().chars().collect();
    let abbrev: Vec<char> = abbrev.to_lowercase().chars().collect();

    if abbrev.is_empty() {
        return SCORE_TRAILING;
    }
    if abbrev.len() > search.len() {
        return SCORE_NO_MATCH;
    }

    let mut original: Vec<char> = string.chars().collect();
    if original.len() != search.len() {
        // Case mapping changed the length, so word boundaries come from the lowercase form
        original = search.clone();
    }

    let trailing = if search.first() == abbrev.first() {
        SCORE_TRAILING_BUT_STARTED
    } else {
        SCORE_TRAILING
    };

    let n = search.len();
    let mut scorer = Scorer {
        original: &original,
        memo: vec![None; (n + 1) * (abbrev.len() + 1)],
        search,
        abbrev,
        trailing,
    };

    scorer.best(0, 0).map_or(SCORE_NO_MATCH, |total| total / n as f64)
}

/// Whether any release name matches `title` from `year`
///
/// Releases not containing the year are skipped; the rest are cut right after
/// the first occurrence of the year before scoring. The first release scoring
/// above the threshold wins.
pub fn fuzzy_match<S: AsRef<str>>(releases: &[S], title: &str, year: u32) -> bool {
    let year = year.to_string();
    let wanted = normalize(&format!("{}.{}", title, year));

    for release in releases {
        let candidate = normalize(release.as_ref());
        let Some(pos) = candidate.find(&year) else {
            continue;
        };
        let candidate = &candidate[..pos + year.len()];

        let score = liquid_metal_score(candidate, &wanted) * 100.0;
        if score > MATCH_THRESHOLD {
            tracing::debug!(release = %candidate, title = %wanted, score = score as u32, "Release matches");
            return true;
        }
    }
    false
}
