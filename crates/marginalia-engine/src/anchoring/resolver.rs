//! Re-anchoring a stored [`Selector`] against the current document.
//!
//! Resolution runs in stages, each only when the previous one found nothing:
//!
//! 1. **Exact quote.** Every occurrence of `exact` in the flattened text.
//!    One occurrence wins outright; several are ranked by how well the text
//!    around each matches the stored prefix/suffix, then by distance to the
//!    stored position, then by offset.
//! 2. **Fuzzy quote.** Approximate matches of `exact`, searched only inside
//!    windows seeded by where the stored context (or the stored position)
//!    still lands. A candidate must reach `fuzzy_threshold` similarity.
//! 3. **Position.** The stored offsets, verbatim, if they still fit.
//! 4. Otherwise [`AnchorError::NotFound`].

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::anchoring::similarity::{best_substring_matches, similarity};
use crate::anchoring::{AnchorError, Selector, TextIndex, TextPositionSelector};

const SCORE_EPSILON: f64 = 1e-9;

/// Tunables for selector building and resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorOptions {
    /// Chars of prefix/suffix captured around a selection
    pub context_chars: usize,
    /// Minimum similarity for a fuzzy candidate, in `[0, 1]`
    pub fuzzy_threshold: f64,
    /// Extra chars searched either side of a seeded window
    pub fuzzy_slack: usize,
    /// Chars of prefix tail / suffix head used to find seed positions
    pub seed_chars: usize,
    /// Cap on seed positions taken from each side of the context
    pub max_seeds: usize,
    /// Longest document scanned in full when nothing seeds a window
    pub max_unseeded_scan: usize,
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            context_chars: 100,
            fuzzy_threshold: 0.6,
            fuzzy_slack: 32,
            seed_chars: 32,
            max_seeds: 16,
            max_unseeded_scan: 20_000,
        }
    }
}

/// Which stage produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Exact,
    Fuzzy,
    Position,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::Exact => "exact",
            Confidence::Fuzzy => "fuzzy",
            Confidence::Position => "position",
        };
        f.write_str(label)
    }
}

/// A resolved flat char range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub start: usize,
    pub end: usize,
    pub confidence: Confidence,
}

impl Resolution {
    pub fn new(start: usize, end: usize, confidence: Confidence) -> Self {
        Self {
            start,
            end,
            confidence,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Selector quote split into chars once per resolution.
struct Quote {
    exact: Vec<char>,
    prefix: Vec<char>,
    suffix: Vec<char>,
}

impl Quote {
    fn from_selector(selector: &Selector) -> Self {
        Self {
            exact: selector.quote.exact.chars().collect(),
            prefix: selector.quote.prefix.chars().collect(),
            suffix: selector.quote.suffix.chars().collect(),
        }
    }

    /// Combined prefix + suffix similarity of the text around `start..end`.
    fn context_score(&self, text: &[char], start: usize, end: usize) -> f64 {
        let before = &text[start.saturating_sub(self.prefix.len())..start];
        let after = &text[end..(end + self.suffix.len()).min(text.len())];
        similarity(&self.prefix, before) + similarity(&self.suffix, after)
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    /// Similarity of the candidate to the quote
    quote_score: f64,
    context_score: f64,
}

/// Candidate ordering: quote score, then context score, then closeness to
/// the position hint, then lowest offset. `Less` means `a` ranks first.
fn rank(a: &Candidate, b: &Candidate, hint: Option<usize>) -> Ordering {
    let by_score = |x: f64, y: f64| {
        if (x - y).abs() <= SCORE_EPSILON {
            Ordering::Equal
        } else {
            y.partial_cmp(&x).unwrap_or(Ordering::Equal)
        }
    };

    by_score(a.quote_score, b.quote_score)
        .then_with(|| by_score(a.context_score, b.context_score))
        .then_with(|| match hint {
            Some(h) => a.start.abs_diff(h).cmp(&b.start.abs_diff(h)),
            None => Ordering::Equal,
        })
        .then_with(|| a.start.cmp(&b.start))
}

fn pick_best(candidates: &[Candidate], hint: Option<usize>) -> Option<Candidate> {
    candidates
        .iter()
        .copied()
        .min_by(|a, b| rank(a, b, hint))
}

/// Start offsets of every (possibly overlapping) occurrence of `needle`.
fn find_all(needle: &[char], haystack: &[char]) -> Vec<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle)
        .map(|(i, _)| i)
        .collect()
}

/// Sort and coalesce overlapping windows, dropping empty ones.
fn merge_regions(mut regions: Vec<Range<usize>>) -> Vec<Range<usize>> {
    regions.retain(|r| r.start < r.end);
    regions.sort_by_key(|r| r.start);

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(regions.len());
    for region in regions {
        match merged.last_mut() {
            Some(last) if region.start <= last.end => last.end = last.end.max(region.end),
            _ => merged.push(region),
        }
    }
    merged
}

/// Anchor resolver configured with [`AnchorOptions`].
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    options: AnchorOptions,
}

impl Resolver {
    pub fn new(options: AnchorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AnchorOptions {
        &self.options
    }

    /// Find the best current range for `selector`.
    pub fn resolve<N>(
        &self,
        selector: &Selector,
        index: &TextIndex<N>,
    ) -> Result<Resolution, AnchorError>
    where
        N: Copy + Eq + fmt::Debug,
    {
        let text = index.chars();
        let quote = Quote::from_selector(selector);
        let hint = selector.position.map(|p| p.start);

        if quote.exact.is_empty() {
            log::debug!("selector has an empty quote, skipping quote stages");
        } else {
            if let Some(found) = self.exact_stage(&quote, text, hint) {
                return Ok(found);
            }
            if let Some(found) = self.fuzzy_stage(&quote, text, hint) {
                return Ok(found);
            }
        }

        position_stage(selector.position, text.len())
    }

    fn exact_stage(&self, quote: &Quote, text: &[char], hint: Option<usize>) -> Option<Resolution> {
        let occurrences = find_all(&quote.exact, text);
        let len = quote.exact.len();
        log::debug!("exact stage: {} occurrence(s)", occurrences.len());

        let start = match occurrences.as_slice() {
            [] => return None,
            [only] => *only,
            many => {
                let candidates: Vec<Candidate> = many
                    .iter()
                    .map(|&start| Candidate {
                        start,
                        end: start + len,
                        quote_score: 1.0,
                        context_score: quote.context_score(text, start, start + len),
                    })
                    .collect();
                pick_best(&candidates, hint)?.start
            }
        };

        Some(Resolution::new(start, start + len, Confidence::Exact))
    }

    fn fuzzy_stage(&self, quote: &Quote, text: &[char], hint: Option<usize>) -> Option<Resolution> {
        let regions = self.fuzzy_regions(quote, text, hint);
        if regions.is_empty() {
            log::debug!("fuzzy stage: nothing seeds a search window");
            return None;
        }

        let mut candidates = Vec::new();
        for region in &regions {
            let window = &text[region.clone()];
            for found in best_substring_matches(&quote.exact, window) {
                let start = region.start + found.start;
                let end = region.start + found.end;
                let quote_score = similarity(&quote.exact, &text[start..end]);
                if quote_score + SCORE_EPSILON < self.options.fuzzy_threshold {
                    continue;
                }
                candidates.push(Candidate {
                    start,
                    end,
                    quote_score,
                    context_score: quote.context_score(text, start, end),
                });
            }
        }

        log::debug!(
            "fuzzy stage: {} window(s), {} candidate(s) above {:.2}",
            regions.len(),
            candidates.len(),
            self.options.fuzzy_threshold
        );

        let best = pick_best(&candidates, hint)?;
        Some(Resolution::new(best.start, best.end, Confidence::Fuzzy))
    }

    /// Windows worth running approximate matching in.
    ///
    /// Seeds are exact occurrences of the prefix tail (quote expected right
    /// after) and the suffix head (quote expected right before), plus the
    /// stored position. The whole text is only scanned when nothing seeds a
    /// window and the text is short enough.
    fn fuzzy_regions(
        &self,
        quote: &Quote,
        text: &[char],
        hint: Option<usize>,
    ) -> Vec<Range<usize>> {
        let opts = &self.options;
        let len = text.len();
        let m = quote.exact.len();
        let slack = opts.fuzzy_slack.max(m / 2);

        let nearest_seeds = |mut seeds: Vec<usize>| {
            if let Some(h) = hint {
                seeds.sort_by_key(|&s| (s.abs_diff(h), s));
            }
            seeds.truncate(opts.max_seeds);
            seeds
        };

        let mut regions = Vec::new();

        if !quote.prefix.is_empty() && opts.seed_chars > 0 {
            let tail = &quote.prefix[quote.prefix.len().saturating_sub(opts.seed_chars)..];
            for at in nearest_seeds(find_all(tail, text)) {
                let expected_start = at + tail.len();
                regions.push(expected_start.saturating_sub(slack)..(expected_start + m + slack).min(len));
            }
        }

        if !quote.suffix.is_empty() && opts.seed_chars > 0 {
            let head = &quote.suffix[..quote.suffix.len().min(opts.seed_chars)];
            for expected_end in nearest_seeds(find_all(head, text)) {
                regions.push(expected_end.saturating_sub(m + slack)..(expected_end + slack).min(len));
            }
        }

        if let Some(h) = hint
            && h <= len
        {
            regions.push(h.saturating_sub(slack)..(h + m + slack).min(len));
        }

        if regions.is_empty() && len <= opts.max_unseeded_scan {
            regions.push(0..len);
        }

        merge_regions(regions)
    }
}

fn position_stage(
    position: Option<TextPositionSelector>,
    len: usize,
) -> Result<Resolution, AnchorError> {
    match position {
        Some(p) if p.fits_within(len) => {
            log::debug!("falling back to stored position {}..{}", p.start, p.end);
            Ok(Resolution::new(p.start, p.end, Confidence::Position))
        }
        Some(p) if p.start > p.end => Err(AnchorError::IndexOutOfRange {
            start: p.start,
            end: p.end,
            len,
        }),
        _ => Err(AnchorError::NotFound),
    }
}

/// Resolve with default [`AnchorOptions`].
pub fn resolve<N>(selector: &Selector, index: &TextIndex<N>) -> Result<Resolution, AnchorError>
where
    N: Copy + Eq + fmt::Debug,
{
    Resolver::default().resolve(selector, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchoring::TextQuoteSelector;
    use crate::content::PlainText;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn index(text: &str) -> TextIndex<usize> {
        TextIndex::build(&PlainText::new(text))
    }

    fn selector(exact: &str, prefix: &str, suffix: &str, position: Option<(usize, usize)>) -> Selector {
        Selector {
            quote: TextQuoteSelector {
                exact: exact.to_string(),
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            },
            position: position.map(|(s, e)| TextPositionSelector::new(s, e)),
        }
    }

    #[test]
    fn test_single_occurrence_is_exact() {
        let idx = index("The quick brown fox jumps over the lazy dog.");
        let found = resolve(&selector("brown fox", "", "", None), &idx).unwrap();
        assert_eq!(found, Resolution::new(10, 19, Confidence::Exact));
    }

    #[test]
    fn test_quote_tracks_moved_text_despite_stale_position() {
        let sel = selector("brown fox", "The quick ", " jumps over the lazy dog.", Some((10, 19)));

        let idx = index("The not quick brown fox jumps over the lazy dog.");
        let found = resolve(&sel, &idx).unwrap();
        assert_eq!(found, Resolution::new(14, 23, Confidence::Exact));

        let idx = index("The slow brown fox jumps over the lazy dog.");
        let found = resolve(&sel, &idx).unwrap();
        assert_eq!(found, Resolution::new(9, 18, Confidence::Exact));
    }

    #[test]
    fn test_context_disambiguates_repeated_quote() {
        let idx = index("red apple, green apple, blue apple");
        // Position hint points at the first apple, but context says green.
        let sel = selector("apple", "green ", ", blue", Some((4, 9)));

        let found = resolve(&sel, &idx).unwrap();
        assert_eq!(found.range(), 17..22);
        assert_eq!(found.confidence, Confidence::Exact);
    }

    #[test]
    fn test_position_breaks_context_ties() {
        let idx = index("cat cat cat");
        let sel = selector("cat", "", "", Some((4, 7)));

        for _ in 0..5 {
            assert_eq!(resolve(&sel, &idx).unwrap().range(), 4..7);
        }
    }

    #[test]
    fn test_lowest_offset_breaks_remaining_ties() {
        let idx = index("cat cat cat");
        let sel = selector("cat", "", "", None);
        assert_eq!(resolve(&sel, &idx).unwrap().range(), 0..3);
    }

    #[test]
    fn test_overlapping_occurrences_are_candidates() {
        let idx = index("aaaa");
        let sel = selector("aa", "", "", Some((2, 4)));
        assert_eq!(resolve(&sel, &idx).unwrap().range(), 2..4);
    }

    #[test]
    fn test_fuzzy_match_after_small_edit() {
        let idx = index("The quick brown cat jumps over the lazy dog.");
        let sel = selector("brown fox", "The quick ", " jumps over", Some((10, 19)));

        let found = resolve(&sel, &idx).unwrap();
        assert_eq!(found, Resolution::new(10, 19, Confidence::Fuzzy));
    }

    #[test]
    fn test_fuzzy_match_follows_context_when_text_moves() {
        let original = "Intro paragraph. We should refactor the parser soon. Closing words.";
        let edited = format!("{}{}", "A brand new opening sentence was added here. ", original)
            .replace("refactor the parser", "refactor the parsers");
        let idx = index(&edited);
        let sel = selector("refactor the parser", "Intro paragraph. We should ", " soon.", Some((27, 46)));

        let found = resolve(&sel, &idx).unwrap();
        assert_eq!(found.confidence, Confidence::Exact);

        let sel = selector("refactor teh parser", "Intro paragraph. We should ", " soon.", Some((27, 46)));
        let found = resolve(&sel, &idx).unwrap();
        assert_eq!(found.confidence, Confidence::Fuzzy);
        assert_eq!(idx.slice(found.range()), "refactor the parser");
    }

    #[test]
    fn test_fuzzy_rejects_weak_candidates() {
        let idx = index("Completely unrelated words live here now.");
        let sel = selector("brown fox", "The quick ", " jumps", None);

        assert_eq!(resolve(&sel, &idx), Err(AnchorError::NotFound));
    }

    #[test]
    fn test_position_fallback_when_quote_is_gone() {
        let idx = index("Completely unrelated words live here now.");
        let sel = selector("brown fox", "The quick ", " jumps", Some((5, 12)));

        let found = resolve(&sel, &idx).unwrap();
        assert_eq!(found, Resolution::new(5, 12, Confidence::Position));
    }

    #[rstest]
    #[case(Some((30, 90)))]
    #[case(None)]
    fn test_unanchorable(#[case] position: Option<(usize, usize)>) {
        let idx = index("short text");
        let sel = selector("something else entirely", "", "", position);
        assert_eq!(resolve(&sel, &idx), Err(AnchorError::NotFound));
    }

    #[test]
    fn test_malformed_position_is_reported() {
        let idx = index("short text");
        let sel = selector("zzzzzzzzzzzzzzzz", "", "", Some((6, 2)));

        let err = resolve(&sel, &idx).unwrap_err();
        assert!(err.is_caller_fault());
    }

    #[test]
    fn test_threshold_is_tunable() {
        let idx = index("The quick brown cat jumps over the lazy dog.");
        let sel = selector("brown fox", "The quick ", " jumps over", None);

        let strict = Resolver::new(AnchorOptions {
            fuzzy_threshold: 0.9,
            ..AnchorOptions::default()
        });
        assert_eq!(strict.resolve(&sel, &idx), Err(AnchorError::NotFound));

        let lenient = Resolver::default();
        assert_eq!(lenient.resolve(&sel, &idx).unwrap().confidence, Confidence::Fuzzy);
    }

    #[test]
    fn test_unseeded_scan_is_bounded() {
        let idx = index("xx The quick brown fax jumps");
        let sel = selector("brown fox", "", "", None);

        let bounded = Resolver::new(AnchorOptions {
            max_unseeded_scan: 4,
            ..AnchorOptions::default()
        });
        assert_eq!(bounded.resolve(&sel, &idx), Err(AnchorError::NotFound));

        let found = Resolver::default().resolve(&sel, &idx).unwrap();
        assert_eq!(idx.slice(found.range()), "brown fax");
    }

    #[test]
    fn test_merge_regions() {
        assert_eq!(
            merge_regions(vec![5..9, 0..3, 2..4, 10..10, 8..12]),
            vec![0..4, 5..12]
        );
    }

    #[test]
    fn test_confidence_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Confidence::Position).unwrap(), "\"position\"");
        assert_eq!(Confidence::Fuzzy.to_string(), "fuzzy");
    }
}
