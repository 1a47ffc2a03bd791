//! Edit-distance helpers shared by the exact and fuzzy resolver stages.

/// Levenshtein distance over chars, two rows of memory.
pub fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Normalised similarity in `[0, 1]`: `1 - distance / longer_len`.
///
/// Two empty inputs are identical (1.0); one empty input scores 0.0.
pub fn similarity(a: &[char], b: &[char]) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let max_len = a.len().max(b.len());
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

/// An approximate occurrence of a pattern: `text[start..end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApproxMatch {
    pub start: usize,
    pub end: usize,
    pub distance: usize,
}

/// Every lowest-distance approximate occurrence of `pattern` in `text`.
///
/// Semi-global edit distance (Sellers): the pattern must be consumed
/// entirely, but may start and end anywhere in `text`. Runs in
/// `O(pattern.len() * text.len())`, so callers bound `text` to a window.
/// Results are ordered by end offset.
pub fn best_substring_matches(pattern: &[char], text: &[char]) -> Vec<ApproxMatch> {
    let m = pattern.len();
    if m == 0 || text.is_empty() {
        return Vec::new();
    }

    // Column j holds the cost of aligning pattern[..i] so that it ends at text[..j],
    // plus where in text that alignment started.
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut prev_start: Vec<usize> = vec![0; m + 1];
    let mut curr: Vec<usize> = vec![0; m + 1];
    let mut curr_start: Vec<usize> = vec![0; m + 1];

    let mut best = usize::MAX;
    let mut matches = Vec::new();

    for j in 1..=text.len() {
        curr[0] = 0;
        curr_start[0] = j;
        for i in 1..=m {
            let cost = usize::from(pattern[i - 1] != text[j - 1]);
            let diag = prev[i - 1] + cost;
            let up = curr[i - 1] + 1;
            let left = prev[i] + 1;

            if diag <= up && diag <= left {
                curr[i] = diag;
                curr_start[i] = prev_start[i - 1];
            } else if up <= left {
                curr[i] = up;
                curr_start[i] = curr_start[i - 1];
            } else {
                curr[i] = left;
                curr_start[i] = prev_start[i];
            }
        }

        let distance = curr[m];
        let start = curr_start[m];
        if start < j {
            if distance < best {
                best = distance;
                matches.clear();
            }
            if distance == best {
                matches.push(ApproxMatch {
                    start,
                    end: j,
                    distance,
                });
            }
        }

        std::mem::swap(&mut prev, &mut curr);
        std::mem::swap(&mut prev_start, &mut curr_start);
    }

    matches
}
