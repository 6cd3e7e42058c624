//! Token-overlap and edit-distance scores shared by every classifier.

use std::collections::HashSet;

/// Lowercase, turn punctuation into spaces and collapse whitespace.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Distinct lowercase alphanumeric tokens.
pub fn tokens(text: &str) -> HashSet<String> {
    normalize(text).split(' ').filter(|t| !t.is_empty()).map(str::to_owned).collect()
}

/// |A ∩ B| / |A ∪ B|.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f32 / union as f32
}

/// Fraction of query tokens present in the candidate.
pub fn overlap(query: &HashSet<String>, candidate: &HashSet<String>) -> f32 {
    if query.is_empty() {
        return 0.0;
    }
    query.intersection(candidate).count() as f32 / query.len() as f32
}

/// Jaccard weighted 0.6 plus raw overlap weighted 0.4.
pub fn similarity(query: &str, candidate: &str) -> f32 {
    let q = tokens(query);
    let c = tokens(candidate);
    jaccard(&q, &c) * 0.6 + overlap(&q, &c) * 0.4
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// 1 - distance / longer length, in [0, 1].
pub fn ratio(a: &str, b: &str) -> f32 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f32 / longest as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation() {
        assert_eq!(normalize("  Halo,   Kak!! "), "halo kak");
        assert_eq!(normalize("?!"), "");
    }

    #[test]
    fn identical_text_scores_one() {
        assert!((similarity("cara bayar", "Cara Bayar?") - 1.0).abs() < 1e-6);
    }

    #[test]
    fn partial_overlap_weights() {
        // jaccard 1/3, overlap 1/2
        let s = similarity("cara bayar", "cara order");
        assert!((s - (1.0 / 3.0 * 0.6 + 0.5 * 0.4)).abs() < 1e-6);
        assert_eq!(similarity("", "apa saja"), 0.0);
    }

    #[test]
    fn edit_distance() {
        assert_eq!(levenshtein("netflix", "netflik"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert!((ratio("spotify", "spotfy") - 6.0 / 7.0).abs() < 1e-6);
        assert_eq!(ratio("", ""), 1.0);
    }
}
