use strsim::{jaro_winkler, normalized_levenshtein};

/// Tier-4 combined similarity: `0.4*sequence_ratio + 0.4*token_sort_ratio +
/// 0.2*partial_ratio`, all normalised to `[0, 1]` (§4.D,
/// `_calculate_similarity`, Open Question 3 resolved: 0.7 on this scale).
///
/// `strsim` substitutes for the original's `rapidfuzz`: `normalized_levenshtein`
/// plays the role of `sequence_ratio`/`partial_ratio`, `jaro_winkler` over the
/// token-sorted strings plays `token_sort_ratio` — both already return
/// `[0, 1]` ratios.
pub fn combined_similarity(a: &str, b: &str) -> f64 {
    let sequence_ratio = normalized_levenshtein(a, b);
    let token_sort_ratio = jaro_winkler(&sort_tokens(a), &sort_tokens(b));
    let partial_ratio = partial_ratio(a, b);

    (0.4 * sequence_ratio + 0.4 * token_sort_ratio + 0.2 * partial_ratio).clamp(0.0, 1.0)
}

pub const FUZZY_ACCEPT_THRESHOLD: f64 = 0.7;

/// Resulting link confidence for a fuzzy match: `similarity * 0.9` (§4.D).
pub fn fuzzy_confidence(similarity: f64) -> f64 {
    (similarity * 0.9).clamp(0.0, 1.0)
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Best-substring-window Levenshtein ratio of the shorter string against
/// the longer one, approximating `rapidfuzz`'s `partial_ratio`.
fn partial_ratio(a: &str, b: &str) -> f64 {
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if shorter.is_empty() {
        return if longer.is_empty() { 1.0 } else { 0.0 };
    }
    if longer.len() <= shorter.len() {
        return normalized_levenshtein(shorter, longer);
    }

    let longer_chars: Vec<char> = longer.chars().collect();
    let shorter_len = shorter.chars().count();

    (0..=longer_chars.len() - shorter_len)
        .map(|start| {
            let window: String = longer_chars[start..start + shorter_len].iter().collect();
            normalized_levenshtein(shorter, &window)
        })
        .fold(0.0_f64, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert!((combined_similarity("gazprom", "gazprom") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn token_order_does_not_matter_for_token_sort_component() {
        let a = sort_tokens("nickel norilsk");
        let b = sort_tokens("norilsk nickel");
        assert_eq!(a, b);
    }

    #[test]
    fn threshold_accepts_close_variants() {
        let sim = combined_similarity("norilsk nickel", "norilsk nikel");
        assert!(sim >= FUZZY_ACCEPT_THRESHOLD);
    }

    #[test]
    fn unrelated_strings_score_low() {
        let sim = combined_similarity("gazprom", "sberbank");
        assert!(sim < FUZZY_ACCEPT_THRESHOLD);
    }

    #[test]
    fn fuzzy_confidence_scales_by_point_nine() {
        assert!((fuzzy_confidence(1.0) - 0.9).abs() < 1e-9);
    }
}
