/// Legal-form stop-words stripped during normalisation (§4.D, `moex_linker.py`).
pub const STOP_WORDS: &[&str] = &[
    "pao", "ao", "oao", "zao", "llc", "ltd", "inc", "corp", "plc", "group", "holding",
    "corporation", "bank",
];

/// Lowercase, strip quotes/punctuation, remove legal-form stop-words, and
/// collapse whitespace (§4.D). The result is the key used for alias-table
/// lookups and the input to tier-4 fuzzy matching.
pub fn normalize(mention: &str) -> String {
    let lowered = mention.to_lowercase();

    let stripped: String = lowered
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '«' | '»' | '“' | '”' | '‘' | '’'))
        .map(|c| if c.is_ascii_punctuation() { ' ' } else { c })
        .collect();

    let words: Vec<&str> = stripped
        .split_whitespace()
        .filter(|word| !STOP_WORDS.contains(word))
        .collect();

    words.join(" ")
}

/// A direct-ticker mention: `[A-Z]{4}[A-Z0-9]*` (§4.D tier 1). Matching is
/// done against the original, un-normalised mention since case carries
/// meaning here.
pub fn direct_ticker_candidate(mention: &str) -> Option<&str> {
    let trimmed = mention.trim();
    let mut chars = trimmed.char_indices();

    let mut alpha_run = 0;
    for (idx, c) in chars.by_ref() {
        if c.is_ascii_uppercase() {
            alpha_run += 1;
            if alpha_run == 4 {
                let rest = &trimmed[idx + c.len_utf8()..];
                let rest_ok = rest.chars().all(|rc| rc.is_ascii_uppercase() || rc.is_ascii_digit());
                if rest_ok {
                    return Some(trimmed);
                }
                return None;
            }
        } else {
            return None;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_legal_form_and_punctuation() {
        assert_eq!(normalize("PAO \"Gazprom\""), "gazprom");
        assert_eq!(normalize("Norilsk Nickel, PJSC"), "norilsk nickel pjsc");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  Sber   Bank  "), "sber");
    }

    #[test]
    fn direct_ticker_requires_four_uppercase_then_alnum() {
        assert_eq!(direct_ticker_candidate("GAZP"), Some("GAZP"));
        assert_eq!(direct_ticker_candidate("GMKN3"), Some("GMKN3"));
        assert_eq!(direct_ticker_candidate("Gazprom"), None);
        assert_eq!(direct_ticker_candidate("GAZ"), None);
    }
}
