/// Patterns identifying a mention as a regulatory body (central bank,
/// ministry, or market regulator) rather than a linkable company (§4.D:
/// "matched via a separate pattern must be classified as `REGULATORY`").
const REGULATORY_PATTERNS: &[&str] = &[
    "central bank",
    "bank of russia",
    "ministry of finance",
    "ministry of economic",
    "ministry of energy",
    "federal reserve",
    "securities and exchange commission",
    "bank of england",
    "european central bank",
];

/// Whether `mention` matches a known regulatory-body pattern, case-insensitive.
pub fn is_regulatory_mention(mention: &str) -> bool {
    let lowered = mention.to_lowercase();
    REGULATORY_PATTERNS
        .iter()
        .any(|pattern| lowered.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_central_bank_variants() {
        assert!(is_regulatory_mention("Bank of Russia"));
        assert!(is_regulatory_mention("the Central Bank raised rates"));
        assert!(is_regulatory_mention("Ministry of Finance statement"));
    }

    #[test]
    fn does_not_flag_ordinary_companies() {
        assert!(!is_regulatory_mention("Sberbank"));
        assert!(!is_regulatory_mention("Norilsk Nickel"));
    }
}
