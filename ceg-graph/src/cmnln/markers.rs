/// Bilingual causal-marker phrase table with per-marker weight in `[0.5,
/// 0.9]` (§4.G step 3, reproduced verbatim from `cmnln_engine.py`'s
/// `CAUSAL_TEXT_MARKERS`).
pub const CAUSAL_TEXT_MARKERS: &[(&str, f64)] = &[
    ("из-за", 0.8),
    ("в результате", 0.8),
    ("вследствие", 0.8),
    ("в связи с", 0.7),
    ("на фоне", 0.6),
    ("после", 0.5),
    ("привело к", 0.9),
    ("вызвало", 0.9),
    ("стало причиной", 0.9),
    ("повлекло", 0.8),
    ("спровоцировало", 0.8),
    ("следствие", 0.7),
    ("due to", 0.8),
    ("because of", 0.8),
    ("as a result of", 0.8),
    ("caused by", 0.9),
    ("led to", 0.9),
    ("resulted in", 0.8),
];

/// `conf_text` = the maximum weight of any marker found in `text`, or `0.0`
/// if none match (§4.G step 3).
pub fn text_marker_confidence(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let lowered = text.to_lowercase();
    CAUSAL_TEXT_MARKERS
        .iter()
        .filter(|(marker, _)| lowered.contains(marker))
        .map(|(_, weight)| *weight)
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_marker_yields_zero() {
        assert_eq!(text_marker_confidence("a perfectly neutral sentence"), 0.0);
    }

    #[test]
    fn strongest_matching_marker_wins() {
        let text = "Stock fell after the news, caused by new sanctions";
        assert_eq!(text_marker_confidence(text), 0.9);
    }

    #[test]
    fn russian_markers_are_matched() {
        assert_eq!(text_marker_confidence("Акции упали из-за санкций"), 0.8);
    }
}
