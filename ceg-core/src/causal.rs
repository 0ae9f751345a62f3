use crate::error::{CausalLinkWeights, CoreError};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Direction of the inferred effect on the target.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display)]
pub enum Sign {
    #[display("+")]
    Positive,
    #[display("-")]
    Negative,
    #[display("±")]
    Mixed,
}

/// How a [`CausalLink`] came to exist (§3, §6).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display)]
pub enum CausalLinkKind {
    /// Discovered while both events were within the active watch window.
    Confirmed,
    /// Discovered after the fact by the retroactive reconciler (§7.Watchers).
    Retro,
    /// Predicted by a watcher rule, not yet confirmed by a matching event.
    Hypothesis,
}

/// The expected-lag class of a [`CausalLink`] (§3: "expected-lag class";
/// §6 closed vocabulary `0-1h/1h-1d/0-1d/0-3d/1-7d/1-4w`). This is the
/// domain prior's *expected* delay bucket for the `(cause_type,
/// effect_type)` pair, not a classification of the pair's *observed*
/// delay — the prior table (`ceg-graph::cmnln::priors::DOMAIN_PRIORS`)
/// assigns one of these to every row, and CMNLN evaluation (§4.G step 2)
/// carries the matched row's class onto the resulting link. Range bounds
/// are in seconds, inclusive on both ends, matching the original's
/// `_check_lag_match` lookup.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display)]
pub enum LagClass {
    #[display("0-1h")]
    ZeroToOneHour,
    #[display("1h-1d")]
    OneHourToOneDay,
    #[display("0-1d")]
    ZeroToOneDay,
    #[display("0-3d")]
    ZeroToThreeDays,
    #[display("1-7d")]
    OneToSevenDays,
    #[display("1-4w")]
    OneToFourWeeks,
}

impl LagClass {
    fn bounds_secs(&self) -> (i64, i64) {
        match self {
            LagClass::ZeroToOneHour => (0, 3_600),
            LagClass::OneHourToOneDay => (3_600, 86_400),
            LagClass::ZeroToOneDay => (0, 86_400),
            LagClass::ZeroToThreeDays => (0, 259_200),
            LagClass::OneToSevenDays => (86_400, 604_800),
            LagClass::OneToFourWeeks => (604_800, 2_419_200),
        }
    }

    /// Whether `delta` falls inside this class's range. Outside it, the
    /// caller halves `conf_prior` (§4.G step 2).
    pub fn matches(&self, delta: chrono::Duration) -> bool {
        let secs = delta.num_seconds();
        let (min, max) = self.bounds_secs();
        secs >= min && secs <= max
    }

    /// The class's range as `chrono::Duration`s, used by the L2 predictive
    /// watcher to turn a prior into a concrete target window
    /// (`ceg-watch::predictions`).
    pub fn bounds(&self) -> (chrono::Duration, chrono::Duration) {
        let (min, max) = self.bounds_secs();
        (chrono::Duration::seconds(min), chrono::Duration::seconds(max))
    }

    /// Classify an observed cause-to-effect delay into the nearest
    /// zero-anchored class, for pairs with no matching domain-prior row
    /// (§4.G step 2 only defines the expected class for known priors).
    pub fn from_delay(delay: chrono::Duration) -> Self {
        let secs = delay.num_seconds().max(0);
        if secs <= 3_600 {
            LagClass::ZeroToOneHour
        } else if secs <= 86_400 {
            LagClass::ZeroToOneDay
        } else if secs <= 259_200 {
            LagClass::ZeroToThreeDays
        } else if secs <= 604_800 {
            LagClass::OneToSevenDays
        } else {
            LagClass::OneToFourWeeks
        }
    }
}

/// A directed causal edge between two [`crate::event::Event`]s (§3).
///
/// Construction always goes through [`CausalLink::new`], which enforces
/// invariant 2 (§8): `cause.ts <= effect.ts`, and clamps `confidence` via
/// [`CausalLinkWeights`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalLink {
    pub cause: SmolStr,
    pub effect: SmolStr,
    pub kind: CausalLinkKind,
    pub sign: Sign,
    pub lag_class: LagClass,
    pub confidence: f64,
    pub weights: CausalLinkWeights,
    /// Evidence ids (§7.CMNLN) backing this link, soft-capped at 3, hard-capped
    /// at 5 (SPEC_FULL.md §4).
    pub evidence: Vec<SmolStr>,
}

impl CausalLink {
    /// `lag_class` is the *expected*-lag class for the `(cause_type,
    /// effect_type)` pair (the matched domain-prior row's
    /// `expected_lag`, or [`LagClass::from_delay`] of the observed delta
    /// when no prior row matched) — not a reclassification of `effect_ts
    /// - cause_ts` after the fact.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cause: SmolStr,
        effect: SmolStr,
        cause_ts: chrono::DateTime<chrono::Utc>,
        effect_ts: chrono::DateTime<chrono::Utc>,
        kind: CausalLinkKind,
        sign: Sign,
        lag_class: LagClass,
        conf_prior: f64,
        conf_text: f64,
        conf_market: f64,
    ) -> Result<Self, CoreError> {
        if cause_ts > effect_ts {
            return Err(CoreError::NonCausalOrdering {
                cause_ts: cause_ts.to_rfc3339(),
                effect_ts: effect_ts.to_rfc3339(),
            });
        }
        let weights = CausalLinkWeights::default();
        let confidence = weights.combine(conf_prior, conf_text, conf_market);
        Ok(Self {
            cause,
            effect,
            kind,
            sign,
            lag_class,
            confidence,
            weights,
            evidence: Vec::new(),
        })
    }

    /// Evidence soft target (§4): callers should stop accumulating evidence
    /// past this point unless a new item clears the acceptance threshold by
    /// a wide margin.
    pub const EVIDENCE_SOFT_TARGET: usize = 3;
    /// Evidence hard cap (§4): never store more than this many evidence ids.
    pub const EVIDENCE_HARD_CAP: usize = 5;

    pub fn push_evidence(&mut self, evidence_id: SmolStr) {
        if self.evidence.len() < Self::EVIDENCE_HARD_CAP {
            self.evidence.push(evidence_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn rejects_effect_before_cause() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let t1 = t0 - Duration::minutes(10);
        let err = CausalLink::new(
            "e1".into(),
            "e2".into(),
            t0,
            t1,
            CausalLinkKind::Confirmed,
            Sign::Positive,
            LagClass::ZeroToOneDay,
            0.5,
            0.5,
            0.5,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::NonCausalOrdering { .. }));
    }

    #[test]
    fn lag_class_serializes_to_range_labels() {
        assert_eq!(LagClass::ZeroToOneHour.to_string(), "0-1h");
        assert_eq!(LagClass::OneHourToOneDay.to_string(), "1h-1d");
        assert_eq!(LagClass::ZeroToOneDay.to_string(), "0-1d");
        assert_eq!(LagClass::ZeroToThreeDays.to_string(), "0-3d");
        assert_eq!(LagClass::OneToSevenDays.to_string(), "1-7d");
        assert_eq!(LagClass::OneToFourWeeks.to_string(), "1-4w");
    }

    #[test]
    fn from_delay_buckets_observed_delta_for_unprimed_pairs() {
        assert_eq!(LagClass::from_delay(Duration::minutes(30)), LagClass::ZeroToOneHour);
        assert_eq!(LagClass::from_delay(Duration::hours(12)), LagClass::ZeroToOneDay);
        assert_eq!(LagClass::from_delay(Duration::days(2)), LagClass::ZeroToThreeDays);
        assert_eq!(LagClass::from_delay(Duration::days(5)), LagClass::OneToSevenDays);
        assert_eq!(LagClass::from_delay(Duration::days(20)), LagClass::OneToFourWeeks);
    }

    #[test]
    fn confidence_clamped_and_evidence_capped() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let t1 = t0 + Duration::hours(1);
        let mut link = CausalLink::new(
            "e1".into(),
            "e2".into(),
            t0,
            t1,
            CausalLinkKind::Hypothesis,
            Sign::Negative,
            LagClass::ZeroToOneHour,
            1.5,
            1.5,
            1.5,
        )
        .unwrap();
        assert_eq!(link.confidence, 1.0);
        for i in 0..10 {
            link.push_evidence(format!("ev{i}").into());
        }
        assert_eq!(link.evidence.len(), CausalLink::EVIDENCE_HARD_CAP);
    }
}
