use ceg_core::causal::{LagClass, Sign};
use ceg_core::event::EventType;

/// One row of the domain-prior table (§4.G step 2, SPEC_FULL.md §4): a
/// `(cause_type, effect_type)` pair with its expected sign, lag class, and
/// prior confidence.
#[derive(Debug, Copy, Clone)]
pub struct DomainPrior {
    pub cause_type: EventType,
    pub effect_type: EventType,
    pub sign: Sign,
    pub expected_lag: LagClass,
    pub conf_prior: f64,
}

/// Reproduced verbatim from the original's `DOMAIN_PRIORS` list
/// (`cmnln_engine.py`). Two effect labels in the original
/// (`target_stock_up`, `stock_up`) have no counterpart in the closed
/// vocabulary (spec.md §6) and are mapped onto the nearest existing type,
/// `stock_rally` — recorded as an Open Question resolution in DESIGN.md.
pub const DOMAIN_PRIORS: &[DomainPrior] = &[
    DomainPrior {
        cause_type: EventType::Sanctions,
        effect_type: EventType::MarketDrop,
        sign: Sign::Negative,
        expected_lag: LagClass::ZeroToOneDay,
        conf_prior: 0.75,
    },
    DomainPrior {
        cause_type: EventType::RateHike,
        effect_type: EventType::RubAppreciation,
        sign: Sign::Positive,
        expected_lag: LagClass::OneHourToOneDay,
        conf_prior: 0.65,
    },
    DomainPrior {
        cause_type: EventType::RateHike,
        effect_type: EventType::BankStockUp,
        sign: Sign::Positive,
        expected_lag: LagClass::ZeroToThreeDays,
        conf_prior: 0.60,
    },
    DomainPrior {
        cause_type: EventType::RateCut,
        effect_type: EventType::RubDepreciation,
        sign: Sign::Negative,
        expected_lag: LagClass::OneHourToOneDay,
        conf_prior: 0.60,
    },
    DomainPrior {
        cause_type: EventType::EarningsBeat,
        effect_type: EventType::StockRally,
        sign: Sign::Positive,
        expected_lag: LagClass::ZeroToOneDay,
        conf_prior: 0.70,
    },
    DomainPrior {
        cause_type: EventType::EarningsMiss,
        effect_type: EventType::StockDrop,
        sign: Sign::Negative,
        expected_lag: LagClass::ZeroToOneDay,
        conf_prior: 0.75,
    },
    DomainPrior {
        cause_type: EventType::GuidanceCut,
        effect_type: EventType::StockDrop,
        sign: Sign::Negative,
        expected_lag: LagClass::ZeroToOneDay,
        conf_prior: 0.70,
    },
    DomainPrior {
        cause_type: EventType::Ma,
        effect_type: EventType::StockRally,
        sign: Sign::Positive,
        expected_lag: LagClass::ZeroToOneDay,
        conf_prior: 0.80,
    },
    DomainPrior {
        cause_type: EventType::Default,
        effect_type: EventType::BondCrash,
        sign: Sign::Negative,
        expected_lag: LagClass::ZeroToOneHour,
        conf_prior: 0.90,
    },
    DomainPrior {
        cause_type: EventType::DividendCut,
        effect_type: EventType::StockDrop,
        sign: Sign::Negative,
        expected_lag: LagClass::ZeroToOneDay,
        conf_prior: 0.65,
    },
    DomainPrior {
        cause_type: EventType::Buyback,
        effect_type: EventType::StockRally,
        sign: Sign::Positive,
        expected_lag: LagClass::ZeroToThreeDays,
        conf_prior: 0.60,
    },
    DomainPrior {
        cause_type: EventType::Regulatory,
        effect_type: EventType::SectorDrop,
        sign: Sign::Negative,
        expected_lag: LagClass::OneToSevenDays,
        conf_prior: 0.55,
    },
    DomainPrior {
        cause_type: EventType::SupplyChain,
        effect_type: EventType::ProductionDown,
        sign: Sign::Negative,
        expected_lag: LagClass::OneToFourWeeks,
        conf_prior: 0.50,
    },
    DomainPrior {
        cause_type: EventType::Accident,
        effect_type: EventType::StockDrop,
        sign: Sign::Negative,
        expected_lag: LagClass::ZeroToOneDay,
        conf_prior: 0.65,
    },
    DomainPrior {
        cause_type: EventType::ManagementChange,
        effect_type: EventType::StockVolatility,
        sign: Sign::Mixed,
        expected_lag: LagClass::ZeroToThreeDays,
        conf_prior: 0.45,
    },
];

/// Find the first prior row matching `cause_type`, mirroring the original's
/// `_find_domain_prior` (which also matches on cause type alone, taking the
/// first hit).
pub fn find_prior(cause_type: EventType) -> Option<&'static DomainPrior> {
    DOMAIN_PRIORS.iter().find(|prior| prior.cause_type == cause_type)
}

/// All prior rows matching `cause_type`, used by the L2 predictive watcher
/// (§4.J) to enumerate every plausible follow-on type rather than only the
/// first, as [`find_prior`] does for the single-pair CMNLN evaluation path.
pub fn priors_for_cause(cause_type: EventType) -> impl Iterator<Item = &'static DomainPrior> {
    DOMAIN_PRIORS.iter().filter(move |prior| prior.cause_type == cause_type)
}
