use crate::error::CoreError;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::str::FromStr;

/// The closed event-type vocabulary (§6). Implementers must not silently
/// extend this set — adding a type is a source change (§9 design note),
/// not a runtime one.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display)]
pub enum EventType {
    Sanctions,
    RateHike,
    RateCut,
    Earnings,
    EarningsBeat,
    EarningsMiss,
    GuidanceCut,
    #[display("m&a")]
    Ma,
    Default,
    DividendCut,
    Buyback,
    Regulatory,
    SupplyChain,
    Accident,
    ManagementChange,
    Ipo,
    MarketDrop,
    RubAppreciation,
    RubDepreciation,
    BankStockUp,
    StockRally,
    StockDrop,
    BondCrash,
    SectorDrop,
    StockVolatility,
    ProductionDown,
}

impl EventType {
    pub const ALL: [EventType; 26] = [
        EventType::Sanctions,
        EventType::RateHike,
        EventType::RateCut,
        EventType::Earnings,
        EventType::EarningsBeat,
        EventType::EarningsMiss,
        EventType::GuidanceCut,
        EventType::Ma,
        EventType::Default,
        EventType::DividendCut,
        EventType::Buyback,
        EventType::Regulatory,
        EventType::SupplyChain,
        EventType::Accident,
        EventType::ManagementChange,
        EventType::Ipo,
        EventType::MarketDrop,
        EventType::RubAppreciation,
        EventType::RubDepreciation,
        EventType::BankStockUp,
        EventType::StockRally,
        EventType::StockDrop,
        EventType::BondCrash,
        EventType::SectorDrop,
        EventType::StockVolatility,
        EventType::ProductionDown,
    ];

    /// Canonical lower_snake wire form, matching the vocabulary strings in
    /// spec.md §6 exactly (eg/ `"m&a"`, `"rate_hike"`).
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            EventType::Sanctions => "sanctions",
            EventType::RateHike => "rate_hike",
            EventType::RateCut => "rate_cut",
            EventType::Earnings => "earnings",
            EventType::EarningsBeat => "earnings_beat",
            EventType::EarningsMiss => "earnings_miss",
            EventType::GuidanceCut => "guidance_cut",
            EventType::Ma => "m&a",
            EventType::Default => "default",
            EventType::DividendCut => "dividend_cut",
            EventType::Buyback => "buyback",
            EventType::Regulatory => "regulatory",
            EventType::SupplyChain => "supply_chain",
            EventType::Accident => "accident",
            EventType::ManagementChange => "management_change",
            EventType::Ipo => "ipo",
            EventType::MarketDrop => "market_drop",
            EventType::RubAppreciation => "rub_appreciation",
            EventType::RubDepreciation => "rub_depreciation",
            EventType::BankStockUp => "bank_stock_up",
            EventType::StockRally => "stock_rally",
            EventType::StockDrop => "stock_drop",
            EventType::BondCrash => "bond_crash",
            EventType::SectorDrop => "sector_drop",
            EventType::StockVolatility => "stock_volatility",
            EventType::ProductionDown => "production_down",
        }
    }
}

impl FromStr for EventType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|ty| ty.as_wire_str() == s)
            .ok_or_else(|| CoreError::UnknownEventType(s.to_owned()))
    }
}

/// Default anchor-event set (§4.E, §9 REDESIGN FLAG 4: externalised to
/// configuration rather than hard-coded in multiple places). Callers should
/// prefer the configured set; this is the fallback when no configuration is
/// supplied.
pub fn default_anchor_types() -> &'static [EventType] {
    &[
        EventType::Sanctions,
        EventType::RateHike,
        EventType::RateCut,
        EventType::Default,
        EventType::Ma,
        EventType::EarningsBeat,
        EventType::EarningsMiss,
    ]
}

/// Attributes carried by an [`Event`]: linked companies/tickers and any
/// numeric metrics copied over from the triggering [`crate::extraction::Extraction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventAttrs {
    pub companies: Vec<SmolStr>,
    /// Invariant 1 (§8): only ever contains ids of instruments that exist in
    /// the graph once the Instrument Linker and Graph Writer have run.
    pub tickers: Vec<SmolStr>,
    pub numeric_fields: Vec<(SmolStr, f64)>,
}

/// The central CEG vertex (§3). Owned by the Event Extractor; immutable
/// after creation except for `is_anchor` recomputation against a changed
/// anchor-set configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: SmolStr,
    pub record_source: SmolStr,
    pub record_external_id: SmolStr,
    pub event_type: EventType,
    pub title: String,
    pub ts: chrono::DateTime<chrono::Utc>,
    pub attrs: EventAttrs,
    pub is_anchor: bool,
    pub extraction_confidence: f64,
}

impl Event {
    pub fn recompute_anchor(&mut self, anchor_types: &[EventType]) {
        self.is_anchor = anchor_types.contains(&self.event_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings_roundtrip() {
        for ty in EventType::ALL {
            let parsed: EventType = ty.as_wire_str().parse().unwrap();
            assert_eq!(parsed, ty);
        }
    }

    #[test]
    fn ma_wire_string_is_ampersand_form() {
        assert_eq!(EventType::Ma.as_wire_str(), "m&a");
    }

    #[test]
    fn unknown_wire_string_errors() {
        let err = "not_a_real_type".parse::<EventType>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownEventType(_)));
    }

    #[test]
    fn recompute_anchor_uses_configured_set() {
        let mut event = Event {
            id: "ev1".into(),
            record_source: "src".into(),
            record_external_id: "ext1".into(),
            event_type: EventType::Sanctions,
            title: "title".into(),
            ts: chrono::Utc::now(),
            attrs: EventAttrs::default(),
            is_anchor: false,
            extraction_confidence: 0.8,
        };
        event.recompute_anchor(default_anchor_types());
        assert!(event.is_anchor);

        event.recompute_anchor(&[EventType::Ipo]);
        assert!(!event.is_anchor);
    }
}
