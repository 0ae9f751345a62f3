use ceg_core::causal::CausalLink;
use smol_str::SmolStr;
use std::collections::HashMap;

/// Direction to explore from the root event (§4.G "Chain discovery").
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ChainDirection {
    Forward,
    Backward,
    Bidirectional,
}

#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Default 3 (§4.G).
    pub max_depth: usize,
    /// Default 168h (§4.G).
    pub time_window_cap: chrono::Duration,
    pub min_edge_confidence: f64,
    /// `K`: maximum chains returned, ranked by average edge confidence.
    pub max_chains: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            time_window_cap: chrono::Duration::hours(168),
            min_edge_confidence: 0.3,
            max_chains: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Chain {
    pub events: Vec<SmolStr>,
    pub edges: Vec<CausalLink>,
    pub avg_effective_confidence: f64,
}

/// Per-edge effective confidence used to rank chains (§4.G "Chain
/// discovery", SPEC_FULL.md §4 `_calculate_link_confidence`): a blend of the
/// stored `conf_total` (0.4), a time-proximity factor (0.25), an importance
/// factor (0.2), and an evidence factor (0.15).
pub fn effective_confidence(
    link: &CausalLink,
    cause_ts: chrono::DateTime<chrono::Utc>,
    effect_ts: chrono::DateTime<chrono::Utc>,
    max_delay: chrono::Duration,
    importance_cause: f64,
    importance_effect: f64,
) -> f64 {
    let time_factor = time_proximity_factor(effect_ts - cause_ts, max_delay);
    let importance_factor = (importance_cause.clamp(0.0, 1.0) * importance_effect.clamp(0.0, 1.0))
        .sqrt()
        .clamp(0.0, 1.0);
    let evidence_factor =
        (link.evidence.len() as f64 / CausalLink::EVIDENCE_SOFT_TARGET as f64).clamp(0.0, 1.0);

    (link.confidence * 0.4 + time_factor * 0.25 + importance_factor * 0.2 + evidence_factor * 0.15)
        .clamp(0.0, 1.0)
}

/// Gaussian centred at an "optimal" 2h delay, `sigma = max_delay / 2`,
/// floored at 0.3 outside `[5min, 72h]` (SPEC_FULL.md §4).
fn time_proximity_factor(delay: chrono::Duration, max_delay: chrono::Duration) -> f64 {
    let delay_mins = delay.num_minutes() as f64;
    if !(5.0..=72.0 * 60.0).contains(&delay_mins) {
        return 0.3;
    }
    const OPTIMAL_MINUTES: f64 = 120.0;
    let sigma = (max_delay.num_minutes() as f64 / 2.0).max(1.0);
    (-((delay_mins - OPTIMAL_MINUTES).powi(2)) / (2.0 * sigma * sigma))
        .exp()
        .clamp(0.0, 1.0)
}

/// BFS chain discovery from `root` (§4.G "Chain discovery"): explores
/// outgoing edges (forward), incoming (backward), or both, up to
/// `config.max_depth`, applying `config.min_edge_confidence` and
/// `config.time_window_cap`, never revisiting a node within the same path.
/// Returns up to `config.max_chains` chains, ranked by average effective
/// edge confidence.
pub fn discover_chains(
    root: &SmolStr,
    direction: ChainDirection,
    config: &ChainConfig,
    outgoing: &HashMap<SmolStr, Vec<CausalLink>>,
    incoming: &HashMap<SmolStr, Vec<CausalLink>>,
    event_ts: &HashMap<SmolStr, chrono::DateTime<chrono::Utc>>,
    importance: &HashMap<SmolStr, f64>,
) -> Vec<Chain> {
    let Some(&root_ts) = event_ts.get(root) else {
        return Vec::new();
    };

    let mut complete_chains = Vec::new();
    let mut stack: Vec<(Vec<SmolStr>, Vec<CausalLink>)> = vec![(vec![root.clone()], Vec::new())];

    while let Some((path, edges)) = stack.pop() {
        let current = path.last().expect("path is never empty").clone();

        let next_edges = candidate_edges(&current, direction, outgoing, incoming);
        let mut extended = false;

        if path.len() - 1 < config.max_depth {
            for link in next_edges {
                let next_node = if link.cause == current { &link.effect } else { &link.cause };
                if path.contains(next_node) {
                    continue;
                }
                let (Some(&cause_ts), Some(&effect_ts)) =
                    (event_ts.get(&link.cause), event_ts.get(&link.effect))
                else {
                    continue;
                };
                if (effect_ts - root_ts).abs() > config.time_window_cap
                    || (cause_ts - root_ts).abs() > config.time_window_cap
                {
                    continue;
                }

                let effective = effective_confidence(
                    &link,
                    cause_ts,
                    effect_ts,
                    config.time_window_cap,
                    importance.get(&link.cause).copied().unwrap_or(0.5),
                    importance.get(&link.effect).copied().unwrap_or(0.5),
                );
                if effective < config.min_edge_confidence {
                    continue;
                }

                extended = true;
                let mut next_path = path.clone();
                next_path.push(next_node.clone());
                let mut next_edges_acc = edges.clone();
                next_edges_acc.push(link.clone());
                stack.push((next_path, next_edges_acc));
            }
        }

        if !extended && !edges.is_empty() {
            let avg = edges
                .iter()
                .map(|link| {
                    let cause_ts = event_ts[&link.cause];
                    let effect_ts = event_ts[&link.effect];
                    effective_confidence(
                        link,
                        cause_ts,
                        effect_ts,
                        config.time_window_cap,
                        importance.get(&link.cause).copied().unwrap_or(0.5),
                        importance.get(&link.effect).copied().unwrap_or(0.5),
                    )
                })
                .sum::<f64>()
                / edges.len() as f64;

            complete_chains.push(Chain {
                events: path,
                edges,
                avg_effective_confidence: avg,
            });
        }
    }

    complete_chains.sort_by(|a, b| b.avg_effective_confidence.total_cmp(&a.avg_effective_confidence));
    complete_chains.truncate(config.max_chains);
    complete_chains
}

fn candidate_edges(
    node: &SmolStr,
    direction: ChainDirection,
    outgoing: &HashMap<SmolStr, Vec<CausalLink>>,
    incoming: &HashMap<SmolStr, Vec<CausalLink>>,
) -> Vec<CausalLink> {
    let mut edges = Vec::new();
    if matches!(direction, ChainDirection::Forward | ChainDirection::Bidirectional) {
        if let Some(links) = outgoing.get(node) {
            edges.extend(links.iter().cloned());
        }
    }
    if matches!(direction, ChainDirection::Backward | ChainDirection::Bidirectional) {
        if let Some(links) = incoming.get(node) {
            edges.extend(links.iter().cloned());
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use ceg_core::causal::{CausalLinkKind, LagClass, Sign};
    use chrono::{TimeZone, Utc};

    fn link(cause: &str, effect: &str, cause_ts: chrono::DateTime<Utc>, effect_ts: chrono::DateTime<Utc>) -> CausalLink {
        CausalLink::new(
            cause.into(),
            effect.into(),
            cause_ts,
            effect_ts,
            CausalLinkKind::Confirmed,
            Sign::Negative,
            LagClass::ZeroToOneDay,
            0.8,
            0.8,
            0.8,
        )
        .unwrap()
    }

    #[test]
    fn discovers_a_two_hop_forward_chain() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let t1 = t0 + chrono::Duration::hours(2);
        let t2 = t1 + chrono::Duration::hours(2);

        let a_b = link("a", "b", t0, t1);
        let b_c = link("b", "c", t1, t2);

        let mut outgoing = HashMap::new();
        outgoing.insert(SmolStr::new("a"), vec![a_b]);
        outgoing.insert(SmolStr::new("b"), vec![b_c]);

        let mut event_ts = HashMap::new();
        event_ts.insert(SmolStr::new("a"), t0);
        event_ts.insert(SmolStr::new("b"), t1);
        event_ts.insert(SmolStr::new("c"), t2);

        let importance = HashMap::new();

        let chains = discover_chains(
            &SmolStr::new("a"),
            ChainDirection::Forward,
            &ChainConfig::default(),
            &outgoing,
            &HashMap::new(),
            &event_ts,
            &importance,
        );

        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].events, vec![SmolStr::new("a"), SmolStr::new("b"), SmolStr::new("c")]);
    }

    #[test]
    fn time_proximity_peaks_near_two_hours() {
        let max_delay = chrono::Duration::hours(168);
        let at_optimal = time_proximity_factor(chrono::Duration::hours(2), max_delay);
        let far = time_proximity_factor(chrono::Duration::hours(60), max_delay);
        assert!(at_optimal > far);
    }

    #[test]
    fn extreme_delay_is_floored_not_zero() {
        let max_delay = chrono::Duration::hours(168);
        let floored = time_proximity_factor(chrono::Duration::minutes(1), max_delay);
        assert_eq!(floored, 0.3);
    }
}
