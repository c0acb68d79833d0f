//! Stage 4: unions episodes into situations.

mod union_find;

use crate::types::{Episode, ExternalGraph, Situation};
use union_find::UnionFind;

/// Halo applied to episode intervals for the temporal-proximity check.
const HALO_MS: i64 = 5 * 60 * 1000;

/// Union episodes into situations by temporal overlap plus an identity or
/// topology bridge, and return them in deterministic order: `window.start`
/// ascending, ties broken by the lexicographically smallest `entity_key`.
pub fn assemble(episodes: Vec<Episode>, graph: &ExternalGraph) -> Vec<Situation> {
    let n = episodes.len();
    let mut uf = UnionFind::new(n);

    for i in 0..n {
        for j in (i + 1)..n {
            if joinable(&episodes[i], &episodes[j], graph) {
                uf.union(i, j);
            }
        }
    }

    let mut components: std::collections::HashMap<usize, Vec<Episode>> = std::collections::HashMap::new();
    for (idx, episode) in episodes.into_iter().enumerate() {
        let root = uf.find(idx);
        components.entry(root).or_default().push(episode);
    }

    let mut situations: Vec<Situation> = components
        .into_values()
        .map(|mut eps| {
            eps.sort_by(|a, b| {
                a.start
                    .cmp(&b.start)
                    .then_with(|| a.entity_key.cmp(&b.entity_key))
                    .then_with(|| a.fingerprint.cmp(&b.fingerprint))
            });
            let start = eps.iter().map(|e| e.start).min().unwrap_or(0);
            let end = eps.iter().map(|e| e.end).max().unwrap_or(0);
            let episode_count = eps.len();
            let situation_id = format!("S-{start}-{end}-{episode_count}");
            Situation::from_episodes(situation_id, eps)
        })
        .collect();

    situations.sort_by(|a, b| {
        a.window
            .start
            .cmp(&b.window.start)
            .then_with(|| smallest_entity_key(a).cmp(&smallest_entity_key(b)))
    });

    situations
}

fn smallest_entity_key(s: &Situation) -> String {
    s.episodes
        .iter()
        .map(|e| e.entity_key.clone())
        .min()
        .unwrap_or_default()
}

/// Two episodes are joinable when BOTH temporal proximity and at least one
/// identity/topology bridge hold.
fn joinable(a: &Episode, b: &Episode, graph: &ExternalGraph) -> bool {
    temporally_close(a, b) && has_bridge(a, b, graph)
}

fn temporally_close(a: &Episode, b: &Episode) -> bool {
    !(a.end + HALO_MS < b.start || b.end + HALO_MS < a.start)
}

fn has_bridge(a: &Episode, b: &Episode, graph: &ExternalGraph) -> bool {
    if a.entity_key == b.entity_key {
        return true;
    }
    if a.fingerprint == b.fingerprint {
        return true;
    }
    if a.deploy_keys.iter().any(|k| b.deploy_keys.contains(k)) {
        return true;
    }
    if a.net_keys.iter().any(|k| b.net_keys.contains(k)) {
        return true;
    }
    graph.has_edge_either_direction(&a.entity_key, &b.entity_key)
}
