// src/seeds.rs
// =============================================================================
// Seed supply: turns candidate domains into the list a session starts from.
//
// Blocked and repeated domains are dropped (first occurrence wins), an empty
// result falls back to a few well-known servers, and the list is shuffled
// so consecutive sessions do not always start in the same corner of the
// network.
// =============================================================================

use std::collections::HashSet;

use rand::seq::SliceRandom;

use crate::blocklist::Blocklist;

pub const DEFAULT_SEEDS: [&str; 4] = [
    "mastodon.social",
    "mastodon.online",
    "mastodon.xyz",
    "mastodon.art",
];

pub fn prepare<I, S>(candidates: I, blocklist: &Blocklist) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seeds = dedupe_allowed(candidates, blocklist);
    if seeds.is_empty() {
        seeds = dedupe_allowed(DEFAULT_SEEDS, blocklist);
    }
    seeds.shuffle(&mut rand::thread_rng());
    seeds
}

fn dedupe_allowed<I, S>(candidates: I, blocklist: &Blocklist) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .map(Into::into)
        .map(|domain| domain.trim().to_string())
        .filter(|domain| !domain.is_empty())
        .filter(|domain| !blocklist.is_blocked(domain))
        .filter(|domain| seen.insert(domain.clone()))
        .collect()
}

/// Parses a seed file: one domain per line, blank lines and `#` comments skipped.
pub fn parse_seed_file(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
