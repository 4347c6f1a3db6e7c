//! Random reviewer selection.

use rand::seq::SliceRandom;

/// Shuffles `candidates` and keeps at most `max` of them.
pub fn select_reviewers(mut candidates: Vec<String>, max: usize) -> Vec<String> {
    if candidates.len() > 1 {
        candidates.shuffle(&mut rand::thread_rng());
    }
    candidates.truncate(max);
    candidates
}

/// Picks one candidate uniformly, `None` when there is nothing to pick.
pub fn choose_one(candidates: &[String]) -> Option<String> {
    candidates.choose(&mut rand::thread_rng()).cloned()
}
