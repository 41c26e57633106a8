use crate::resolution::strategy::Candidate;
use tracing::debug;

/// Picks the winner: highest score, then highest strategy priority, then proposal order.
/// Exact-label candidates never compete with later strategies; generation stops at them.
pub fn rank(mut candidates: Vec<Candidate>) -> Option<Candidate> {
    // sort_by is stable, so equal keys keep proposal order
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.priority().cmp(&b.priority()))
    });
    if let Some(winner) = candidates.first() {
        debug!(
            node = winner.node,
            method = %winner.method,
            score = winner.score,
            total = candidates.len(),
            "ranked candidates"
        );
    }
    candidates.into_iter().next()
}
