use std::collections::HashSet;

use crate::types::{Participant, WinnerRecord};

/// Participants currently eligible for a draw, in roster order.
///
/// With `allow_repeat` the whole roster is eligible. Otherwise anyone whose
/// id appears anywhere in the history is excluded, whatever prize they won.
pub fn resolve_draw_pool(
    roster: &[Participant],
    history: &[WinnerRecord],
    allow_repeat: bool,
) -> Vec<Participant> {
    if allow_repeat {
        return roster.to_vec();
    }
    let winner_ids: HashSet<u64> = history.iter().map(|w| w.participant.id).collect();
    roster
        .iter()
        .filter(|p| !winner_ids.contains(&p.id))
        .cloned()
        .collect()
}
