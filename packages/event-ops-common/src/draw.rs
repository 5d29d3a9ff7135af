use crate::random::{shuffle, DrawRng};
use crate::types::{Participant, Prize};

/// Number of winners a draw will actually produce.
///
/// `min(requested, remaining stock, pool size)`; zero when any of them is zero.
pub fn effective_batch(requested: u32, remaining: u32, pool_size: usize) -> u32 {
    let pool = u32::try_from(pool_size).unwrap_or(u32::MAX);
    requested.min(remaining).min(pool)
}

/// Batch size to request after switching to a prize, so a stale value from
/// the previous prize never over-asks. Never below one.
pub fn clamp_batch_for_prize(prize_quantity: u32, pool_size: usize) -> u32 {
    let pool = u32::try_from(pool_size).unwrap_or(u32::MAX);
    prize_quantity.min(pool).max(1)
}

/// Shuffle a copy of the pool and take the first `count` entries.
/// Winners come back in shuffle order.
pub fn select_winners(pool: &[Participant], count: u32, rng: &mut DrawRng) -> Vec<Participant> {
    let mut shuffled = pool.to_vec();
    shuffle(&mut shuffled, rng);
    shuffled.truncate(count as usize);
    shuffled
}

/// First prize in inventory order that still has stock.
pub fn next_available_prize(prizes: &[Prize]) -> Option<&Prize> {
    prizes.iter().find(|p| !p.is_exhausted())
}

/// Text shown on the draw display once a batch is finalized.
pub fn result_display(winners: &[Participant]) -> String {
    match winners {
        [single] => single.name.clone(),
        _ => format!("{} winners", winners.len()),
    }
}
