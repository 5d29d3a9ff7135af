use cosmwasm_std::{Decimal, DepsMut, Env, Event, MessageInfo, Response, Uint128};
use event_ops_common::draw::{
    effective_batch, next_available_prize, result_display, select_winners,
};
use event_ops_common::random::pick;
use event_ops_common::types::{DrawPhase, WinnerRecord};

use crate::error::ContractError;
use crate::execute::{
    arm_or_confirm, current_pool, ensure_operator, issue_token, load_prizes, next_rng,
    switch_active_prize,
};
use crate::state::{
    Celebration, PendingDraw, RaffleState, CONFIG, DESK_STATE, DRAW_SETTINGS, PRIZES, RAFFLE,
    WINNERS,
};

const NANOS_PER_MILLI: u64 = 1_000_000;

/// Per-winner hold time in nanoseconds.
pub fn celebration_nanos(seconds: Decimal) -> u64 {
    // Decimal carries 18 fractional digits; drop 9 of them for nanoseconds
    let nanos = seconds.atomics() / Uint128::new(1_000_000_000);
    u64::try_from(nanos.u128()).unwrap_or(u64::MAX)
}

fn in_progress(raffle: &RaffleState) -> ContractError {
    ContractError::DrawInProgress {
        phase: raffle.phase.as_str().to_string(),
    }
}

/// Enter Drawing for the active prize.
///
/// Rejected unless Idle with an active prize, a non-empty pool and stock
/// left. The batch is fixed here as `min(requested, stock, pool)`; the
/// winners themselves are chosen when the animation timer fires.
pub fn start_draw(deps: DepsMut, env: Env, info: MessageInfo) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;

    let mut raffle = RAFFLE.load(deps.storage)?;
    if raffle.phase != DrawPhase::Idle {
        return Err(in_progress(&raffle));
    }

    let settings = DRAW_SETTINGS.load(deps.storage)?;
    let prize_id = settings.active_prize_id.ok_or(ContractError::NoActivePrize)?;
    let prize = PRIZES
        .may_load(deps.storage, prize_id)?
        .ok_or(ContractError::PrizeNotFound { prize_id })?;

    let pool = current_pool(deps.storage, &settings)?;
    if pool.is_empty() {
        return Err(ContractError::EmptyPool);
    }
    if prize.is_exhausted() {
        return Err(ContractError::PrizeExhausted { prize_id });
    }

    let batch = effective_batch(settings.batch_size, prize.quantity, pool.len());

    let mut desk = DESK_STATE.load(deps.storage)?;
    let token = issue_token(&mut desk);
    let finalize_at = env
        .block
        .time
        .plus_nanos(config.draw_animation_ms.saturating_mul(NANOS_PER_MILLI));

    // First flicker frame right away
    let mut rng = next_rng(&env, &mut desk);
    let frame = pick(&pool, &mut rng).map(|p| p.name.clone());

    raffle.pending_draw = Some(PendingDraw {
        token,
        prize_id,
        batch,
        started_at: env.block.time,
        finalize_at,
        previous_display: raffle.current_display.take(),
    });
    raffle.current_display = frame;
    raffle.phase = DrawPhase::Drawing;

    RAFFLE.save(deps.storage, &raffle)?;
    DESK_STATE.save(deps.storage, &desk)?;

    Ok(Response::new()
        .add_attribute("action", "start_draw")
        .add_attribute("token", token.to_string())
        .add_attribute("batch", batch.to_string())
        .add_event(
            Event::new("event_ops_draw_started")
                .add_attribute("prize_id", prize_id.to_string())
                .add_attribute("prize", prize.name)
                .add_attribute("batch", batch.to_string())
                .add_attribute("pool_size", pool.len().to_string())
                .add_attribute("token", token.to_string())
                .add_attribute("finalize_at", finalize_at.nanos().to_string()),
        ))
}

/// Timer callback for both the draw animation and the celebration reveal.
/// A token that does not match the live timer is stale and changes nothing.
pub fn tick(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    token: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;

    let raffle = RAFFLE.load(deps.storage)?;
    match raffle.phase {
        DrawPhase::Drawing => {
            let pending = raffle
                .pending_draw
                .clone()
                .filter(|p| p.token == token)
                .ok_or(ContractError::StaleTimer { token })?;
            if env.block.time < pending.finalize_at {
                flicker(deps, env, raffle)
            } else {
                finalize_draw(deps, env, raffle, pending)
            }
        }
        DrawPhase::Celebrating => {
            let celebration = raffle
                .celebration
                .clone()
                .filter(|c| c.token == token)
                .ok_or(ContractError::StaleTimer { token })?;
            if env.block.time < celebration.advance_at {
                return Err(ContractError::TimerNotDue {
                    due: celebration.advance_at.nanos(),
                });
            }
            advance_celebration(deps, env, raffle, celebration)
        }
        DrawPhase::Idle => Err(ContractError::StaleTimer { token }),
    }
}

/// Cosmetic frame: show a random pool member. Has no bearing on the result.
fn flicker(deps: DepsMut, env: Env, mut raffle: RaffleState) -> Result<Response, ContractError> {
    let settings = DRAW_SETTINGS.load(deps.storage)?;
    let pool = current_pool(deps.storage, &settings)?;

    let mut desk = DESK_STATE.load(deps.storage)?;
    let mut rng = next_rng(&env, &mut desk);
    if let Some(frame) = pick(&pool, &mut rng) {
        raffle.current_display = Some(frame.name.clone());
    }
    RAFFLE.save(deps.storage, &raffle)?;
    DESK_STATE.save(deps.storage, &desk)?;

    Ok(Response::new().add_attribute("action", "draw_flicker"))
}

/// The Finalizing step. Runs inside one call, so no other draw can
/// interleave:
/// 1. snapshot the prize name
/// 2. shuffle the pool and take the batch
/// 3. append history newest-first with one shared timestamp
/// 4. decrement stock
/// 5. on exhaustion, advance to the first prize with stock (or none)
/// 6. set the result display and start the celebration
fn finalize_draw(
    deps: DepsMut,
    env: Env,
    mut raffle: RaffleState,
    pending: PendingDraw,
) -> Result<Response, ContractError> {
    let mut settings = DRAW_SETTINGS.load(deps.storage)?;
    let mut desk = DESK_STATE.load(deps.storage)?;
    let now = env.block.time;

    let mut prize = PRIZES
        .may_load(deps.storage, pending.prize_id)?
        .ok_or(ContractError::PrizeNotFound {
            prize_id: pending.prize_id,
        })?;
    let prize_name = prize.name.clone();

    let pool = current_pool(deps.storage, &settings)?;
    let count = effective_batch(pending.batch, prize.quantity, pool.len());
    if count == 0 {
        return Err(if pool.is_empty() {
            ContractError::EmptyPool
        } else {
            ContractError::PrizeExhausted { prize_id: prize.id }
        });
    }

    let mut rng = next_rng(&env, &mut desk);
    let winners = select_winners(&pool, count, &mut rng);

    // Highest sequence goes to the first winner so newest-first iteration
    // lists the batch in shuffle order.
    let base = desk.next_winner_seq;
    let last = winners.len() as u64 - 1;
    for (i, participant) in winners.iter().enumerate() {
        let record = WinnerRecord {
            participant: participant.clone(),
            prize: prize_name.clone(),
            timestamp: now,
        };
        WINNERS.save(deps.storage, base + last - i as u64, &record)?;
    }
    desk.next_winner_seq += winners.len() as u64;

    prize.decrement(count);
    PRIZES.save(deps.storage, prize.id, &prize)?;

    let mut exhausted_event = None;
    if prize.is_exhausted() {
        let prizes = load_prizes(deps.storage)?;
        let next = next_available_prize(&prizes).cloned();
        switch_active_prize(deps.storage, &mut settings, next.as_ref())?;
        DRAW_SETTINGS.save(deps.storage, &settings)?;
        exhausted_event = Some(
            Event::new("event_ops_prize_exhausted")
                .add_attribute("prize_id", prize.id.to_string())
                .add_attribute(
                    "next_prize_id",
                    next.map_or_else(|| "none".to_string(), |p| p.id.to_string()),
                ),
        );
    }

    let token = issue_token(&mut desk);
    let advance_at = now.plus_nanos(celebration_nanos(settings.celebration_seconds));
    raffle.current_display = Some(result_display(&winners));
    raffle.pending_draw = None;
    raffle.last_draw_at = Some(now);
    raffle.phase = DrawPhase::Celebrating;
    raffle.celebration = Some(Celebration {
        token,
        prize_name: prize_name.clone(),
        winners: winners.clone(),
        index: 0,
        advance_at,
    });
    desk.total_draws_completed += 1;

    RAFFLE.save(deps.storage, &raffle)?;
    DESK_STATE.save(deps.storage, &desk)?;

    let names: Vec<&str> = winners.iter().map(|p| p.name.as_str()).collect();
    let ids: Vec<String> = winners.iter().map(|p| p.id.to_string()).collect();

    let mut response = Response::new()
        .add_attribute("action", "finalize_draw")
        .add_attribute("prize_id", prize.id.to_string())
        .add_attribute("winners", count.to_string())
        .add_attribute("token", token.to_string())
        .add_event(
            Event::new("event_ops_draw_result")
                .add_attribute("prize_id", prize.id.to_string())
                .add_attribute("prize", prize_name)
                .add_attribute("count", count.to_string())
                .add_attribute("winner_ids", ids.join(","))
                .add_attribute("winner_names", names.join(","))
                .add_attribute("remaining", prize.quantity.to_string())
                .add_attribute("seed", rng.seed_hex())
                .add_attribute("timestamp", now.nanos().to_string()),
        );
    if let Some(event) = exhausted_event {
        response = response.add_event(event);
    }
    Ok(response)
}

fn advance_celebration(
    deps: DepsMut,
    env: Env,
    mut raffle: RaffleState,
    mut celebration: Celebration,
) -> Result<Response, ContractError> {
    celebration.index += 1;

    if celebration.index as usize >= celebration.winners.len() {
        raffle.phase = DrawPhase::Idle;
        raffle.celebration = None;
        RAFFLE.save(deps.storage, &raffle)?;
        return Ok(Response::new()
            .add_attribute("action", "celebration_finished")
            .add_attribute("revealed", celebration.winners.len().to_string()));
    }

    let settings = DRAW_SETTINGS.load(deps.storage)?;
    let mut desk = DESK_STATE.load(deps.storage)?;
    celebration.token = issue_token(&mut desk);
    celebration.advance_at = env
        .block
        .time
        .plus_nanos(celebration_nanos(settings.celebration_seconds));

    let response = Response::new()
        .add_attribute("action", "celebration_advance")
        .add_attribute("index", celebration.index.to_string())
        .add_attribute("token", celebration.token.to_string());

    raffle.celebration = Some(celebration);
    RAFFLE.save(deps.storage, &raffle)?;
    DESK_STATE.save(deps.storage, &desk)?;

    Ok(response)
}

/// Skip the rest of the reveal. History is already recorded.
pub fn close_celebration(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;

    let mut raffle = RAFFLE.load(deps.storage)?;
    if raffle.phase != DrawPhase::Celebrating {
        return Err(ContractError::NotCelebrating);
    }
    raffle.phase = DrawPhase::Idle;
    raffle.celebration = None;
    RAFFLE.save(deps.storage, &raffle)?;

    Ok(Response::new().add_attribute("action", "close_celebration"))
}

/// Teardown of the draw view. A pending draw is dropped without recording
/// anything; a celebration is closed. Every outstanding token goes stale.
pub fn cancel_timers(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;

    let mut raffle = RAFFLE.load(deps.storage)?;
    let cancelled = raffle.phase.as_str();
    match raffle.phase {
        DrawPhase::Drawing => {
            if let Some(pending) = raffle.pending_draw.take() {
                raffle.current_display = pending.previous_display;
            }
        }
        DrawPhase::Celebrating => {
            raffle.celebration = None;
        }
        DrawPhase::Idle => {}
    }
    raffle.phase = DrawPhase::Idle;
    RAFFLE.save(deps.storage, &raffle)?;

    Ok(Response::new()
        .add_attribute("action", "cancel_timers")
        .add_attribute("cancelled", cancelled))
}

/// Start the raffle over: clear history and restore every prize's stock.
/// Needs a confirming second call within the confirm window. The active
/// prize selection is left as is.
pub fn reset_raffle(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;

    let mut raffle = RAFFLE.load(deps.storage)?;
    if raffle.phase == DrawPhase::Drawing {
        return Err(in_progress(&raffle));
    }

    let confirmed = arm_or_confirm(
        &mut raffle.reset_armed_until,
        env.block.time,
        config.confirm_window_seconds,
    );
    if !confirmed {
        RAFFLE.save(deps.storage, &raffle)?;
        return Ok(Response::new()
            .add_attribute("action", "reset_raffle")
            .add_attribute("status", "armed"));
    }

    WINNERS.clear(deps.storage);
    let mut restored = 0u32;
    for mut prize in load_prizes(deps.storage)? {
        prize.restore();
        PRIZES.save(deps.storage, prize.id, &prize)?;
        restored += 1;
    }

    raffle.phase = DrawPhase::Idle;
    raffle.celebration = None;
    raffle.current_display = None;
    raffle.last_draw_at = None;
    RAFFLE.save(deps.storage, &raffle)?;

    Ok(Response::new()
        .add_attribute("action", "reset_raffle")
        .add_attribute("status", "reset")
        .add_event(
            Event::new("event_ops_raffle_reset")
                .add_attribute("prizes_restored", restored.to_string()),
        ))
}
