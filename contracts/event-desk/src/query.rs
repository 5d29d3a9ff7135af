use std::collections::BTreeMap;

use cosmwasm_std::{to_json_binary, Binary, Deps, Env, Order, StdError, StdResult};
use cw_storage_plus::Bound;
use event_ops_common::csv::{export_groups, export_winners};
use event_ops_common::types::DrawPhase;

use crate::execute::{current_pool, load_history, load_roster};
use crate::msg::{
    CelebrationView, DrawPoolResponse, DuplicateNamesResponse, ExportResponse, GroupsResponse,
    NameCount, PrizesResponse, RaffleStatusResponse, RosterResponse, RosterStatsResponse,
    WinnerEntry, WinnerHistoryResponse,
};
use crate::state::{
    CONFIG, DESK_STATE, DRAW_SETTINGS, GROUPS, PARTICIPANTS, PRIZES, RAFFLE, WINNERS,
};

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config)
}

pub fn query_draw_settings(deps: Deps) -> StdResult<Binary> {
    let settings = DRAW_SETTINGS.load(deps.storage)?;
    to_json_binary(&settings)
}

pub fn query_roster(deps: Deps, start_after: Option<u64>, limit: Option<u32>) -> StdResult<Binary> {
    let limit = limit.unwrap_or(30).min(100) as usize;
    let start = start_after.map(Bound::exclusive);

    let participants: Vec<_> = PARTICIPANTS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .filter_map(|r| r.ok())
        .map(|(_, p)| p)
        .collect();
    let total = PARTICIPANTS
        .keys(deps.storage, None, None, Order::Ascending)
        .count() as u64;

    to_json_binary(&RosterResponse {
        participants,
        total,
    })
}

fn name_counts(deps: Deps) -> StdResult<BTreeMap<String, u32>> {
    let mut counts = BTreeMap::new();
    for participant in load_roster(deps.storage)? {
        *counts.entry(participant.name).or_insert(0) += 1;
    }
    Ok(counts)
}

pub fn query_duplicate_names(deps: Deps) -> StdResult<Binary> {
    let duplicates = name_counts(deps)?
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, count)| NameCount { name, count })
        .collect();
    to_json_binary(&DuplicateNamesResponse { duplicates })
}

pub fn query_roster_stats(deps: Deps) -> StdResult<Binary> {
    let counts = name_counts(deps)?;
    let total: u64 = counts.values().map(|c| u64::from(*c)).sum();
    to_json_binary(&RosterStatsResponse {
        total,
        distinct_names: counts.len() as u64,
        has_duplicates: counts.values().any(|c| *c > 1),
    })
}

pub fn query_prizes(deps: Deps, start_after: Option<u64>, limit: Option<u32>) -> StdResult<Binary> {
    let limit = limit.unwrap_or(20).min(100) as usize;
    let start = start_after.map(Bound::exclusive);

    let prizes: Vec<_> = PRIZES
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .filter_map(|r| r.ok())
        .map(|(_, p)| p)
        .collect();

    to_json_binary(&PrizesResponse { prizes })
}

pub fn query_prize(deps: Deps, prize_id: u64) -> StdResult<Binary> {
    let prize = PRIZES.may_load(deps.storage, prize_id)?;
    to_json_binary(&prize)
}

pub fn query_active_prize(deps: Deps) -> StdResult<Binary> {
    let settings = DRAW_SETTINGS.load(deps.storage)?;
    let prize = match settings.active_prize_id {
        Some(id) => PRIZES.may_load(deps.storage, id)?,
        None => None,
    };
    to_json_binary(&prize)
}

pub fn query_draw_pool(deps: Deps) -> StdResult<Binary> {
    let settings = DRAW_SETTINGS.load(deps.storage)?;
    let participants = current_pool(deps.storage, &settings)?;
    to_json_binary(&DrawPoolResponse {
        size: participants.len() as u32,
        participants,
    })
}

pub fn query_raffle_status(deps: Deps, env: Env) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    let settings = DRAW_SETTINGS.load(deps.storage)?;
    let raffle = RAFFLE.load(deps.storage)?;
    let desk = DESK_STATE.load(deps.storage)?;
    let now = env.block.time;

    let active_prize = match settings.active_prize_id {
        Some(id) => PRIZES.may_load(deps.storage, id)?,
        None => None,
    };
    let pool_size = current_pool(deps.storage, &settings)?.len() as u32;

    let (timer_token, next_tick_at) = match (&raffle.pending_draw, &raffle.celebration) {
        (Some(pending), _) if raffle.phase == DrawPhase::Drawing => {
            let next_frame = now.plus_nanos(config.flicker_interval_ms.saturating_mul(1_000_000));
            (Some(pending.token), Some(next_frame.min(pending.finalize_at)))
        }
        (_, Some(celebration)) => (Some(celebration.token), Some(celebration.advance_at)),
        _ => (None, None),
    };

    let celebrating = raffle.celebration.as_ref().and_then(|c| {
        c.winners
            .get(c.index as usize)
            .map(|winner| CelebrationView {
                prize_name: c.prize_name.clone(),
                winner: winner.clone(),
                position: c.index + 1,
                total: c.winners.len() as u32,
            })
    });

    let reset_armed = raffle
        .reset_armed_until
        .map(|deadline| now <= deadline)
        .unwrap_or(false);

    to_json_binary(&RaffleStatusResponse {
        phase: raffle.phase,
        display: raffle
            .current_display
            .unwrap_or(config.placeholder_display),
        active_prize,
        pool_size,
        timer_token,
        next_tick_at,
        celebrating,
        reset_armed,
        last_draw_at: raffle.last_draw_at,
        total_draws_completed: desk.total_draws_completed,
    })
}

pub fn query_winner_history(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(20).min(100) as usize;
    let end = start_after.map(Bound::exclusive);

    let winners: Vec<_> = WINNERS
        .range(deps.storage, None, end, Order::Descending)
        .take(limit)
        .filter_map(|r| r.ok())
        .map(|(seq, record)| WinnerEntry { seq, record })
        .collect();
    let total = WINNERS
        .keys(deps.storage, None, None, Order::Ascending)
        .count() as u64;

    to_json_binary(&WinnerHistoryResponse { winners, total })
}

pub fn query_export_winners(deps: Deps) -> StdResult<Binary> {
    let history = load_history(deps.storage)?;
    if history.is_empty() {
        return Err(StdError::generic_err("no winners to export"));
    }
    to_json_binary(&ExportResponse {
        content: export_winners(&history),
        rows: history.len() as u32,
    })
}

pub fn query_groups(deps: Deps) -> StdResult<Binary> {
    let groups = GROUPS.may_load(deps.storage)?.unwrap_or_default();
    to_json_binary(&GroupsResponse { groups })
}

pub fn query_export_groups(deps: Deps) -> StdResult<Binary> {
    let groups = GROUPS.may_load(deps.storage)?.unwrap_or_default();
    if groups.is_empty() {
        return Err(StdError::generic_err("no groups to export"));
    }
    let rows = groups.iter().map(|g| g.members.len() as u32).sum();
    to_json_binary(&ExportResponse {
        content: export_groups(&groups),
        rows,
    })
}
