use std::collections::HashSet;

use cosmwasm_std::{
    Decimal, DepsMut, Env, Event, MessageInfo, Order, Response, StdResult, Storage, Timestamp,
};
use event_ops_common::draw::clamp_batch_for_prize;
use event_ops_common::grouping::partition_into_groups;
use event_ops_common::ingest::{
    normalize_names, parse_pasted_names, parse_prize_rows, parse_roster_file, sample_names,
    sample_prizes, IngestError, PrizeRow,
};
use event_ops_common::pool::resolve_draw_pool;
use event_ops_common::random::DrawRng;
use event_ops_common::types::{DrawPhase, Participant, Prize, WinnerRecord};

use crate::error::ContractError;
use crate::msg::{DrawSettingsPatch, UpdateConfigParams};
use crate::state::{
    DeskConfig, DeskState, DrawSettings, RaffleState, CONFIG, DESK_STATE, DRAW_SETTINGS, GROUPS,
    PARTICIPANTS, PRIZES, RAFFLE, WINNERS,
};

pub const MIN_GROUP_SIZE: u32 = 2;
/// Upper bound for the per-winner celebration hold
pub const MAX_CELEBRATION_SECONDS: u128 = 3600;
/// Upper bound for the draw animation and flicker cadence (one hour)
pub const MAX_TIMER_MS: u64 = 3_600_000;
/// Upper bound for the two-step confirmation window
pub const MAX_CONFIRM_WINDOW_SECONDS: u64 = 3600;

// ─── Guards and shared loaders ───

pub fn ensure_operator(config: &DeskConfig, info: &MessageInfo) -> Result<(), ContractError> {
    if info.sender != config.operator {
        return Err(ContractError::Unauthorized {
            reason: "only operator can drive the desk".to_string(),
        });
    }
    Ok(())
}

/// Roster, inventory and draw settings are frozen while a draw animates,
/// so finalizing sees the pool the draw started from.
pub fn ensure_not_drawing(storage: &dyn Storage) -> Result<RaffleState, ContractError> {
    let raffle = RAFFLE.load(storage)?;
    if raffle.phase == DrawPhase::Drawing {
        return Err(ContractError::DrawInProgress {
            phase: raffle.phase.as_str().to_string(),
        });
    }
    Ok(raffle)
}

pub fn validate_config(config: &DeskConfig) -> Result<(), ContractError> {
    if !(1..=MAX_TIMER_MS).contains(&config.draw_animation_ms) {
        return Err(ContractError::InvalidConfig {
            reason: format!("draw_animation_ms must be within 1..={MAX_TIMER_MS}"),
        });
    }
    if !(1..=MAX_TIMER_MS).contains(&config.flicker_interval_ms) {
        return Err(ContractError::InvalidConfig {
            reason: format!("flicker_interval_ms must be within 1..={MAX_TIMER_MS}"),
        });
    }
    if !(1..=MAX_CONFIRM_WINDOW_SECONDS).contains(&config.confirm_window_seconds) {
        return Err(ContractError::InvalidConfig {
            reason: format!(
                "confirm_window_seconds must be within 1..={MAX_CONFIRM_WINDOW_SECONDS}"
            ),
        });
    }
    if config.max_group_size < MIN_GROUP_SIZE {
        return Err(ContractError::InvalidConfig {
            reason: format!("max_group_size must be at least {MIN_GROUP_SIZE}"),
        });
    }
    Ok(())
}

pub fn load_roster(storage: &dyn Storage) -> StdResult<Vec<Participant>> {
    PARTICIPANTS
        .range(storage, None, None, Order::Ascending)
        .map(|r| r.map(|(_, p)| p))
        .collect()
}

pub fn load_prizes(storage: &dyn Storage) -> StdResult<Vec<Prize>> {
    PRIZES
        .range(storage, None, None, Order::Ascending)
        .map(|r| r.map(|(_, p)| p))
        .collect()
}

/// Winner history, newest first.
pub fn load_history(storage: &dyn Storage) -> StdResult<Vec<WinnerRecord>> {
    WINNERS
        .range(storage, None, None, Order::Descending)
        .map(|r| r.map(|(_, w)| w))
        .collect()
}

pub fn current_pool(storage: &dyn Storage, settings: &DrawSettings) -> StdResult<Vec<Participant>> {
    let roster = load_roster(storage)?;
    let history = load_history(storage)?;
    Ok(resolve_draw_pool(&roster, &history, settings.allow_repeat))
}

/// Fresh random stream for this call. Bumps the desk nonce.
///
/// `seed = sha256( 0x02 || block_time_ns || height || contract || nonce )`
pub fn next_rng(env: &Env, desk: &mut DeskState) -> DrawRng {
    let nonce = desk.rng_nonce;
    desk.rng_nonce += 1;
    DrawRng::derive(&[
        &env.block.time.nanos().to_be_bytes(),
        &env.block.height.to_be_bytes(),
        env.contract.address.as_bytes(),
        &nonce.to_be_bytes(),
    ])
}

pub fn issue_token(desk: &mut DeskState) -> u64 {
    let token = desk.next_timer_token;
    desk.next_timer_token += 1;
    token
}

/// Make `prize` the active prize. When the selection actually changes to a
/// prize, the requested batch is clamped to `max(1, min(stock, pool))`.
/// Returns whether the selection changed.
pub fn switch_active_prize(
    storage: &dyn Storage,
    settings: &mut DrawSettings,
    prize: Option<&Prize>,
) -> StdResult<bool> {
    let new_id = prize.map(|p| p.id);
    if settings.active_prize_id == new_id {
        return Ok(false);
    }
    settings.active_prize_id = new_id;
    if let Some(prize) = prize {
        let pool = current_pool(storage, settings)?;
        settings.batch_size = clamp_batch_for_prize(prize.quantity, pool.len());
    }
    Ok(true)
}

/// Two-step confirmation. The first call arms until `now + window`; a call
/// inside the window confirms and disarms. Returns true on confirm.
pub fn arm_or_confirm(
    armed_until: &mut Option<Timestamp>,
    now: Timestamp,
    window_seconds: u64,
) -> bool {
    match armed_until {
        Some(deadline) if now <= *deadline => {
            *armed_until = None;
            true
        }
        _ => {
            *armed_until = Some(now.plus_seconds(window_seconds));
            false
        }
    }
}

// ─── Roster ───

fn append_participants(
    storage: &mut dyn Storage,
    names: Vec<String>,
) -> Result<Vec<Participant>, ContractError> {
    if names.is_empty() {
        return Err(ContractError::NoValidNames);
    }
    let mut desk = DESK_STATE.load(storage)?;
    let mut added = Vec::with_capacity(names.len());
    for name in names {
        let participant = Participant {
            id: desk.next_participant_id,
            name,
        };
        desk.next_participant_id += 1;
        PARTICIPANTS.save(storage, participant.id, &participant)?;
        added.push(participant);
    }
    DESK_STATE.save(storage, &desk)?;
    Ok(added)
}

fn participants_added(source: &str, added: &[Participant]) -> Response {
    let first_id = added.first().map(|p| p.id).unwrap_or_default();
    Response::new()
        .add_attribute("action", "add_participants")
        .add_attribute("source", source)
        .add_attribute("count", added.len().to_string())
        .add_event(
            Event::new("event_ops_participants_added")
                .add_attribute("source", source)
                .add_attribute("count", added.len().to_string())
                .add_attribute("first_id", first_id.to_string()),
        )
}

pub fn add_participants(
    deps: DepsMut,
    info: MessageInfo,
    names: Vec<String>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    ensure_not_drawing(deps.storage)?;

    let added = append_participants(deps.storage, normalize_names(names))?;
    Ok(participants_added("list", &added))
}

pub fn import_roster_text(
    deps: DepsMut,
    info: MessageInfo,
    text: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    ensure_not_drawing(deps.storage)?;

    let added = append_participants(deps.storage, parse_pasted_names(&text))?;
    Ok(participants_added("text", &added))
}

pub fn import_roster_file(
    deps: DepsMut,
    info: MessageInfo,
    file_name: String,
    content: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    ensure_not_drawing(deps.storage)?;

    let names = parse_roster_file(&file_name, &content).map_err(|e| match e {
        IngestError::UnsupportedFileType { file_name } => {
            ContractError::UnsupportedFileType { file_name }
        }
    })?;
    let added = append_participants(deps.storage, names)?;
    Ok(participants_added("file", &added).add_attribute("file_name", file_name))
}

pub fn add_sample_participants(
    deps: DepsMut,
    info: MessageInfo,
    count: u32,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    ensure_not_drawing(deps.storage)?;

    let added = append_participants(deps.storage, sample_names(count))?;
    Ok(participants_added("sample", &added))
}

pub fn remove_participant(
    deps: DepsMut,
    info: MessageInfo,
    participant_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    ensure_not_drawing(deps.storage)?;

    if !PARTICIPANTS.has(deps.storage, participant_id) {
        return Err(ContractError::ParticipantNotFound { participant_id });
    }
    PARTICIPANTS.remove(deps.storage, participant_id);

    Ok(Response::new()
        .add_attribute("action", "remove_participant")
        .add_attribute("participant_id", participant_id.to_string()))
}

pub fn remove_duplicates(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    ensure_not_drawing(deps.storage)?;

    let roster = load_roster(deps.storage)?;
    let mut seen = HashSet::new();
    let mut removed = 0u32;
    for participant in roster {
        if !seen.insert(participant.name) {
            PARTICIPANTS.remove(deps.storage, participant.id);
            removed += 1;
        }
    }

    Ok(Response::new()
        .add_attribute("action", "remove_duplicates")
        .add_attribute("removed", removed.to_string())
        .add_event(
            Event::new("event_ops_duplicates_removed")
                .add_attribute("removed", removed.to_string())
                .add_attribute("remaining", seen.len().to_string()),
        ))
}

pub fn clear_roster(deps: DepsMut, env: Env, info: MessageInfo) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    ensure_not_drawing(deps.storage)?;

    let mut desk = DESK_STATE.load(deps.storage)?;
    let confirmed = arm_or_confirm(
        &mut desk.roster_clear_armed_until,
        env.block.time,
        config.confirm_window_seconds,
    );
    DESK_STATE.save(deps.storage, &desk)?;

    if !confirmed {
        return Ok(Response::new()
            .add_attribute("action", "clear_roster")
            .add_attribute("status", "armed"));
    }

    PARTICIPANTS.clear(deps.storage);

    Ok(Response::new()
        .add_attribute("action", "clear_roster")
        .add_attribute("status", "cleared")
        .add_event(Event::new("event_ops_roster_cleared")))
}

// ─── Prize inventory ───

fn append_prizes(storage: &mut dyn Storage, rows: Vec<PrizeRow>) -> StdResult<Vec<Prize>> {
    let mut desk = DESK_STATE.load(storage)?;
    let mut added = Vec::with_capacity(rows.len());
    for row in rows {
        let prize = Prize::new(desk.next_prize_id, row.name, row.quantity);
        desk.next_prize_id += 1;
        PRIZES.save(storage, prize.id, &prize)?;
        added.push(prize);
    }
    DESK_STATE.save(storage, &desk)?;
    Ok(added)
}

/// Select the first of `added` when nothing is active yet.
fn select_if_unset(storage: &mut dyn Storage, added: &[Prize]) -> StdResult<bool> {
    let mut settings = DRAW_SETTINGS.load(storage)?;
    if settings.active_prize_id.is_some() {
        return Ok(false);
    }
    let changed = switch_active_prize(storage, &mut settings, added.first())?;
    DRAW_SETTINGS.save(storage, &settings)?;
    Ok(changed)
}

pub fn add_prize(
    deps: DepsMut,
    info: MessageInfo,
    name: String,
    quantity: u32,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    ensure_not_drawing(deps.storage)?;

    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ContractError::BlankName);
    }

    let added = append_prizes(deps.storage, vec![PrizeRow { name, quantity }])?;
    let selected = select_if_unset(deps.storage, &added)?;
    let prize = &added[0];

    Ok(Response::new()
        .add_attribute("action", "add_prize")
        .add_attribute("prize_id", prize.id.to_string())
        .add_attribute("selected", selected.to_string())
        .add_event(
            Event::new("event_ops_prize_added")
                .add_attribute("prize_id", prize.id.to_string())
                .add_attribute("name", prize.name.clone())
                .add_attribute("quantity", prize.total_quantity.to_string()),
        ))
}

pub fn remove_prize(
    deps: DepsMut,
    info: MessageInfo,
    prize_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    ensure_not_drawing(deps.storage)?;

    if !PRIZES.has(deps.storage, prize_id) {
        return Err(ContractError::PrizeNotFound { prize_id });
    }
    PRIZES.remove(deps.storage, prize_id);

    // The caller must pick a new prize explicitly.
    let mut settings = DRAW_SETTINGS.load(deps.storage)?;
    let was_active = settings.active_prize_id == Some(prize_id);
    if was_active {
        settings.active_prize_id = None;
        DRAW_SETTINGS.save(deps.storage, &settings)?;
    }

    Ok(Response::new()
        .add_attribute("action", "remove_prize")
        .add_attribute("prize_id", prize_id.to_string())
        .add_attribute("was_active", was_active.to_string()))
}

pub fn import_prizes(
    deps: DepsMut,
    info: MessageInfo,
    csv: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    ensure_not_drawing(deps.storage)?;

    let import = parse_prize_rows(&csv);
    if import.rows.is_empty() {
        return Err(ContractError::NothingToImport);
    }

    let added = append_prizes(deps.storage, import.rows)?;
    let selected = select_if_unset(deps.storage, &added)?;

    Ok(Response::new()
        .add_attribute("action", "import_prizes")
        .add_attribute("imported", added.len().to_string())
        .add_attribute("skipped", import.skipped.to_string())
        .add_attribute("selected", selected.to_string())
        .add_event(
            Event::new("event_ops_prizes_imported")
                .add_attribute("imported", added.len().to_string())
                .add_attribute("skipped", import.skipped.to_string()),
        ))
}

pub fn load_sample_prizes(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    ensure_not_drawing(deps.storage)?;

    PRIZES.clear(deps.storage);
    let added = append_prizes(deps.storage, sample_prizes())?;

    let mut settings = DRAW_SETTINGS.load(deps.storage)?;
    switch_active_prize(deps.storage, &mut settings, added.first())?;
    DRAW_SETTINGS.save(deps.storage, &settings)?;

    Ok(Response::new()
        .add_attribute("action", "load_sample_prizes")
        .add_attribute("count", added.len().to_string()))
}

// ─── Draw settings ───

pub fn select_prize(
    deps: DepsMut,
    info: MessageInfo,
    prize_id: Option<u64>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    ensure_not_drawing(deps.storage)?;

    let prize = match prize_id {
        Some(prize_id) => Some(
            PRIZES
                .may_load(deps.storage, prize_id)?
                .ok_or(ContractError::PrizeNotFound { prize_id })?,
        ),
        None => None,
    };

    let mut settings = DRAW_SETTINGS.load(deps.storage)?;
    let changed = switch_active_prize(deps.storage, &mut settings, prize.as_ref())?;
    DRAW_SETTINGS.save(deps.storage, &settings)?;

    Ok(Response::new()
        .add_attribute("action", "select_prize")
        .add_attribute(
            "prize_id",
            prize_id.map_or_else(|| "none".to_string(), |id| id.to_string()),
        )
        .add_attribute("changed", changed.to_string())
        .add_attribute("batch_size", settings.batch_size.to_string()))
}

pub fn update_draw_settings(
    deps: DepsMut,
    info: MessageInfo,
    patch: DrawSettingsPatch,
) -> Result<Response, ContractError> {
    let DrawSettingsPatch {
        batch_size,
        celebration_seconds,
        allow_repeat,
    } = patch;

    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;
    ensure_not_drawing(deps.storage)?;

    let mut settings = DRAW_SETTINGS.load(deps.storage)?;
    if let Some(batch) = batch_size {
        settings.batch_size = batch.max(1);
    }
    if let Some(seconds) = celebration_seconds {
        settings.celebration_seconds = normalize_celebration(seconds);
    }
    // Previously excluded winners become eligible again at once; the pool
    // is derived on every read.
    if let Some(flag) = allow_repeat {
        settings.allow_repeat = flag;
    }
    DRAW_SETTINGS.save(deps.storage, &settings)?;

    Ok(Response::new()
        .add_attribute("action", "update_draw_settings")
        .add_attribute("batch_size", settings.batch_size.to_string())
        .add_attribute("celebration_seconds", settings.celebration_seconds.to_string())
        .add_attribute("allow_repeat", settings.allow_repeat.to_string()))
}

/// Zero becomes one second; anything above the cap is capped.
pub fn normalize_celebration(seconds: Decimal) -> Decimal {
    if seconds.is_zero() {
        return Decimal::one();
    }
    seconds.min(Decimal::from_ratio(MAX_CELEBRATION_SECONDS, 1u128))
}

// ─── Grouping ───

pub fn form_groups(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    group_size: u32,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info)?;

    if group_size < MIN_GROUP_SIZE || group_size > config.max_group_size {
        return Err(ContractError::InvalidGroupSize {
            size: group_size,
            min: MIN_GROUP_SIZE,
            max: config.max_group_size,
        });
    }

    let roster = load_roster(deps.storage)?;
    if roster.is_empty() {
        return Err(ContractError::EmptyRoster);
    }

    let mut desk = DESK_STATE.load(deps.storage)?;
    let mut rng = next_rng(&env, &mut desk);
    let groups = partition_into_groups(&roster, group_size as usize, &mut rng);
    GROUPS.save(deps.storage, &groups)?;
    DESK_STATE.save(deps.storage, &desk)?;

    Ok(Response::new()
        .add_attribute("action", "form_groups")
        .add_attribute("group_size", group_size.to_string())
        .add_attribute("groups", groups.len().to_string())
        .add_event(
            Event::new("event_ops_groups_formed")
                .add_attribute("group_size", group_size.to_string())
                .add_attribute("groups", groups.len().to_string())
                .add_attribute("participants", roster.len().to_string())
                .add_attribute("seed", rng.seed_hex()),
        ))
}

// ─── Admin ───

pub fn update_config(
    deps: DepsMut,
    info: MessageInfo,
    params: UpdateConfigParams,
) -> Result<Response, ContractError> {
    let UpdateConfigParams {
        operator,
        draw_animation_ms,
        flicker_interval_ms,
        confirm_window_seconds,
        max_group_size,
        placeholder_display,
    } = params;

    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can update config".to_string(),
        });
    }

    if let Some(op) = operator {
        config.operator = deps.api.addr_validate(&op)?;
    }
    if let Some(ms) = draw_animation_ms {
        config.draw_animation_ms = ms;
    }
    if let Some(ms) = flicker_interval_ms {
        config.flicker_interval_ms = ms;
    }
    if let Some(seconds) = confirm_window_seconds {
        config.confirm_window_seconds = seconds;
    }
    if let Some(size) = max_group_size {
        config.max_group_size = size;
    }
    if let Some(text) = placeholder_display {
        config.placeholder_display = text;
    }
    validate_config(&config)?;

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attribute("action", "update_config"))
}
