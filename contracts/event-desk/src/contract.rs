use cosmwasm_std::{
    entry_point, Binary, Decimal, Deps, DepsMut, Env, MessageInfo, Response, StdResult,
};
use cw2::{get_contract_version, set_contract_version};
use event_ops_common::types::DrawPhase;

use crate::error::ContractError;
use crate::execute;
use crate::msg::{
    DrawSettingsPatch, ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg, UpdateConfigParams,
};
use crate::query;
use crate::raffle;
use crate::state::{
    DeskConfig, DeskState, DrawSettings, RaffleState, CONFIG, DESK_STATE, DRAW_SETTINGS, GROUPS,
    RAFFLE,
};

const CONTRACT_NAME: &str = "crates.io:event-ops-desk";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_DRAW_ANIMATION_MS: u64 = 2_000;
pub const DEFAULT_FLICKER_INTERVAL_MS: u64 = 60;
pub const DEFAULT_CONFIRM_WINDOW_SECONDS: u64 = 3;
pub const DEFAULT_MAX_GROUP_SIZE: u32 = 20;
pub const DEFAULT_CELEBRATION_SECONDS: u64 = 3;
pub const DEFAULT_PLACEHOLDER_DISPLAY: &str = "Waiting for draw";

#[entry_point]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let config = DeskConfig {
        admin: info.sender.clone(),
        operator: deps.api.addr_validate(&msg.operator)?,
        draw_animation_ms: msg.draw_animation_ms.unwrap_or(DEFAULT_DRAW_ANIMATION_MS),
        flicker_interval_ms: msg
            .flicker_interval_ms
            .unwrap_or(DEFAULT_FLICKER_INTERVAL_MS),
        confirm_window_seconds: msg
            .confirm_window_seconds
            .unwrap_or(DEFAULT_CONFIRM_WINDOW_SECONDS),
        max_group_size: msg.max_group_size.unwrap_or(DEFAULT_MAX_GROUP_SIZE),
        placeholder_display: msg
            .placeholder_display
            .unwrap_or_else(|| DEFAULT_PLACEHOLDER_DISPLAY.to_string()),
    };
    execute::validate_config(&config)?;
    CONFIG.save(deps.storage, &config)?;

    let celebration_seconds = msg
        .default_celebration_seconds
        .unwrap_or_else(|| Decimal::from_ratio(DEFAULT_CELEBRATION_SECONDS, 1u64));
    DRAW_SETTINGS.save(
        deps.storage,
        &DrawSettings {
            batch_size: 1,
            celebration_seconds: execute::normalize_celebration(celebration_seconds),
            allow_repeat: false,
            active_prize_id: None,
        },
    )?;

    DESK_STATE.save(
        deps.storage,
        &DeskState {
            next_participant_id: 1,
            next_prize_id: 1,
            next_winner_seq: 0,
            next_timer_token: 1,
            rng_nonce: 0,
            total_draws_completed: 0,
            roster_clear_armed_until: None,
        },
    )?;

    RAFFLE.save(
        deps.storage,
        &RaffleState {
            phase: DrawPhase::Idle,
            current_display: None,
            pending_draw: None,
            celebration: None,
            last_draw_at: None,
            reset_armed_until: None,
        },
    )?;
    GROUPS.save(deps.storage, &Vec::new())?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "event-desk")
        .add_attribute("admin", info.sender.to_string()))
}

#[entry_point]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::AddParticipants { names } => execute::add_participants(deps, info, names),
        ExecuteMsg::ImportRosterText { text } => execute::import_roster_text(deps, info, text),
        ExecuteMsg::ImportRosterFile { file_name, content } => {
            execute::import_roster_file(deps, info, file_name, content)
        }
        ExecuteMsg::AddSampleParticipants { count } => {
            execute::add_sample_participants(deps, info, count)
        }
        ExecuteMsg::RemoveParticipant { participant_id } => {
            execute::remove_participant(deps, info, participant_id)
        }
        ExecuteMsg::RemoveDuplicates {} => execute::remove_duplicates(deps, info),
        ExecuteMsg::ClearRoster {} => execute::clear_roster(deps, env, info),
        ExecuteMsg::AddPrize { name, quantity } => execute::add_prize(deps, info, name, quantity),
        ExecuteMsg::RemovePrize { prize_id } => execute::remove_prize(deps, info, prize_id),
        ExecuteMsg::ImportPrizes { csv } => execute::import_prizes(deps, info, csv),
        ExecuteMsg::LoadSamplePrizes {} => execute::load_sample_prizes(deps, info),
        ExecuteMsg::SelectPrize { prize_id } => execute::select_prize(deps, info, prize_id),
        ExecuteMsg::UpdateDrawSettings {
            batch_size,
            celebration_seconds,
            allow_repeat,
        } => execute::update_draw_settings(
            deps,
            info,
            DrawSettingsPatch {
                batch_size,
                celebration_seconds,
                allow_repeat,
            },
        ),
        ExecuteMsg::StartDraw {} => raffle::start_draw(deps, env, info),
        ExecuteMsg::Tick { token } => raffle::tick(deps, env, info, token),
        ExecuteMsg::CloseCelebration {} => raffle::close_celebration(deps, info),
        ExecuteMsg::CancelTimers {} => raffle::cancel_timers(deps, info),
        ExecuteMsg::ResetRaffle {} => raffle::reset_raffle(deps, env, info),
        ExecuteMsg::FormGroups { group_size } => {
            execute::form_groups(deps, env, info, group_size)
        }
        ExecuteMsg::UpdateConfig {
            operator,
            draw_animation_ms,
            flicker_interval_ms,
            confirm_window_seconds,
            max_group_size,
            placeholder_display,
        } => execute::update_config(
            deps,
            info,
            UpdateConfigParams {
                operator,
                draw_animation_ms,
                flicker_interval_ms,
                confirm_window_seconds,
                max_group_size,
                placeholder_display,
            },
        ),
    }
}

#[entry_point]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query::query_config(deps),
        QueryMsg::DrawSettings {} => query::query_draw_settings(deps),
        QueryMsg::Roster { start_after, limit } => query::query_roster(deps, start_after, limit),
        QueryMsg::DuplicateNames {} => query::query_duplicate_names(deps),
        QueryMsg::RosterStats {} => query::query_roster_stats(deps),
        QueryMsg::Prizes { start_after, limit } => query::query_prizes(deps, start_after, limit),
        QueryMsg::Prize { prize_id } => query::query_prize(deps, prize_id),
        QueryMsg::ActivePrize {} => query::query_active_prize(deps),
        QueryMsg::DrawPool {} => query::query_draw_pool(deps),
        QueryMsg::RaffleStatus {} => query::query_raffle_status(deps, env),
        QueryMsg::WinnerHistory { start_after, limit } => {
            query::query_winner_history(deps, start_after, limit)
        }
        QueryMsg::ExportWinners {} => query::query_export_winners(deps),
        QueryMsg::Groups {} => query::query_groups(deps),
        QueryMsg::ExportGroups {} => query::query_export_groups(deps),
    }
}

#[entry_point]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::Unauthorized {
            reason: "Cannot migrate from different contract type".to_string(),
        });
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", stored.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}
