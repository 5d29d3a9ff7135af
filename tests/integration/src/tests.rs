//! Integration tests for the event-ops desk.
//!
//! These tests drive the contract through its `instantiate` / `execute` /
//! `query` entry points with `cosmwasm_std::testing` mocks, and play the
//! host's part for timers: a `Tick` is sent once the block clock passes the
//! due time the desk reported.
//!
//! Run:
//! ```bash
//! cargo test -p event-ops-integration-tests
//! ```

use std::collections::HashSet;

use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{from_json, Env, MemoryStorage, OwnedDeps, Response};
use event_ops_common::csv::{parse_rows, BOM};
use event_ops_common::types::{DrawPhase, Prize};
use event_ops_desk::contract::{execute, instantiate, query};
use event_ops_desk::msg::{
    DrawPoolResponse, DuplicateNamesResponse, ExecuteMsg, ExportResponse, GroupsResponse,
    InstantiateMsg, PrizesResponse, QueryMsg, RaffleStatusResponse, RosterResponse,
    RosterStatsResponse, WinnerHistoryResponse,
};
use event_ops_desk::state::DrawSettings;
use event_ops_desk::ContractError;

type Deps = OwnedDeps<MemoryStorage, MockApi, MockQuerier>;

// ─── Constants ───

const DRAW_MS: u64 = 2_000;
const CONFIRM_WINDOW_MS: u64 = 3_000;

// ─── Helpers ───

/// `mock_env()` with the block clock at `ms` milliseconds past the start.
fn env_at(ms: u64) -> Env {
    let mut env = mock_env();
    env.block.time = env.block.time.plus_nanos(ms * 1_000_000);
    env
}

fn setup_desk() -> Deps {
    let mut deps = mock_dependencies();
    let admin = deps.api.addr_make("admin");
    let operator = deps.api.addr_make("operator");
    instantiate(
        deps.as_mut(),
        mock_env(),
        message_info(&admin, &[]),
        InstantiateMsg {
            operator: operator.to_string(),
            draw_animation_ms: None,
            flicker_interval_ms: None,
            confirm_window_seconds: None,
            max_group_size: None,
            default_celebration_seconds: None,
            placeholder_display: None,
        },
    )
    .unwrap();
    deps
}

fn exec(deps: &mut Deps, at_ms: u64, msg: ExecuteMsg) -> Result<Response, ContractError> {
    let operator = deps.api.addr_make("operator");
    execute(deps.as_mut(), env_at(at_ms), message_info(&operator, &[]), msg)
}

fn query_at<T: serde::de::DeserializeOwned>(deps: &Deps, at_ms: u64, msg: QueryMsg) -> T {
    let res = query(deps.as_ref(), env_at(at_ms), msg).unwrap();
    from_json(res).unwrap()
}

fn attr(res: &Response, key: &str) -> String {
    res.attributes
        .iter()
        .find(|a| a.key == key)
        .map(|a| a.value.clone())
        .unwrap_or_default()
}

fn add_names(deps: &mut Deps, names: &[&str]) {
    let names = names.iter().map(|n| n.to_string()).collect();
    exec(deps, 0, ExecuteMsg::AddParticipants { names }).unwrap();
}

fn add_prize(deps: &mut Deps, name: &str, quantity: u32) {
    exec(
        deps,
        0,
        ExecuteMsg::AddPrize {
            name: name.to_string(),
            quantity,
        },
    )
    .unwrap();
}

fn set_batch(deps: &mut Deps, at_ms: u64, batch: u32) {
    exec(
        deps,
        at_ms,
        ExecuteMsg::UpdateDrawSettings {
            batch_size: Some(batch),
            celebration_seconds: None,
            allow_repeat: None,
        },
    )
    .unwrap();
}

fn prizes(deps: &Deps) -> Vec<Prize> {
    let res: PrizesResponse = query_at(
        deps,
        0,
        QueryMsg::Prizes {
            start_after: None,
            limit: Some(100),
        },
    );
    res.prizes
}

fn history(deps: &Deps) -> WinnerHistoryResponse {
    query_at(
        deps,
        0,
        QueryMsg::WinnerHistory {
            start_after: None,
            limit: Some(100),
        },
    )
}

/// Full draw cycle: start, let the animation finish, skip the reveal.
/// Advances `clock` past everything it waited for and returns the
/// finalize response.
fn run_draw(deps: &mut Deps, clock: &mut u64) -> Response {
    let res = exec(deps, *clock, ExecuteMsg::StartDraw {}).unwrap();
    let token: u64 = attr(&res, "token").parse().unwrap();

    *clock += DRAW_MS;
    let res = exec(deps, *clock, ExecuteMsg::Tick { token }).unwrap();
    assert_eq!(attr(&res, "action"), "finalize_draw");

    *clock += 100;
    exec(deps, *clock, ExecuteMsg::CloseCelebration {}).unwrap();
    res
}

/// Two-step reset: arm, then confirm inside the window.
fn reset(deps: &mut Deps, clock: &mut u64) {
    let res = exec(deps, *clock, ExecuteMsg::ResetRaffle {}).unwrap();
    assert_eq!(attr(&res, "status"), "armed");
    *clock += CONFIRM_WINDOW_MS / 2;
    let res = exec(deps, *clock, ExecuteMsg::ResetRaffle {}).unwrap();
    assert_eq!(attr(&res, "status"), "reset");
    *clock += CONFIRM_WINDOW_MS * 2;
}

// ─── Scenarios ───

#[test]
fn test_batch_capped_by_stock_then_auto_advance() {
    let mut deps = setup_desk();
    add_names(&mut deps, &["Alice", "Bob", "Carol"]);
    add_prize(&mut deps, "P", 2);
    add_prize(&mut deps, "Q", 1);
    set_batch(&mut deps, 0, 5);

    let mut clock = 0;
    let res = run_draw(&mut deps, &mut clock);
    assert_eq!(attr(&res, "winners"), "2");
    assert!(res.events.iter().any(|e| e.ty == "event_ops_prize_exhausted"));

    let hist = history(&deps);
    assert_eq!(hist.total, 2);
    let ids: HashSet<u64> = hist.winners.iter().map(|w| w.record.participant.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(hist.winners.iter().all(|w| w.record.prize == "P"));

    let all = prizes(&deps);
    assert_eq!(all[0].quantity, 0);
    assert_eq!(all[0].total_quantity, 2);

    let active: Option<Prize> = query_at(&deps, clock, QueryMsg::ActivePrize {});
    assert_eq!(active.map(|p| p.name), Some("Q".to_string()));

    // Switching to Q clamps the requested 5 to min(stock 1, pool 1)
    let settings: DrawSettings = query_at(&deps, clock, QueryMsg::DrawSettings {});
    assert_eq!(settings.active_prize_id, Some(2));
    assert_eq!(settings.batch_size, 1);
}

#[test]
fn test_auto_advance_to_none_when_all_exhausted() {
    let mut deps = setup_desk();
    add_names(&mut deps, &["Alice", "Bob", "Carol"]);
    add_prize(&mut deps, "P", 2);
    set_batch(&mut deps, 0, 5);

    let mut clock = 0;
    run_draw(&mut deps, &mut clock);

    let active: Option<Prize> = query_at(&deps, clock, QueryMsg::ActivePrize {});
    assert_eq!(active, None);
    let err = exec(&mut deps, clock, ExecuteMsg::StartDraw {}).unwrap_err();
    assert!(matches!(err, ContractError::NoActivePrize));
}

#[test]
fn test_pool_shrinks_without_repeat() {
    let mut deps = setup_desk();
    add_names(&mut deps, &["Alice", "Bob", "Carol"]);
    add_prize(&mut deps, "P", 10);

    let pool: DrawPoolResponse = query_at(&deps, 0, QueryMsg::DrawPool {});
    assert_eq!(pool.size, 3);

    set_batch(&mut deps, 0, 2);
    let mut clock = 0;
    run_draw(&mut deps, &mut clock);

    let pool: DrawPoolResponse = query_at(&deps, clock, QueryMsg::DrawPool {});
    assert_eq!(pool.size, 1);
    let hist = history(&deps);
    let winner_ids: HashSet<u64> = hist.winners.iter().map(|w| w.record.participant.id).collect();
    assert!(!winner_ids.contains(&pool.participants[0].id));

    // The last eligible participant can still be drawn; a batch of 2 shrinks to 1
    let res = run_draw(&mut deps, &mut clock);
    assert_eq!(attr(&res, "winners"), "1");

    let err = exec(&mut deps, clock, ExecuteMsg::StartDraw {}).unwrap_err();
    assert!(matches!(err, ContractError::EmptyPool));
}

#[test]
fn test_groups_of_four_from_ten() {
    let mut deps = setup_desk();
    exec(&mut deps, 0, ExecuteMsg::AddSampleParticipants { count: 10 }).unwrap();

    exec(&mut deps, 0, ExecuteMsg::FormGroups { group_size: 4 }).unwrap();
    let res: GroupsResponse = query_at(&deps, 0, QueryMsg::Groups {});

    let sizes: Vec<usize> = res.groups.iter().map(|g| g.members.len()).collect();
    assert_eq!(sizes, vec![4, 4, 2]);
    let names: Vec<&str> = res.groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Group 1", "Group 2", "Group 3"]);

    let ids: HashSet<u64> = res
        .groups
        .iter()
        .flat_map(|g| g.members.iter().map(|m| m.id))
        .collect();
    assert_eq!(ids, (1..=10).collect::<HashSet<u64>>());
}

#[test]
fn test_pasted_roster_is_trimmed() {
    let mut deps = setup_desk();
    exec(
        &mut deps,
        0,
        ExecuteMsg::ImportRosterText {
            text: "Alice\n\nBob \n".to_string(),
        },
    )
    .unwrap();

    let roster: RosterResponse = query_at(
        &deps,
        0,
        QueryMsg::Roster {
            start_after: None,
            limit: None,
        },
    );
    assert_eq!(roster.total, 2);
    let names: Vec<&str> = roster.participants.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);
}

// ─── Invariants over a full raffle ───

#[test]
fn test_full_raffle_invariants() {
    let mut deps = setup_desk();
    exec(&mut deps, 0, ExecuteMsg::AddSampleParticipants { count: 30 }).unwrap();
    exec(&mut deps, 0, ExecuteMsg::LoadSamplePrizes {}).unwrap();
    set_batch(&mut deps, 0, 3);

    let initial = prizes(&deps);
    let total_stock: u32 = initial.iter().map(|p| p.total_quantity).sum();

    let mut clock = 0;
    let mut drawn = 0u32;
    let mut rounds = 0;
    loop {
        let active: Option<Prize> = query_at(&deps, clock, QueryMsg::ActivePrize {});
        if active.is_none() {
            break;
        }
        let res = run_draw(&mut deps, &mut clock);
        drawn += attr(&res, "winners").parse::<u32>().unwrap();
        rounds += 1;
        assert!(rounds < 100, "raffle did not terminate");

        for prize in prizes(&deps) {
            assert!(prize.quantity <= prize.total_quantity);
        }
    }

    let remaining: u32 = prizes(&deps).iter().map(|p| p.quantity).sum();
    assert_eq!(remaining, 0);
    assert_eq!(drawn, total_stock - remaining);

    let hist = history(&deps);
    assert_eq!(hist.total, u64::from(drawn));
    let ids: HashSet<u64> = hist.winners.iter().map(|w| w.record.participant.id).collect();
    assert_eq!(ids.len(), hist.winners.len());

    // Per-prize awards match the stock that left the inventory
    for prize in prizes(&deps) {
        let awarded = hist
            .winners
            .iter()
            .filter(|w| w.record.prize == prize.name)
            .count() as u32;
        assert_eq!(awarded, prize.awarded());
    }

    let status: RaffleStatusResponse = query_at(&deps, clock, QueryMsg::RaffleStatus {});
    assert_eq!(status.phase, DrawPhase::Idle);
    assert_eq!(status.total_draws_completed, rounds);
    assert_eq!(status.pool_size, 30 - drawn);
}

#[test]
fn test_history_newest_first_with_paging() {
    let mut deps = setup_desk();
    add_names(&mut deps, &["Alice", "Bob", "Carol", "Dave"]);
    add_prize(&mut deps, "Mug", 1);
    add_prize(&mut deps, "Hoodie", 1);

    let mut clock = 0;
    run_draw(&mut deps, &mut clock);
    run_draw(&mut deps, &mut clock);

    let hist = history(&deps);
    assert_eq!(hist.winners.len(), 2);
    assert_eq!(hist.winners[0].record.prize, "Hoodie");
    assert_eq!(hist.winners[1].record.prize, "Mug");
    assert!(hist.winners[0].record.timestamp > hist.winners[1].record.timestamp);

    let page: WinnerHistoryResponse = query_at(
        &deps,
        0,
        QueryMsg::WinnerHistory {
            start_after: Some(hist.winners[0].seq),
            limit: Some(10),
        },
    );
    assert_eq!(page.winners.len(), 1);
    assert_eq!(page.winners[0].record.prize, "Mug");
}

#[test]
fn test_winner_export_parses_back() {
    let mut deps = setup_desk();
    add_names(&mut deps, &["Alice \"Al\"", "Bob, Jr", "Carol"]);
    add_prize(&mut deps, "Grand, \"Big\" Prize", 3);
    set_batch(&mut deps, 0, 3);

    let err = query(deps.as_ref(), mock_env(), QueryMsg::ExportWinners {}).unwrap_err();
    assert!(err.to_string().contains("no winners"));

    let mut clock = 0;
    run_draw(&mut deps, &mut clock);

    let export: ExportResponse = query_at(&deps, clock, QueryMsg::ExportWinners {});
    assert_eq!(export.rows, 3);
    assert!(export.content.starts_with(BOM));

    let rows = parse_rows(&export.content);
    assert_eq!(rows[0], vec!["name", "prize"]);
    let hist = history(&deps);
    for (row, entry) in rows[1..].iter().zip(hist.winners.iter()) {
        assert_eq!(row[0], entry.record.participant.name);
        assert_eq!(row[1], "Grand, \"Big\" Prize");
    }
}

#[test]
fn test_group_export_parses_back() {
    let mut deps = setup_desk();
    add_names(&mut deps, &["Alice", "Bob", "Carol", "Dave", "Eve"]);
    exec(&mut deps, 0, ExecuteMsg::FormGroups { group_size: 2 }).unwrap();

    let export: ExportResponse = query_at(&deps, 0, QueryMsg::ExportGroups {});
    assert_eq!(export.rows, 5);

    let rows = parse_rows(&export.content);
    assert_eq!(rows[0], vec!["group", "name"]);
    assert_eq!(rows.len(), 6);
    let members: HashSet<&str> = rows[1..].iter().map(|r| r[1].as_str()).collect();
    assert_eq!(members.len(), 5);
    assert!(rows[1..].iter().all(|r| r[0].starts_with("Group ")));
}

// ─── Reset ───

#[test]
fn test_reset_restores_stock_and_is_idempotent() {
    let mut deps = setup_desk();
    exec(&mut deps, 0, ExecuteMsg::AddSampleParticipants { count: 12 }).unwrap();
    add_prize(&mut deps, "Mug", 3);
    add_prize(&mut deps, "Hoodie", 2);
    set_batch(&mut deps, 0, 2);

    let mut clock = 0;
    run_draw(&mut deps, &mut clock);
    run_draw(&mut deps, &mut clock);

    reset(&mut deps, &mut clock);
    let after_first = prizes(&deps);
    assert!(after_first.iter().all(|p| p.quantity == p.total_quantity));
    assert_eq!(history(&deps).total, 0);
    let status: RaffleStatusResponse = query_at(&deps, clock, QueryMsg::RaffleStatus {});
    assert_eq!(status.display, "Waiting for draw");
    assert_eq!(status.pool_size, 12);

    reset(&mut deps, &mut clock);
    assert_eq!(prizes(&deps), after_first);
    assert_eq!(history(&deps).total, 0);
}

#[test]
fn test_reset_confirmation_expires() {
    let mut deps = setup_desk();
    add_names(&mut deps, &["Alice", "Bob"]);
    add_prize(&mut deps, "Mug", 2);

    let mut clock = 0;
    run_draw(&mut deps, &mut clock);

    exec(&mut deps, clock, ExecuteMsg::ResetRaffle {}).unwrap();
    let status: RaffleStatusResponse = query_at(&deps, clock, QueryMsg::RaffleStatus {});
    assert!(status.reset_armed);

    clock += CONFIRM_WINDOW_MS * 3;
    let status: RaffleStatusResponse = query_at(&deps, clock, QueryMsg::RaffleStatus {});
    assert!(!status.reset_armed);

    let res = exec(&mut deps, clock, ExecuteMsg::ResetRaffle {}).unwrap();
    assert_eq!(attr(&res, "status"), "armed");
    assert_eq!(history(&deps).total, 2);
}

#[test]
fn test_reset_rejected_while_drawing() {
    let mut deps = setup_desk();
    add_names(&mut deps, &["Alice", "Bob"]);
    add_prize(&mut deps, "Mug", 2);

    exec(&mut deps, 0, ExecuteMsg::StartDraw {}).unwrap();
    let err = exec(&mut deps, 100, ExecuteMsg::ResetRaffle {}).unwrap_err();
    assert!(matches!(err, ContractError::DrawInProgress { .. }));
}

// ─── Timers ───

#[test]
fn test_status_reports_next_tick() {
    let mut deps = setup_desk();
    add_names(&mut deps, &["Alice", "Bob"]);
    add_prize(&mut deps, "Mug", 2);

    let status: RaffleStatusResponse = query_at(&deps, 0, QueryMsg::RaffleStatus {});
    assert_eq!(status.timer_token, None);
    assert_eq!(status.next_tick_at, None);

    let res = exec(&mut deps, 0, ExecuteMsg::StartDraw {}).unwrap();
    let token: u64 = attr(&res, "token").parse().unwrap();

    let status: RaffleStatusResponse = query_at(&deps, 0, QueryMsg::RaffleStatus {});
    assert_eq!(status.phase, DrawPhase::Drawing);
    assert_eq!(status.timer_token, Some(token));
    assert_eq!(status.next_tick_at, Some(env_at(60).block.time));

    // Near the end the next tick is capped at the finalize time
    let status: RaffleStatusResponse = query_at(&deps, 1_990, QueryMsg::RaffleStatus {});
    assert_eq!(status.next_tick_at, Some(env_at(DRAW_MS).block.time));
}

#[test]
fn test_ticks_after_cancel_are_stale() {
    let mut deps = setup_desk();
    add_names(&mut deps, &["Alice", "Bob", "Carol"]);
    add_prize(&mut deps, "Mug", 3);
    set_batch(&mut deps, 0, 3);

    let mut clock = 0;
    let res = exec(&mut deps, clock, ExecuteMsg::StartDraw {}).unwrap();
    let draw_token: u64 = attr(&res, "token").parse().unwrap();
    clock += DRAW_MS;
    let res = exec(&mut deps, clock, ExecuteMsg::Tick { token: draw_token }).unwrap();
    let reveal_token: u64 = attr(&res, "token").parse().unwrap();

    exec(&mut deps, clock, ExecuteMsg::CancelTimers {}).unwrap();
    // Cancelling twice is harmless
    exec(&mut deps, clock, ExecuteMsg::CancelTimers {}).unwrap();

    clock += 10_000;
    for token in [draw_token, reveal_token] {
        let err = exec(&mut deps, clock, ExecuteMsg::Tick { token }).unwrap_err();
        assert!(matches!(err, ContractError::StaleTimer { .. }));
    }

    // History from the finished draw stays
    assert_eq!(history(&deps).total, 3);
    let status: RaffleStatusResponse = query_at(&deps, clock, QueryMsg::RaffleStatus {});
    assert_eq!(status.phase, DrawPhase::Idle);
    assert_eq!(status.display, "3 winners");
}

// ─── Roster management ───

#[test]
fn test_duplicate_report_and_cleanup() {
    let mut deps = setup_desk();
    add_names(&mut deps, &["Alice", "Bob", "Alice", "Carol", "Bob", "Alice"]);

    let stats: RosterStatsResponse = query_at(&deps, 0, QueryMsg::RosterStats {});
    assert_eq!(stats.total, 6);
    assert_eq!(stats.distinct_names, 3);
    assert!(stats.has_duplicates);

    let dupes: DuplicateNamesResponse = query_at(&deps, 0, QueryMsg::DuplicateNames {});
    let report: Vec<(&str, u32)> = dupes
        .duplicates
        .iter()
        .map(|d| (d.name.as_str(), d.count))
        .collect();
    assert_eq!(report, vec![("Alice", 3), ("Bob", 2)]);

    exec(&mut deps, 0, ExecuteMsg::RemoveDuplicates {}).unwrap();
    let stats: RosterStatsResponse = query_at(&deps, 0, QueryMsg::RosterStats {});
    assert_eq!(stats.total, 3);
    assert!(!stats.has_duplicates);
}

#[test]
fn test_roster_paging() {
    let mut deps = setup_desk();
    exec(&mut deps, 0, ExecuteMsg::AddSampleParticipants { count: 45 }).unwrap();

    let first: RosterResponse = query_at(
        &deps,
        0,
        QueryMsg::Roster {
            start_after: None,
            limit: None,
        },
    );
    assert_eq!(first.total, 45);
    assert_eq!(first.participants.len(), 30);

    let rest: RosterResponse = query_at(
        &deps,
        0,
        QueryMsg::Roster {
            start_after: first.participants.last().map(|p| p.id),
            limit: None,
        },
    );
    assert_eq!(rest.participants.len(), 15);
    assert_eq!(rest.participants[0].id, 31);
}

#[test]
fn test_sample_participants_capped() {
    let mut deps = setup_desk();
    let res = exec(&mut deps, 0, ExecuteMsg::AddSampleParticipants { count: 10_000 }).unwrap();
    assert_eq!(attr(&res, "count"), "500");
}

#[test]
fn test_sample_prizes_replace_inventory() {
    let mut deps = setup_desk();
    add_prize(&mut deps, "Mug", 2);
    exec(&mut deps, 0, ExecuteMsg::LoadSamplePrizes {}).unwrap();

    let all = prizes(&deps);
    assert_eq!(all.len(), 4);
    assert!(all.iter().all(|p| p.name != "Mug"));

    let active: Option<Prize> = query_at(&deps, 0, QueryMsg::ActivePrize {});
    assert_eq!(active.map(|p| p.id), Some(all[0].id));
}
