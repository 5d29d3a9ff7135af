use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Decimal, Timestamp};
use cw_storage_plus::{Item, Map};
use event_ops_common::types::{DrawPhase, Group, Participant, Prize, WinnerRecord};

pub const CONFIG: Item<DeskConfig> = Item::new("config");
pub const DESK_STATE: Item<DeskState> = Item::new("desk_state");
pub const DRAW_SETTINGS: Item<DrawSettings> = Item::new("draw_settings");
pub const RAFFLE: Item<RaffleState> = Item::new("raffle");

/// Roster, keyed by participant id. Ids are issued in insertion order.
pub const PARTICIPANTS: Map<u64, Participant> = Map::new("participants");
/// Prize inventory, keyed by prize id. Ascending id is inventory order.
pub const PRIZES: Map<u64, Prize> = Map::new("prizes");
/// Append-only winner history keyed by sequence. Iterate descending for newest-first.
pub const WINNERS: Map<u64, WinnerRecord> = Map::new("winners");
/// Latest grouping result, replaced wholesale on every run.
pub const GROUPS: Item<Vec<Group>> = Item::new("groups");

#[cw_serde]
pub struct DeskConfig {
    pub admin: Addr,
    /// Host allowed to drive the desk
    pub operator: Addr,
    /// Length of the drawing animation before a batch is finalized
    pub draw_animation_ms: u64,
    /// Suggested cadence for flicker ticks while drawing
    pub flicker_interval_ms: u64,
    /// How long an armed reset/clear waits for its confirming second call
    pub confirm_window_seconds: u64,
    pub max_group_size: u32,
    /// Display text before the first draw and after a reset
    pub placeholder_display: String,
}

#[cw_serde]
pub struct DeskState {
    pub next_participant_id: u64,
    pub next_prize_id: u64,
    pub next_winner_seq: u64,
    pub next_timer_token: u64,
    /// Mixed into every random seed so two runs in one block differ
    pub rng_nonce: u64,
    pub total_draws_completed: u64,
    pub roster_clear_armed_until: Option<Timestamp>,
}

#[cw_serde]
pub struct DrawSettings {
    /// Requested winners per draw, at least 1
    pub batch_size: u32,
    /// Hold time per winner during the celebration reveal
    pub celebration_seconds: Decimal,
    pub allow_repeat: bool,
    pub active_prize_id: Option<u64>,
}

#[cw_serde]
pub struct RaffleState {
    pub phase: DrawPhase,
    /// `None` shows the configured placeholder
    pub current_display: Option<String>,
    pub pending_draw: Option<PendingDraw>,
    pub celebration: Option<Celebration>,
    pub last_draw_at: Option<Timestamp>,
    pub reset_armed_until: Option<Timestamp>,
}

/// A draw waiting for its animation to finish.
#[cw_serde]
pub struct PendingDraw {
    pub token: u64,
    pub prize_id: u64,
    pub batch: u32,
    pub started_at: Timestamp,
    pub finalize_at: Timestamp,
    /// Restored if the draw is cancelled
    pub previous_display: Option<String>,
}

/// Sequential reveal of a finalized batch. Presentation only.
#[cw_serde]
pub struct Celebration {
    pub token: u64,
    pub prize_name: String,
    pub winners: Vec<Participant>,
    pub index: u32,
    pub advance_at: Timestamp,
}
