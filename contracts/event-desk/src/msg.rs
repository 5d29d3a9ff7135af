use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Decimal, Timestamp};
use event_ops_common::types::{DrawPhase, Group, Participant, Prize, WinnerRecord};

use crate::state::{DeskConfig, DrawSettings};

#[cw_serde]
pub struct InstantiateMsg {
    pub operator: String,
    pub draw_animation_ms: Option<u64>,
    pub flicker_interval_ms: Option<u64>,
    pub confirm_window_seconds: Option<u64>,
    pub max_group_size: Option<u32>,
    pub default_celebration_seconds: Option<Decimal>,
    pub placeholder_display: Option<String>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Append names to the roster. Names are trimmed; blanks are dropped.
    AddParticipants { names: Vec<String> },
    /// Pasted text, one name per line.
    ImportRosterText { text: String },
    /// Uploaded `.txt` / `.csv` roster file.
    ImportRosterFile { file_name: String, content: String },
    /// Generate a demo roster.
    AddSampleParticipants { count: u32 },
    RemoveParticipant { participant_id: u64 },
    /// Keep only the first participant per name.
    RemoveDuplicates {},
    /// Two-step: the first call arms, a second call within the confirm window clears.
    ClearRoster {},

    AddPrize { name: String, quantity: u32 },
    RemovePrize { prize_id: u64 },
    /// `name,quantity` rows appended to the inventory.
    ImportPrizes { csv: String },
    /// Replace the inventory with the demo set.
    LoadSamplePrizes {},

    SelectPrize { prize_id: Option<u64> },
    UpdateDrawSettings {
        batch_size: Option<u32>,
        celebration_seconds: Option<Decimal>,
        allow_repeat: Option<bool>,
    },
    /// Enter Drawing for the active prize.
    StartDraw {},
    /// Timer callback. The token must match the live timer.
    Tick { token: u64 },
    /// Skip the rest of the winner reveal.
    CloseCelebration {},
    /// Teardown: cancel any pending draw or celebration timer.
    CancelTimers {},
    /// Two-step: clears winner history and restores every prize's stock.
    ResetRaffle {},

    FormGroups { group_size: u32 },

    /// Update configuration. Admin only.
    UpdateConfig {
        operator: Option<String>,
        draw_animation_ms: Option<u64>,
        flicker_interval_ms: Option<u64>,
        confirm_window_seconds: Option<u64>,
        max_group_size: Option<u32>,
        placeholder_display: Option<String>,
    },
}

#[cw_serde]
pub struct MigrateMsg {}

/// Bundled fields of `ExecuteMsg::UpdateConfig`.
pub struct UpdateConfigParams {
    pub operator: Option<String>,
    pub draw_animation_ms: Option<u64>,
    pub flicker_interval_ms: Option<u64>,
    pub confirm_window_seconds: Option<u64>,
    pub max_group_size: Option<u32>,
    pub placeholder_display: Option<String>,
}

/// Bundled fields of `ExecuteMsg::UpdateDrawSettings`.
pub struct DrawSettingsPatch {
    pub batch_size: Option<u32>,
    pub celebration_seconds: Option<Decimal>,
    pub allow_repeat: Option<bool>,
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(DeskConfig)]
    Config {},
    #[returns(DrawSettings)]
    DrawSettings {},
    #[returns(RosterResponse)]
    Roster {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(DuplicateNamesResponse)]
    DuplicateNames {},
    #[returns(RosterStatsResponse)]
    RosterStats {},
    #[returns(PrizesResponse)]
    Prizes {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(Option<Prize>)]
    Prize { prize_id: u64 },
    #[returns(Option<Prize>)]
    ActivePrize {},
    #[returns(DrawPoolResponse)]
    DrawPool {},
    #[returns(RaffleStatusResponse)]
    RaffleStatus {},
    /// Newest first. `start_after` is a sequence number; older entries follow it.
    #[returns(WinnerHistoryResponse)]
    WinnerHistory {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(ExportResponse)]
    ExportWinners {},
    #[returns(GroupsResponse)]
    Groups {},
    #[returns(ExportResponse)]
    ExportGroups {},
}

#[cw_serde]
pub struct RosterResponse {
    pub participants: Vec<Participant>,
    pub total: u64,
}

#[cw_serde]
pub struct NameCount {
    pub name: String,
    pub count: u32,
}

#[cw_serde]
pub struct DuplicateNamesResponse {
    pub duplicates: Vec<NameCount>,
}

#[cw_serde]
pub struct RosterStatsResponse {
    pub total: u64,
    pub distinct_names: u64,
    pub has_duplicates: bool,
}

#[cw_serde]
pub struct PrizesResponse {
    pub prizes: Vec<Prize>,
}

#[cw_serde]
pub struct DrawPoolResponse {
    pub participants: Vec<Participant>,
    pub size: u32,
}

#[cw_serde]
pub struct CelebrationView {
    pub prize_name: String,
    pub winner: Participant,
    /// 1-based position of `winner` in the batch
    pub position: u32,
    pub total: u32,
}

#[cw_serde]
pub struct RaffleStatusResponse {
    pub phase: DrawPhase,
    pub display: String,
    pub active_prize: Option<Prize>,
    pub pool_size: u32,
    /// Token the next `Tick` must carry
    pub timer_token: Option<u64>,
    /// When the host should send the next `Tick`
    pub next_tick_at: Option<Timestamp>,
    pub celebrating: Option<CelebrationView>,
    pub reset_armed: bool,
    pub last_draw_at: Option<Timestamp>,
    pub total_draws_completed: u64,
}

#[cw_serde]
pub struct WinnerEntry {
    pub seq: u64,
    pub record: WinnerRecord,
}

#[cw_serde]
pub struct WinnerHistoryResponse {
    pub winners: Vec<WinnerEntry>,
    pub total: u64,
}

#[cw_serde]
pub struct GroupsResponse {
    pub groups: Vec<Group>,
}

#[cw_serde]
pub struct ExportResponse {
    /// UTF-8 CSV with a leading byte-order mark
    pub content: String,
    /// Data rows, header excluded
    pub rows: u32,
}
