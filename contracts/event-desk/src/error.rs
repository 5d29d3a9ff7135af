use cosmwasm_std::StdError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("name must not be blank")]
    BlankName,

    #[error("no valid names found in input")]
    NoValidNames,

    #[error("no valid prize rows found in input")]
    NothingToImport,

    #[error("unsupported file type: {file_name} (expected .txt or .csv)")]
    UnsupportedFileType { file_name: String },

    #[error("participant {participant_id} not found")]
    ParticipantNotFound { participant_id: u64 },

    #[error("prize {prize_id} not found")]
    PrizeNotFound { prize_id: u64 },

    #[error("no active prize selected")]
    NoActivePrize,

    #[error("prize {prize_id} has no remaining stock")]
    PrizeExhausted { prize_id: u64 },

    #[error("draw pool is empty")]
    EmptyPool,

    #[error("roster is empty")]
    EmptyRoster,

    #[error("group size {size} out of range [{min}, {max}]")]
    InvalidGroupSize { size: u32, min: u32, max: u32 },

    #[error("a draw is in progress (phase: {phase})")]
    DrawInProgress { phase: String },

    #[error("no celebration is running")]
    NotCelebrating,

    #[error("timer token {token} is stale")]
    StaleTimer { token: u64 },

    #[error("timer not due until {due} (ns)")]
    TimerNotDue { due: u64 },
}
