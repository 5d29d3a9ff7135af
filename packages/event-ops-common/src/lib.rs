pub mod csv;
pub mod draw;
pub mod grouping;
pub mod ingest;
pub mod pool;
pub mod random;
pub mod types;

pub use draw::{clamp_batch_for_prize, effective_batch, next_available_prize, select_winners};
pub use grouping::partition_into_groups;
pub use pool::resolve_draw_pool;
pub use random::{shuffle, DrawRng};
pub use types::{DrawPhase, Group, Participant, Prize, WinnerRecord};
