use cosmwasm_schema::cw_serde;
use cosmwasm_std::Timestamp;

/// A roster entry. Identity is the id; names may repeat.
#[cw_serde]
pub struct Participant {
    pub id: u64,
    pub name: String,
}

/// A prize with its remaining and original stock.
///
/// Invariant: `quantity <= total_quantity` and `total_quantity >= 1`.
#[cw_serde]
pub struct Prize {
    pub id: u64,
    pub name: String,
    /// Units still available to draw
    pub quantity: u32,
    /// Units at creation, restored on reset
    pub total_quantity: u32,
}

impl Prize {
    /// Create a prize with full stock. A zero quantity is clamped to one.
    pub fn new(id: u64, name: impl Into<String>, quantity: u32) -> Self {
        let quantity = quantity.max(1);
        Self {
            id,
            name: name.into(),
            quantity,
            total_quantity: quantity,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.quantity == 0
    }

    /// Remove `count` units from stock, never going below zero.
    pub fn decrement(&mut self, count: u32) {
        self.quantity = self.quantity.saturating_sub(count);
    }

    pub fn restore(&mut self) {
        self.quantity = self.total_quantity;
    }

    /// Units handed out since creation or the last reset.
    pub fn awarded(&self) -> u32 {
        self.total_quantity - self.quantity
    }
}

/// An immutable history entry. The participant and the prize name are
/// copies taken at draw time, not references.
#[cw_serde]
pub struct WinnerRecord {
    pub participant: Participant,
    pub prize: String,
    pub timestamp: Timestamp,
}

/// One partition of a grouping run. Groups have no identity across runs.
#[cw_serde]
pub struct Group {
    /// 1-based position in the partition
    pub id: u32,
    pub name: String,
    pub members: Vec<Participant>,
}

/// The observable phases of the raffle engine. Finalizing happens inside a
/// single step between `Drawing` and `Celebrating` and is never stored.
#[cw_serde]
pub enum DrawPhase {
    Idle,
    Drawing,
    Celebrating,
}

impl DrawPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawPhase::Idle => "idle",
            DrawPhase::Drawing => "drawing",
            DrawPhase::Celebrating => "celebrating",
        }
    }
}
