// Core value types shared by both sides of the wire.
//
// `SlotId` names one of the server's two player positions. `Highlight` is a
// board coordinate as it travels on the wire (the engine's `Cell` stays on
// the server). `WireBoard` is the row-major tile grid carried in snapshots.

use std::fmt;

/// Side length of a board on the wire.
pub const WIRE_BOARD_SIZE: usize = 4;

/// Row-major tile grid as carried in a snapshot record.
pub type WireBoard = [[u32; WIRE_BOARD_SIZE]; WIRE_BOARD_SIZE];

/// One of the two fixed player positions on the server. Only `FIRST` and
/// `SECOND` exist; the inner index is private so it is always 0 or 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u8);

impl SlotId {
    pub const FIRST: SlotId = SlotId(0);
    pub const SECOND: SlotId = SlotId(1);
    pub const ALL: [SlotId; 2] = [SlotId::FIRST, SlotId::SECOND];

    /// Slot at position `index`, if there is one.
    pub fn from_index(index: usize) -> Option<SlotId> {
        SlotId::ALL.get(index).copied()
    }

    /// The other slot.
    pub fn opponent(self) -> SlotId {
        if self == SlotId::FIRST {
            SlotId::SECOND
        } else {
            SlotId::FIRST
        }
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}", self.0)
    }
}

/// Board cell most recently modified by an attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Highlight {
    pub row: u8,
    pub col: u8,
}

impl Highlight {
    pub fn is_on_board(self) -> bool {
        usize::from(self.row) < WIRE_BOARD_SIZE && usize::from(self.col) < WIRE_BOARD_SIZE
    }
}
