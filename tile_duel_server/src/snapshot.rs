// Snapshot composition and delivery.
//
// `compose` projects the session table into the view one player receives:
// their own board, score, pending attacks and highlight, the opponent's board
// and score (zeroed when the other slot is empty), and the derived status.
// It takes `&Slots`, which only exists behind the table lock, so a snapshot
// always reflects the state between two complete critical sections.
//
// `Dispatch` is the hand-off between the locked and unlocked halves of a
// worker's step: it is built while the guard is held (composing snapshots,
// cloning the recipients' `PeerWriter`s and stamping sequence numbers) and
// `deliver`ed after the guard is dropped.

use tile_duel_engine::{BOARD_SIZE, Cell};
use tile_duel_protocol::{
    GameStatus, Highlight, ProtocolError, SlotId, Snapshot, WIRE_BOARD_SIZE,
};
use tracing::{trace, warn};

use crate::session::{PeerWriter, Sent, Slots};

const _: () = assert!(BOARD_SIZE == WIRE_BOARD_SIZE);

/// Match status of slot `id`.
pub fn status_for(id: SlotId, slots: &Slots) -> GameStatus {
    if slots.occupancy() < 2 {
        return GameStatus::Waiting;
    }
    let mine = slots.state(id);
    let theirs = slots.state(id.opponent());
    match (mine.is_game_over(), theirs.is_game_over()) {
        (true, true) if mine.score() > theirs.score() => GameStatus::Win,
        (true, true) => GameStatus::Lose,
        (true, false) => GameStatus::OverWait,
        (false, _) => GameStatus::Playing,
    }
}

/// Build the view sent to slot `id`. `attack_landed` says whether an attack
/// hit this slot's board in the critical section producing the view; the
/// hit flag is only raised together with a highlight.
pub fn compose(id: SlotId, slots: &Slots, attack_landed: bool) -> Snapshot {
    let mine = slots.state(id);
    let opp = id.opponent();
    let (opp_board, opp_score) = if slots.is_occupied(opp) {
        let theirs = slots.state(opp);
        (*theirs.board().rows(), theirs.score())
    } else {
        ([[0; WIRE_BOARD_SIZE]; WIRE_BOARD_SIZE], 0)
    };
    let highlight = mine.highlight().map(to_wire_cell);

    Snapshot {
        my_board: *mine.board().rows(),
        opp_board,
        my_score: mine.score(),
        opp_score,
        status: status_for(id, slots),
        pending_attacks: mine.attacks().iter().collect(),
        highlight,
        hit: attack_landed && highlight.is_some(),
    }
}

fn to_wire_cell(cell: Cell) -> Highlight {
    Highlight {
        row: cell.row as u8,
        col: cell.col as u8,
    }
}

struct Outgoing {
    id: SlotId,
    peer: PeerWriter,
    seq: u64,
    snapshot: Snapshot,
}

impl Outgoing {
    fn compose(slots: &Slots, id: SlotId, hit_on: Option<SlotId>) -> Option<Self> {
        let peer = slots.peer(id)?;
        Some(Self {
            id,
            seq: peer.stamp(),
            snapshot: compose(id, slots, hit_on == Some(id)),
            peer,
        })
    }
}

/// Snapshots composed under the table lock, waiting to be written.
pub struct Dispatch {
    deliveries: Vec<Outgoing>,
}

impl Dispatch {
    /// A snapshot for `id` only, if that slot is occupied.
    pub fn to_slot(slots: &Slots, id: SlotId, hit_on: Option<SlotId>) -> Self {
        let deliveries = Outgoing::compose(slots, id, hit_on).into_iter().collect();
        Self { deliveries }
    }

    /// A snapshot for every occupied slot.
    pub fn to_all(slots: &Slots, hit_on: Option<SlotId>) -> Self {
        let deliveries = SlotId::ALL
            .into_iter()
            .filter_map(|id| Outgoing::compose(slots, id, hit_on))
            .collect();
        Self { deliveries }
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    /// The composed snapshot for `id`, if one is queued.
    pub fn snapshot_for(&self, id: SlotId) -> Option<&Snapshot> {
        self.deliveries
            .iter()
            .find(|out| out.id == id)
            .map(|out| &out.snapshot)
    }

    /// Write every queued snapshot. Call only after dropping the table lock.
    ///
    /// A snapshot is skipped if its recipient has already been sent one
    /// composed later. A failed write to `own` (the caller's connection) is
    /// returned so the caller can tear down. Failures on the other connection
    /// are logged; the failed socket is shut down, so that connection's own
    /// worker tears it down on its next read.
    pub fn deliver(self, own: Option<SlotId>) -> Result<(), ProtocolError> {
        let mut own_result = Ok(());
        for out in self.deliveries {
            match out.peer.send(out.seq, &out.snapshot) {
                Ok(Sent::Written) => {}
                Ok(Sent::Superseded) => {
                    trace!(id = %out.id, seq = out.seq, "dropped superseded snapshot");
                }
                Err(e) if Some(out.id) == own => own_result = Err(e),
                Err(e) => {
                    warn!(id = %out.id, error = %e, "failed to send snapshot to opponent");
                }
            }
        }
        own_result
    }
}
