// The two-slot session table shared by all connection workers.
//
// `SessionTable` is the single piece of shared mutable state in the server.
// It wraps `Slots` (both player positions, the shared `TileRng`, and the
// game rules) in one `Mutex`. Every read or write of occupancy or of either
// `EngineState` goes through `SessionTable::lock`, and a worker holds the
// guard for the whole of one turn: move, spawn, attack, game-over check,
// opponent enqueue, and composing both snapshots. Nothing outside the guard
// can see a half-applied turn.
//
// Each occupied slot keeps a `PeerWriter`, a cloneable handle to that
// connection's write half behind its own small mutex. Workers clone the
// handles they need while holding the table lock and write after releasing
// it. The writer mutex only keeps two workers from interleaving bytes on the
// same socket; it is never taken while the table lock is held.
//
// Two workers can finish their critical sections in one order and reach the
// same socket in the other. Each snapshot therefore carries a per-peer
// sequence number stamped under the table lock, and the writer drops any
// snapshot older than the last one it wrote. Write halves carry a write
// timeout (set by the accept loop); a failed or timed-out write shuts that
// socket down, so a player who stops reading is disconnected instead of
// stalling the other player's worker.
//
// Slot lifecycle:
// - Both slots start with a fresh game when the table is created.
// - `assign` puts a new connection in the first free slot and restarts that
//   slot's game.
// - `release` empties a slot; when that leaves no one connected, both games
//   are reset together.

use std::io::BufWriter;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tile_duel_engine::{EngineState, GameRules};
use tile_duel_prng::TileRng;
use tile_duel_protocol::{ProtocolError, SlotId, Snapshot, write_snapshot};

/// Shared handle to one connection's write half.
#[derive(Clone)]
pub struct PeerWriter {
    inner: Arc<PeerShared>,
}

struct PeerShared {
    /// Last sequence number handed out. Only advanced under the table lock.
    stamped: AtomicU64,
    out: Mutex<PeerOut>,
}

struct PeerOut {
    writer: BufWriter<TcpStream>,
    /// Sequence number of the last snapshot written to the socket.
    sent: u64,
}

/// What `PeerWriter::send` did with a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sent {
    Written,
    /// A snapshot composed later had already been written; this one was
    /// dropped.
    Superseded,
}

impl PeerWriter {
    /// Wrap a connection's write half. Any write timeout must already be set
    /// on `stream`.
    pub fn new(stream: TcpStream) -> Self {
        Self {
            inner: Arc::new(PeerShared {
                stamped: AtomicU64::new(0),
                out: Mutex::new(PeerOut {
                    writer: BufWriter::new(stream),
                    sent: 0,
                }),
            }),
        }
    }

    /// Reserve the sequence number for a snapshot being composed. Call in
    /// the same critical section that composes it, so numbers follow the
    /// order in which table states were observed.
    pub fn stamp(&self) -> u64 {
        self.inner.stamped.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Write snapshot `seq` unless a newer one has already gone out. Must
    /// not be called while holding the table lock.
    ///
    /// A failed write shuts the socket down, so the connection's own worker
    /// sees EOF on its next read and tears the slot down.
    pub fn send(&self, seq: u64, snapshot: &Snapshot) -> Result<Sent, ProtocolError> {
        let mut out = self.inner.out.lock().unwrap_or_else(PoisonError::into_inner);
        if seq <= out.sent {
            return Ok(Sent::Superseded);
        }
        if let Err(e) = write_snapshot(&mut out.writer, snapshot) {
            out.writer.get_ref().shutdown(Shutdown::Both).ok();
            return Err(e);
        }
        out.sent = seq;
        Ok(Sent::Written)
    }
}

struct Slot {
    peer: Option<PeerWriter>,
    state: EngineState,
}

/// What happened to the table when a slot was released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    /// The other player is still connected.
    OpponentRemains(SlotId),
    /// Nobody is left; both games were reset.
    Emptied,
}

/// Mutable borrows of everything one player's turn touches.
pub struct TurnParts<'a> {
    pub own: &'a mut EngineState,
    pub opponent: &'a mut EngineState,
    pub rng: &'a mut TileRng,
    pub rules: &'a GameRules,
}

/// Contents of the session table. Only reachable through the table's lock.
pub struct Slots {
    slots: [Slot; 2],
    rng: TileRng,
    rules: GameRules,
}

impl Slots {
    fn new(rules: GameRules, mut rng: TileRng) -> Self {
        let slots = [
            Slot {
                peer: None,
                state: EngineState::new(&mut rng, &rules),
            },
            Slot {
                peer: None,
                state: EngineState::new(&mut rng, &rules),
            },
        ];
        Self { slots, rng, rules }
    }

    /// Number of connected players (0, 1, or 2).
    pub fn occupancy(&self) -> usize {
        self.slots.iter().filter(|s| s.peer.is_some()).count()
    }

    pub fn is_occupied(&self, id: SlotId) -> bool {
        self.slots[id.index()].peer.is_some()
    }

    pub fn state(&self, id: SlotId) -> &EngineState {
        &self.slots[id.index()].state
    }

    pub fn state_mut(&mut self, id: SlotId) -> &mut EngineState {
        &mut self.slots[id.index()].state
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Write handle of the player in `id`, if any.
    pub fn peer(&self, id: SlotId) -> Option<PeerWriter> {
        self.slots[id.index()].peer.clone()
    }

    /// Split borrows for a turn taken by the player in `id`.
    pub fn turn_parts(&mut self, id: SlotId) -> TurnParts<'_> {
        let [first, second] = &mut self.slots;
        let (own, opponent) = if id.index() == 0 {
            (&mut first.state, &mut second.state)
        } else {
            (&mut second.state, &mut first.state)
        };
        TurnParts {
            own,
            opponent,
            rng: &mut self.rng,
            rules: &self.rules,
        }
    }

    /// Seat `peer` in the first free slot with a fresh game.
    pub fn assign(&mut self, peer: PeerWriter) -> Option<SlotId> {
        let id = SlotId::ALL
            .into_iter()
            .find(|id| self.slots[id.index()].peer.is_none())?;
        let slot = &mut self.slots[id.index()];
        slot.peer = Some(peer);
        slot.state.reset(&mut self.rng, &self.rules);
        Some(id)
    }

    /// Empty slot `id`, resetting both games if that leaves nobody.
    pub fn release(&mut self, id: SlotId) -> Release {
        self.slots[id.index()].peer = None;
        if self.occupancy() > 0 {
            return Release::OpponentRemains(id.opponent());
        }
        for slot in &mut self.slots {
            slot.state.reset(&mut self.rng, &self.rules);
        }
        Release::Emptied
    }
}

/// Lock-guarded two-slot store shared by the accept loop and all workers.
pub struct SessionTable {
    inner: Mutex<Slots>,
}

impl SessionTable {
    pub fn new(rules: GameRules, rng: TileRng) -> Self {
        Self {
            inner: Mutex::new(Slots::new(rules, rng)),
        }
    }

    /// Take the table lock. Every mutation sequence runs under one guard.
    ///
    /// A poisoned lock is recovered: each critical section leaves the slots
    /// consistent before anything in it can panic, so the data is usable.
    pub fn lock(&self) -> MutexGuard<'_, Slots> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seat a new connection, or `None` if both slots are taken.
    pub fn assign(&self, peer: PeerWriter) -> Option<SlotId> {
        self.lock().assign(peer)
    }

    pub fn release(&self, id: SlotId) -> Release {
        self.lock().release(id)
    }

    pub fn occupancy(&self) -> usize {
        self.lock().occupancy()
    }

    /// Run `f` against one slot's game while holding the lock.
    pub fn with_state<R>(&self, id: SlotId, f: impl FnOnce(&mut EngineState) -> R) -> R {
        f(self.lock().state_mut(id))
    }
}
