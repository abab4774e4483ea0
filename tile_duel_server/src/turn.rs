// Turn logic run inside the table lock.
//
// `play_move` is one player's whole turn as a single critical section: slide,
// spawn if anything moved, try to land the oldest pending attack, check for
// game over, then roll attacks from the score gained and queue them on the
// opponent. `IdleTimer` drives the forced attack that punishes a player who
// sits on a non-empty attack queue.
//
// Both take `&mut Slots` (only reachable through the lock guard) and return a
// plain outcome; the handler turns an outcome into a `Dispatch` before the
// guard drops.

use tile_duel_engine::Direction;
use tile_duel_protocol::{Action, SlotId};

use crate::session::{Slots, TurnParts};
use crate::snapshot::Dispatch;

/// Movement direction of an action; `None` for `Quit`.
pub fn direction_of(action: Action) -> Option<Direction> {
    match action {
        Action::MoveUp => Some(Direction::Up),
        Action::MoveDown => Some(Direction::Down),
        Action::MoveLeft => Some(Direction::Left),
        Action::MoveRight => Some(Direction::Right),
        Action::Quit => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// No opponent connected; the move was dropped.
    Ignored,
    /// The mover's game had already ended; nothing changed.
    AlreadyOver,
    Played {
        gained: u32,
        moved: bool,
        /// An attack from the mover's own queue landed this turn.
        landed: bool,
        game_over: bool,
        /// Attacks accepted into the opponent's queue.
        attacks_sent: usize,
    },
}

impl TurnOutcome {
    /// Snapshots to send after this turn, composed from the post-turn state.
    pub fn dispatch(self, slots: &Slots, id: SlotId) -> Option<Dispatch> {
        match self {
            TurnOutcome::Ignored => None,
            TurnOutcome::AlreadyOver => Some(Dispatch::to_all(slots, None)),
            TurnOutcome::Played { landed, .. } => {
                Some(Dispatch::to_all(slots, landed.then_some(id)))
            }
        }
    }
}

/// Apply one move by the player in `id`.
pub fn play_move(slots: &mut Slots, id: SlotId, dir: Direction) -> TurnOutcome {
    if slots.occupancy() < 2 {
        return TurnOutcome::Ignored;
    }
    if slots.state(id).is_game_over() {
        return TurnOutcome::AlreadyOver;
    }

    let TurnParts {
        own,
        opponent,
        rng,
        rules,
    } = slots.turn_parts(id);

    let gained = own.apply_move(dir);
    let moved = own.moved();
    if moved {
        own.spawn_tile(rng, rules);
    }
    own.execute_attack(rng);
    let landed = own.highlight().is_some();
    let game_over = own.check_over();

    let attacks_sent = rules
        .roll_attacks(gained, rng)
        .into_iter()
        .filter(|value| opponent.queue_attack(*value))
        .count();

    TurnOutcome::Played {
        gained,
        moved,
        landed,
        game_over,
        attacks_sent,
    }
}

/// Counts consecutive read timeouts during which the player had attacks
/// pending and an opponent was connected.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdleTimer {
    ticks: u32,
}

/// Result of a forced attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForcedAttack {
    pub landed: bool,
    pub game_over: bool,
}

impl IdleTimer {
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// The player acted; start counting again.
    pub fn reset(&mut self) {
        self.ticks = 0;
    }

    /// Advance on a read timeout. Once the configured number of idle ticks
    /// is reached, force an attack on the player in `id` and restart.
    pub fn on_timeout(&mut self, slots: &mut Slots, id: SlotId) -> Option<ForcedAttack> {
        if slots.occupancy() < 2 || slots.state(id).attacks().is_empty() {
            self.ticks = 0;
            return None;
        }
        self.ticks += 1;
        if self.ticks < slots.rules().idle_ticks_before_attack {
            return None;
        }
        self.ticks = 0;

        let TurnParts { own, rng, .. } = slots.turn_parts(id);
        own.execute_attack(rng);
        Some(ForcedAttack {
            landed: own.highlight().is_some(),
            game_over: own.check_over(),
        })
    }
}
