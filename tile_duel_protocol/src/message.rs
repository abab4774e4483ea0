// Protocol records exchanged between clients and the server.
//
// - `Action`: the single byte a client sends per keystroke.
// - `Snapshot`: the full view of both boards the server sends back after
//   every state change that concerns the receiving player.
//
// `GameStatus` is derived by the server from slot occupancy and both players'
// game-over flags; see `tile_duel_server::snapshot`.

use crate::error::ProtocolError;
use crate::types::{Highlight, WIRE_BOARD_SIZE, WireBoard};

/// Upper bound on pending attacks listed in a snapshot.
pub const MAX_PENDING_ATTACKS: usize = 10;

/// Client input. Encoded as a single byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Action {
    MoveUp = 0,
    MoveDown = 1,
    MoveLeft = 2,
    MoveRight = 3,
    Quit = 4,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::MoveUp,
        Action::MoveDown,
        Action::MoveLeft,
        Action::MoveRight,
        Action::Quit,
    ];

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            0 => Ok(Action::MoveUp),
            1 => Ok(Action::MoveDown),
            2 => Ok(Action::MoveLeft),
            3 => Ok(Action::MoveRight),
            4 => Ok(Action::Quit),
            other => Err(ProtocolError::UnknownAction(other)),
        }
    }
}

/// Match status from one player's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GameStatus {
    /// Fewer than two players connected.
    Waiting = 0,
    Playing = 1,
    /// Both boards are finished and this player scored strictly more.
    Win = 2,
    /// Both boards are finished and this player did not score more.
    Lose = 3,
    /// This board is finished; the opponent is still playing.
    OverWait = 4,
}

impl GameStatus {
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            0 => Ok(GameStatus::Waiting),
            1 => Ok(GameStatus::Playing),
            2 => Ok(GameStatus::Win),
            3 => Ok(GameStatus::Lose),
            4 => Ok(GameStatus::OverWait),
            other => Err(ProtocolError::UnknownStatus(other)),
        }
    }
}

/// Point-in-time view of the match sent to one player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub my_board: WireBoard,
    pub opp_board: WireBoard,
    pub my_score: u32,
    pub opp_score: u32,
    pub status: GameStatus,
    /// Attacks waiting to land on `my_board`, oldest first.
    pub pending_attacks: Vec<u32>,
    pub highlight: Option<Highlight>,
    /// An attack landed on `my_board` in the turn that produced this view.
    pub hit: bool,
}

impl Snapshot {
    /// A snapshot with empty boards, zero scores, and `WAITING` status.
    pub fn waiting() -> Self {
        Self {
            my_board: [[0; WIRE_BOARD_SIZE]; WIRE_BOARD_SIZE],
            opp_board: [[0; WIRE_BOARD_SIZE]; WIRE_BOARD_SIZE],
            my_score: 0,
            opp_score: 0,
            status: GameStatus::Waiting,
            pending_attacks: Vec::new(),
            highlight: None,
            hit: false,
        }
    }

    pub fn attack_count(&self) -> usize {
        self.pending_attacks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_bytes_are_stable() {
        for (expected, action) in Action::ALL.iter().enumerate() {
            assert_eq!(usize::from(action.to_byte()), expected);
            assert_eq!(Action::from_byte(action.to_byte()).unwrap(), *action);
        }
    }

    #[test]
    fn unknown_action_byte_rejected() {
        let err = Action::from_byte(5).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownAction(5)));
    }

    #[test]
    fn status_bytes_are_stable() {
        assert_eq!(GameStatus::Waiting.to_byte(), 0);
        assert_eq!(GameStatus::OverWait.to_byte(), 4);
        assert_eq!(GameStatus::from_byte(2).unwrap(), GameStatus::Win);
        assert!(matches!(
            GameStatus::from_byte(9),
            Err(ProtocolError::UnknownStatus(9))
        ));
    }
}
