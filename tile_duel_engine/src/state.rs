// Per-player game state and its transitions.
//
// `EngineState` is everything one player owns: board, score, game-over flag,
// the transient `moved` flag from the last move, the bounded queue of attacks
// the opponent has sent, and the cell the most recent attack touched. All
// transitions are plain methods with no I/O and no locking; randomness comes
// in through a caller-supplied `TileRng`.
//
// Attack execution takes the head of the queue and looks for a cell that is
// either empty or already holds the same value. The entry is only dequeued
// once it lands. A board with no such cell keeps the attack pending for the
// next attempt. Landing on an equal tile adds the attack value to it, which
// for equal values is the same as doubling.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tile_duel_prng::TileRng;

use crate::board::{Board, Cell, Direction, Tile};
use crate::rules::GameRules;

/// Maximum number of attacks that can wait on one board.
pub const ATTACK_QUEUE_CAPACITY: usize = 10;

/// Bounded FIFO of pending attack values. Overflow is dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackQueue {
    values: VecDeque<Tile>,
}

impl AttackQueue {
    /// Append `value` unless the queue is full. Returns whether it was kept.
    pub fn push(&mut self, value: Tile) -> bool {
        if self.values.len() >= ATTACK_QUEUE_CAPACITY {
            return false;
        }
        self.values.push_back(value);
        true
    }

    pub fn front(&self) -> Option<Tile> {
        self.values.front().copied()
    }

    pub fn pop_front(&mut self) -> Option<Tile> {
        self.values.pop_front()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Tile> + '_ {
        self.values.iter().copied()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// One player's board and the bookkeeping around it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    board: Board,
    score: u32,
    game_over: bool,
    moved: bool,
    attacks: AttackQueue,
    highlight: Option<Cell>,
}

impl EngineState {
    /// A fresh game: empty board with two spawned tiles.
    pub fn new(rng: &mut TileRng, rules: &GameRules) -> Self {
        let mut state = Self::default();
        state.reset(rng, rules);
        state
    }

    /// A state with a given board and nothing else set. No tiles are spawned.
    pub fn from_board(board: Board) -> Self {
        Self {
            board,
            ..Self::default()
        }
    }

    /// Clear everything and spawn the two opening tiles.
    pub fn reset(&mut self, rng: &mut TileRng, rules: &GameRules) {
        *self = Self::default();
        self.spawn_tile(rng, rules);
        self.spawn_tile(rng, rules);
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn set_board(&mut self, board: Board) {
        self.board = board;
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Whether the last `apply_move` changed any cell.
    pub fn moved(&self) -> bool {
        self.moved
    }

    pub fn highlight(&self) -> Option<Cell> {
        self.highlight
    }

    pub fn attacks(&self) -> &AttackQueue {
        &self.attacks
    }

    /// Place a 2 (or, with `rules.spawn_four_chance`, a 4) on a uniformly
    /// chosen empty cell. No-op on a full board.
    pub fn spawn_tile(&mut self, rng: &mut TileRng, rules: &GameRules) {
        let empty = self.board.empty_cells();
        let Some(cell) = rng.choose(&empty) else {
            return;
        };
        let value = if rng.random_bool(rules.spawn_four_chance) {
            4
        } else {
            2
        };
        self.board.set(cell, value);
    }

    /// Slide and merge toward `dir`. Sets `moved`, adds the merge score to
    /// the running score and returns the score gained by this move alone.
    pub fn apply_move(&mut self, dir: Direction) -> u32 {
        let before = self.board;
        let gained = self.board.slide(dir);
        self.moved = self.board != before;
        self.score += gained;
        gained
    }

    /// Queue an incoming attack. Dropped silently once the queue is full.
    pub fn queue_attack(&mut self, value: Tile) -> bool {
        self.attacks.push(value)
    }

    /// Try to land the oldest pending attack. Clears the highlight first; on
    /// success the highlight marks the cell that was hit.
    pub fn execute_attack(&mut self, rng: &mut TileRng) {
        self.highlight = None;
        let Some(value) = self.attacks.front() else {
            return;
        };

        let targets: Vec<Cell> = Board::cells()
            .filter(|c| {
                let current = self.board.get(*c);
                current == 0 || current == value
            })
            .collect();
        let Some(cell) = rng.choose(&targets) else {
            // Nowhere to land; stays queued for the next attempt.
            return;
        };

        let current = self.board.get(cell);
        self.board.set(cell, current + value);
        self.highlight = Some(cell);
        self.attacks.pop_front();
    }

    /// True when no empty cell and no mergeable neighbours remain. Latches
    /// `game_over` when it returns true.
    pub fn check_over(&mut self) -> bool {
        if self.board.has_empty_cell() || self.board.has_adjacent_pair() {
            return false;
        }
        self.game_over = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> GameRules {
        GameRules::default()
    }

    fn checkerboard() -> Board {
        Board::from_rows([
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 2, 4],
            [4, 2, 4, 2],
        ])
    }

    fn tile_count(board: &Board) -> usize {
        board.rows().iter().flatten().filter(|v| **v != 0).count()
    }

    #[test]
    fn new_game_has_two_small_tiles() {
        let mut rng = TileRng::new(1);
        for _ in 0..50 {
            let state = EngineState::new(&mut rng, &rules());
            assert_eq!(tile_count(state.board()), 2);
            assert!(
                state
                    .board()
                    .rows()
                    .iter()
                    .flatten()
                    .all(|v| matches!(*v, 0 | 2 | 4))
            );
            assert_eq!(state.score(), 0);
            assert!(!state.is_game_over());
            assert!(!state.moved());
            assert_eq!(state.highlight(), None);
            assert!(state.attacks().is_empty());
        }
    }

    #[test]
    fn reset_clears_score_queue_and_flags() {
        let mut rng = TileRng::new(2);
        let mut state = EngineState::from_board(checkerboard());
        state.check_over();
        state.queue_attack(2);
        state.score = 500;
        state.reset(&mut rng, &rules());
        assert_eq!(state.score(), 0);
        assert!(!state.is_game_over());
        assert!(state.attacks().is_empty());
        assert_eq!(tile_count(state.board()), 2);
    }

    #[test]
    fn spawn_fills_only_empty_cells() {
        let mut rng = TileRng::new(3);
        let mut state = EngineState::from_board(Board::EMPTY);
        for placed in 1..=16 {
            state.spawn_tile(&mut rng, &rules());
            assert_eq!(tile_count(state.board()), placed);
        }
        let full = *state.board();
        state.spawn_tile(&mut rng, &rules());
        assert_eq!(*state.board(), full);
    }

    #[test]
    fn spawn_value_follows_four_chance() {
        let mut rng = TileRng::new(4);
        let always_four = GameRules {
            spawn_four_chance: 1.0,
            ..GameRules::default()
        };
        let mut state = EngineState::from_board(Board::EMPTY);
        state.spawn_tile(&mut rng, &always_four);
        assert!(state.board().rows().iter().flatten().any(|v| *v == 4));
    }

    #[test]
    fn move_accumulates_score_and_reports_gain() {
        let mut state = EngineState::from_board(Board::from_rows([
            [2, 2, 4, 4],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
        ]));
        state.score = 10;
        let gained = state.apply_move(Direction::Left);
        assert_eq!(gained, 12);
        assert_eq!(state.score(), 22);
        assert!(state.moved());
        assert_eq!(state.board().rows()[0], [4, 8, 0, 0]);
    }

    #[test]
    fn move_that_changes_nothing_is_not_moved() {
        let mut state = EngineState::from_board(Board::from_rows([
            [2, 4, 0, 0],
            [8, 0, 0, 0],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
        ]));
        assert_eq!(state.apply_move(Direction::Left), 0);
        assert!(!state.moved());
        assert_eq!(state.apply_move(Direction::Right), 0);
        assert!(state.moved());
    }

    #[test]
    fn queue_drops_past_capacity() {
        let mut state = EngineState::default();
        for _ in 0..ATTACK_QUEUE_CAPACITY {
            assert!(state.queue_attack(2));
        }
        assert!(!state.queue_attack(4));
        assert_eq!(state.attacks().len(), ATTACK_QUEUE_CAPACITY);
        assert!(state.attacks().iter().all(|v| v == 2));
    }

    #[test]
    fn execute_attack_on_empty_queue_only_clears_highlight() {
        let mut rng = TileRng::new(5);
        let mut state = EngineState::from_board(Board::EMPTY);
        state.highlight = Some(Cell::new(1, 1));
        state.execute_attack(&mut rng);
        assert_eq!(state.highlight(), None);
        assert_eq!(*state.board(), Board::EMPTY);
    }

    #[test]
    fn execute_attack_lands_in_only_empty_cell() {
        let mut rng = TileRng::new(6);
        let mut board = checkerboard();
        board.set(Cell::new(2, 1), 0);
        let mut state = EngineState::from_board(board);
        state.queue_attack(8);
        state.queue_attack(2);

        state.execute_attack(&mut rng);
        assert_eq!(state.highlight(), Some(Cell::new(2, 1)));
        assert_eq!(state.board().get(Cell::new(2, 1)), 8);
        assert_eq!(state.attacks().len(), 1);
        assert_eq!(state.attacks().front(), Some(2));
    }

    #[test]
    fn execute_attack_merges_into_equal_tile() {
        let mut rng = TileRng::new(7);
        let mut board = Board::from_rows([
            [8, 16, 8, 16],
            [16, 8, 16, 8],
            [8, 16, 8, 16],
            [16, 8, 16, 8],
        ]);
        board.set(Cell::new(0, 0), 2);
        let mut state = EngineState::from_board(board);
        state.queue_attack(2);
        state.execute_attack(&mut rng);
        assert_eq!(state.highlight(), Some(Cell::new(0, 0)));
        assert_eq!(state.board().get(Cell::new(0, 0)), 4);
        assert!(state.attacks().is_empty());
    }

    #[test]
    fn blocked_attack_stays_queued() {
        let mut rng = TileRng::new(8);
        let mut state = EngineState::from_board(Board::from_rows([
            [8, 16, 8, 16],
            [16, 8, 16, 8],
            [8, 16, 8, 16],
            [16, 8, 16, 8],
        ]));
        state.queue_attack(2);
        state.queue_attack(4);
        state.execute_attack(&mut rng);
        assert_eq!(state.highlight(), None);
        assert_eq!(state.attacks().len(), 2);
        assert_eq!(state.attacks().front(), Some(2));
    }

    #[test]
    fn attack_never_grows_queue_and_shrinks_by_one_on_success() {
        let mut rng = TileRng::new(9);
        let mut state = EngineState::new(&mut rng, &rules());
        for _ in 0..ATTACK_QUEUE_CAPACITY {
            state.queue_attack(2);
        }
        let mut previous = state.attacks().len();
        for _ in 0..30 {
            state.execute_attack(&mut rng);
            let now = state.attacks().len();
            match state.highlight() {
                Some(cell) => {
                    assert_eq!(now + 1, previous);
                    assert_ne!(state.board().get(cell), 0);
                }
                None => assert_eq!(now, previous),
            }
            previous = now;
        }
    }

    #[test]
    fn check_over_requires_full_board_without_pairs() {
        let mut state = EngineState::from_board(checkerboard());
        assert!(state.check_over());
        assert!(state.is_game_over());

        let mut with_gap = checkerboard();
        with_gap.set(Cell::new(0, 0), 0);
        let mut state = EngineState::from_board(with_gap);
        assert!(!state.check_over());
        assert!(!state.is_game_over());

        let mut with_pair = checkerboard();
        with_pair.set(Cell::new(0, 1), 2);
        let mut state = EngineState::from_board(with_pair);
        assert!(!state.check_over());
        assert!(!state.is_game_over());
    }

    #[test]
    fn state_survives_json_dump() {
        let mut rng = TileRng::new(10);
        let mut state = EngineState::new(&mut rng, &rules());
        state.queue_attack(4);
        let json = serde_json::to_string(&state).unwrap();
        let restored: EngineState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }
}
