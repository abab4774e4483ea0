// tile_duel_engine - board, merge, and attack rules for Tile Duel.
//
// Tile Duel is two-player 2048: each player slides tiles on their own 4×4
// board, and a move that merges enough score sends penalty tiles into the
// opponent's attack queue. This crate is the pure rules layer. It knows
// nothing about sockets, slots, or locks; the server crate wraps two
// `EngineState`s behind a mutex and calls into them.
//
// Module overview:
// - `board.rs`:  `Board`, `Cell`, `Direction`, and the single-line
//                slide-and-merge step every move is built from.
// - `state.rs`:  `EngineState` (board, score, flags, attack queue,
//                highlight) and its transitions: spawn, move, queue attack,
//                execute attack, game-over check.
// - `rules.rs`:  `GameRules`, the tunable numbers (attack threshold, caps,
//                spawn odds, idle timer), and attack rolling.
//
// All randomness comes from `tile_duel_prng::TileRng`, passed in by the
// caller, so every transition is reproducible under a fixed seed.

pub mod board;
pub mod rules;
pub mod state;

pub use board::{BOARD_SIZE, Board, Cell, Direction, Line, Tile, merge_line};
pub use rules::GameRules;
pub use state::{ATTACK_QUEUE_CAPACITY, AttackQueue, EngineState};
