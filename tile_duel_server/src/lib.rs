// tile_duel_server - two-player Tile Duel game server.
//
// Tile Duel is a head-to-head sliding-tile game: two players each play their
// own 4x4 board, and big merges send attack tiles onto the opponent's board.
// This crate owns the authoritative game state for exactly two seats and
// pushes a full snapshot of it to each player after every change.
//
// Module overview:
// - `session.rs`:  `SessionTable`, the two slots behind one mutex, plus the
//                  shared tile generator and rules. `PeerWriter` per
//                  connection for writes made outside the lock.
// - `turn.rs`:     One move as a single critical section, and the idle timer
//                  that forces pending attacks to land.
// - `snapshot.rs`: Derives each player's view (status, boards, attacks,
//                  highlight) and delivers it after the lock is released.
// - `handler.rs`:  Per-connection worker: entry, read loop, teardown.
// - `server.rs`:   Listener, worker supervision, `ServerHandle`.
// - `client.rs`:   Programmatic client (reader thread + mpsc).
// - `config.rs`:   `ServerConfig`, loadable from JSON.
// - `error.rs`:    `ServerError` and `ClientError`.
//
// Dependencies: `tile_duel_engine` (board rules), `tile_duel_prng` (seedable
// randomness), `tile_duel_protocol` (wire records).
//
// The server can run as a standalone binary (`main.rs`) or be embedded via
// the library API (`start_server`).

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod server;
pub mod session;
pub mod snapshot;
pub mod turn;

pub use client::Client;
pub use config::ServerConfig;
pub use error::{ClientError, ServerError};
pub use server::{ServerHandle, start_server};
pub use session::SessionTable;
