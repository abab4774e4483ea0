// tile_duel_protocol - wire protocol between Tile Duel clients and server.
//
// Shared by the server (`tile_duel_server`) and any client. It has no
// dependency on the engine: boards travel as plain `u32` grids and the server
// converts its engine types at the edge.
//
// Module overview:
// - `types.rs`:    `SlotId`, `Highlight`, and the `WireBoard` grid.
// - `message.rs`:  `Action` (client → server), `GameStatus`, and `Snapshot`
//                  (server → client).
// - `framing.rs`:  Fixed-size, big-endian, versioned record codec over any
//                  `Read`/`Write` stream.
// - `error.rs`:    `ProtocolError`.
//
// Design decisions:
// - **Fixed-size records, no length prefix.** An action is one byte, a
//   snapshot is `SNAPSHOT_LEN` bytes. Both ends agree on the layout through
//   this crate; a version byte leads every snapshot.
// - **Explicit field-by-field encoding.** Nothing depends on struct layout,
//   padding, or host endianness.
// - **No async runtime.** Plain `std::io::Read`/`Write`, compatible with
//   blocking `TcpStream`s that use read timeouts.

pub mod error;
pub mod framing;
pub mod message;
pub mod types;

pub use error::ProtocolError;
pub use framing::{
    ACTION_LEN, PROTOCOL_VERSION, SNAPSHOT_LEN, decode_snapshot, encode_snapshot, read_action,
    read_snapshot, write_action, write_snapshot,
};
pub use message::{Action, GameStatus, MAX_PENDING_ATTACKS, Snapshot};
pub use types::{Highlight, SlotId, WIRE_BOARD_SIZE, WireBoard};
