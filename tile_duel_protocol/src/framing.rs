// Fixed-size binary records over a byte stream.
//
// There is no length prefix: both ends know the exact size of each record.
// A client sends one `ACTION_LEN`-byte record per action; the server sends
// `SNAPSHOT_LEN`-byte snapshot records. Every multi-byte field is big-endian
// and written field by field, so the layout does not depend on any in-memory
// struct representation.
//
// Snapshot layout (offsets in bytes):
//
//   0    version          u8      PROTOCOL_VERSION
//   1    my_board         16×u32  row-major
//   65   opp_board        16×u32  row-major
//   129  my_score         u32
//   133  opp_score        u32
//   137  status           u8      GameStatus
//   138  pending_attacks  10×u32  unused entries are zero
//   178  attack_count     u32     <= 10
//   182  highlight_row    i32     -1 when there is no highlight
//   186  highlight_col    i32     -1 when there is no highlight
//   190  hit              u8      0 or 1
//
// Writers use `write_all` and flush, so a record is either fully handed to
// the OS or the call fails. Readers use `read_exact`; a stream that ends
// mid-record surfaces as `UnexpectedEof`, which callers treat as fatal for
// the connection.

use std::io::{Read, Write};

use crate::error::ProtocolError;
use crate::message::{Action, GameStatus, MAX_PENDING_ATTACKS, Snapshot};
use crate::types::{Highlight, WIRE_BOARD_SIZE, WireBoard};

/// Snapshot layout version. Bumped on any change to the record layout.
pub const PROTOCOL_VERSION: u8 = 1;

/// Size of a client action record.
pub const ACTION_LEN: usize = 1;

const BOARD_BYTES: usize = WIRE_BOARD_SIZE * WIRE_BOARD_SIZE * 4;

/// Size of a server snapshot record.
pub const SNAPSHOT_LEN: usize = 1 + 2 * BOARD_BYTES + 4 + 4 + 1 + MAX_PENDING_ATTACKS * 4 + 4 + 4 + 4 + 1;

/// Sentinel for "no highlight" in the row and column fields.
const NO_HIGHLIGHT: i32 = -1;

/// Write one action record and flush.
pub fn write_action<W: Write>(writer: &mut W, action: Action) -> Result<(), ProtocolError> {
    writer.write_all(&[action.to_byte()])?;
    writer.flush()?;
    Ok(())
}

/// Read one action record. Blocks up to the stream's read timeout, if any.
pub fn read_action<R: Read>(reader: &mut R) -> Result<Action, ProtocolError> {
    let mut buf = [0u8; ACTION_LEN];
    reader.read_exact(&mut buf)?;
    Action::from_byte(buf[0])
}

/// Encode a snapshot into its fixed-size record.
pub fn encode_snapshot(snapshot: &Snapshot) -> Result<[u8; SNAPSHOT_LEN], ProtocolError> {
    let count = snapshot.pending_attacks.len();
    if count > MAX_PENDING_ATTACKS {
        return Err(ProtocolError::AttackCount { count });
    }

    let mut out = [0u8; SNAPSHOT_LEN];
    let mut w = RecordWriter::new(&mut out);
    w.put_u8(PROTOCOL_VERSION);
    w.put_board(&snapshot.my_board);
    w.put_board(&snapshot.opp_board);
    w.put_u32(snapshot.my_score);
    w.put_u32(snapshot.opp_score);
    w.put_u8(snapshot.status.to_byte());
    for i in 0..MAX_PENDING_ATTACKS {
        w.put_u32(snapshot.pending_attacks.get(i).copied().unwrap_or(0));
    }
    w.put_u32(count as u32);
    let (row, col) = match snapshot.highlight {
        Some(h) if h.is_on_board() => (i32::from(h.row), i32::from(h.col)),
        Some(h) => {
            return Err(ProtocolError::Highlight {
                row: i32::from(h.row),
                col: i32::from(h.col),
            });
        }
        None => (NO_HIGHLIGHT, NO_HIGHLIGHT),
    };
    w.put_i32(row);
    w.put_i32(col);
    w.put_u8(u8::from(snapshot.hit));
    Ok(out)
}

/// Decode a snapshot record, validating every enumerated or bounded field.
pub fn decode_snapshot(record: &[u8; SNAPSHOT_LEN]) -> Result<Snapshot, ProtocolError> {
    let mut r = RecordReader::new(record);

    let version = r.u8();
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::Version {
            found: version,
            expected: PROTOCOL_VERSION,
        });
    }
    let my_board = r.board();
    let opp_board = r.board();
    let my_score = r.u32();
    let opp_score = r.u32();
    let status = GameStatus::from_byte(r.u8())?;
    let mut slots = [0u32; MAX_PENDING_ATTACKS];
    for slot in &mut slots {
        *slot = r.u32();
    }
    let count = r.u32() as usize;
    if count > MAX_PENDING_ATTACKS {
        return Err(ProtocolError::AttackCount { count });
    }
    let row = r.i32();
    let col = r.i32();
    let highlight = decode_highlight(row, col)?;
    let hit = match r.u8() {
        0 => false,
        1 => true,
        other => return Err(ProtocolError::HitFlag(other)),
    };

    Ok(Snapshot {
        my_board,
        opp_board,
        my_score,
        opp_score,
        status,
        pending_attacks: slots[..count].to_vec(),
        highlight,
        hit,
    })
}

/// Encode and write one snapshot record, then flush.
pub fn write_snapshot<W: Write>(writer: &mut W, snapshot: &Snapshot) -> Result<(), ProtocolError> {
    let record = encode_snapshot(snapshot)?;
    writer.write_all(&record)?;
    writer.flush()?;
    Ok(())
}

/// Read and decode one snapshot record.
pub fn read_snapshot<R: Read>(reader: &mut R) -> Result<Snapshot, ProtocolError> {
    let mut record = [0u8; SNAPSHOT_LEN];
    reader.read_exact(&mut record)?;
    decode_snapshot(&record)
}

fn decode_highlight(row: i32, col: i32) -> Result<Option<Highlight>, ProtocolError> {
    if row == NO_HIGHLIGHT && col == NO_HIGHLIGHT {
        return Ok(None);
    }
    match (u8::try_from(row), u8::try_from(col)) {
        (Ok(r), Ok(c)) if (Highlight { row: r, col: c }).is_on_board() => {
            Ok(Some(Highlight { row: r, col: c }))
        }
        _ => Err(ProtocolError::Highlight { row, col }),
    }
}

/// Sequential big-endian writer over a fixed record buffer.
struct RecordWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> RecordWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    fn put_u8(&mut self, v: u8) {
        self.put(&[v]);
    }

    fn put_u32(&mut self, v: u32) {
        self.put(&v.to_be_bytes());
    }

    fn put_i32(&mut self, v: i32) {
        self.put(&v.to_be_bytes());
    }

    fn put_board(&mut self, board: &WireBoard) {
        for v in board.iter().flatten() {
            self.put_u32(*v);
        }
    }
}

/// Sequential big-endian reader over a fixed record buffer.
struct RecordReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    fn u32(&mut self) -> u32 {
        u32::from_be_bytes(self.take())
    }

    fn i32(&mut self) -> i32 {
        i32::from_be_bytes(self.take())
    }

    fn board(&mut self) -> WireBoard {
        let mut board = [[0u32; WIRE_BOARD_SIZE]; WIRE_BOARD_SIZE];
        for v in board.iter_mut().flatten() {
            *v = self.u32();
        }
        board
    }
}
