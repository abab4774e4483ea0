// Errors raised while encoding or decoding protocol records.

use crate::message::MAX_PENDING_ATTACKS;

/// Anything that can go wrong reading or writing a record.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown action byte {0:#04x}")]
    UnknownAction(u8),

    #[error("unsupported protocol version {found} (expected {expected})")]
    Version { found: u8, expected: u8 },

    #[error("unknown game status {0}")]
    UnknownStatus(u8),

    #[error("attack count {count} exceeds {max}", max = MAX_PENDING_ATTACKS)]
    AttackCount { count: usize },

    #[error("highlight ({row}, {col}) is not a board cell")]
    Highlight { row: i32, col: i32 },

    #[error("invalid hit flag {0}")]
    HitFlag(u8),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// True when a read gave up because the socket's read timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ProtocolError::Io(e)
                if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut)
        )
    }

    /// True when the peer closed the stream, including mid-record.
    pub fn is_eof(&self) -> bool {
        matches!(self, ProtocolError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}
