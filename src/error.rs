use thiserror::Error;

/// Request-level rejection. The message is dropped, the connection stays open.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RejectReason {
  #[error("pixel ({x}, {y}) is outside the {width}x{height} canvas")]
  OutOfBounds { x: u16, y: u16, width: u16, height: u16 },
  #[error("color {color} exceeds palette limit {limit}")]
  InvalidColor { color: u8, limit: u8 },
}

/// Connection-fatal: the offending connection is closed.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ProtocolViolation {
  #[error("payload of {len} bytes exceeds limit of {max}")]
  Oversized { len: usize, max: usize },
  #[error("payload of {len} bytes is shorter than expected {expected}")]
  Truncated { len: usize, expected: usize },
  #[error("text frames are not part of the protocol")]
  TextFrame,
  #[error("session is no longer connected")]
  UnknownSession,
}

/// Failure to queue a message for one session during fan-out.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SendError {
  #[error("channel closed")]
  Closed,
  #[error("outbound queue full")]
  Full,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("canvas dimensions must be positive, got {width}x{height}")]
  EmptyCanvas { width: u16, height: u16 },
  #[error("palette limit {0} does not fit in a nibble (max 15)")]
  PaletteTooLarge(u8),
  #[error("max payload of {0} bytes cannot hold a 5-byte update")]
  PayloadTooSmall(usize),
  #[error("outbound queue depth must be at least 1")]
  EmptyQueue,
}
