use crate::consts::UPDATE_LEN;

/// What a session's write task pushes to its socket, in queue order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelMsg {
  /// Packed canvas, always the first message of a session.
  Board(Vec<u8>),
  /// Verbatim bytes of an accepted update.
  Paint([u8; UPDATE_LEN]),
}

impl ChannelMsg {
  pub fn into_data(self) -> Vec<u8> {
    match self {
      ChannelMsg::Board(board) => board,
      ChannelMsg::Paint(paint) => paint.to_vec(),
    }
  }
}
