use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
  canvas::Canvas,
  channel::ChannelMsg,
  config::Config,
  consts::UPDATE_LEN,
  error::{ConfigError, ProtocolViolation, RejectReason, SendError},
  pixel::{encode_snapshot, PixelUpdate},
  registry::{Outbox, Registry, Session},
};

/// Result of a well-formed update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
  /// Applied and queued to `delivered` sessions, the sender included.
  Painted { delivered: usize },
  /// Dropped without touching the canvas; the connection stays open.
  Rejected(RejectReason),
}

/// Owns the canvas and the sessions watching it.
pub struct Dispatcher {
  config: Config,
  canvas: Canvas,
  registry: Registry,
  // held across apply + fan-out and across snapshot + subscribe
  fanout: Mutex<()>,
}

impl Dispatcher {
  pub fn new(config: Config) -> Result<Self, ConfigError> {
    let config = config.validate()?;

    Ok(Dispatcher {
      canvas: Canvas::from_config(&config)?,
      registry: Registry::new(),
      fanout: Mutex::new(()),
      config,
    })
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn canvas(&self) -> &Canvas {
    &self.canvas
  }

  pub fn registry(&self) -> &Registry {
    &self.registry
  }

  /// Registers a new session. Its queue holds the board before any paint,
  /// and every paint applied after the board was taken.
  pub fn connect(&self) -> (Uuid, Outbox) {
    let (session, outbox) = Session::new(self.config.outbound_queue);
    let id = session.id();

    {
      let _guard = self.fanout.lock();

      let board = encode_snapshot(
        self.canvas.width(),
        self.canvas.height(),
        self.canvas.snapshot(),
      );

      // fresh queue with a live receiver, cannot fail
      if let Err(err) = session.send(ChannelMsg::Board(board)) {
        tracing::error!(session = %id, "Failed to queue board: {err}");
      }

      self.registry.add(session);
    }

    tracing::info!(session = %id, online = self.registry.len(), "Connected.");

    (id, outbox)
  }

  /// Idempotent.
  pub fn disconnect(&self, session: Uuid) -> bool {
    let removed = self.registry.remove(session);

    if removed {
      tracing::info!(%session, online = self.registry.len(), "Disconnected.");
    }

    removed
  }

  /// Handles one inbound binary message. A protocol violation has already
  /// removed the session when this returns `Err`; the caller closes its socket.
  pub fn handle_message(&self, session: Uuid, data: &[u8]) -> Result<Outcome, ProtocolViolation> {
    let res = self.paint(session, data);

    match &res {
      Err(violation) => self.violation(session, *violation),
      Ok(Outcome::Rejected(reason)) => {
        tracing::warn!(%session, "Rejected paint: {reason}");
      },
      Ok(Outcome::Painted { delivered }) => {
        tracing::debug!(%session, delivered, "Painted.");
      },
    }

    res
  }

  /// Drops a session that broke the protocol.
  pub fn violation(&self, session: Uuid, violation: ProtocolViolation) {
    tracing::warn!(%session, "Protocol violation: {violation}");
    self.disconnect(session);
  }

  fn paint(&self, session: Uuid, data: &[u8]) -> Result<Outcome, ProtocolViolation> {
    let max = self.config.max_payload_bytes;

    if data.len() > max {
      return Err(ProtocolViolation::Oversized { len: data.len(), max });
    }

    let PixelUpdate { x, y, color } = PixelUpdate::decode(data)?;

    // decode guarantees the exact length
    let mut paint = [0; UPDATE_LEN];
    paint.copy_from_slice(data);

    let _guard = self.fanout.lock();

    // kicked by a full queue, or already disconnected
    if !self.registry.contains(session) {
      return Err(ProtocolViolation::UnknownSession);
    }

    if let Err(reason) = self.canvas.apply(x, y, color) {
      return Ok(Outcome::Rejected(reason));
    }

    Ok(Outcome::Painted { delivered: self.broadcast(paint) })
  }

  fn broadcast(&self, paint: [u8; UPDATE_LEN]) -> usize {
    let mut delivered = 0;

    for session in self.registry.live_sessions() {
      match session.send(ChannelMsg::Paint(paint)) {
        Ok(()) => delivered += 1,
        Err(SendError::Closed) => {
          tracing::debug!(session = %session.id(), "Skipped closed session");
          self.registry.remove(session.id());
        },
        Err(SendError::Full) => {
          tracing::warn!(session = %session.id(), "Outbound queue full, dropping session");
          self.registry.remove(session.id());
          session.kick();
        },
      }
    }

    delivered
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn small() -> Dispatcher {
    Dispatcher::new(Config { width: 4, height: 2, outbound_queue: 8, ..Default::default() }).unwrap()
  }

  #[test]
  fn board_comes_first() {
    let dispatcher = small();
    dispatcher.canvas().apply(0, 0, 3).unwrap();

    let (_, mut rx) = dispatcher.connect();

    assert_eq!(rx.try_recv().unwrap(), ChannelMsg::Board(vec![0x30, 0x00, 0x00, 0x00]));
    assert!(rx.try_recv().is_err());
  }

  #[test]
  fn rejected_paint_keeps_session() {
    let dispatcher = small();
    let (id, mut rx) = dispatcher.connect();
    rx.try_recv().unwrap();

    let res = dispatcher.handle_message(id, &[0, 4, 0, 0, 1]);
    assert_eq!(
      res,
      Ok(Outcome::Rejected(RejectReason::OutOfBounds { x: 4, y: 0, width: 4, height: 2 })),
    );

    let res = dispatcher.handle_message(id, &[0, 0, 0, 1, 16]);
    assert_eq!(res, Ok(Outcome::Rejected(RejectReason::InvalidColor { color: 16, limit: 15 })));

    assert!(dispatcher.registry().contains(id));
    assert!(rx.try_recv().is_err());
    assert_eq!(dispatcher.canvas().snapshot().count(), 0);
  }

  #[test]
  fn truncated_payload_is_fatal() {
    let dispatcher = small();
    let (id, _rx) = dispatcher.connect();

    let res = dispatcher.handle_message(id, &[0, 0, 0]);
    assert_eq!(res, Err(ProtocolViolation::Truncated { len: 3, expected: 5 }));
    assert!(!dispatcher.registry().contains(id));
  }

  #[test]
  fn larger_payload_limit_still_needs_five_bytes() {
    let dispatcher = Dispatcher::new(Config {
      width: 4,
      height: 2,
      max_payload_bytes: 16,
      ..Default::default()
    }).unwrap();
    let (id, _rx) = dispatcher.connect();

    let res = dispatcher.handle_message(id, &[0; 8]);
    assert_eq!(res, Err(ProtocolViolation::Oversized { len: 8, max: 5 }));
  }

  #[test]
  fn full_queue_drops_only_that_session() {
    let dispatcher = Dispatcher::new(Config {
      width: 4,
      height: 2,
      outbound_queue: 2,
      ..Default::default()
    }).unwrap();

    let (slow, slow_outbox) = dispatcher.connect();
    let (fast, mut fast_rx) = dispatcher.connect();

    for color in 0..3 {
      fast_rx.try_recv().unwrap();
      dispatcher.handle_message(fast, &[0, 0, 0, 0, color]).unwrap();
    }

    // slow holds the board plus one paint, the second paint overflows it
    assert!(!dispatcher.registry().contains(slow));
    assert!(slow_outbox.is_kicked());
    assert!(dispatcher.registry().contains(fast));
    assert_eq!(fast_rx.try_recv().unwrap(), ChannelMsg::Paint([0, 0, 0, 0, 2]));
  }

  #[test]
  fn kicked_session_cannot_paint() {
    let dispatcher = Dispatcher::new(Config {
      width: 4,
      height: 2,
      outbound_queue: 1,
      ..Default::default()
    }).unwrap();

    let (slow, slow_outbox) = dispatcher.connect();
    let (fast, mut fast_rx) = dispatcher.connect();
    fast_rx.try_recv().unwrap();

    // slow still holds its board, so this paint overflows it
    dispatcher.handle_message(fast, &[0, 0, 0, 0, 1]).unwrap();
    assert!(slow_outbox.is_kicked());

    let res = dispatcher.handle_message(slow, &[0, 3, 0, 1, 9]);
    assert_eq!(res, Err(ProtocolViolation::UnknownSession));
    assert_eq!(dispatcher.canvas().get(3, 1), None);
    assert_eq!(fast_rx.try_recv().unwrap(), ChannelMsg::Paint([0, 0, 0, 0, 1]));
    assert!(fast_rx.try_recv().is_err());
  }

  #[test]
  fn rejects_unvalidated_config() {
    let res = Dispatcher::new(Config { palette_limit: 31, ..Default::default() });
    assert!(matches!(res, Err(ConfigError::PaletteTooLarge(31))));
  }

  #[test]
  fn disconnect_is_idempotent() {
    let dispatcher = small();
    let (id, _rx) = dispatcher.connect();

    assert!(dispatcher.disconnect(id));
    assert!(!dispatcher.disconnect(id));
  }
}
