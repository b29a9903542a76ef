use std::{
  collections::HashMap,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use parking_lot::RwLock;
use tokio::sync::{
  mpsc::{self, error::{TryRecvError, TrySendError}, Receiver, Sender},
  Notify,
};
use uuid::Uuid;

use crate::{channel::ChannelMsg, error::SendError};

/// Set once when the server drops a session on its own.
#[derive(Debug, Default)]
pub struct Kick {
  kicked: AtomicBool,
  notify: Notify,
}

impl Kick {
  fn fire(&self) {
    self.kicked.store(true, Ordering::Release);
    self.notify.notify_waiters();
  }

  pub fn is_kicked(&self) -> bool {
    self.kicked.load(Ordering::Acquire)
  }

  /// Resolves once the session has been kicked, immediately if it already was.
  pub async fn wait(&self) {
    let notified = self.notify.notified();

    if self.is_kicked() {
      return;
    }

    notified.await;
  }
}

/// Handle to one connected channel. Cloning it does not open a new channel.
#[derive(Clone, Debug)]
pub struct Session {
  id: Uuid,
  sender: Sender<ChannelMsg>,
  kick: Arc<Kick>,
}

/// Receiving end of a session, owned by its connection task.
#[derive(Debug)]
pub struct Outbox {
  receiver: Receiver<ChannelMsg>,
  kick: Arc<Kick>,
}

impl Outbox {
  pub async fn recv(&mut self) -> Option<ChannelMsg> {
    self.receiver.recv().await
  }

  pub fn try_recv(&mut self) -> Result<ChannelMsg, TryRecvError> {
    self.receiver.try_recv()
  }

  pub fn kick(&self) -> Arc<Kick> {
    self.kick.clone()
  }

  pub fn is_kicked(&self) -> bool {
    self.kick.is_kicked()
  }
}

impl Session {
  /// A new session and the outbox its write task drains.
  /// At most `capacity` messages can wait in the queue.
  pub fn new(capacity: usize) -> (Self, Outbox) {
    let (sender, receiver) = mpsc::channel(capacity);
    let kick = Arc::new(Kick::default());

    (
      Session { id: Uuid::new_v4(), sender, kick: kick.clone() },
      Outbox { receiver, kick },
    )
  }

  pub fn id(&self) -> Uuid {
    self.id
  }

  pub fn is_open(&self) -> bool {
    !self.sender.is_closed()
  }

  /// Queue `msg` without waiting.
  pub fn send(&self, msg: ChannelMsg) -> Result<(), SendError> {
    self.sender.try_send(msg).map_err(|err| match err {
      TrySendError::Full(_) => SendError::Full,
      TrySendError::Closed(_) => SendError::Closed,
    })
  }

  /// Tells the connection task to tear down without draining its queue.
  pub fn kick(&self) {
    self.kick.fire();
  }
}

#[derive(Default)]
pub struct Registry {
  sessions: RwLock<HashMap<Uuid, Session>>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(&self, session: Session) {
    self.sessions.write().insert(session.id, session);
  }

  /// Returns whether the session was present.
  pub fn remove(&self, id: Uuid) -> bool {
    self.sessions.write().remove(&id).is_some()
  }

  pub fn contains(&self, id: Uuid) -> bool {
    self.sessions.read().contains_key(&id)
  }

  /// Open sessions at the time of the call. The lock is released before
  /// returning so callers can send and remove while walking the result.
  pub fn live_sessions(&self) -> Vec<Session> {
    self.sessions.read()
      .values()
      .filter(|session| session.is_open())
      .cloned()
      .collect()
  }

  pub fn len(&self) -> usize {
    self.sessions.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.sessions.read().is_empty()
  }
}
