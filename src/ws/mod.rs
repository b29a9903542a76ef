mod read;

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::Response,
};
use futures::{
  stream::{SplitSink, SplitStream},
  SinkExt, StreamExt,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::AppState;
use read::handle_read;
use yur_place::registry::Outbox;

pub async fn ws(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> Response {
  let max = state.dispatcher.config().max_payload_bytes;

  ws.max_message_size(max)
    .on_upgrade(|socket| handle_ws(state, socket))
}

#[tracing::instrument(name = "ws", skip_all, fields(session))]
async fn handle_ws(state: Arc<AppState>, socket: WebSocket) {
  let (session, outbox) = state.dispatcher.connect();
  let kick = outbox.kick();
  tracing::Span::current().record("session", tracing::field::display(session));

  let (ws_out, ws_in) = socket.split();
  let ws_out = Mutex::new(ws_out);

  tokio::select! {
    _ = ws_read(ws_in, &ws_out, state.clone(), session) => { },
    _ = ws_write(&ws_out, outbox) => { },
    _ = kick.wait() => {
      tracing::warn!("Closed due to full outbound queue");
    },
  }

  state.dispatcher.disconnect(session);

  // a kicked client may not be reading, drop the socket without a handshake
  if !kick.is_kicked() {
    // already gone if the client closed first
    let _ = ws_out.lock().await.close().await;
  }

  tracing::info!("Closed.");
}

async fn ws_read(
  mut ws_in: SplitStream<WebSocket>,
  ws_out: &Mutex<SplitSink<WebSocket, Message>>,
  state: Arc<AppState>,
  session: Uuid,
) {
  loop {
    let msg = ws_in.next().await;

    let exit = handle_read(&state, ws_out, session, msg).await;

    if exit {
      break;
    }
  }
}

async fn ws_write(
  ws_out: &Mutex<SplitSink<WebSocket, Message>>,
  mut outbox: Outbox,
) {
  while let Some(msg) = outbox.recv().await {
    let res = ws_out.lock().await.send(Message::Binary(msg.into_data())).await;

    if res.is_err() {
      tracing::warn!("Closed due to failed to send");
      return;
    }
  }

  // every sender is gone: the registry let go of this session
  tracing::warn!("Closed due to dropped queue");
}
