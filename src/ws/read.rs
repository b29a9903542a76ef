use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use futures::{stream::SplitSink, SinkExt};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::AppState;
use yur_place::{dispatch::Outcome, error::ProtocolViolation};

/// Returns `true` once the connection should be torn down.
pub async fn handle_read(
  state: &AppState,
  ws_out: &Mutex<SplitSink<WebSocket, Message>>,
  session: Uuid,
  msg: Option<Result<Message, axum::Error>>,
) -> bool {
  let Some(msg) = msg else {
    tracing::info!("Received empty message, closing...");
    return true;
  };

  let msg = match msg {
    Ok(msg) => msg,
    Err(err) => {
      // includes frames over max_message_size
      tracing::warn!("Error receiving message, closing: {err}");
      return true;
    },
  };

  let data = match msg {
    Message::Binary(data) => data,
    Message::Text(_) => {
      let violation = ProtocolViolation::TextFrame;
      state.dispatcher.violation(session, violation);
      close_with(ws_out, violation).await;
      return true;
    },
    Message::Close(_) => {
      tracing::info!("Client closed connection, closing...");
      return true;
    },
    // answered by the transport
    Message::Ping(_) | Message::Pong(_) => return false,
  };

  match state.dispatcher.handle_message(session, &data) {
    Ok(Outcome::Painted { .. } | Outcome::Rejected(_)) => false,
    Err(violation) => {
      close_with(ws_out, violation).await;
      true
    },
  }
}

async fn close_with(
  ws_out: &Mutex<SplitSink<WebSocket, Message>>,
  violation: ProtocolViolation,
) {
  let code = match violation {
    ProtocolViolation::Oversized { .. } => close_code::SIZE,
    ProtocolViolation::Truncated { .. } => close_code::PROTOCOL,
    ProtocolViolation::TextFrame => close_code::UNSUPPORTED,
    ProtocolViolation::UnknownSession => close_code::POLICY,
  };

  let frame = CloseFrame {
    code,
    reason: violation.to_string().into(),
  };

  let res = ws_out.lock().await.send(Message::Close(Some(frame))).await;

  if res.is_err() {
    tracing::warn!("Error sending close frame");
  }
}
