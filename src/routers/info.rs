use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use super::Resp;

/// Everything a client needs to unpack the board it receives on connect.
#[derive(Serialize)]
pub struct InfoResp {
  width: u16,
  height: u16,
  palette_limit: u8,
  online: usize,
}

pub async fn info(
  State(state): State<Arc<AppState>>,
) -> Json<Resp<InfoResp>> {
  let canvas = state.dispatcher.canvas();

  Json(InfoResp {
    width: canvas.width(),
    height: canvas.height(),
    palette_limit: canvas.palette_limit(),
    online: state.dispatcher.registry().len(),
  }.into())
}
