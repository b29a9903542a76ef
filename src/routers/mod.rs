mod info;

pub use info::info;

use serde::Serialize;

#[derive(Serialize)]
pub struct Resp<T> {
  code: i32,
  data: T,
}

impl<T> From<T> for Resp<T> {
  fn from(data: T) -> Self {
    Resp { code: 0, data }
  }
}
