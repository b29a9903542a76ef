use crate::{
  consts::{
    DEFAULT_HEIGHT, DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_OUTBOUND_QUEUE,
    DEFAULT_PALETTE_LIMIT, DEFAULT_WIDTH, MAX_PALETTE_LIMIT, UPDATE_LEN,
  },
  error::ConfigError,
};

#[derive(Clone, Debug)]
pub struct Config {
  pub width: u16,
  pub height: u16,
  pub palette_limit: u8,
  pub max_payload_bytes: usize,
  pub outbound_queue: usize,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      width: DEFAULT_WIDTH,
      height: DEFAULT_HEIGHT,
      palette_limit: DEFAULT_PALETTE_LIMIT,
      max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
      outbound_queue: DEFAULT_OUTBOUND_QUEUE,
    }
  }
}

impl Config {
  pub fn validate(self) -> Result<Self, ConfigError> {
    if self.width == 0 || self.height == 0 {
      return Err(ConfigError::EmptyCanvas { width: self.width, height: self.height });
    }

    if self.palette_limit > MAX_PALETTE_LIMIT {
      return Err(ConfigError::PaletteTooLarge(self.palette_limit));
    }

    if self.max_payload_bytes < UPDATE_LEN {
      return Err(ConfigError::PayloadTooSmall(self.max_payload_bytes));
    }

    if self.outbound_queue == 0 {
      return Err(ConfigError::EmptyQueue);
    }

    Ok(self)
  }

  /// Byte length of the packed snapshot sent on connect.
  pub fn snapshot_len(&self) -> usize {
    self.height as usize * (self.width as usize).div_ceil(2)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_is_valid() {
    let config = Config::default().validate().unwrap();
    assert_eq!(config.snapshot_len(), 600 * 500);
  }

  #[test]
  fn rejects_bad_values() {
    let zero = Config { width: 0, ..Default::default() };
    assert_eq!(
      zero.validate().unwrap_err(),
      ConfigError::EmptyCanvas { width: 0, height: DEFAULT_HEIGHT },
    );

    let palette = Config { palette_limit: 16, ..Default::default() };
    assert_eq!(palette.validate().unwrap_err(), ConfigError::PaletteTooLarge(16));

    let payload = Config { max_payload_bytes: 4, ..Default::default() };
    assert_eq!(payload.validate().unwrap_err(), ConfigError::PayloadTooSmall(4));

    let queue = Config { outbound_queue: 0, ..Default::default() };
    assert_eq!(queue.validate().unwrap_err(), ConfigError::EmptyQueue);
  }

  #[test]
  fn odd_width_rounds_up() {
    let config = Config { width: 5, height: 3, ..Default::default() };
    assert_eq!(config.snapshot_len(), 9);
  }
}
