use parking_lot::Mutex;

use crate::{
  config::Config,
  consts::MAX_PALETTE_LIMIT,
  error::{ConfigError, RejectReason},
};

pub type PaletteIndex = u8;

/// Fixed-size grid of palette indices. `apply` is the only way to write a cell.
pub struct Canvas {
  width: u16,
  height: u16,
  palette_limit: PaletteIndex,
  // row-major, `None` is an unset cell
  cells: Vec<Mutex<Option<PaletteIndex>>>,
}

impl Canvas {
  /// Fails when `palette_limit` does not fit the snapshot's nibbles.
  pub fn new(width: u16, height: u16, palette_limit: PaletteIndex) -> Result<Self, ConfigError> {
    if palette_limit > MAX_PALETTE_LIMIT {
      return Err(ConfigError::PaletteTooLarge(palette_limit));
    }

    let cells = (0..width as usize * height as usize)
      .map(|_| Mutex::new(None))
      .collect();

    Ok(Canvas { width, height, palette_limit, cells })
  }

  pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
    Canvas::new(config.width, config.height, config.palette_limit)
  }

  pub fn width(&self) -> u16 {
    self.width
  }

  pub fn height(&self) -> u16 {
    self.height
  }

  pub fn palette_limit(&self) -> PaletteIndex {
    self.palette_limit
  }

  fn index(&self, x: u16, y: u16) -> usize {
    y as usize * self.width as usize + x as usize
  }

  pub fn apply(&self, x: u16, y: u16, color: PaletteIndex) -> Result<(), RejectReason> {
    if x >= self.width || y >= self.height {
      return Err(RejectReason::OutOfBounds {
        x,
        y,
        width: self.width,
        height: self.height,
      });
    }

    if color > self.palette_limit {
      return Err(RejectReason::InvalidColor { color, limit: self.palette_limit });
    }

    *self.cells[self.index(x, y)].lock() = Some(color);

    Ok(())
  }

  /// `None` for unset cells and for coordinates outside the canvas.
  pub fn get(&self, x: u16, y: u16) -> Option<PaletteIndex> {
    if x >= self.width || y >= self.height {
      return None;
    }

    *self.cells[self.index(x, y)].lock()
  }

  /// Every set cell as `(x, y, color)`, `y` outer and `x` inner.
  /// Cells are read one at a time as the iterator advances.
  pub fn snapshot(&self) -> Snapshot<'_> {
    Snapshot { canvas: self, next: 0 }
  }
}

#[derive(Clone)]
pub struct Snapshot<'a> {
  canvas: &'a Canvas,
  next: usize,
}

impl Iterator for Snapshot<'_> {
  type Item = (u16, u16, PaletteIndex);

  fn next(&mut self) -> Option<Self::Item> {
    let width = self.canvas.width as usize;

    while self.next < self.canvas.cells.len() {
      let idx = self.next;
      self.next += 1;

      if let Some(color) = *self.canvas.cells[idx].lock() {
        return Some(((idx % width) as u16, (idx / width) as u16, color));
      }
    }

    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn apply_in_bounds() {
    let canvas = Canvas::new(4, 3, 15).unwrap();

    canvas.apply(0, 0, 0).unwrap();
    canvas.apply(3, 2, 15).unwrap();

    assert_eq!(canvas.get(0, 0), Some(0));
    assert_eq!(canvas.get(3, 2), Some(15));
    assert_eq!(canvas.get(1, 1), None);

    let cells: Vec<_> = canvas.snapshot().collect();
    assert_eq!(cells, vec![(0, 0, 0), (3, 2, 15)]);
  }

  #[test]
  fn rejects_edge_coordinates() {
    let canvas = Canvas::new(4, 3, 15).unwrap();

    for (x, y) in [(4, 0), (0, 3), (5, 1), (u16::MAX, u16::MAX)] {
      assert_eq!(
        canvas.apply(x, y, 1),
        Err(RejectReason::OutOfBounds { x, y, width: 4, height: 3 }),
      );
    }

    assert_eq!(canvas.snapshot().count(), 0);
  }

  #[test]
  fn rejects_color_over_limit() {
    let canvas = Canvas::new(2, 2, 7).unwrap();

    canvas.apply(1, 1, 7).unwrap();
    assert_eq!(
      canvas.apply(1, 1, 8),
      Err(RejectReason::InvalidColor { color: 8, limit: 7 }),
    );
    assert_eq!(
      canvas.apply(0, 0, 255),
      Err(RejectReason::InvalidColor { color: 255, limit: 7 }),
    );

    assert_eq!(canvas.get(1, 1), Some(7));
    assert_eq!(canvas.get(0, 0), None);
  }

  #[test]
  fn snapshot_is_row_major_and_restartable() {
    let canvas = Canvas::new(3, 2, 15).unwrap();

    canvas.apply(2, 1, 4).unwrap();
    canvas.apply(1, 0, 2).unwrap();
    canvas.apply(0, 1, 9).unwrap();

    let snapshot = canvas.snapshot();
    let first: Vec<_> = snapshot.clone().collect();
    let second: Vec<_> = snapshot.collect();

    assert_eq!(first, vec![(1, 0, 2), (0, 1, 9), (2, 1, 4)]);
    assert_eq!(first, second);
  }

  #[test]
  fn palette_must_fit_a_nibble() {
    assert!(matches!(Canvas::new(2, 2, 16), Err(ConfigError::PaletteTooLarge(16))));
    assert!(Canvas::new(2, 2, MAX_PALETTE_LIMIT).is_ok());
  }

  #[test]
  fn last_writer_wins() {
    let canvas = Canvas::new(1, 1, 15).unwrap();

    canvas.apply(0, 0, 3).unwrap();
    canvas.apply(0, 0, 11).unwrap();

    assert_eq!(canvas.snapshot().collect::<Vec<_>>(), vec![(0, 0, 11)]);
  }
}
