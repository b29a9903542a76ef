use crate::{canvas::PaletteIndex, consts::UPDATE_LEN, error::ProtocolViolation};

/// One pixel write, both as client request and as broadcast payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelUpdate {
  pub x: u16,
  pub y: u16,
  pub color: PaletteIndex,
}

impl PixelUpdate {
  pub fn decode(data: &[u8]) -> Result<Self, ProtocolViolation> {
    if data.len() > UPDATE_LEN {
      return Err(ProtocolViolation::Oversized { len: data.len(), max: UPDATE_LEN });
    }

    if data.len() < UPDATE_LEN {
      return Err(ProtocolViolation::Truncated { len: data.len(), expected: UPDATE_LEN });
    }

    Ok(PixelUpdate {
      x: u16::from_be_bytes([data[0], data[1]]),
      y: u16::from_be_bytes([data[2], data[3]]),
      color: data[4],
    })
  }

  pub fn encode(&self) -> [u8; UPDATE_LEN] {
    self.into()
  }
}

impl TryFrom<&[u8]> for PixelUpdate {
  type Error = ProtocolViolation;

  fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
    PixelUpdate::decode(data)
  }
}

impl From<&PixelUpdate> for [u8; UPDATE_LEN] {
  fn from(pixel: &PixelUpdate) -> Self {
    let mut res = [0; UPDATE_LEN];

    res[0..2].copy_from_slice(&pixel.x.to_be_bytes());
    res[2..4].copy_from_slice(&pixel.y.to_be_bytes());
    res[4] = pixel.color;

    res
  }
}

fn row_len(width: u16) -> usize {
  (width as usize).div_ceil(2)
}

/// Packs set cells into two pixels per byte, row-major. The even column is
/// the high nibble. Cells not yielded stay `0`, as does the padding nibble of
/// an odd-width row.
pub fn encode_snapshot<I>(width: u16, height: u16, cells: I) -> Vec<u8>
where
  I: IntoIterator<Item = (u16, u16, PaletteIndex)>,
{
  let row = row_len(width);
  let mut board = vec![0; height as usize * row];

  for (x, y, color) in cells {
    if x >= width || y >= height {
      continue;
    }

    // Canvas keeps the palette within a nibble
    let nibble = color & 0x0f;
    let byte = &mut board[y as usize * row + x as usize / 2];

    if x % 2 == 0 {
      *byte = (*byte & 0x0f) | (nibble << 4);
    } else {
      *byte = (*byte & 0xf0) | nibble;
    }
  }

  board
}

/// Inverse of [`encode_snapshot`]: one palette index per cell, row-major.
pub fn decode_snapshot(width: u16, height: u16, data: &[u8]) -> Result<Vec<PaletteIndex>, ProtocolViolation> {
  let row = row_len(width);
  let expected = height as usize * row;

  if data.len() > expected {
    return Err(ProtocolViolation::Oversized { len: data.len(), max: expected });
  }

  if data.len() < expected {
    return Err(ProtocolViolation::Truncated { len: data.len(), expected });
  }

  if row == 0 {
    return Ok(Vec::new());
  }

  let mut cells = Vec::with_capacity(width as usize * height as usize);

  for line in data.chunks(row) {
    for x in 0..width as usize {
      let byte = line[x / 2];
      cells.push(if x % 2 == 0 { byte >> 4 } else { byte & 0x0f });
    }
  }

  Ok(cells)
}
