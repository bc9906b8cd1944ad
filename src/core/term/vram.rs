//! Video memory export
//!
//! The display hardware reads 16-bit words: character in the high byte,
//! `bg << 4 | fg` in the low byte. Where each word lands is up to the
//! [`AddressMap`] of the output sink.

use thiserror::Error;

use super::state::{Cell, Framebuffer};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VramError {
    #[error("VRAM buffer too small: need {needed} words, got {got}")]
    BufferTooSmall { needed: usize, got: usize },

    #[error("Address map placed cell ({x}, {y}) at {index}, outside {len} words")]
    AddressOutOfRange { x: u16, y: u16, index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, VramError>;

/// Pack a cell into one video memory word
pub fn pack_cell(cell: &Cell) -> u16 {
    let attr = ((cell.bg & 0x0F) << 4) | (cell.fg & 0x0F);
    (u16::from(cell.ch) << 8) | u16::from(attr)
}

/// Inverse of [`pack_cell`]
pub fn unpack_cell(word: u16) -> Cell {
    let [ch, attr] = word.to_be_bytes();
    Cell {
        ch,
        fg: attr & 0x0F,
        bg: attr >> 4,
    }
}

/// Logical `(x, y)` to word offset in video memory
pub trait AddressMap {
    fn index(&self, x: u16, y: u16, cols: u16) -> usize;
}

/// Plain row-major layout
#[derive(Debug, Clone, Copy, Default)]
pub struct RowMajor;

impl AddressMap for RowMajor {
    fn index(&self, x: u16, y: u16, cols: u16) -> usize {
        y as usize * cols as usize + x as usize
    }
}

/// Row-major with adjacent columns swapped (`x ^ 1`).
///
/// Matches a controller that fetches 32-bit words and shifts out the high
/// half first. Requires an even column count.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairSwapped;

impl PairSwapped {
    /// Whether every column of a `cols`-wide row has a partner
    pub fn fits(cols: u16) -> bool {
        cols % 2 == 0
    }
}

impl AddressMap for PairSwapped {
    fn index(&self, x: u16, y: u16, cols: u16) -> usize {
        y as usize * cols as usize + (x ^ 1) as usize
    }
}

impl<F> AddressMap for F
where
    F: Fn(u16, u16, u16) -> usize,
{
    fn index(&self, x: u16, y: u16, cols: u16) -> usize {
        self(x, y, cols)
    }
}

impl Framebuffer {
    /// Write every cell into `out` through `map`
    pub fn export<M: AddressMap + ?Sized>(&self, map: &M, out: &mut [u16]) -> Result<()> {
        let (cols, rows) = (self.cols(), self.rows());
        let needed = cols as usize * rows as usize;
        if out.len() < needed {
            return Err(VramError::BufferTooSmall {
                needed,
                got: out.len(),
            });
        }
        for y in 0..rows {
            for (x, cell) in (0..cols).zip(self.row(y).unwrap_or_default()) {
                let index = map.index(x, y, cols);
                let len = out.len();
                let slot = out
                    .get_mut(index)
                    .ok_or(VramError::AddressOutOfRange { x, y, index, len })?;
                *slot = pack_cell(cell);
            }
        }
        Ok(())
    }

    /// Allocate and fill a word buffer
    pub fn to_vram<M: AddressMap + ?Sized>(&self, map: &M) -> Result<Vec<u16>> {
        let mut out = vec![0; self.cols() as usize * self.rows() as usize];
        self.export(map, &mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::term::color::palette;

    fn framebuffer() -> Framebuffer {
        let mut fb = Framebuffer::new(4, 2, palette::DARK_GRAY, palette::BLACK);
        fb.write_cell(0, 0, b'A', palette::WHITE, palette::DARK_BLUE);
        fb.write_cell(1, 0, b'B', palette::RED, palette::BLACK);
        fb
    }

    #[test]
    fn test_pack_layout() {
        let cell = Cell { ch: b'A', fg: palette::WHITE, bg: palette::DARK_BLUE };
        assert_eq!(pack_cell(&cell), 0x414F);
        assert_eq!(unpack_cell(0x414F), cell);
    }

    #[test]
    fn test_row_major_export() {
        let words = framebuffer().to_vram(&RowMajor).expect("row-major export");
        assert_eq!(words.len(), 8);
        assert_eq!(words[0], 0x414F);
        assert_eq!(words[1], 0x4209);
        assert_eq!(words[2], 0x2007);
    }

    #[test]
    fn test_pair_swapped_export() {
        let words = framebuffer().to_vram(&PairSwapped).expect("pair-swapped export");
        assert_eq!(words[0], 0x4209);
        assert_eq!(words[1], 0x414F);
    }

    #[test]
    fn test_pair_swapped_needs_even_width() {
        assert!(PairSwapped::fits(4));
        assert!(!PairSwapped::fits(3));

        let mut fb = Framebuffer::new(3, 1, palette::DARK_GRAY, palette::BLACK);
        fb.write_cell(2, 0, b'Z', palette::WHITE, palette::BLACK);
        assert!(matches!(
            fb.to_vram(&PairSwapped),
            Err(VramError::AddressOutOfRange { x: 2, index: 3, len: 3, .. })
        ));
        let words = fb.to_vram(&RowMajor).expect("row-major export");
        assert_eq!(words[2], 0x5A0F);
    }

    #[test]
    fn test_closure_map() {
        // Column-major
        let map = |x: u16, y: u16, _cols: u16| x as usize * 2 + y as usize;
        let words = framebuffer().to_vram(&map).expect("closure export");
        assert_eq!(words[0], 0x414F);
        assert_eq!(words[2], 0x4209);
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let mut out = [0u16; 3];
        assert_eq!(
            framebuffer().export(&RowMajor, &mut out),
            Err(VramError::BufferTooSmall { needed: 8, got: 3 })
        );
    }

    #[test]
    fn test_bad_map_is_rejected() {
        let map = |_x: u16, _y: u16, _cols: u16| 100usize;
        let mut out = [0u16; 8];
        assert!(matches!(
            framebuffer().export(&map, &mut out),
            Err(VramError::AddressOutOfRange { index: 100, .. })
        ));
    }
}
