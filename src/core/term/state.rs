//! Terminal state management
//!
//! This module defines the framebuffer, the cursor, and the cursor
//! controller logic that places characters into the grid.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use super::color::{ColorArg, ColorState};

const BACKSPACE: u8 = 0x08;
const TAB: u8 = 0x09;
const LINEFEED: u8 = 0x0A;
const CARRIAGE_RETURN: u8 = 0x0D;
const BLANK: u8 = b' ';

/// Construction-time parameters of a terminal instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub cols: u16,
    pub rows: u16,
    pub tab_width: u16,
}

/// A single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: u8,
    pub fg: u8,
    pub bg: u8,
}

impl Cell {
    pub fn blank(fg: u8, bg: u8) -> Self {
        Self { ch: BLANK, fg, bg }
    }
}

/// Fixed rows x cols cell grid, stored row-major
#[derive(Debug, Clone)]
pub struct Framebuffer {
    cells: Vec<Cell>,
    cols: u16,
    rows: u16,
    pub dirty_lines: HashSet<usize>,
    pub full_redraw: bool,
}

impl Framebuffer {
    pub fn new(cols: u16, rows: u16, fg: u8, bg: u8) -> Self {
        Self {
            cells: vec![Cell::blank(fg, bg); cols as usize * rows as usize],
            cols,
            rows,
            dirty_lines: HashSet::new(),
            full_redraw: true,
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.cols as usize + x as usize
    }

    /// Cell at `(x, y)`, `None` if out of bounds
    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        if x < self.cols && y < self.rows {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    /// All cells of row `y`
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y < self.rows {
            let start = self.index(0, y);
            Some(&self.cells[start..start + self.cols as usize])
        } else {
            None
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Characters of row `y` as text (bytes mapped one-to-one to chars)
    pub fn row_text(&self, y: u16) -> String {
        self.row(y)
            .map(|cells| cells.iter().map(|c| c.ch as char).collect())
            .unwrap_or_default()
    }

    pub fn write_cell(&mut self, x: u16, y: u16, ch: u8, fg: u8, bg: u8) {
        let idx = self.index(x, y);
        self.cells[idx] = Cell { ch, fg, bg };
        self.mark_dirty(y as usize);
    }

    /// Fill every cell with a blank in the given colors
    pub fn clear_all(&mut self, fg: u8, bg: u8) {
        self.cells.fill(Cell::blank(fg, bg));
        self.mark_all_dirty();
    }

    pub fn clear_line(&mut self, y: u16, fg: u8, bg: u8) {
        self.clear_line_from(0, y, fg, bg);
    }

    /// Blank row `y` from column `x` to the end of the line
    pub fn clear_line_from(&mut self, x: u16, y: u16, fg: u8, bg: u8) {
        let start = self.index(x, y);
        let end = self.index(0, y) + self.cols as usize;
        self.cells[start..end].fill(Cell::blank(fg, bg));
        self.mark_dirty(y as usize);
    }

    /// Shift all rows up by `n`, blanking the exposed bottom rows
    pub fn scroll_up(&mut self, n: u16, fg: u8, bg: u8) {
        let n = n.min(self.rows) as usize;
        let shift = n * self.cols as usize;
        self.cells.copy_within(shift.., 0);
        let len = self.cells.len();
        self.cells[len - shift..].fill(Cell::blank(fg, bg));
        self.mark_all_dirty();
    }

    pub fn mark_dirty(&mut self, line: usize) {
        self.dirty_lines.insert(line);
    }

    pub fn mark_all_dirty(&mut self) {
        self.full_redraw = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty_lines.clear();
        self.full_redraw = false;
    }
}

/// Hardware cursor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CursorStyle {
    Hidden,
    Underline,
    BlinkingUnderline,
    Block,
    #[default]
    BlinkingBlock,
}

impl CursorStyle {
    /// Value of the cursor type byte in video memory
    pub fn to_byte(self) -> u8 {
        match self {
            CursorStyle::Hidden => 0,
            CursorStyle::Underline => 1,
            CursorStyle::BlinkingUnderline => 2,
            CursorStyle::Block => 3,
            CursorStyle::BlinkingBlock => 4,
        }
    }

    pub fn is_visible(self) -> bool {
        self != CursorStyle::Hidden
    }
}

/// Cursor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    pub x: u16,
    pub y: u16,
    pub style: CursorStyle,
}

/// Framebuffer + cursor + colors of one terminal instance
#[derive(Debug, Clone)]
pub struct TerminalState {
    pub cols: u16,
    pub rows: u16,
    pub tab_width: u16,
    pub framebuffer: Framebuffer,
    pub cursor: CursorState,
    pub colors: ColorState,
}

impl TerminalState {
    pub fn new(geometry: Geometry, colors: ColorState) -> Self {
        let cols = geometry.cols.max(1);
        let rows = geometry.rows.max(1);
        Self {
            cols,
            rows,
            tab_width: geometry.tab_width,
            framebuffer: Framebuffer::new(cols, rows, colors.fg, colors.bg),
            cursor: CursorState::default(),
            colors,
        }
    }

    /// Handle one byte that is not part of an escape sequence
    pub fn put_char(&mut self, ch: u8) {
        match ch {
            CARRIAGE_RETURN => self.carriage_return(),
            LINEFEED => self.linefeed(),
            BACKSPACE => self.backspace(),
            TAB => self.horizontal_tab(),
            // Remaining C0 bytes have glyphs in the hardware font
            _ => self.print(ch),
        }
    }

    fn print(&mut self, ch: u8) {
        let CursorState { x, y, .. } = self.cursor;
        self.framebuffer
            .write_cell(x, y, ch, self.colors.fg, self.colors.bg);
        if x == self.cols - 1 {
            self.linefeed();
            self.cursor.x = 0;
        } else {
            self.cursor.x += 1;
        }
    }

    /// Carriage return - move cursor to column 0
    pub fn carriage_return(&mut self) {
        self.cursor.x = 0;
    }

    /// Line feed - move cursor down, scroll if on the last row
    pub fn linefeed(&mut self) {
        if self.cursor.y == self.rows - 1 {
            self.scroll_up(1);
        } else {
            self.cursor.y += 1;
        }
    }

    /// Destructive backspace
    pub fn backspace(&mut self) {
        if self.cursor.x > 0 {
            self.cursor.x -= 1;
        } else if self.cursor.y > 0 {
            self.cursor.y -= 1;
            self.cursor.x = self.cols - 1;
        }
        let CursorState { x, y, .. } = self.cursor;
        self.framebuffer
            .write_cell(x, y, BLANK, self.colors.fg, self.colors.bg);
    }

    /// Horizontal tab - `tab_width` blanks through the normal print path
    pub fn horizontal_tab(&mut self) {
        for _ in 0..self.tab_width {
            self.print(BLANK);
        }
    }

    pub fn scroll_up(&mut self, n: u16) {
        self.framebuffer.scroll_up(n, self.colors.fg, self.colors.bg);
    }

    /// Clear the whole screen and home the cursor
    pub fn clear_screen(&mut self) {
        self.framebuffer.clear_all(self.colors.fg, self.colors.bg);
        self.cursor.x = 0;
        self.cursor.y = 0;
    }

    /// Clear from the cursor to the end of the current line
    pub fn clear_to_end_of_line(&mut self) {
        let CursorState { x, y, .. } = self.cursor;
        self.framebuffer
            .clear_line_from(x, y, self.colors.fg, self.colors.bg);
    }

    /// Absolute move; each axis is applied only if it is on screen
    pub fn goto_xy(&mut self, x: u16, y: u16) {
        if x < self.cols {
            self.cursor.x = x;
        }
        if y < self.rows {
            self.cursor.y = y;
        }
    }

    /// Absolute move, clamped into the grid
    pub fn set_position_clamped(&mut self, x: u16, y: u16) {
        self.cursor.x = x.min(self.cols - 1);
        self.cursor.y = y.min(self.rows - 1);
    }

    pub fn set_column_clamped(&mut self, x: u16) {
        self.cursor.x = x.min(self.cols - 1);
    }

    /// Relative move, clamped on both sides
    pub fn move_relative(&mut self, dx: i32, dy: i32) {
        let x = (i32::from(self.cursor.x) + dx).clamp(0, i32::from(self.cols) - 1);
        let y = (i32::from(self.cursor.y) + dy).clamp(0, i32::from(self.rows) - 1);
        self.cursor.x = x as u16;
        self.cursor.y = y as u16;
    }

    pub fn set_color(&mut self, fg: ColorArg, bg: ColorArg) {
        self.colors.set(fg, bg);
    }
}
