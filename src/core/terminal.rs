//! Terminal instance
//!
//! Owns the state of one virtual text display and drives it from a byte
//! stream. Bytes must be delivered one at a time by a single writer; every
//! effect is applied before [`Terminal::on_byte`] returns.

use std::io;

use tracing::trace;

use crate::config::TerminalConfig;

use super::term::{
    Action, ColorArg, ColorState, CursorState, CursorStyle, EscapeParser, Framebuffer, Geometry,
    Operation, ParserState, TerminalState,
};

/// A virtual text-mode terminal
#[derive(Debug, Clone)]
pub struct Terminal {
    state: TerminalState,
    parser: EscapeParser,
    config: TerminalConfig,
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new(&TerminalConfig::default())
    }
}

impl Terminal {
    pub fn new(config: &TerminalConfig) -> Self {
        let geometry = Geometry {
            cols: config.cols,
            rows: config.rows,
            tab_width: config.tab_width,
        };
        let mut state = TerminalState::new(
            geometry,
            ColorState::new(config.default_fg, config.default_bg),
        );
        state.cursor.style = config.cursor_style;
        Self {
            state,
            parser: EscapeParser::new(config.max_escape_len),
            config: config.clone(),
        }
    }

    /// Terminal of the given size with every other setting at its default
    pub fn with_size(cols: u16, rows: u16) -> Self {
        Self::new(&TerminalConfig {
            cols,
            rows,
            ..TerminalConfig::default()
        })
    }

    /// Feed a single byte
    pub fn on_byte(&mut self, byte: u8) {
        match self.parser.advance(byte) {
            Action::Print(b) => self.state.put_char(b),
            Action::Execute(op) => self.apply(op),
            Action::None => {}
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.on_byte(b);
        }
    }

    /// Apply a decoded operation
    pub fn apply(&mut self, op: Operation) {
        trace!("apply {:?}", op);
        let state = &mut self.state;
        match op {
            Operation::ClearScreen => state.clear_screen(),
            Operation::ClearToEndOfLine => state.clear_to_end_of_line(),
            Operation::SetCursorPosition { row, col } => {
                state.set_position_clamped(col.saturating_sub(1), row.saturating_sub(1));
            }
            // Column is taken as-is, unlike the 1-based position above
            Operation::SetCursorColumn(col) => state.set_column_clamped(col),
            Operation::MoveRelative { dx, dy } => state.move_relative(dx, dy),
            Operation::SetGraphicsRendition(p1, p2) => {
                state.colors.apply_sgr(p1, p2);
            }
            Operation::NoOp => {}
        }
    }

    pub fn state(&self) -> &TerminalState {
        &self.state
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.state.framebuffer
    }

    /// Mutable access for the refresh consumer (dirty flags)
    pub fn framebuffer_mut(&mut self) -> &mut Framebuffer {
        &mut self.state.framebuffer
    }

    pub fn colors(&self) -> &ColorState {
        &self.state.colors
    }

    pub fn cursor(&self) -> &CursorState {
        &self.state.cursor
    }

    /// Cursor `(x, y)`
    pub fn position(&self) -> (u16, u16) {
        (self.state.cursor.x, self.state.cursor.y)
    }

    pub fn parser_state(&self) -> ParserState {
        self.parser.state()
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn set_color(&mut self, fg: ColorArg, bg: ColorArg) {
        self.state.set_color(fg, bg);
    }

    pub fn goto_xy(&mut self, x: u16, y: u16) {
        self.state.goto_xy(x, y);
    }

    pub fn set_cursor_style(&mut self, style: CursorStyle) {
        self.state.cursor.style = style;
    }

    /// Back to the freshly-constructed state
    pub fn reset(&mut self) {
        *self = Self::new(&self.config);
    }
}

/// Lets the terminal act as a plain character sink
impl io::Write for Terminal {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.feed(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::term::color::{palette, Brightness, ANSI_COLOR_LUT, PALETTE_SIZE};
    use crate::core::term::Cell;
    use std::io::Write;

    fn terminal(cols: u16, rows: u16) -> Terminal {
        Terminal::with_size(cols, rows)
    }

    fn fill(term: &mut Terminal) {
        let (cols, rows) = (term.state().cols, term.state().rows);
        for y in 0..rows {
            term.goto_xy(0, y);
            for _ in 0..cols - 1 {
                term.on_byte(b'a' + y as u8);
            }
        }
        term.goto_xy(0, 0);
    }

    #[test]
    fn test_print_at_origin() {
        let mut term = terminal(80, 25);
        term.on_byte(b'A');
        let colors = *term.colors();
        assert_eq!(
            term.framebuffer().cell(0, 0).copied(),
            Some(Cell { ch: b'A', fg: colors.fg, bg: colors.bg })
        );
        assert_eq!(term.position(), (1, 0));
    }

    #[test]
    fn test_clear_screen_sequence() {
        let mut term = terminal(10, 4);
        fill(&mut term);
        term.feed(b"\x1b[3;4H\x1b[32;41m\x1b[2J");
        assert_eq!(term.position(), (0, 0));
        let blank = Cell::blank(palette::DARK_GREEN, palette::DARK_RED);
        assert!(term.framebuffer().cells().iter().all(|c| *c == blank));
        assert_eq!(term.parser_state(), ParserState::Idle);
    }

    #[test]
    fn test_wrap_then_scroll() {
        let mut term = terminal(5, 2);
        term.feed(b"\x1b[2;5H");
        assert_eq!(term.position(), (4, 1));
        term.feed(b"xy");
        assert_eq!(term.position(), (1, 1));
        assert_eq!(term.framebuffer().row_text(0), "    x");
        assert_eq!(term.framebuffer().row_text(1), "y    ");
    }

    #[test]
    fn test_newline_on_last_row_scrolls() {
        let mut term = terminal(6, 3);
        fill(&mut term);
        term.feed(b"\x1b[3;2H\n");
        assert_eq!(term.position(), (1, 2));
        assert_eq!(term.framebuffer().row_text(0), "bbbbb ");
        assert_eq!(term.framebuffer().row_text(1), "ccccc ");
        assert_eq!(term.framebuffer().row_text(2), "      ");
    }

    #[test]
    fn test_sgr_brightness_offset() {
        let mut term = terminal(10, 2);
        term.feed(b"\x1b[31m");
        assert_eq!(term.colors().fg, ANSI_COLOR_LUT[1]);
        assert_eq!(term.colors().brightness, Brightness::Normal);

        term.feed(b"\x1b[1m\x1b[31m");
        assert_eq!(term.colors().fg, ANSI_COLOR_LUT[1] + PALETTE_SIZE);
        assert_eq!(term.colors().brightness, Brightness::Bright);

        term.on_byte(b'R');
        assert_eq!(
            term.framebuffer().cell(0, 0).map(|c| c.fg),
            Some(palette::RED)
        );
    }

    #[test]
    fn test_bright_with_color_code_keeps_stored_colors() {
        let mut term = terminal(10, 2);
        term.feed(b"\x1b[1;33m");
        assert_eq!(term.colors().fg, palette::WHITE);
        assert_eq!(term.colors().bg, palette::GRAY);
    }

    #[test]
    fn test_sgr_reset_restores_initial_colors() {
        let mut term = terminal(10, 2);
        let fresh = *term.colors();
        term.feed(b"\x1b[1m\x1b[35;46m\x1b[0m");
        assert_eq!(*term.colors(), fresh);
    }

    #[test]
    fn test_overlong_sequence_is_discarded() {
        let mut term = Terminal::new(&TerminalConfig {
            cols: 10,
            rows: 2,
            max_escape_len: 8,
            ..TerminalConfig::default()
        });
        let before = term.framebuffer().cells().to_vec();
        term.feed(b"\x1b[1;1;1;");
        assert_eq!(term.parser_state(), ParserState::Collecting);
        // The ESC overflows the buffer and opens the next sequence
        term.feed(b"\x1b[31m");
        assert_eq!(term.parser_state(), ParserState::Idle);
        assert_eq!(term.colors().fg, palette::DARK_RED);
        assert_eq!(term.framebuffer().cells(), before.as_slice());
        assert_eq!(term.position(), (0, 0));

        term.feed(b"\x1b[2;3H");
        assert_eq!(term.position(), (2, 1));
    }

    #[test]
    fn test_overflowing_literal_is_printed() {
        let mut term = Terminal::new(&TerminalConfig {
            cols: 10,
            rows: 2,
            max_escape_len: 8,
            ..TerminalConfig::default()
        });
        term.feed(b"\x1b[1;1;1;x");
        assert_eq!(term.framebuffer().row_text(0), "x         ");
        assert_eq!(term.position(), (1, 0));
    }

    #[test]
    fn test_cursor_position_is_one_based() {
        let mut term = terminal(80, 25);
        term.feed(b"\x1b[5;10H");
        assert_eq!(term.position(), (9, 4));
        term.feed(b"\x1b[H");
        assert_eq!(term.position(), (0, 0));
        term.feed(b"\x1b[0;0f");
        assert_eq!(term.position(), (0, 0));
        term.feed(b"\x1b[99;200H");
        assert_eq!(term.position(), (79, 24));
    }

    #[test]
    fn test_cursor_column_is_zero_based() {
        // Unlike ESC [ H, ESC [ G applies its parameter without subtracting one
        let mut term = terminal(80, 25);
        term.feed(b"\x1b[3;1H\x1b[5G");
        assert_eq!(term.position(), (5, 2));
        term.feed(b"\x1b[500G");
        assert_eq!(term.position(), (79, 2));
    }

    #[test]
    fn test_relative_moves_clamp() {
        let mut term = terminal(10, 5);
        term.feed(b"\x1b[3B\x1b[4C");
        assert_eq!(term.position(), (4, 3));
        term.feed(b"\x1b[20B\x1b[20C");
        assert_eq!(term.position(), (9, 4));
        term.feed(b"\x1b[2A\x1b[D");
        assert_eq!(term.position(), (8, 2));
        term.feed(b"\x1b[50A\x1b[50D");
        assert_eq!(term.position(), (0, 0));
    }

    #[test]
    fn test_clear_to_end_of_line_sequence() {
        let mut term = terminal(6, 2);
        fill(&mut term);
        term.feed(b"\x1b[1;3H\x1b[K");
        assert_eq!(term.framebuffer().row_text(0), "aa    ");
        assert_eq!(term.framebuffer().row_text(1), "bbbbb ");
        assert_eq!(term.position(), (2, 0));
    }

    #[test]
    fn test_malformed_sequences_change_nothing() {
        let mut term = terminal(10, 3);
        term.feed(b"\x1b[2;2H");
        let cells = term.framebuffer().cells().to_vec();
        let colors = *term.colors();
        term.feed(b"\x1b[1J\x1b[?25h\x1b(B\x1b[99m\x1b[m\x1b[G\x1b[5z");
        assert_eq!(term.framebuffer().cells(), cells.as_slice());
        assert_eq!(*term.colors(), colors);
        assert_eq!(term.position(), (1, 1));
        assert_eq!(term.parser_state(), ParserState::Idle);
    }

    #[test]
    fn test_tab_and_backspace() {
        let mut term = Terminal::new(&TerminalConfig {
            cols: 10,
            rows: 2,
            tab_width: 3,
            ..TerminalConfig::default()
        });
        term.feed(b"a\tb");
        assert_eq!(term.framebuffer().row_text(0), "a   b     ");
        term.feed(b"\x08\x08");
        assert_eq!(term.framebuffer().row_text(0), "a         ");
        assert_eq!(term.position(), (3, 0));
    }

    #[test]
    fn test_instances_are_independent() {
        let mut a = terminal(10, 2);
        let b = terminal(10, 2);
        a.feed(b"\x1b[34mhello");
        assert_eq!(b.position(), (0, 0));
        assert_eq!(b.colors().fg, TerminalConfig::default().default_fg);
        assert_eq!(b.framebuffer().row_text(0), " ".repeat(10));
    }

    #[test]
    fn test_io_write_sink() {
        let mut term = terminal(20, 2);
        write!(term, "x={}\r\n\x1b[33m\x1b[1m!", 42).expect("write to terminal");
        assert_eq!(term.framebuffer().row_text(0).trim_end(), "x=42");
        assert_eq!(term.framebuffer().cell(0, 1).map(|c| c.fg), Some(palette::YELLOW));
    }

    #[test]
    fn test_set_color_and_reset() {
        let mut term = terminal(10, 2);
        term.set_color(ColorArg::Index(palette::CYAN), ColorArg::Keep);
        term.set_cursor_style(CursorStyle::Hidden);
        term.feed(b"zz");
        assert_eq!(term.colors().fg, palette::CYAN);
        term.reset();
        assert_eq!(term.position(), (0, 0));
        assert_eq!(term.cursor().style, CursorStyle::BlinkingBlock);
        assert_eq!(term.framebuffer().row_text(0), " ".repeat(10));
        assert_eq!(*term.colors(), ColorState::new(palette::DARK_GRAY, palette::BLACK));
    }
}
