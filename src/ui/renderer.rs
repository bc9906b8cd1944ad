//! Framebuffer renderer using crossterm
//!
//! Shows a terminal's framebuffer on the host console. This plays the part
//! of the display-refresh routine: it reads the cell grid and the dirty flags
//! on its own schedule and never touches the escape interpreter.

use std::fmt::Write as _;
use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::config::ColorScheme;
use crate::core::term::{Cell, Framebuffer};
use crate::core::Terminal;

/// Terminal renderer
pub struct Renderer {
    scheme: ColorScheme,
    /// Whether the host console has been switched to the alternate screen
    initialized: bool,
}

impl Renderer {
    pub fn new(scheme: ColorScheme) -> Self {
        Self {
            scheme,
            initialized: false,
        }
    }

    /// Initialize the host console for rendering
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;
        self.initialized = true;
        Ok(())
    }

    /// Cleanup the host console
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = io::stdout();
        let _ = execute!(stdout, ResetColor, Show, LeaveAlternateScreen);
        let _ = stdout.flush();
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Draw whatever changed since the last call and clear the dirty flags
    pub fn render(&mut self, terminal: &mut Terminal) -> io::Result<()> {
        let stdout = io::stdout();
        let mut stdout = io::BufWriter::with_capacity(65536, stdout.lock());
        self.draw(&mut stdout, terminal)?;
        stdout.flush()?;
        terminal.framebuffer_mut().clear_dirty();
        Ok(())
    }

    /// Queue the drawing commands for the dirty part of the framebuffer
    pub fn draw<W: Write>(&self, out: &mut W, terminal: &Terminal) -> io::Result<()> {
        let fb = terminal.framebuffer();
        queue!(out, Hide)?;

        let rows: Vec<u16> = if fb.full_redraw {
            (0..fb.rows()).collect()
        } else {
            let mut dirty: Vec<u16> = fb.dirty_lines.iter().map(|&r| r as u16).collect();
            dirty.sort_unstable();
            dirty
        };
        for y in rows {
            self.draw_row(out, fb, y)?;
        }
        queue!(out, ResetColor)?;

        let cursor = terminal.cursor();
        if cursor.style.is_visible() {
            queue!(out, MoveTo(cursor.x, cursor.y), Show)?;
        }
        Ok(())
    }

    fn draw_row<W: Write>(&self, out: &mut W, fb: &Framebuffer, y: u16) -> io::Result<()> {
        let Some(cells) = fb.row(y) else {
            return Ok(());
        };
        queue!(out, MoveTo(0, y))?;

        let mut last: Option<(u8, u8)> = None;
        let mut run = String::with_capacity(cells.len());
        for cell in cells {
            let colors = (cell.fg, cell.bg);
            if last != Some(colors) {
                if let Some((fg, bg)) = last {
                    self.flush_run(out, fg, bg, &mut run)?;
                }
                last = Some(colors);
            }
            run.push(display_char(cell));
        }
        if let Some((fg, bg)) = last {
            self.flush_run(out, fg, bg, &mut run)?;
        }
        Ok(())
    }

    fn flush_run<W: Write>(&self, out: &mut W, fg: u8, bg: u8, run: &mut String) -> io::Result<()> {
        queue!(
            out,
            SetForegroundColor(self.scheme.color(fg).to_crossterm()),
            SetBackgroundColor(self.scheme.color(bg).to_crossterm()),
            Print(run.as_str())
        )?;
        run.clear();
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Printable stand-in for a cell's character byte
fn display_char(cell: &Cell) -> char {
    match cell.ch {
        0x20..=0x7E => cell.ch as char,
        _ => '·',
    }
}

/// Debug renderer for text output
pub struct DebugRenderer;

impl DebugRenderer {
    /// Render state to string (for debugging)
    pub fn render(terminal: &Terminal) -> String {
        let fb = terminal.framebuffer();
        let cursor = terminal.cursor();
        let colors = terminal.colors();
        let mut output = String::new();

        let _ = writeln!(output, "=== Terminal {}x{} ===", fb.cols(), fb.rows());
        let _ = writeln!(
            output,
            "Cursor: ({}, {}) style={:?}",
            cursor.x, cursor.y, cursor.style
        );
        let _ = writeln!(
            output,
            "Colors: fg={} bg={} brightness={:?}",
            colors.fg, colors.bg, colors.brightness
        );
        output.push_str(&"─".repeat(fb.cols() as usize));
        output.push('\n');

        for y in 0..fb.rows() {
            let indicator = if y == cursor.y { '>' } else { ' ' };
            output.push(indicator);
            for (x, cell) in fb.row(y).unwrap_or_default().iter().enumerate() {
                if y == cursor.y && x == cursor.x as usize && cursor.style.is_visible() {
                    output.push('█');
                } else {
                    output.push(display_char(cell));
                }
            }
            output.push('\n');
        }

        output.push_str(&"─".repeat(fb.cols() as usize));
        output.push('\n');
        output
    }

    /// Hex dump of packed video memory words, one grid row per line
    pub fn render_vram(words: &[u16], cols: u16) -> String {
        let mut output = String::new();
        for row in words.chunks(cols.max(1) as usize) {
            let line: Vec<String> = row.iter().map(|w| format!("{:04X}", w)).collect();
            output.push_str(&line.join(" "));
            output.push('\n');
        }
        output
    }
}
