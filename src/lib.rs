//! vramterm - a text-mode virtual framebuffer terminal
//!
//! Characters with color attributes are rendered into a fixed-size cell
//! buffer. A small subset of ANSI/VT100 escape sequences (cursor motion,
//! screen and line clearing, color selection) is interpreted from a serial
//! byte stream.
//!
//! ```
//! use vramterm::core::Terminal;
//!
//! let mut term = Terminal::with_size(80, 25);
//! term.feed(b"\x1b[2J\x1b[32mready\r\n");
//! assert_eq!(term.position(), (0, 1));
//! assert!(term.framebuffer().row_text(0).starts_with("ready"));
//! ```

pub mod config;
pub mod core;
pub mod ui;

pub use crate::config::{Config, TerminalConfig};
pub use crate::core::Terminal;
