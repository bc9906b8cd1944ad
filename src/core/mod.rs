//! Core terminal emulation components.
//!
//! - **term**: framebuffer, cursor, colors, escape parser and decoder
//! - **terminal**: one terminal instance driven byte by byte
//! - **session**: byte source feeding a terminal from a reader thread
//!
//! # Architecture
//!
//! ```text
//! Session (reader thread -> channel)
//! └── Terminal::on_byte
//!     ├── EscapeParser (Idle / Collecting)
//!     │   └── command::decode -> Operation
//!     └── TerminalState
//!         ├── Framebuffer (cell grid + dirty rows)
//!         ├── CursorState (position + style)
//!         └── ColorState (fg / bg / brightness)
//! ```

pub mod session;
pub mod term;
pub mod terminal;

pub use session::{Session, SessionEvent};
pub use terminal::Terminal;
