//! Terminal core: framebuffer, cursor, colors, and the escape interpreter.

pub mod color;
pub mod command;
pub mod parser;
pub mod state;
pub mod vram;

pub use color::{Brightness, ColorArg, ColorState};
pub use command::{Operation, Params};
pub use parser::{Action, EscapeParser, ParserState};
pub use state::{Cell, CursorState, CursorStyle, Framebuffer, Geometry, TerminalState};
pub use vram::{AddressMap, PairSwapped, RowMajor, VramError};
