//! Host console output.
//!
//! - **renderer**: crossterm renderer for the framebuffer plus a plain-text
//!   `DebugRenderer`

pub mod renderer;

pub use renderer::{DebugRenderer, Renderer};
