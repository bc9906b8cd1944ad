//! Configuration and color scheme management for vramterm.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.vramterm/config.toml`
//! - Construction-time terminal parameters (grid size, default colors, tabs)
//! - Built-in RGB palettes used when the framebuffer is shown on a host console
//!
//! # Configuration File
//!
//! ```toml
//! # Palette for the console renderer: default, solarized, gruvbox
//! color_scheme = "default"
//!
//! [terminal]
//! rows = 25
//! cols = 80
//! default_fg = 7
//! default_bg = 0
//! tab_width = 4
//! max_escape_len = 16
//! cursor_style = "blinking-block"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::term::color::MAX_PALETTE_INDEX;
use crate::core::term::parser::{DEFAULT_MAX_ESCAPE_LEN, MIN_ESCAPE_LEN};
use crate::core::term::CursorStyle;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Grid must be at least 1x1, got {cols}x{rows}")]
    InvalidGeometry { cols: u16, rows: u16 },

    #[error("Palette index {0} is out of range (0-15)")]
    InvalidColor(u8),

    #[error("max_escape_len must be at least {min}, got {got}")]
    EscapeBufferTooSmall { min: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Color scheme name
    pub color_scheme: String,
    /// Terminal instance settings
    pub terminal: TerminalConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            color_scheme: "default".to_string(),
            terminal: TerminalConfig::default(),
        }
    }
}

/// Construction-time parameters of a terminal instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub rows: u16,
    pub cols: u16,
    pub default_fg: u8,
    pub default_bg: u8,
    pub tab_width: u16,
    pub max_escape_len: usize,
    pub cursor_style: CursorStyle,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            rows: 25,
            cols: 80,
            default_fg: 7,
            default_bg: 0,
            tab_width: 4,
            max_escape_len: DEFAULT_MAX_ESCAPE_LEN,
            cursor_style: CursorStyle::default(),
        }
    }
}

impl TerminalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::InvalidGeometry {
                cols: self.cols,
                rows: self.rows,
            });
        }
        for color in [self.default_fg, self.default_bg] {
            if color > MAX_PALETTE_INDEX {
                return Err(ConfigError::InvalidColor(color));
            }
        }
        if self.max_escape_len < MIN_ESCAPE_LEN {
            return Err(ConfigError::EscapeBufferTooSmall {
                min: MIN_ESCAPE_LEN,
                got: self.max_escape_len,
            });
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::get_config_path() {
            Some(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Ignoring config file: {}", e);
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    /// Load and validate configuration from a file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.terminal.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Directory holding the config and log files
    pub fn config_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".vramterm"))
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get the color scheme
    pub fn get_color_scheme(&self) -> ColorScheme {
        ColorScheme::by_name(&self.color_scheme)
    }
}

/// Color definition (RGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert to crossterm Color
    pub fn to_crossterm(&self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// RGB values for the 16 hardware palette entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub name: String,
    pub palette: [Color; 16],
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_scheme()
    }
}

impl ColorScheme {
    /// RGB value of a palette index
    pub fn color(&self, index: u8) -> Color {
        self.palette[(index & MAX_PALETTE_INDEX) as usize]
    }

    /// Classic CGA colors
    pub fn default_scheme() -> Self {
        Self {
            name: "default".to_string(),
            palette: [
                Color::new(0, 0, 0),
                Color::new(170, 0, 0),
                Color::new(0, 170, 0),
                Color::new(170, 85, 0),
                Color::new(0, 0, 170),
                Color::new(170, 0, 170),
                Color::new(0, 170, 170),
                Color::new(170, 170, 170),
                Color::new(85, 85, 85),
                Color::new(255, 85, 85),
                Color::new(85, 255, 85),
                Color::new(255, 255, 85),
                Color::new(85, 85, 255),
                Color::new(255, 85, 255),
                Color::new(85, 255, 255),
                Color::new(255, 255, 255),
            ],
        }
    }

    /// Solarized Dark scheme
    pub fn solarized() -> Self {
        Self {
            name: "solarized".to_string(),
            palette: [
                Color::new(7, 54, 66),
                Color::new(220, 50, 47),
                Color::new(133, 153, 0),
                Color::new(181, 137, 0),
                Color::new(38, 139, 210),
                Color::new(211, 54, 130),
                Color::new(42, 161, 152),
                Color::new(238, 232, 213),
                Color::new(0, 43, 54),
                Color::new(203, 75, 22),
                Color::new(88, 110, 117),
                Color::new(101, 123, 131),
                Color::new(131, 148, 150),
                Color::new(108, 113, 196),
                Color::new(147, 161, 161),
                Color::new(253, 246, 227),
            ],
        }
    }

    /// Gruvbox Dark scheme
    pub fn gruvbox() -> Self {
        Self {
            name: "gruvbox".to_string(),
            palette: [
                Color::new(40, 40, 40),
                Color::new(204, 36, 29),
                Color::new(152, 151, 26),
                Color::new(215, 153, 33),
                Color::new(69, 133, 136),
                Color::new(177, 98, 134),
                Color::new(104, 157, 106),
                Color::new(168, 153, 132),
                Color::new(146, 131, 116),
                Color::new(251, 73, 52),
                Color::new(184, 187, 38),
                Color::new(250, 189, 47),
                Color::new(131, 165, 152),
                Color::new(211, 134, 155),
                Color::new(142, 192, 124),
                Color::new(235, 219, 178),
            ],
        }
    }

    /// Get scheme by name
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "solarized" | "solarized-dark" | "solarized_dark" => Self::solarized(),
            "gruvbox" | "gruvbox-dark" | "gruvbox_dark" => Self::gruvbox(),
            _ => Self::default_scheme(),
        }
    }

    /// List available schemes
    pub fn list() -> Vec<&'static str> {
        vec!["default", "solarized", "gruvbox"]
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}
