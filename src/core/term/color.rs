//! Color state
//!
//! Current foreground/background palette indices plus the brightness flag,
//! and the mapping from ANSI SGR color codes to the 16-entry hardware palette.

/// Number of base colors; the bright half of the palette starts here.
pub const PALETTE_SIZE: u8 = 8;

/// Highest valid palette index (base + bright half).
pub const MAX_PALETTE_INDEX: u8 = PALETTE_SIZE * 2 - 1;

/// Hardware palette indices
pub mod palette {
    pub const BLACK: u8 = 0;
    pub const DARK_RED: u8 = 1;
    pub const DARK_GREEN: u8 = 2;
    pub const BROWN: u8 = 3;
    pub const DARK_BLUE: u8 = 4;
    pub const DARK_MAGENTA: u8 = 5;
    pub const DARK_CYAN: u8 = 6;
    pub const DARK_GRAY: u8 = 7;
    pub const GRAY: u8 = 8;
    pub const RED: u8 = 9;
    pub const GREEN: u8 = 10;
    pub const YELLOW: u8 = 11;
    pub const BLUE: u8 = 12;
    pub const MAGENTA: u8 = 13;
    pub const CYAN: u8 = 14;
    pub const WHITE: u8 = 15;
}

/// ANSI color number (the `n` in `3n`/`4n`) to base palette index.
pub const ANSI_COLOR_LUT: [u8; PALETTE_SIZE as usize] = [
    palette::BLACK,
    palette::DARK_RED,
    palette::DARK_GREEN,
    palette::BROWN,
    palette::DARK_BLUE,
    palette::DARK_MAGENTA,
    palette::DARK_CYAN,
    palette::DARK_GRAY,
];

const SGR_RESET: u16 = 0;
const SGR_BRIGHT: u16 = 1;
const SGR_FAINT: u16 = 2;
const SGR_FG: std::ops::RangeInclusive<u16> = 30..=37;
const SGR_BG: std::ops::RangeInclusive<u16> = 40..=47;

/// Brightness modifier applied on top of the base color selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Brightness {
    #[default]
    Normal,
    Bright,
}

impl Brightness {
    fn offset(self) -> u8 {
        match self {
            Brightness::Normal => 0,
            Brightness::Bright => PALETTE_SIZE,
        }
    }
}

/// Argument to a color-setting call.
///
/// `Default` and `Keep` are sentinels; they are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorArg {
    /// Use the configured default for this channel
    Default,
    /// Leave this channel as it is
    Keep,
    /// Explicit palette index (masked to 0-15)
    Index(u8),
}

/// Current drawing colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorState {
    pub fg: u8,
    pub bg: u8,
    pub brightness: Brightness,
    default_fg: u8,
    default_bg: u8,
}

impl ColorState {
    pub fn new(default_fg: u8, default_bg: u8) -> Self {
        let default_fg = default_fg & MAX_PALETTE_INDEX;
        let default_bg = default_bg & MAX_PALETTE_INDEX;
        Self {
            fg: default_fg,
            bg: default_bg,
            brightness: Brightness::Normal,
            default_fg,
            default_bg,
        }
    }

    pub fn default_fg(&self) -> u8 {
        self.default_fg
    }

    pub fn default_bg(&self) -> u8 {
        self.default_bg
    }

    /// Set both channels, resolving the sentinels
    pub fn set(&mut self, fg: ColorArg, bg: ColorArg) {
        match fg {
            ColorArg::Default => self.fg = self.default_fg,
            ColorArg::Keep => {}
            ColorArg::Index(n) => self.fg = n & MAX_PALETTE_INDEX,
        }
        match bg {
            ColorArg::Default => self.bg = self.default_bg,
            ColorArg::Keep => {}
            ColorArg::Index(n) => self.bg = n & MAX_PALETTE_INDEX,
        }
    }

    /// Back to the freshly-initialized state
    pub fn reset(&mut self) {
        *self = Self::new(self.default_fg, self.default_bg);
    }

    /// Apply an SGR with one or two parameters.
    ///
    /// Returns `false` when `p1` selects nothing; the state is then left
    /// untouched. `p2` is only read after a color code in `p1`, and is
    /// ignored if it is not a color code itself.
    pub fn apply_sgr(&mut self, p1: u16, p2: Option<u16>) -> bool {
        match p1 {
            SGR_RESET => self.reset(),
            SGR_BRIGHT | SGR_FAINT => {
                self.brightness = if p1 == SGR_BRIGHT {
                    Brightness::Bright
                } else {
                    Brightness::Normal
                };
                let offset = self.brightness.offset();
                self.fg = self.fg % PALETTE_SIZE + offset;
                self.bg = self.bg % PALETTE_SIZE + offset;
            }
            _ => {
                let Some(channel) = Channel::from_code(p1) else {
                    return false;
                };
                self.select(channel);
                if let Some(channel) = p2.and_then(Channel::from_code) {
                    self.select(channel);
                }
            }
        }
        true
    }

    fn select(&mut self, channel: Channel) {
        match channel {
            Channel::Fg(base) => self.fg = self.effective(base),
            Channel::Bg(base) => self.bg = self.effective(base),
        }
    }

    fn effective(&self, base: u8) -> u8 {
        base + self.brightness.offset()
    }
}

/// Which channel an SGR color code selects, with its base palette index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Fg(u8),
    Bg(u8),
}

impl Channel {
    fn from_code(code: u16) -> Option<Self> {
        if SGR_FG.contains(&code) {
            Some(Channel::Fg(ANSI_COLOR_LUT[(code - SGR_FG.start()) as usize]))
        } else if SGR_BG.contains(&code) {
            Some(Channel::Bg(ANSI_COLOR_LUT[(code - SGR_BG.start()) as usize]))
        } else {
            None
        }
    }
}
