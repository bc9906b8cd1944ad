//! Escape sequence decoder
//!
//! Turns a completed `ESC [ ... <letter>` sequence into an [`Operation`].
//! Anything malformed or unsupported becomes [`Operation::NoOp`].

use tracing::debug;

use super::parser::ESC;

/// Maximum number of parameters kept; extra ones are ignored
pub const MAX_PARAMS: usize = 4;

/// A decoded escape sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `ESC [ 2 J`
    ClearScreen,
    /// `ESC [ K`
    ClearToEndOfLine,
    /// `ESC [ row ; col H`, 1-based
    SetCursorPosition { row: u16, col: u16 },
    /// `ESC [ col G`, applied as-is
    SetCursorColumn(u16),
    /// `ESC [ n A/B/C/D`
    MoveRelative { dx: i32, dy: i32 },
    /// `ESC [ p1 ; p2 m`
    SetGraphicsRendition(u16, Option<u16>),
    NoOp,
}

/// Parameters of a control sequence, `None` where a field was empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Params {
    values: [Option<u16>; MAX_PARAMS],
    count: usize,
}

impl Params {
    /// Parse the bytes between `[` and the terminator.
    ///
    /// Returns `None` if anything other than digits and `;` shows up.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        let mut params = Params::default();
        if raw.is_empty() {
            return Some(params);
        }
        for field in raw.split(|&b| b == b';') {
            let mut value: Option<u16> = None;
            for &b in field {
                if !b.is_ascii_digit() {
                    return None;
                }
                let digit = u16::from(b - b'0');
                value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(digit));
            }
            if params.count < MAX_PARAMS {
                params.values[params.count] = value;
                params.count += 1;
            }
        }
        Some(params)
    }

    pub fn get(&self, idx: usize) -> Option<u16> {
        self.values.get(idx).copied().flatten()
    }

    pub fn get_or(&self, idx: usize, default: u16) -> u16 {
        self.get(idx).unwrap_or(default)
    }

    /// Number of fields seen (empty fields included)
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Decode a full escape sequence, ESC and terminator included
pub fn decode(seq: &[u8]) -> Operation {
    let op = decode_inner(seq);
    if op == Operation::NoOp {
        debug!("Ignoring escape sequence: {:?}", String::from_utf8_lossy(seq));
    }
    op
}

fn decode_inner(seq: &[u8]) -> Operation {
    let [first, b'[', body @ .., terminator] = seq else {
        return Operation::NoOp;
    };
    if *first != ESC {
        return Operation::NoOp;
    }
    let Some(params) = Params::parse(body) else {
        return Operation::NoOp;
    };

    match terminator {
        b'J' if body == b"2" => Operation::ClearScreen,
        b'K' => Operation::ClearToEndOfLine,
        b'H' | b'f' => Operation::SetCursorPosition {
            row: params.get_or(0, 1),
            col: params.get_or(1, 1),
        },
        b'G' => match params.get(0) {
            Some(col) => Operation::SetCursorColumn(col),
            None => Operation::NoOp,
        },
        b'A' | b'B' | b'C' | b'D' => {
            let n = i32::from(params.get_or(0, 1));
            let (dx, dy) = match terminator {
                b'A' => (0, -n),
                b'B' => (0, n),
                b'C' => (n, 0),
                _ => (-n, 0),
            };
            Operation::MoveRelative { dx, dy }
        }
        b'm' => match params.get(0) {
            Some(p1) => Operation::SetGraphicsRendition(p1, params.get(1)),
            None => Operation::NoOp,
        },
        _ => Operation::NoOp,
    }
}
