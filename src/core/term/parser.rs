//! Escape sequence collector
//!
//! Two-state machine that separates literal bytes from escape sequences and
//! buffers the latter, bounded, until a terminating letter arrives.

use tracing::debug;

use super::command::{self, Operation};

pub const ESC: u8 = 0x1B;

/// Default capacity of the escape buffer, ESC included
pub const DEFAULT_MAX_ESCAPE_LEN: usize = 16;

/// Smallest usable capacity: ESC, `[`, terminator
pub const MIN_ESCAPE_LEN: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParserState {
    #[default]
    Idle,
    Collecting,
}

/// What the caller has to do with a byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Not part of a sequence, render it
    Print(u8),
    /// Sequence completed and decoded
    Execute(Operation),
    /// Byte was consumed by the parser
    None,
}

/// Parser state machine
#[derive(Debug, Clone)]
pub struct EscapeParser {
    state: ParserState,
    buf: Vec<u8>,
    max_len: usize,
}

impl Default for EscapeParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ESCAPE_LEN)
    }
}

impl EscapeParser {
    pub fn new(max_len: usize) -> Self {
        let max_len = max_len.max(MIN_ESCAPE_LEN);
        Self {
            state: ParserState::Idle,
            buf: Vec::with_capacity(max_len),
            max_len,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Bytes collected so far for the pending sequence
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    /// Feed a single byte to the parser
    pub fn advance(&mut self, byte: u8) -> Action {
        match self.state {
            ParserState::Idle => {
                if byte == ESC {
                    self.buf.push(byte);
                    self.state = ParserState::Collecting;
                    Action::None
                } else {
                    Action::Print(byte)
                }
            }
            ParserState::Collecting => self.collect(byte),
        }
    }

    fn collect(&mut self, byte: u8) -> Action {
        if self.buf.len() >= self.max_len {
            debug!(
                "Escape sequence exceeds {} bytes, discarding: {:?}",
                self.max_len,
                String::from_utf8_lossy(&self.buf)
            );
            self.reset();
            return self.advance(byte);
        }

        self.buf.push(byte);
        if byte.is_ascii_alphabetic() {
            let op = command::decode(&self.buf);
            self.reset();
            Action::Execute(op)
        } else {
            Action::None
        }
    }

    /// Drop any pending sequence and go back to Idle
    pub fn reset(&mut self) {
        self.buf.clear();
        self.state = ParserState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(parser: &mut EscapeParser, bytes: &[u8]) -> Vec<Action> {
        bytes.iter().map(|&b| parser.advance(b)).collect()
    }

    #[test]
    fn test_literal_bytes_pass_through() {
        let mut parser = EscapeParser::default();
        assert_eq!(feed(&mut parser, b"hi"), vec![Action::Print(b'h'), Action::Print(b'i')]);
        assert_eq!(parser.state(), ParserState::Idle);
    }

    #[test]
    fn test_sequence_completes_on_letter() {
        let mut parser = EscapeParser::default();
        let actions = feed(&mut parser, b"\x1b[2J");
        assert_eq!(actions[..3], [Action::None, Action::None, Action::None]);
        assert_eq!(actions[3], Action::Execute(Operation::ClearScreen));
        assert_eq!(parser.state(), ParserState::Idle);
        assert!(parser.pending().is_empty());
    }

    #[test]
    fn test_overflow_discards_and_recovers() {
        let mut parser = EscapeParser::new(6);
        let actions = feed(&mut parser, b"\x1b[1111");
        assert!(actions.iter().all(|a| *a == Action::None));
        assert_eq!(parser.pending().len(), 6);

        // Full buffer: the next byte drops the sequence and is seen as a literal
        assert_eq!(parser.advance(b'1'), Action::Print(b'1'));
        assert_eq!(parser.state(), ParserState::Idle);
        assert!(parser.pending().is_empty());

        let actions = feed(&mut parser, b"\x1b[31m");
        assert_eq!(
            actions.last(),
            Some(&Action::Execute(Operation::SetGraphicsRendition(31, None)))
        );
    }

    #[test]
    fn test_escape_after_overflow_starts_new_sequence() {
        let mut parser = EscapeParser::new(8);
        let actions = feed(&mut parser, b"\x1b[1;1;1;\x1b[31m");
        assert!(actions[..actions.len() - 1].iter().all(|a| *a == Action::None));
        assert_eq!(
            actions.last(),
            Some(&Action::Execute(Operation::SetGraphicsRendition(31, None)))
        );
        assert_eq!(parser.state(), ParserState::Idle);
    }

    #[test]
    fn test_sequence_filling_buffer_exactly_decodes() {
        let mut parser = EscapeParser::new(8);
        let actions = feed(&mut parser, b"\x1b[12;34H");
        assert_eq!(
            actions.last(),
            Some(&Action::Execute(Operation::SetCursorPosition { row: 12, col: 34 }))
        );
        assert_eq!(parser.state(), ParserState::Idle);
    }

    #[test]
    fn test_second_escape_is_buffered() {
        let mut parser = EscapeParser::default();
        feed(&mut parser, b"\x1b[3\x1b");
        assert_eq!(parser.state(), ParserState::Collecting);
        assert_eq!(parser.pending(), b"\x1b[3\x1b");
        assert_eq!(parser.advance(b'm'), Action::Execute(Operation::NoOp));
        assert_eq!(parser.state(), ParserState::Idle);
    }

    #[test]
    fn test_minimum_capacity() {
        let mut parser = EscapeParser::new(0);
        assert_eq!(
            feed(&mut parser, b"\x1b[K").last(),
            Some(&Action::Execute(Operation::ClearToEndOfLine))
        );
    }
}
