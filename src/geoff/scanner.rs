//! Character scanner with a single character of lookahead.

use std::iter::Fuse;

use crate::{Error, Result};

/// Reads characters one at a time. At most one character is ever buffered,
/// so the grammar above it cannot backtrack further than one `peek()`.
pub struct Scanner<I: Iterator<Item = char>> {
    chars: Fuse<I>,
    lookahead: Option<char>,
    position: usize,
}

impl<I: Iterator<Item = char>> Scanner<I> {
    pub fn new(chars: I) -> Self {
        Self {
            chars: chars.fuse(),
            lookahead: None,
            position: 0,
        }
    }

    /// Offset, in characters, of the next unread character.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The next character, without consuming it.
    pub fn peek(&mut self) -> Option<char> {
        if self.lookahead.is_none() {
            self.lookahead = self.chars.next();
        }
        self.lookahead
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.lookahead.take().or_else(|| self.chars.next());
        if ch.is_some() {
            self.position += 1;
        }
        ch
    }

    /// Consume the next character.
    pub fn read(&mut self) -> Result<char> {
        self.bump().ok_or(Error::UnexpectedEndOfInput { position: self.position })
    }

    pub fn has_more(&mut self) -> bool {
        self.peek().is_some()
    }

    pub fn next_is(&mut self, ch: char) -> bool {
        self.peek() == Some(ch)
    }

    pub fn next_matches(&mut self, pred: impl Fn(char) -> bool) -> bool {
        self.peek().is_some_and(pred)
    }

    /// Consume `ch`, failing if the next character is anything else.
    pub fn read_exact(&mut self, ch: char) -> Result<char> {
        if self.next_is(ch) {
            self.read()
        } else {
            Err(self.unexpected(format!("'{ch}'")))
        }
    }

    /// Consume up to and including `terminator`, or to end of input.
    pub fn read_until(&mut self, terminator: char) -> String {
        let mut s = String::new();
        while let Some(ch) = self.bump() {
            s.push(ch);
            if ch == terminator {
                break;
            }
        }
        s
    }

    /// Consume until the text read so far ends with `terminator`, or to end
    /// of input. The terminator is included in the returned text.
    pub fn read_until_str(&mut self, terminator: &str) -> String {
        let mut s = String::new();
        let Some(last) = terminator.chars().last() else {
            return s;
        };
        while !s.ends_with(terminator) && self.has_more() {
            s.push_str(&self.read_until(last));
        }
        s
    }

    /// Skip whitespace.
    pub fn skip_whitespace(&mut self) {
        while self.next_matches(char::is_whitespace) {
            self.bump();
        }
    }

    /// Error for a grammar mismatch at the current position.
    pub fn unexpected(&mut self, expected: impl Into<String>) -> Error {
        match self.peek() {
            Some(found) => Error::UnexpectedCharacter {
                position: self.position,
                found,
                expected: expected.into(),
            },
            None => Error::UnexpectedEndOfInput { position: self.position },
        }
    }
}
