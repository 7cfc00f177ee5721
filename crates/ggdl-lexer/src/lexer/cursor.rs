use ggdl_common::Position;

use super::charclass::is_printable;
use super::error::StreamError;
use super::source::RuneSource;

/// Column alignment for `\t`.
pub const TAB_STOP: u32 = 4;

/// Scan state shared by every sub-scanner: where the next token starts, the
/// characters read for it so far, and the sticky read error.
///
/// The three parts only ever change together. Every transition takes the
/// cursor by value and hands back its successor, so a half-updated cursor
/// cannot be observed and an old cursor never shares a pending buffer with
/// a new one. Clone first to keep a snapshot.
///
/// A cursor assumes it is the only reader of its input and that nothing
/// else advances the input between calls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cursor {
    pos: Position,
    pending: Vec<char>,
    error: Option<StreamError>,
}

impl Cursor {
    /// Fresh cursor at [`Position::UNKNOWN`]; the first
    /// [`peek_first`](Self::peek_first) moves it to line 1, column 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor at `pos` that has already read `pending` for the next token.
    pub fn with_pending(pos: Position, pending: impl IntoIterator<Item = char>) -> Self {
        Self {
            pos,
            pending: pending.into_iter().collect(),
            error: None,
        }
    }

    /// Position of the token that consuming the pending characters would
    /// produce, whether or not anything is pending.
    pub fn pos(&self) -> Position {
        self.pos
    }

    pub fn pending(&self) -> &[char] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_end_of_stream(&self) -> bool {
        matches!(self.error, Some(StreamError::EndOfStream))
    }

    /// The error from the most recent read, if any. Once set it survives
    /// every transition and blocks further reads.
    pub fn error(&self) -> Option<&StreamError> {
        self.error.as_ref()
    }

    /// Extends the pending image with one character from `input`.
    ///
    /// Returns `None` without reading when the cursor is already terminal,
    /// and `None` (leaving the cursor terminal) when the read fails.
    pub fn read_next<S: RuneSource + ?Sized>(mut self, input: &mut S) -> (Self, Option<char>) {
        if self.error.is_some() {
            return (self, None);
        }
        match input.read_rune() {
            Ok(c) => {
                self.pending.push(c);
                (self, Some(c))
            }
            Err(err) => {
                self.error = Some(err);
                (self, None)
            }
        }
    }

    /// Returns the first character of the next lexeme, reading it from
    /// `input` only if nothing is pending.
    ///
    /// A run of whitespace is skipped on the way, with every skipped
    /// character still counted towards the position. If the run reaches the
    /// end of input the whole run is consumed, the position falls back to
    /// [`Position::UNKNOWN`], and `None` is returned.
    ///
    /// At most one character may be pending when this is called.
    pub fn peek_first<S: RuneSource + ?Sized>(mut self, input: &mut S) -> (Self, Option<char>) {
        if self.pos.is_unknown() {
            self.pos = Position::new(1, 1);
        }
        debug_assert!(
            self.pending.len() <= 1,
            "peek_first with {} pending characters",
            self.pending.len()
        );

        let (mut next, mut c) = match self.pending.first().copied() {
            Some(first) => (self, Some(first)),
            None => self.read_next(input),
        };
        if !c.is_some_and(char::is_whitespace) {
            return (next, c);
        }

        while !next.has_error() && c.is_some_and(char::is_whitespace) {
            (next, c) = next.read_next(input);
        }
        if next.has_error() {
            let (drained, _) = next.consume_all();
            (drained.reset_position(), None)
        } else {
            let (rest, _) = next.consume_except_final();
            (rest, c)
        }
    }

    /// Flushes the pending characters into an image, moving the position
    /// past them.
    pub fn consume_all(mut self) -> (Self, String) {
        self.pos = advance_over(self.pos, self.pending.iter().copied());
        let image = self.pending.drain(..).collect();
        (self, image)
    }

    /// Like [`consume_all`](Self::consume_all), but the final pending
    /// character stays behind as the start of the next lexeme.
    pub fn consume_except_final(mut self) -> (Self, String) {
        let Some(last) = self.pending.pop() else {
            return (self, String::new());
        };
        let (mut next, image) = self.consume_all();
        next.pending.push(last);
        (next, image)
    }

    /// Forgets the position, for when a failed read leaves no meaningful
    /// location.
    pub fn reset_position(mut self) -> Self {
        self.pos = Position::UNKNOWN;
        self
    }
}

/// Line and column delta covered by `text` when it starts at `start_column`.
///
/// Printable characters take one column, a newline moves to column 1 of the
/// next line, and a tab moves to the next multiple of [`TAB_STOP`] past the
/// current column. Anything else takes no room. Apply the result with
/// [`Position::advance_by`].
pub fn offset(start_column: u32, text: impl IntoIterator<Item = char>) -> (u32, u32) {
    let mut lines = 0u32;
    let mut columns = 0u32;
    for c in text {
        if c == '\n' {
            lines += 1;
            columns = 1;
        } else if c == '\t' {
            // tab stops are absolute, so measure from the line start
            let base = if lines == 0 { start_column } else { 0 };
            let at = base + columns;
            columns = (at / TAB_STOP + 1) * TAB_STOP - base;
        } else if is_printable(c) {
            columns += 1;
        }
    }
    (lines, columns)
}

/// The position reached after `text`, starting from `pos`.
pub fn advance_over(pos: Position, text: impl IntoIterator<Item = char>) -> Position {
    let (lines, columns) = offset(pos.column(), text);
    pos.advance_by(lines, columns)
}
