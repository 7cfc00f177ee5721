use std::fmt;

use serde::ser::{Serialize, SerializeStruct, Serializer};

// Packed layout, most significant bits first:
//
//   LLLLLLLLLLLLLLLLLLLL CCCCCCCCCC FF
//   20 bits line         10 bits    2 bits mode
//                        column
const LINE_OFFSET: u32 = 12;
const LINE_MASK: u32 = (1 << 20) - 1;
const COLUMN_OFFSET: u32 = 2;
const COLUMN_MASK: u32 = (1 << 10) - 1;
const MODE_MASK: u32 = 0b11;

/// Lexical mode carried alongside a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Freshly created, or reset by a newline.
    Unknown,
    /// The token at this position is a comment.
    Comment,
    /// The token at this position is part of a GDL sentence.
    Sentence,
    /// The token at this position is in a metalanguage block, not GDL.
    MetaBlock,
}

impl Mode {
    fn bits(self) -> u32 {
        match self {
            Mode::Unknown => 0b00,
            Mode::Comment => 0b01,
            Mode::Sentence => 0b10,
            Mode::MetaBlock => 0b11,
        }
    }

    fn from_bits(bits: u32) -> Self {
        match bits & MODE_MASK {
            0b01 => Mode::Comment,
            0b10 => Mode::Sentence,
            0b11 => Mode::MetaBlock,
            _ => Mode::Unknown,
        }
    }

    fn marker(self) -> char {
        match self {
            Mode::Unknown => '?',
            Mode::Comment => ';',
            Mode::Sentence => '.',
            Mode::MetaBlock => '!',
        }
    }
}

/// Token position (1-based line/column plus a [`Mode`]) packed into 32 bits.
///
/// Zero in either field means "unknown". Values too large for their field
/// saturate instead of wrapping, and the packed ordering always agrees with
/// source order: once the line saturates the column is dropped, so text on
/// a later line can never compare before text on an earlier one.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position(u32);

impl Position {
    /// Unknown line, unknown column, unknown mode. Used before the first
    /// character is read and for the end-of-stream token.
    pub const UNKNOWN: Position = Position(0);

    pub const MAX_LINE: u32 = LINE_MASK;
    pub const MAX_COLUMN: u32 = COLUMN_MASK;

    pub fn new(line: u32, column: u32) -> Self {
        Self::packed(line, column, Mode::Unknown)
    }

    fn packed(line: u32, column: u32, mode: Mode) -> Self {
        let (line, column) = if line >= LINE_MASK {
            (LINE_MASK, 0)
        } else {
            (line, column.min(COLUMN_MASK))
        };
        Position((line << LINE_OFFSET) | (column << COLUMN_OFFSET) | mode.bits())
    }

    /// 1-based line, zero when unknown.
    pub fn line(self) -> u32 {
        (self.0 >> LINE_OFFSET) & LINE_MASK
    }

    /// 1-based column, zero when unknown.
    pub fn column(self) -> u32 {
        (self.0 >> COLUMN_OFFSET) & COLUMN_MASK
    }

    pub fn mode(self) -> Mode {
        Mode::from_bits(self.0)
    }

    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }

    /// Moves to the start of the next line. The column becomes zero, so the
    /// first character on the new line is reached by one further
    /// [`advance_column`](Self::advance_column). Comment mode ends at the
    /// newline; other modes carry over.
    pub fn advance_line(self) -> Self {
        let mode = match self.mode() {
            Mode::Comment => Mode::Unknown,
            other => other,
        };
        Self::packed(self.line() + 1, 0, mode)
    }

    pub fn advance_column(self) -> Self {
        Self::packed(self.line(), self.column() + 1, self.mode())
    }

    /// Equivalent to `lines` calls of [`advance_line`](Self::advance_line)
    /// followed by `columns` calls of [`advance_column`](Self::advance_column).
    pub fn advance_by(self, lines: u32, columns: u32) -> Self {
        let start = if lines == 0 {
            self
        } else {
            let mode = match self.mode() {
                Mode::Comment => Mode::Unknown,
                other => other,
            };
            Self::packed(self.line().saturating_add(lines), 0, mode)
        };
        Self::packed(
            start.line(),
            start.column().saturating_add(columns),
            start.mode(),
        )
    }

    fn with_mode(self, mode: Mode) -> Self {
        Position((self.0 & !MODE_MASK) | mode.bits())
    }

    pub fn in_sentence(self) -> Self {
        self.with_mode(Mode::Sentence)
    }

    pub fn in_comment(self) -> Self {
        self.with_mode(Mode::Comment)
    }

    pub fn in_metablock(self) -> Self {
        self.with_mode(Mode::MetaBlock)
    }

    pub fn reset_mode(self) -> Self {
        self.with_mode(Mode::Unknown)
    }

    pub fn is_sentence(self) -> bool {
        self.mode() == Mode::Sentence
    }

    pub fn is_comment(self) -> bool {
        self.mode() == Mode::Comment
    }

    pub fn is_metablock(self) -> bool {
        self.mode() == Mode::MetaBlock
    }

    /// Same line and column, ignoring the mode bits.
    pub fn same_place(self, other: Position) -> bool {
        self.line() == other.line() && self.column() == other.column()
    }
}

/// A range of source text in a named file, `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub file: String,
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(file: impl Into<String>, start: Position, end: Position) -> Self {
        Self {
            file: file.into(),
            start,
            end,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file,
            self.start.line(),
            self.start.column()
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{},{}", self.mode().marker(), self.line(), self.column())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self)
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Position", 3)?;
        state.serialize_field("line", &self.line())?;
        state.serialize_field("column", &self.column())?;
        let mode = match self.mode() {
            Mode::Unknown => "unknown",
            Mode::Comment => "comment",
            Mode::Sentence => "sentence",
            Mode::MetaBlock => "metablock",
        };
        state.serialize_field("mode", mode)?;
        state.end()
    }
}
