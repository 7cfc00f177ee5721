use std::fmt;

use ggdl_common::Position;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// A single token produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub pos: Position,
    pub kind: TokenKind,
}

impl Token {
    /// The end-of-stream sentinel. It is not part of the document, so its
    /// position is always [`Position::UNKNOWN`].
    pub const EOF: Token = Token {
        pos: Position::UNKNOWN,
        kind: TokenKind::Eof,
    };

    pub fn new(kind: TokenKind, pos: Position) -> Self {
        Self { pos, kind }
    }

    /// Keyword token when `image` is in the keyword vocabulary, identifier
    /// otherwise.
    pub fn word(image: String, pos: Position) -> Self {
        match Keyword::from_image(&image) {
            Some(keyword) => Self::new(TokenKind::Keyword(keyword), pos),
            None => Self::new(TokenKind::Identifier(image), pos),
        }
    }

    pub fn line(&self) -> u32 {
        self.pos.line()
    }

    pub fn column(&self) -> u32 {
        self.pos.column()
    }

    pub fn type_str(&self) -> &'static str {
        self.kind.type_str()
    }

    pub fn image(&self) -> &str {
        self.kind.image()
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}:{}>", self.pos, self.type_str(), self.image())
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Token", 3)?;
        state.serialize_field("pos", &self.pos)?;
        state.serialize_field("type", self.type_str())?;
        state.serialize_field("image", self.image())?;
        state.end()
    }
}

/// All token kinds in GDL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `(` begins every expression.
    ExprStart,
    /// `)` ends an expression or sub-expression.
    ExprEnd,
    /// `<=` introduces a rule.
    LeftDoubleArrow,
    /// `?` marks a variable.
    QuestionMark,
    Keyword(Keyword),
    Identifier(String),
    /// A run of decimal digits. Range is the grammar's problem.
    Integer(String),
    /// From `;` up to, not including, the newline.
    LineComment(String),
    /// Input that no token can represent, kept verbatim.
    Unexpected(String),
    Eof,
}

/// Image of [`TokenKind::Eof`]. It should never appear in real output.
const EOF_IMAGE: &str = "\u{1A}";

impl TokenKind {
    pub fn type_str(&self) -> &'static str {
        match self {
            TokenKind::ExprStart => "OPEN_PAREN",
            TokenKind::ExprEnd => "CLOSE_PAREN",
            TokenKind::LeftDoubleArrow => "ARROW_LD",
            TokenKind::QuestionMark => "QUE_MARK",
            TokenKind::Keyword(_) => "KEYWORD",
            TokenKind::Identifier(_) => "IDENT",
            TokenKind::Integer(_) => "INTEGER",
            TokenKind::LineComment(_) => "COMMENT",
            TokenKind::Unexpected(_) => "UNEXPECTED",
            TokenKind::Eof => "EOF",
        }
    }

    /// The source text this kind stands for.
    pub fn image(&self) -> &str {
        match self {
            TokenKind::ExprStart => "(",
            TokenKind::ExprEnd => ")",
            TokenKind::LeftDoubleArrow => "<=",
            TokenKind::QuestionMark => "?",
            TokenKind::Keyword(keyword) => keyword.as_str(),
            TokenKind::Identifier(image)
            | TokenKind::Integer(image)
            | TokenKind::LineComment(image)
            | TokenKind::Unexpected(image) => image,
            TokenKind::Eof => EOF_IMAGE,
        }
    }
}

/// The fixed GDL keyword vocabulary. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Relations with special meaning in GDL.
    Role,
    Legal,
    Next,
    Does,
    Goal,
    Terminal,
    // GDL-II additions.
    Sees,
    Random,
    // Derivable, but conventionally reserved.
    Init,
    Input,
    // Logical relations GDL assumes.
    True,
    Or,
    And,
    Not,
}

impl Keyword {
    pub const ALL: [Keyword; 14] = [
        Keyword::Role,
        Keyword::Legal,
        Keyword::Next,
        Keyword::Does,
        Keyword::Goal,
        Keyword::Terminal,
        Keyword::Sees,
        Keyword::Random,
        Keyword::Init,
        Keyword::Input,
        Keyword::True,
        Keyword::Or,
        Keyword::And,
        Keyword::Not,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Role => "role",
            Keyword::Legal => "legal",
            Keyword::Next => "next",
            Keyword::Does => "does",
            Keyword::Goal => "goal",
            Keyword::Terminal => "terminal",
            Keyword::Sees => "sees",
            Keyword::Random => "random",
            Keyword::Init => "init",
            Keyword::Input => "input",
            Keyword::True => "true",
            Keyword::Or => "or",
            Keyword::And => "and",
            Keyword::Not => "not",
        }
    }

    pub fn from_image(image: &str) -> Option<Keyword> {
        match image {
            "role" => Some(Keyword::Role),
            "legal" => Some(Keyword::Legal),
            "next" => Some(Keyword::Next),
            "does" => Some(Keyword::Does),
            "goal" => Some(Keyword::Goal),
            "terminal" => Some(Keyword::Terminal),
            "sees" => Some(Keyword::Sees),
            "random" => Some(Keyword::Random),
            "init" => Some(Keyword::Init),
            "input" => Some(Keyword::Input),
            "true" => Some(Keyword::True),
            "or" => Some(Keyword::Or),
            "and" => Some(Keyword::And),
            "not" => Some(Keyword::Not),
            _ => None,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
