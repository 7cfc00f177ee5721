pub mod charclass;
pub mod cursor;
pub mod error;
pub mod source;
pub mod token;

mod scanner;

pub use cursor::Cursor;
pub use error::StreamError;
pub use scanner::{diagnostics, tokenize, tokenize_str, Tokenizer};
pub use source::{ReaderSource, RuneSource, StrSource};
pub use token::{Keyword, Token, TokenKind};
