pub mod lexer;

pub use lexer::{tokenize, tokenize_str, Token, TokenKind, Tokenizer};
