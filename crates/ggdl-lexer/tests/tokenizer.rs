//! End-to-end tokenizer tests: source text → token channel → verify.

use std::io;
use std::sync::Arc;

use ggdl_common::{LexerConfig, Position};
use ggdl_lexer::lexer::cursor::advance_over;
use ggdl_lexer::lexer::{Keyword, ReaderSource, RuneSource, StrSource, StreamError};
use ggdl_lexer::{tokenize, tokenize_str, Token, TokenKind, Tokenizer};
use proptest::prelude::*;

const FIXTURE: &str = "(<= (next ?x fun)\n  (does ?x ?y) (fun ?p ?y)) ;; does arity oddity \"intended\n( fun 69 gøød ) \n";

/// (type, line, column, image) for every token but the sentinel.
fn summary(tokens: &[Token]) -> Vec<(&'static str, u32, u32, String)> {
    tokens
        .iter()
        .filter(|t| !t.is_eof())
        .map(|t| (t.type_str(), t.line(), t.column(), t.image().to_string()))
        .collect()
}

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize_str(source).into_iter().map(|t| t.kind).collect()
}

/// Yields the given characters, then fails with a non-EOF error.
struct FailsAfter {
    chars: std::vec::IntoIter<char>,
}

impl FailsAfter {
    fn new(prefix: &str) -> Self {
        Self {
            chars: prefix.chars().collect::<Vec<_>>().into_iter(),
        }
    }
}

impl RuneSource for FailsAfter {
    fn read_rune(&mut self) -> Result<char, StreamError> {
        match self.chars.next() {
            Some(c) => Ok(c),
            None => Err(io::Error::new(io::ErrorKind::Other, "dowhatnow?").into()),
        }
    }
}

fn buffered(capacity: usize) -> LexerConfig {
    LexerConfig {
        channel_capacity: capacity,
        ..LexerConfig::default()
    }
}

// =========================================================================
// Fixture
// =========================================================================

#[test]
fn fixture_token_stream() {
    let tokens = tokenize_str(FIXTURE);
    let want: Vec<(&str, u32, u32, &str)> = vec![
        ("OPEN_PAREN", 1, 1, "("),
        ("ARROW_LD", 1, 2, "<="),
        ("OPEN_PAREN", 1, 5, "("),
        ("KEYWORD", 1, 6, "next"),
        ("QUE_MARK", 1, 11, "?"),
        ("IDENT", 1, 12, "x"),
        ("IDENT", 1, 14, "fun"),
        ("CLOSE_PAREN", 1, 17, ")"),
        ("OPEN_PAREN", 2, 3, "("),
        ("KEYWORD", 2, 4, "does"),
        ("QUE_MARK", 2, 9, "?"),
        ("IDENT", 2, 10, "x"),
        ("QUE_MARK", 2, 12, "?"),
        ("IDENT", 2, 13, "y"),
        ("CLOSE_PAREN", 2, 14, ")"),
        ("OPEN_PAREN", 2, 16, "("),
        ("IDENT", 2, 17, "fun"),
        ("QUE_MARK", 2, 21, "?"),
        ("IDENT", 2, 22, "p"),
        ("QUE_MARK", 2, 24, "?"),
        ("IDENT", 2, 25, "y"),
        ("CLOSE_PAREN", 2, 26, ")"),
        ("CLOSE_PAREN", 2, 27, ")"),
        ("COMMENT", 2, 29, ";; does arity oddity \"intended"),
        ("OPEN_PAREN", 3, 1, "("),
        ("IDENT", 3, 3, "fun"),
        ("INTEGER", 3, 7, "69"),
        ("IDENT", 3, 10, "gøød"),
        ("CLOSE_PAREN", 3, 15, ")"),
    ];
    let want: Vec<_> = want
        .into_iter()
        .map(|(ty, line, col, image)| (ty, line, col, image.to_string()))
        .collect();

    assert_eq!(summary(&tokens), want);
    assert_eq!(tokens.last(), Some(&Token::EOF));
    assert_eq!(tokens.len(), want.len() + 1);
}

#[test]
fn fixture_through_reader_source() {
    let from_reader = tokenize(ReaderSource::new(FIXTURE.as_bytes())).unwrap();
    assert_eq!(from_reader, tokenize_str(FIXTURE));
}

#[test]
fn fixture_modes() {
    let tokens = tokenize_str(FIXTURE);
    for token in &tokens {
        match token.kind {
            TokenKind::LineComment(_) => assert!(token.pos.is_comment(), "{token}"),
            TokenKind::Eof => assert!(token.pos.is_unknown()),
            _ => assert!(token.pos.is_sentence(), "{token}"),
        }
    }
}

// =========================================================================
// Stream lifecycle
// =========================================================================

#[test]
fn single_eof_sentinel_last() {
    for source in ["", "   ", "(role robot)", "; only a comment", "123", "<"] {
        let tokens = tokenize_str(source);
        let eofs = tokens.iter().filter(|t| t.is_eof()).count();
        assert_eq!(eofs, 1, "{source:?}");
        assert!(tokens.last().is_some_and(Token::is_eof), "{source:?}");
        assert!(tokens.last().is_some_and(|t| t.pos == Position::UNKNOWN));
    }
}

#[test]
fn idempotent_after_end_of_stream() {
    let (mut tokenizer, receiver) =
        Tokenizer::with_config(StrSource::new("(init x)"), &buffered(16));
    assert_eq!(tokenizer.read_all(), Ok(()));
    let cursor = tokenizer.cursor().clone();

    for _ in 0..3 {
        assert_eq!(tokenizer.next_token(), Err(StreamError::EndOfStream));
        assert_eq!(tokenizer.cursor(), &cursor);
    }

    let received: Vec<Token> = receiver.iter().collect();
    assert_eq!(received.len(), 5);
    assert_eq!(received.last(), Some(&Token::EOF));
    assert!(receiver.recv().is_err());
}

#[test]
fn read_failure_stops_without_sentinel() {
    let (mut tokenizer, receiver) =
        Tokenizer::with_config(FailsAfter::new("aa"), &buffered(16));

    let err = tokenizer.read_all().unwrap_err();
    assert_eq!(err.to_string(), "dowhatnow?");
    assert!(matches!(err, StreamError::Io(_)));

    let received: Vec<Token> = receiver.iter().collect();
    assert_eq!(
        received,
        vec![Token::new(
            TokenKind::Identifier("aa".into()),
            Position::new(1, 1).in_sentence()
        )]
    );

    assert_eq!(tokenizer.next_token(), Err(err.clone()));
    assert_eq!(tokenizer.next_token(), Err(err));
}

#[test]
fn immediate_read_failure_sends_nothing() {
    let (mut tokenizer, receiver) = Tokenizer::channel(FailsAfter::new(""));
    let err = tokenizer.next_token().unwrap_err();
    assert_eq!(err.to_string(), "dowhatnow?");
    assert!(receiver.recv().is_err());
}

#[test]
fn read_all_returns_immediate_failure_unchanged() {
    let (mut tokenizer, receiver) = Tokenizer::with_config(FailsAfter::new(""), &buffered(4));
    let expected = StreamError::Io(Arc::new(io::Error::new(io::ErrorKind::Other, "dowhatnow?")));

    assert_eq!(tokenizer.read_all(), Err(expected.clone()));
    assert_eq!(receiver.iter().count(), 0);
    assert_eq!(tokenizer.read_all(), Err(expected));
}

#[test]
fn tokenize_reports_read_failure() {
    let err = tokenize(FailsAfter::new("(role")).unwrap_err();
    let expected = StreamError::Io(Arc::new(io::Error::new(io::ErrorKind::Other, "dowhatnow?")));
    assert_eq!(err, expected);
}

#[test]
fn rendezvous_channel_hands_over_in_order() {
    let (mut tokenizer, receiver) = Tokenizer::channel(StrSource::new("(legal ?r 1)"));
    let consumer = std::thread::spawn(move || receiver.iter().map(|t| t.kind).collect::<Vec<_>>());
    assert_eq!(tokenizer.read_all(), Ok(()));
    drop(tokenizer);
    assert_eq!(
        consumer.join().unwrap(),
        vec![
            TokenKind::ExprStart,
            TokenKind::Keyword(Keyword::Legal),
            TokenKind::QuestionMark,
            TokenKind::Identifier("r".into()),
            TokenKind::Integer("1".into()),
            TokenKind::ExprEnd,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn consumer_hang_up_halts_producer() {
    let (mut tokenizer, receiver) = Tokenizer::with_config(StrSource::new("(a b c)"), &buffered(1));
    assert_eq!(tokenizer.next_token(), Ok(()));
    assert_eq!(receiver.recv().map(|t| t.kind), Ok(TokenKind::ExprStart));
    drop(receiver);
    assert_eq!(tokenizer.read_all(), Err(StreamError::Disconnected));
    assert_eq!(tokenizer.next_token(), Err(StreamError::Disconnected));
}

// =========================================================================
// Lexemes
// =========================================================================

#[test]
fn keyword_boundary() {
    assert_eq!(
        kinds("role roles Role"),
        vec![
            TokenKind::Keyword(Keyword::Role),
            TokenKind::Identifier("roles".into()),
            TokenKind::Identifier("Role".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn every_keyword_is_recognized() {
    for keyword in Keyword::ALL {
        let source = format!("({keyword})");
        assert_eq!(kinds(&source)[1], TokenKind::Keyword(keyword), "{source}");
    }
}

#[test]
fn tab_stops() {
    let column_of_paren = |source: &str| {
        tokenize_str(source)
            .into_iter()
            .find(|t| t.kind == TokenKind::ExprStart)
            .map(|t| t.column())
    };
    assert_eq!(column_of_paren("\t("), Some(4));
    assert_eq!(column_of_paren("ab\t("), Some(4));
    assert_eq!(column_of_paren("abc\t("), Some(8));
    assert_eq!(column_of_paren("abcd\t("), Some(8));
    assert_eq!(column_of_paren("\t\t("), Some(8));
    assert_eq!(column_of_paren("x\n\t("), Some(4));
}

#[test]
fn left_arrow_lookahead() {
    let unexpected = |image: &str| TokenKind::Unexpected(image.into());
    assert_eq!(kinds("<="), vec![TokenKind::LeftDoubleArrow, TokenKind::Eof]);
    assert_eq!(kinds("<"), vec![unexpected("<"), TokenKind::Eof]);
    assert_eq!(
        kinds("< ="),
        vec![unexpected("<"), unexpected("="), TokenKind::Eof]
    );
    assert_eq!(
        kinds("<?x"),
        vec![
            unexpected("<"),
            TokenKind::QuestionMark,
            TokenKind::Identifier("x".into()),
            TokenKind::Eof,
        ]
    );
    assert_eq!(
        kinds("<a"),
        vec![unexpected("<"), TokenKind::Identifier("a".into()), TokenKind::Eof]
    );
}

#[test]
fn comment_then_next_line() {
    let tokens = tokenize_str("; setup\n(role x)");
    assert_eq!(tokens[0].image(), "; setup");
    assert_eq!((tokens[1].line(), tokens[1].column()), (2, 1));
}

#[test]
fn bad_input_never_stops_scanning() {
    let tokens = tokenize_str("(a ! 1 # b)");
    assert_eq!(
        summary(&tokens),
        vec![
            ("OPEN_PAREN", 1, 1, "(".to_string()),
            ("IDENT", 1, 2, "a".to_string()),
            ("UNEXPECTED", 1, 4, "!".to_string()),
            ("INTEGER", 1, 6, "1".to_string()),
            ("UNEXPECTED", 1, 8, "#".to_string()),
            ("IDENT", 1, 10, "b".to_string()),
            ("CLOSE_PAREN", 1, 11, ")".to_string()),
        ]
    );
}

#[test]
fn invalid_utf8_surfaces_as_unexpected() {
    let bytes: &[u8] = b"(a \xFF)";
    let tokens = tokenize(ReaderSource::new(bytes)).unwrap();
    assert_eq!(tokens[2].kind, TokenKind::Unexpected("\u{FFFD}".into()));
    assert_eq!(tokens[3].kind, TokenKind::ExprEnd);
}

// =========================================================================
// Properties
// =========================================================================

/// Walks `source` alongside `tokens`, checking that each token's image sits
/// at the token's position once skipped whitespace is accounted for.
fn check_reconstruction(source: &str, tokens: &[Token]) -> Result<(), TestCaseError> {
    let mut rest = source;
    let mut pos = Position::new(1, 1);

    for token in tokens.iter().filter(|t| !t.is_eof()) {
        let trimmed = rest.trim_start();
        pos = advance_over(pos, rest[..rest.len() - trimmed.len()].chars());
        rest = trimmed;

        let image = token.image();
        prop_assert!(
            rest.starts_with(image),
            "token {} does not match remaining text {:?}",
            token,
            rest
        );
        prop_assert!(
            token.pos.same_place(pos),
            "token {} expected at {}",
            token,
            pos
        );
        pos = advance_over(pos, image.chars());
        rest = &rest[image.len()..];
    }

    prop_assert!(rest.trim_start().is_empty(), "unscanned text {:?}", rest);
    Ok(())
}

proptest! {
    #[test]
    fn tokens_reconstruct_source(source in "[()<=?;a-zR09ø!# \t\n-]{0,48}") {
        let tokens = tokenize_str(&source);
        check_reconstruction(&source, &tokens)?;

        prop_assert_eq!(tokens.iter().filter(|t| t.is_eof()).count(), 1);
        prop_assert!(tokens.last().is_some_and(Token::is_eof));
    }

    #[test]
    fn positions_never_go_backwards(source in "[()?;a-z0-9 \t\n]{0,48}") {
        let tokens = tokenize_str(&source);
        let positions: Vec<_> = tokens
            .iter()
            .filter(|t| !t.is_eof())
            .map(|t| (t.line(), t.column()))
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
