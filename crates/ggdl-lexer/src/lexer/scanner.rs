use crossbeam_channel::{bounded, Receiver, Sender};
use ggdl_common::{Diagnostic, DiagnosticBag, LexerConfig, Position, Span};
use tracing::{debug, trace, warn};

use super::charclass::{is_decimal_digit, is_letter, is_punct_or_symbol};
use super::cursor::{advance_over, Cursor};
use super::error::{Result, StreamError};
use super::source::{RuneSource, StrSource};
use super::token::{Token, TokenKind};

/// Streaming tokenizer for GDL.
///
/// Each [`next_token`](Self::next_token) call scans one token and sends it
/// on the output channel. With the default zero-capacity channel every send
/// waits for the consumer, so a stalled consumer stalls scanning. The
/// stream ends with exactly one [`Token::EOF`] when the input runs out, or
/// with no sentinel when the input fails; either way the channel is closed
/// once, and later calls keep returning the same error.
///
/// Dropping the tokenizer closes the channel as well.
pub struct Tokenizer<S> {
    input: S,
    output: Option<Sender<Token>>,
    cursor: Cursor,
    halted: Option<StreamError>,
}

impl<S: RuneSource> Tokenizer<S> {
    pub fn new(input: S, output: Sender<Token>) -> Self {
        Self {
            input,
            output: Some(output),
            cursor: Cursor::new(),
            halted: None,
        }
    }

    /// Tokenizer wired to a fresh rendezvous channel.
    pub fn channel(input: S) -> (Self, Receiver<Token>) {
        Self::with_config(input, &LexerConfig::default())
    }

    pub fn with_config(input: S, config: &LexerConfig) -> (Self, Receiver<Token>) {
        let (sender, receiver) = bounded(config.channel_capacity);
        (Self::new(input, sender), receiver)
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Scans and sends the next token.
    ///
    /// Returns [`StreamError::EndOfStream`] once the input is exhausted (after
    /// the final token and the sentinel have been sent) and any other error
    /// as soon as it occurs. A bad character is not an error: it arrives as a
    /// [`TokenKind::Unexpected`] token and scanning carries on.
    pub fn next_token(&mut self) -> Result<()> {
        self.status()?;

        let first = self.step(Cursor::peek_first);
        if self.cursor.has_error() {
            self.finish();
            return self.status();
        }

        let token = match first {
            Some(c) if is_punct_or_symbol(c) => self.step(scan_operator),
            Some(c) if is_decimal_digit(c) => self.step(scan_number),
            Some(c) if is_letter(c) => self.step(scan_word),
            _ => self.step(|cursor, _| scan_unexpected(cursor)),
        };

        self.publish(token);
        if self.cursor.has_error() {
            self.finish();
        }
        self.status()
    }

    /// Drives [`next_token`](Self::next_token) until the stream ends. Running
    /// out of input is success; any other error is returned as soon as it
    /// happens.
    pub fn read_all(&mut self) -> Result<()> {
        loop {
            match self.next_token() {
                Ok(()) => {}
                Err(StreamError::EndOfStream) => return Ok(()),
                Err(err) => return Err(err),
            }
        }
    }

    /// Runs one cursor transition against the input and keeps its result.
    fn step<T>(&mut self, transition: impl FnOnce(Cursor, &mut S) -> (Cursor, T)) -> T {
        let cursor = std::mem::take(&mut self.cursor);
        let (cursor, value) = transition(cursor, &mut self.input);
        self.cursor = cursor;
        value
    }

    fn publish(&mut self, token: Token) {
        let Some(output) = &self.output else {
            return;
        };
        trace!(pos = %token.pos, kind = token.type_str(), "token");
        if output.send(token).is_err() {
            warn!("token receiver dropped; halting tokenizer");
            self.halted = Some(StreamError::Disconnected);
            self.output = None;
        }
    }

    /// Sends the sentinel if the input ended normally, then closes the output.
    fn finish(&mut self) {
        if self.cursor.is_end_of_stream() {
            debug!("end of stream");
            self.publish(Token::EOF);
        } else if let Some(err) = self.cursor.error() {
            debug!(error = %err, "input failed, no end-of-stream token");
        }
        if self.output.take().is_some() {
            debug!("token output closed");
        }
    }

    fn status(&self) -> Result<()> {
        if let Some(err) = &self.halted {
            return Err(err.clone());
        }
        match self.cursor.error() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Tokenizes `input` to completion, collecting every token including the
/// final [`Token::EOF`].
///
/// Tokens are handed over through the usual rendezvous channel to a
/// collector thread, so this is a faithful run of the streaming path.
pub fn tokenize<S: RuneSource>(input: S) -> Result<Vec<Token>> {
    let (mut tokenizer, receiver) = Tokenizer::channel(input);
    std::thread::scope(|scope| {
        let collector = scope.spawn(move || receiver.iter().collect::<Vec<_>>());
        let outcome = tokenizer.read_all();
        drop(tokenizer);
        let tokens = match collector.join() {
            Ok(tokens) => tokens,
            Err(panic) => std::panic::resume_unwind(panic),
        };
        outcome.map(|()| tokens)
    })
}

/// Tokenizes a string. Strings cannot fail mid-read, so the stream always
/// ends with [`Token::EOF`].
pub fn tokenize_str(source: &str) -> Vec<Token> {
    match tokenize(StrSource::new(source)) {
        Ok(tokens) => tokens,
        Err(err) => unreachable!("in-memory source failed: {err}"),
    }
}

/// Reports every [`TokenKind::Unexpected`] token in `tokens` as an error.
pub fn diagnostics(tokens: &[Token], file: &str) -> DiagnosticBag {
    let mut bag = DiagnosticBag::new();
    for token in tokens {
        if let TokenKind::Unexpected(image) = &token.kind {
            let end = advance_over(token.pos, image.chars());
            let message = match image.as_str() {
                "<" => "unexpected '<'".to_string(),
                _ => format!("unexpected input {:?}", image),
            };
            let mut diagnostic = Diagnostic::new(message, Span::new(file, token.pos, end));
            if image == "<" {
                diagnostic = diagnostic.with_suggestion("rules are written with '<=' and no space");
            }
            bag.report(diagnostic);
        }
    }
    bag
}

// ---------------------------------------------------------------
// Sub-scanners
//
// Each takes the cursor by value with the lexeme's first character pending
// (or about to be read) and returns the advanced cursor with the token. A
// token's position is the cursor position just before its final consume,
// which is where its image starts.
// ---------------------------------------------------------------

/// `(`, `)`, `?`, `<=` and `;` comments; any other punctuation or symbol is
/// unexpected.
fn scan_operator<S: RuneSource + ?Sized>(cursor: Cursor, input: &mut S) -> (Cursor, Token) {
    let (cursor, first) = cursor.peek_first(input);
    match first {
        Some('(') => scan_single(cursor, TokenKind::ExprStart),
        Some(')') => scan_single(cursor, TokenKind::ExprEnd),
        Some('?') => scan_single(cursor, TokenKind::QuestionMark),
        Some('<') => scan_arrow(cursor, input),
        Some(';') => scan_comment(cursor, input),
        _ => scan_unexpected(cursor),
    }
}

fn scan_single(cursor: Cursor, kind: TokenKind) -> (Cursor, Token) {
    let pos = cursor.pos().in_sentence();
    let (cursor, _) = cursor.consume_all();
    (cursor, Token::new(kind, pos))
}

/// `<` needs one character of lookahead. Without a following `=` the `<`
/// alone is unexpected, and the lookahead is left for the next lexeme.
fn scan_arrow<S: RuneSource + ?Sized>(cursor: Cursor, input: &mut S) -> (Cursor, Token) {
    let (cursor, next) = cursor.read_next(input);
    let pos = cursor.pos().in_sentence();
    match next {
        Some('=') => {
            let (cursor, _) = cursor.consume_all();
            (cursor, Token::new(TokenKind::LeftDoubleArrow, pos))
        }
        Some(_) => {
            let (cursor, image) = cursor.consume_except_final();
            (cursor, Token::new(TokenKind::Unexpected(image), pos))
        }
        None => {
            let (cursor, image) = cursor.consume_all();
            (cursor, Token::new(TokenKind::Unexpected(image), pos))
        }
    }
}

/// From `;` to the end of the line. The newline is consumed separately so
/// the next lexeme starts at column 1.
fn scan_comment<S: RuneSource + ?Sized>(cursor: Cursor, input: &mut S) -> (Cursor, Token) {
    let pos = cursor.pos().in_comment();
    let mut cursor = cursor;
    let mut c = cursor.pending().last().copied();
    while !cursor.has_error() && c != Some('\n') {
        (cursor, c) = cursor.read_next(input);
    }

    let (cursor, image) = if cursor.has_error() {
        cursor.consume_all()
    } else {
        let (cursor, image) = cursor.consume_except_final();
        let (cursor, _newline) = cursor.consume_all();
        (cursor, image)
    };
    (cursor, Token::new(TokenKind::LineComment(image), pos))
}

/// A run of decimal digits.
fn scan_number<S: RuneSource + ?Sized>(cursor: Cursor, input: &mut S) -> (Cursor, Token) {
    let (mut cursor, mut c) = cursor.peek_first(input);
    if !c.is_some_and(is_decimal_digit) {
        return scan_unexpected(cursor);
    }
    while !cursor.has_error() && c.is_some_and(is_decimal_digit) {
        (cursor, c) = cursor.read_next(input);
    }
    let (cursor, pos, image) = finish_run(cursor);
    (cursor, Token::new(TokenKind::Integer(image), pos))
}

/// A letter followed by letters and digits: a keyword or an identifier.
fn scan_word<S: RuneSource + ?Sized>(cursor: Cursor, input: &mut S) -> (Cursor, Token) {
    let (mut cursor, mut c) = cursor.peek_first(input);
    if !c.is_some_and(is_letter) {
        return scan_unexpected(cursor);
    }
    while !cursor.has_error() && c.is_some_and(|c| is_letter(c) || is_decimal_digit(c)) {
        (cursor, c) = cursor.read_next(input);
    }
    let (cursor, pos, image) = finish_run(cursor);
    (cursor, Token::word(image, pos))
}

/// Ends a greedy run. The character that stopped the run stays pending; at
/// the end of input everything pending belongs to the run.
fn finish_run(cursor: Cursor) -> (Cursor, Position, String) {
    let pos = cursor.pos().in_sentence();
    let (cursor, image) = if cursor.has_error() {
        cursor.consume_all()
    } else {
        cursor.consume_except_final()
    };
    (cursor, pos, image)
}

/// Everything pending becomes one unexpected token.
fn scan_unexpected(cursor: Cursor) -> (Cursor, Token) {
    let pos = cursor.pos().in_sentence();
    let (cursor, image) = cursor.consume_all();
    (cursor, Token::new(TokenKind::Unexpected(image), pos))
}
