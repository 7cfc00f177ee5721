use std::io::{self, Read};

use super::error::StreamError;

/// A pull source of Unicode characters.
///
/// A source is read by exactly one [`Cursor`](super::Cursor); nothing here
/// supports seeking or sharing, so give each tokenizer its own source.
pub trait RuneSource {
    /// Returns the next character, or [`StreamError::EndOfStream`] once the
    /// input is exhausted.
    fn read_rune(&mut self) -> Result<char, StreamError>;
}

impl<S: RuneSource + ?Sized> RuneSource for &mut S {
    fn read_rune(&mut self) -> Result<char, StreamError> {
        (**self).read_rune()
    }
}

/// Characters of an in-memory string.
pub struct StrSource<'src> {
    chars: std::str::Chars<'src>,
}

impl<'src> StrSource<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            chars: source.chars(),
        }
    }
}

impl RuneSource for StrSource<'_> {
    fn read_rune(&mut self) -> Result<char, StreamError> {
        self.chars.next().ok_or(StreamError::EndOfStream)
    }
}

/// Decodes UTF-8 from a byte stream one character at a time.
///
/// Reads a byte at a time, so wrap unbuffered readers in a `BufReader`.
/// Malformed or truncated sequences decode to U+FFFD and decoding resumes
/// at the following byte.
pub struct ReaderSource<R> {
    inner: R,
    buf: [u8; 4],
    len: usize,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: [0; 4],
            len: 0,
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>, StreamError> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Buffers up to `want` bytes; fewer only when the input ends.
    fn fill(&mut self, want: usize) -> Result<(), StreamError> {
        while self.len < want {
            match self.read_byte()? {
                Some(byte) => {
                    self.buf[self.len] = byte;
                    self.len += 1;
                }
                None => break,
            }
        }
        Ok(())
    }

    fn shift(&mut self, count: usize) {
        self.buf.copy_within(count..self.len, 0);
        self.len -= count;
    }
}

impl<R: Read> RuneSource for ReaderSource<R> {
    fn read_rune(&mut self) -> Result<char, StreamError> {
        self.fill(1)?;
        if self.len == 0 {
            return Err(StreamError::EndOfStream);
        }

        let width = sequence_width(self.buf[0]);
        if width == 0 {
            self.shift(1);
            return Ok(char::REPLACEMENT_CHARACTER);
        }
        self.fill(width)?;

        let decoded = if self.len >= width {
            std::str::from_utf8(&self.buf[..width])
                .ok()
                .and_then(|s| s.chars().next())
        } else {
            None
        };
        match decoded {
            Some(c) => {
                self.shift(width);
                Ok(c)
            }
            None => {
                self.shift(1);
                Ok(char::REPLACEMENT_CHARACTER)
            }
        }
    }
}

/// Length of the UTF-8 sequence introduced by `lead`, zero if `lead` cannot
/// start one.
fn sequence_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}
