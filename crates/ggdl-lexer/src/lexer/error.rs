use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Why a token stream stopped.
///
/// Errors are sticky on the [`Cursor`](super::Cursor) and handed back on every
/// later call, so they must be cheap to clone; I/O errors are shared behind
/// an `Arc` for that reason.
#[derive(Error, Debug, Clone)]
pub enum StreamError {
    /// The input ran out. This is the normal way for a stream to end.
    #[error("end of stream")]
    EndOfStream,

    #[error("{0}")]
    Io(Arc<io::Error>),

    /// The consumer dropped its receiver before the stream was finished.
    #[error("token receiver disconnected")]
    Disconnected,
}

impl StreamError {
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, StreamError::EndOfStream)
    }
}

impl From<io::Error> for StreamError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            StreamError::EndOfStream
        } else {
            StreamError::Io(Arc::new(err))
        }
    }
}

impl PartialEq for StreamError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (StreamError::EndOfStream, StreamError::EndOfStream) => true,
            (StreamError::Disconnected, StreamError::Disconnected) => true,
            (StreamError::Io(a), StreamError::Io(b)) => {
                Arc::ptr_eq(a, b) || (a.kind() == b.kind() && a.to_string() == b.to_string())
            }
            _ => false,
        }
    }
}

impl Eq for StreamError {}

pub type Result<T> = std::result::Result<T, StreamError>;
