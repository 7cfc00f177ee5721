pub mod errors;
pub mod manifest;
pub mod position;

pub use errors::{Diagnostic, DiagnosticBag};
pub use manifest::{GgdlManifest, LexerConfig, ManifestError};
pub use position::{Mode, Position, Span};
