use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const MANIFEST_FILE: &str = "ggdl.toml";

/// The parsed ggdl.toml manifest.
#[derive(Debug, Clone)]
pub struct GgdlManifest {
    pub lexer: LexerConfig,
}

/// Settings for the tokenizer and the tools that drive it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LexerConfig {
    /// Buffer size of the token channel. Zero makes every token a rendezvous
    /// with the consumer.
    #[serde(default)]
    pub channel_capacity: usize,
    /// Hide comment tokens when displaying a token stream. The stream itself
    /// always carries them.
    #[serde(default)]
    pub skip_comments: bool,
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 0,
            skip_comments: false,
        }
    }
}

/// Raw TOML structure for deserialization.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    lexer: Option<LexerConfig>,
}

/// Errors that can occur when loading a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("no ggdl.toml found (searched from {0})")]
    NotFound(String),
    #[error("failed to read ggdl.toml: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("invalid ggdl.toml: {0}")]
    ParseError(String),
}

/// Walk up from `start_dir` looking for `ggdl.toml`.
pub fn find_manifest(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let candidate = current.join(MANIFEST_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load a ggdl.toml manifest from a file path.
pub fn load_manifest(path: &Path) -> Result<GgdlManifest, ManifestError> {
    let content = std::fs::read_to_string(path)?;
    parse_manifest(&content)
}

/// Parse a ggdl.toml manifest from a string.
pub fn parse_manifest(content: &str) -> Result<GgdlManifest, ManifestError> {
    let raw: RawManifest =
        toml::from_str(content).map_err(|e| ManifestError::ParseError(e.to_string()))?;

    Ok(GgdlManifest {
        lexer: raw.lexer.unwrap_or_default(),
    })
}

/// Find and load the manifest starting from a source file's directory.
pub fn find_and_load_manifest(source_file: &Path) -> Result<GgdlManifest, ManifestError> {
    let start_dir = source_file.parent().unwrap_or_else(|| Path::new("."));
    let manifest_path = find_manifest(start_dir)
        .ok_or_else(|| ManifestError::NotFound(start_dir.display().to_string()))?;
    load_manifest(&manifest_path)
}
