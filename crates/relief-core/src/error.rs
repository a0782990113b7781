//! Error types for Relief

use std::path::{Path, PathBuf};
use thiserror::Error;

/// The main error type for Relief operations
#[derive(Debug, Error)]
pub enum ReliefError {
    #[error("IO error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("Kernel error: {0}")]
    KernelError(String),

    #[error(
        "Resample underflow: rescaled grid is {scaled}x{scaled} but the target needs {target}x{target}; padding is not supported"
    )]
    ResampleUnderflow { scaled: u32, target: u32 },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),
}

/// Errors describing malformed heightmap data
#[derive(Debug, Error)]
pub enum FormatError {
    #[error(
        "Size mismatch{}: expected {expected} bytes for {width}x{height} at {bit_depth}-bit, got {actual}",
        path_suffix(.path)
    )]
    SizeMismatch {
        path: Option<PathBuf>,
        width: u32,
        height: u32,
        bit_depth: u8,
        expected: usize,
        actual: usize,
    },

    #[error(
        "Unrecognized raw heightmap '{}': expected {expected8} bytes (8-bit) or {expected16} bytes (16-bit) for {side}x{side}, got {actual}",
        .path.display()
    )]
    UnrecognizedRawSize {
        path: PathBuf,
        side: u32,
        expected8: usize,
        expected16: usize,
        actual: usize,
    },

    #[error("Failed to decode image '{}': {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("Expected a 16-bit heightmap, got {0}-bit")]
    UnexpectedBitDepth(u8),
}

impl FormatError {
    /// Attach the offending file path to a size mismatch
    pub fn with_path(self, file: &Path) -> Self {
        match self {
            FormatError::SizeMismatch {
                width,
                height,
                bit_depth,
                expected,
                actual,
                ..
            } => FormatError::SizeMismatch {
                path: Some(file.to_path_buf()),
                width,
                height,
                bit_depth,
                expected,
                actual,
            },
            other => other,
        }
    }
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" in '{}'", p.display()),
        None => String::new(),
    }
}

/// Result type alias for Relief operations
pub type Result<T> = std::result::Result<T, ReliefError>;

impl ReliefError {
    /// Wrap an IO error with the path it occurred on
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        ReliefError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True for errors raised because a required collaborator is missing
    pub fn is_dependency_unavailable(&self) -> bool {
        matches!(self, ReliefError::DependencyUnavailable(_))
    }
}

impl From<toml::de::Error> for ReliefError {
    fn from(err: toml::de::Error) -> Self {
        ReliefError::TomlParseError(err.to_string())
    }
}
