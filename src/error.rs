/// Crate-level error types for classref diagnostics.
use std::path::PathBuf;

/// All errors in classref carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, root, or class involved.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `composer.json` exists but cannot be understood.
    #[error("invalid composer.json: {}: {reason}", path.display())]
    ComposerInvalid {
        /// Path to the composer file.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// A copy would overwrite an existing file.
    #[error("destination already exists: {}", path.display())]
    DestinationExists {
        /// The file that is already there.
        path: PathBuf,
    },

    /// Source file exceeds the size limit.
    #[error("file too large ({size_bytes} bytes, max {max_bytes}): {}", file.display())]
    FileTooLarge {
        /// File that exceeded the size limit.
        file: PathBuf,
        /// Maximum allowed file size in bytes.
        max_bytes: u64,
        /// Actual file size in bytes.
        size_bytes: u64,
    },

    /// `git ls-files` could not list the root.
    #[error("git failed in {}: {reason}", root.display())]
    GitFailed {
        /// Reason reported by git, or the spawn error.
        reason: String,
        /// Directory git was run in.
        root: PathBuf,
    },

    /// Input is neither a valid class name nor a path.
    #[error("invalid class name: `{input}`")]
    InvalidName {
        /// The rejected input.
        input: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON (de)serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// The source parser could not process a file.
    #[error("parse failed: {}: {reason}", file.display())]
    ParseFailed {
        /// File that failed to parse.
        file: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// A listed file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    ReadFailed {
        /// File that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A reference span did not hold the expected name when rewriting.
    #[error("cannot replace `{expected}` at {start}..{end} in {}", file.display())]
    ReplaceFailed {
        /// End byte offset of the span.
        end: usize,
        /// The name that should have been at the span.
        expected: String,
        /// File being rewritten.
        file: PathBuf,
        /// Start byte offset of the span.
        start: usize,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// No named root matches the requested name.
    #[error("unknown root: `{name}` (known: {})", known.join(", "))]
    UnknownRoot {
        /// Names of all registered roots.
        known: Vec<String>,
        /// The requested root name.
        name: String,
    },

    /// No autoload prefix covers this class.
    #[error("no autoload mapping for class `{class}`")]
    UnmappedClass {
        /// The class that could not be mapped to a file.
        class: String,
    },

    /// No autoload directory contains this path.
    #[error("no autoload mapping for path: {}", path.display())]
    UnmappedPath {
        /// The path that could not be mapped to a class.
        path: PathBuf,
    },

    /// Persisting rewritten contents failed.
    #[error("cannot write {}: {source}", path.display())]
    WriteFailed {
        /// File that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
