//! Error types for the skey library.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the skey library.
///
/// Every failure is surfaced to the immediate caller; nothing retries.
/// Credential-store mutations are all-or-nothing, so any error from a store
/// operation leaves the on-disk state as it was.
#[derive(Debug, Error)]
pub enum Error {
    /// The algorithm id or name is not one of md4, md5, sha1 — or, on the
    /// verification path, is anything other than md5.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The seed is not 1 to 16 alphanumeric characters (RFC 2289 section 6.0).
    #[error("invalid seed {seed:?}: must be 1 to 16 alphanumeric characters, got {length}")]
    InvalidSeed { seed: String, length: usize },

    /// The sidecar lock file could not be created or locked.
    #[error("unable to lock {}", .path.display())]
    Lock { path: PathBuf, source: io::Error },

    /// The user database file could not be opened or created.
    #[error("unable to open {}", .path.display())]
    StoreOpen { path: PathBuf, source: io::Error },

    #[error("user not found")]
    UserNotFound(String),

    /// A line matching the requested user is missing required fields.
    #[error("user database corrupted at line {line}")]
    StoreCorrupted { line: usize },

    /// A challenge string lacks the `otp-` prefix or a required field.
    #[error("malformed challenge: {0}")]
    MalformedChallenge(&'static str),

    /// The seed changed between challenge and verification.
    #[error("seed changed between challenge and verification")]
    SeedMismatch,

    /// The sequence number changed between challenge and verification.
    #[error("sequence changed between challenge and verification")]
    SequenceMismatch,

    /// The reply does not hash to the stored previous one-time password.
    #[error("invalid response")]
    InvalidResponse,

    /// Writing or renaming the replacement database file failed. The
    /// original database is untouched.
    #[error("unable to write user database")]
    Write(#[source] io::Error),

    /// Input is not a valid six-word encoding (unknown word, wrong word
    /// count, or checksum failure).
    #[error("invalid six-word encoding")]
    UnsupportedEncoding,

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
