//! Fatal error types for the Quadrate front-end.
//!
//! Malformed source never produces an [`Error`]: lexical and syntax problems
//! are recovered from and collected as [`Diagnostic`](crate::Diagnostic)s.
//! An [`Error`] means the pass itself could not continue, for example because
//! the token stream could not be allocated, and it always reaches the caller.
//!
//! # Examples
//!
//! ```rust
//! use quadrate_syntax::error::{Error, Result};
//!
//! fn buffer_tokens(n: usize) -> Result<Vec<u32>> {
//!     let mut v = Vec::new();
//!     v.try_reserve(n).map_err(|e| Error::out_of_memory("token stream", e))?;
//!     Ok(v)
//! }
//!
//! assert!(buffer_tokens(16).is_ok());
//! assert!(matches!(buffer_tokens(usize::MAX), Err(Error::OutOfMemory { .. })));
//! ```

use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// An unrecoverable front-end failure.
#[derive(Debug, Error)]
pub enum Error {
    /// Memory for the named structure could not be reserved.
    #[error("out of memory while allocating the {what}")]
    OutOfMemory {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },

    /// A source file could not be read or written.
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn out_of_memory(what: &'static str, source: TryReserveError) -> Self {
        Error::OutOfMemory { what, source }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// A specialized `Result` type for fatal front-end failures.
pub type Result<T> = std::result::Result<T, Error>;

/// Pushes onto `vec`, reporting allocation failure instead of aborting.
pub fn try_push<T>(vec: &mut Vec<T>, value: T, what: &'static str) -> Result<()> {
    vec.try_reserve(1)
        .map_err(|e| Error::out_of_memory(what, e))?;
    vec.push(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_push_appends() {
        let mut v = Vec::new();
        try_push(&mut v, 1, "test vector").unwrap();
        try_push(&mut v, 2, "test vector").unwrap();
        assert_eq!(v, [1, 2]);
    }

    #[test]
    fn test_out_of_memory_message() {
        let err = Vec::<u64>::new().try_reserve(usize::MAX).unwrap_err();
        let err = Error::out_of_memory("token stream", err);
        assert_eq!(
            err.to_string(),
            "out of memory while allocating the token stream"
        );
    }

    #[test]
    fn test_io_message_names_path() {
        let err = Error::io(
            "missing.qd",
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );
        assert_eq!(err.to_string(), "failed to access missing.qd: not found");
    }
}
