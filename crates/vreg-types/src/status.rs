//! Native status codes and the internal error taxonomy.
//!
//! The guest observes plain WinError numerics; internally the bridge and
//! engine work with a tagged error type. [`NativeStatus`] is the canonical
//! wire domain and every [`RegistryError`] maps onto it deterministically,
//! so the original numeric status can always be reconstructed.

use std::fmt;
use thiserror::Error;

/// Wire-level status codes matching the native registry API.
///
/// These values correspond to the WinError `LSTATUS` codes the real API
/// returns from its registry entry points.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeStatus {
    Success = 0,
    FileNotFound = 2,
    AccessDenied = 5,
    InvalidHandle = 6,
    GenFailure = 31,
    MoreData = 234,
    BadKey = 1010,
}

impl NativeStatus {
    /// Creates a NativeStatus from a raw numeric code.
    ///
    /// Unknown codes collapse to `GenFailure`.
    pub fn from_raw(status: i32) -> Self {
        match status {
            0 => NativeStatus::Success,
            2 => NativeStatus::FileNotFound,
            5 => NativeStatus::AccessDenied,
            6 => NativeStatus::InvalidHandle,
            234 => NativeStatus::MoreData,
            1010 => NativeStatus::BadKey,
            _ => NativeStatus::GenFailure,
        }
    }

    /// Returns the raw numeric code the guest sees.
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    /// Returns true if the status indicates success.
    pub fn is_success(&self) -> bool {
        *self == NativeStatus::Success
    }

    /// Returns true if the status indicates an error.
    pub fn is_error(&self) -> bool {
        *self != NativeStatus::Success
    }
}

impl fmt::Display for NativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NativeStatus::Success => "ERROR_SUCCESS",
            NativeStatus::FileNotFound => "ERROR_FILE_NOT_FOUND",
            NativeStatus::AccessDenied => "ERROR_ACCESS_DENIED",
            NativeStatus::InvalidHandle => "ERROR_INVALID_HANDLE",
            NativeStatus::GenFailure => "ERROR_GEN_FAILURE",
            NativeStatus::MoreData => "ERROR_MORE_DATA",
            NativeStatus::BadKey => "ERROR_BADKEY",
        };
        write!(f, "{}", s)
    }
}

/// Error type for virtual registry operations.
///
/// This is the internal taxonomy; the wire only ever sees the
/// [`NativeStatus`] obtained through [`RegistryError::status`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The handle does not refer to an open key context.
    #[error("invalid key handle")]
    InvalidHandle,

    /// The requested key does not exist.
    #[error("key not found: {path}")]
    KeyNotFound { path: String },

    /// The requested value does not exist under the key.
    #[error("value not found: {name}")]
    ValueNotFound { name: String },

    /// Malformed or absent subkey on a create-style operation.
    #[error("bad key")]
    BadKey,

    /// The engine refused the operation.
    #[error("access denied: {reason}")]
    AccessDenied { reason: String },

    /// Opaque engine failure.
    #[error("registry engine failure: {message}")]
    Engine { message: String },
}

impl RegistryError {
    /// Creates a key-not-found error.
    pub fn key_not_found(path: impl Into<String>) -> Self {
        RegistryError::KeyNotFound { path: path.into() }
    }

    /// Creates a value-not-found error.
    pub fn value_not_found(name: impl Into<String>) -> Self {
        RegistryError::ValueNotFound { name: name.into() }
    }

    /// Creates an access-denied error.
    pub fn access_denied(reason: impl Into<String>) -> Self {
        RegistryError::AccessDenied {
            reason: reason.into(),
        }
    }

    /// Creates an opaque engine failure.
    pub fn engine(message: impl Into<String>) -> Self {
        RegistryError::Engine {
            message: message.into(),
        }
    }

    /// Deterministic mapping into the wire-level status space.
    pub fn status(&self) -> NativeStatus {
        match self {
            RegistryError::InvalidHandle => NativeStatus::InvalidHandle,
            RegistryError::KeyNotFound { .. } | RegistryError::ValueNotFound { .. } => {
                NativeStatus::FileNotFound
            }
            RegistryError::BadKey => NativeStatus::BadKey,
            RegistryError::AccessDenied { .. } => NativeStatus::AccessDenied,
            RegistryError::Engine { .. } => NativeStatus::GenFailure,
        }
    }
}

impl From<RegistryError> for NativeStatus {
    fn from(err: RegistryError) -> Self {
        err.status()
    }
}

/// Result type for virtual registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
