//! Guest handle and internal key identifier types.
//!
//! The guest hands the bridge pointer-sized opaque handles; the registry
//! engine works with 32-bit key identifiers. The two types here pin down
//! that translation: decoding range-checks the pointer-sized value into the
//! 32-bit space, encoding zero-extends back. Neither side ever dereferences
//! a handle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-bit key identifier used by the virtual registry engine.
///
/// Each id in use maps to exactly one currently-open key context; the
/// engine owns that invariant, this type only carries the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VirtualKeyId(u32);

impl VirtualKeyId {
    /// Creates a key id from its raw 32-bit value.
    pub const fn from_raw(raw: u32) -> Self {
        VirtualKeyId(raw)
    }

    /// Returns the raw 32-bit value.
    pub const fn as_raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for VirtualKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pointer-sized opaque key handle as seen by the guest.
///
/// Handles are never dereferenced, only decoded. A handle is valid for
/// decoding when its numeric value fits the unsigned 32-bit internal id
/// space; whether the decoded id refers to an open key is for the engine
/// to decide.
///
/// # Examples
///
/// ```
/// use vreg_types::{GuestHandle, VirtualKeyId};
///
/// let id = VirtualKeyId::from_raw(7);
/// let handle = GuestHandle::from(id);
/// assert_eq!(handle.decode(), Some(id));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuestHandle(usize);

impl GuestHandle {
    /// The null handle.
    pub const NULL: GuestHandle = GuestHandle(0);

    /// Creates a handle from the raw pointer-sized value the guest passed.
    pub const fn from_raw(raw: usize) -> Self {
        GuestHandle(raw)
    }

    /// Returns the raw pointer-sized value.
    pub const fn as_raw(&self) -> usize {
        self.0
    }

    /// Returns true if this is the null handle.
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Decodes the handle into the engine's 32-bit id space.
    ///
    /// Returns `None` for any value outside the unsigned 32-bit domain.
    /// Wide handles from a 64-bit guest are rejected rather than silently
    /// truncated.
    pub fn decode(&self) -> Option<VirtualKeyId> {
        u32::try_from(self.0).ok().map(VirtualKeyId)
    }
}

impl From<VirtualKeyId> for GuestHandle {
    /// Zero-extending inverse of [`GuestHandle::decode`].
    fn from(id: VirtualKeyId) -> Self {
        GuestHandle(id.as_raw() as usize)
    }
}

impl fmt::Display for GuestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
