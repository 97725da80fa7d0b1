//! Common types for the virtual-registry interception layer.
//!
//! This crate provides the shared vocabulary between the guest-side hook
//! bridge and the virtual registry engine:
//!
//! - [`GuestHandle`]: pointer-sized opaque key handles as seen by the guest
//! - [`VirtualKeyId`]: 32-bit key identifiers used by the registry engine
//! - [`ValueKind`]: native registry value-type codes (REG_SZ, REG_DWORD, ...)
//! - [`VirtualRegistryValue`]: a named, typed byte payload stored under a key
//! - [`NativeStatus`]: the wire-level numeric status space (WinError codes)
//! - [`RegistryError`]: the internal tagged error taxonomy

mod handle;
mod status;
mod value;

pub use handle::{GuestHandle, VirtualKeyId};
pub use status::{NativeStatus, RegistryError, RegistryResult};
pub use value::{CreationDisposition, ValueKind, VirtualRegistryValue};
