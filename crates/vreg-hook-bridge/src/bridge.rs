//! The five-operation call bridge.
//!
//! Each operation follows the same shape: translate the guest handle,
//! short-circuit the documented edge cases, arm the reentrancy exclusion,
//! call the engine, marshal outputs, log the outcome. Handle-decode
//! failures return before the exclusion is armed or the engine is touched,
//! and are not logged.
//!
//! Reply structs model the by-reference outputs of the native contract
//! explicitly: a `Some` field was written, a `None` field was left
//! untouched. The create-with-null-subkey defect of the real API leaves
//! the output handle unwritten, and the ABI layer reproduces exactly that.

use std::sync::Arc;

use vreg_types::{
    CreationDisposition, GuestHandle, NativeStatus, ValueKind, VirtualRegistryValue,
};

use crate::engine::RegistryEngine;
use crate::exclusion::{ExclusionGuard, HookExclusion};
use crate::marshal::{write_value, QueryValueSink};

/// Reply of [`RegistryHookBridge::open_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenKeyReply {
    pub status: NativeStatus,
    /// Resulting key handle; `None` means the output field was not written.
    pub handle: Option<GuestHandle>,
}

/// Reply of [`RegistryHookBridge::create_key_ex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateKeyReply {
    pub status: NativeStatus,
    /// Resulting key handle; `None` means the output field was not written.
    pub handle: Option<GuestHandle>,
    /// Creation disposition; `None` means the output field was not written.
    pub disposition: Option<CreationDisposition>,
}

/// The interception bridge for the registry API family.
///
/// Constructed once per guest process and shared across all hooked
/// threads. Both collaborators are passed in explicitly: the engine owns
/// the virtual store, the exclusion capability suppresses re-interception
/// of the bridge's own forwarding calls.
pub struct RegistryHookBridge {
    engine: Arc<dyn RegistryEngine>,
    exclusion: Arc<dyn HookExclusion>,
}

impl RegistryHookBridge {
    /// Creates a bridge over `engine`, excluding re-interception through
    /// `exclusion`.
    pub fn new(engine: Arc<dyn RegistryEngine>, exclusion: Arc<dyn HookExclusion>) -> Self {
        RegistryHookBridge { engine, exclusion }
    }

    /// Returns the exclusion capability this bridge arms around engine
    /// calls. The hook-installation layer uses it to let excluded calls
    /// through to the real API.
    pub fn exclusion(&self) -> &dyn HookExclusion {
        self.exclusion.as_ref()
    }

    /// Opens a subkey of `h_key` in the virtual registry.
    ///
    /// A `None` subkey is the native "no subkey" sentinel and passes the
    /// handle through unchanged, valid or not.
    pub fn open_key(&self, h_key: GuestHandle, sub_key: Option<&str>) -> OpenKeyReply {
        let Some(sub_key) = sub_key else {
            return OpenKeyReply {
                status: NativeStatus::Success,
                handle: Some(h_key),
            };
        };
        let Some(key_id) = h_key.decode() else {
            return OpenKeyReply {
                status: NativeStatus::InvalidHandle,
                handle: Some(GuestHandle::NULL),
            };
        };

        let _exclusion = ExclusionGuard::enter(self.exclusion.as_ref());
        match self.engine.open_key(key_id, sub_key) {
            Ok(opened) => {
                log::debug!("OpenKey({}\\{}) => {}", h_key, sub_key, opened);
                OpenKeyReply {
                    status: NativeStatus::Success,
                    handle: Some(GuestHandle::from(opened)),
                }
            }
            Err(err) => {
                log::debug!("OpenKey({}\\{}) => {}", h_key, sub_key, err.status());
                OpenKeyReply {
                    status: err.status(),
                    handle: Some(GuestHandle::NULL),
                }
            }
        }
    }

    /// Creates or opens a subkey of `h_key`.
    ///
    /// Class, options, and security parameters of the native signature are
    /// accepted by the ABI layer and uninterpreted here.
    ///
    /// A `None` subkey reproduces a documented native defect: the call
    /// fails with `ERROR_BADKEY`, the disposition reads `NoKeyCreated`,
    /// and the output handle is left unwritten rather than cleared.
    pub fn create_key_ex(&self, h_key: GuestHandle, sub_key: Option<&str>) -> CreateKeyReply {
        let Some(sub_key) = sub_key else {
            return CreateKeyReply {
                status: NativeStatus::BadKey,
                handle: None,
                disposition: Some(CreationDisposition::NoKeyCreated),
            };
        };
        let Some(key_id) = h_key.decode() else {
            return CreateKeyReply {
                status: NativeStatus::InvalidHandle,
                handle: Some(GuestHandle::NULL),
                disposition: Some(CreationDisposition::NoKeyCreated),
            };
        };

        let _exclusion = ExclusionGuard::enter(self.exclusion.as_ref());
        match self.engine.create_key(key_id, sub_key) {
            Ok((created, disposition)) => {
                log::debug!(
                    "CreateKey(HKey={} NewSubKey={}) => {} HKey={}",
                    h_key,
                    sub_key,
                    disposition,
                    created
                );
                CreateKeyReply {
                    status: NativeStatus::Success,
                    handle: Some(GuestHandle::from(created)),
                    disposition: Some(disposition),
                }
            }
            Err(err) => {
                log::debug!(
                    "CreateKey(HKey={} NewSubKey={}) => {}",
                    h_key,
                    sub_key,
                    err.status()
                );
                CreateKeyReply {
                    status: err.status(),
                    handle: Some(GuestHandle::NULL),
                    disposition: Some(CreationDisposition::NoKeyCreated),
                }
            }
        }
    }

    /// Closes the key context bound to `h_key`.
    pub fn close_key(&self, h_key: GuestHandle) -> NativeStatus {
        let Some(key_id) = h_key.decode() else {
            return NativeStatus::InvalidHandle;
        };

        let _exclusion = ExclusionGuard::enter(self.exclusion.as_ref());
        let status = match self.engine.close_key(key_id) {
            Ok(()) => NativeStatus::Success,
            Err(err) => err.status(),
        };
        log::debug!("CloseKey(HKey={}) => {}", key_id, status);
        status
    }

    /// Looks up a value and marshals it into the caller's sink.
    ///
    /// A `None` or empty value name always fails with
    /// `ERROR_FILE_NOT_FOUND`. The real API would fall back to the key's
    /// default value for that input; this bridge does not, and the gap is
    /// kept for transparency with the revision it reproduces.
    pub fn query_value(
        &self,
        h_key: GuestHandle,
        value_name: Option<&str>,
        sink: QueryValueSink<'_>,
    ) -> NativeStatus {
        let name = match value_name {
            None | Some("") => return NativeStatus::FileNotFound,
            Some(name) => name,
        };
        let Some(key_id) = h_key.decode() else {
            return NativeStatus::InvalidHandle;
        };

        let _exclusion = ExclusionGuard::enter(self.exclusion.as_ref());
        match self.engine.query_value(key_id, name) {
            Ok(value) => {
                log::debug!(
                    "QueryValue(HKey={} ValueName={}) => {}",
                    key_id,
                    name,
                    NativeStatus::Success
                );
                write_value(&value, sink)
            }
            Err(err) => {
                log::debug!(
                    "QueryValue(HKey={} ValueName={}) => {}",
                    key_id,
                    name,
                    err.status()
                );
                err.status()
            }
        }
    }

    /// Inserts or overwrites a value under the key bound to `h_key`.
    ///
    /// `data` is copied into an owned buffer before the engine sees it; no
    /// aliasing of caller memory survives the call. A `None` name targets
    /// the key's default value.
    pub fn set_value(
        &self,
        h_key: GuestHandle,
        value_name: Option<&str>,
        kind: ValueKind,
        data: &[u8],
    ) -> NativeStatus {
        let Some(key_id) = h_key.decode() else {
            return NativeStatus::InvalidHandle;
        };

        let _exclusion = ExclusionGuard::enter(self.exclusion.as_ref());
        let name = value_name.unwrap_or("");
        let value = VirtualRegistryValue::new(name, kind, data.to_vec());
        let status = match self.engine.set_value(key_id, value) {
            Ok(()) => NativeStatus::Success,
            Err(err) => err.status(),
        };
        log::debug!(
            "SetValue(HKey={} Name={} Type={}) => {}",
            key_id,
            name,
            kind,
            status
        );
        status
    }
}
