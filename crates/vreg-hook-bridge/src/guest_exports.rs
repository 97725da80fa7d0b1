//! Guest-facing `extern "C"` entry points.
//!
//! These functions are the fixed wire contract the hook-installation layer
//! diverts the guest's registry calls into: native parameter order,
//! by-reference outputs, NUL-terminated UTF-16 strings, and an `i32`
//! status return. Everything raw-pointer-shaped lives here; the bridge
//! behind it only sees safe types.
//!
//! A bridge instance is registered process-wide with [`install`] before
//! hooks are armed. Calls arriving with no bridge installed fail with
//! `ERROR_GEN_FAILURE` instead of touching any real registry state, and
//! no unwind ever crosses the `extern "C"` boundary.

use std::ffi::c_void;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::slice;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;

use vreg_types::{GuestHandle, NativeStatus, ValueKind};

use crate::bridge::RegistryHookBridge;
use crate::marshal::QueryValueSink;

static BRIDGE: Lazy<Mutex<Option<Arc<RegistryHookBridge>>>> = Lazy::new(|| Mutex::new(None));

/// Registers the bridge instance the exports dispatch through.
///
/// Replaces any previously installed bridge.
pub fn install(bridge: Arc<RegistryHookBridge>) {
    *lock_slot() = Some(bridge);
}

/// Removes the installed bridge; subsequent hooked calls fail with
/// `ERROR_GEN_FAILURE`.
pub fn uninstall() {
    *lock_slot() = None;
}

fn lock_slot() -> std::sync::MutexGuard<'static, Option<Arc<RegistryHookBridge>>> {
    BRIDGE.lock().unwrap_or_else(PoisonError::into_inner)
}

fn installed() -> Option<Arc<RegistryHookBridge>> {
    lock_slot().clone()
}

/// Runs one hooked call against the installed bridge, containing panics.
fn dispatch<F>(api_name: &str, call: F) -> i32
where
    F: FnOnce(&RegistryHookBridge) -> NativeStatus,
{
    let status = match installed() {
        Some(bridge) => match catch_unwind(AssertUnwindSafe(|| call(&bridge))) {
            Ok(status) => status,
            Err(_) => {
                log::error!("{} hook panicked; reporting failure to the guest", api_name);
                NativeStatus::GenFailure
            }
        },
        None => {
            log::warn!("{} hooked with no bridge installed", api_name);
            NativeStatus::GenFailure
        }
    };
    status.as_raw()
}

/// Reads a NUL-terminated UTF-16 string; `None` for a null pointer.
///
/// # Safety
///
/// A non-null `ptr` must point to a NUL-terminated UTF-16 buffer valid for
/// the duration of the call.
unsafe fn wide_cstr(ptr: *const u16) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let mut len = 0usize;
    while unsafe { *ptr.add(len) } != 0 {
        len += 1;
    }
    let units = unsafe { slice::from_raw_parts(ptr, len) };
    Some(String::from_utf16_lossy(units))
}

/// Hooked RegOpenKeyEx.
///
/// A null `sub_key` is the "no subkey" sentinel: the input handle passes
/// through unchanged. `options` and `sam_desired` are accepted and
/// uninterpreted.
///
/// # Safety
///
/// - `sub_key`, if non-null, must be a NUL-terminated UTF-16 string
/// - `phk_result`, if non-null, must be valid for a pointer-sized write
#[no_mangle]
pub unsafe extern "C" fn vreg_open_key_hooked(
    h_key: usize,
    sub_key: *const u16,
    _options: u32,
    _sam_desired: u32,
    phk_result: *mut usize,
) -> i32 {
    dispatch("RegOpenKeyEx", |bridge| {
        let sub_key = unsafe { wide_cstr(sub_key) };
        let reply = bridge.open_key(GuestHandle::from_raw(h_key), sub_key.as_deref());
        if let Some(handle) = reply.handle {
            if !phk_result.is_null() {
                unsafe { *phk_result = handle.as_raw() };
            }
        }
        reply.status
    })
}

/// Hooked RegCreateKeyEx.
///
/// With a null `sub_key` the native defect is reproduced: `*phk_result`
/// is left untouched (not cleared), `*disposition` reads `NoKeyCreated`,
/// and the call fails with `ERROR_BADKEY`. The reserved, class, options,
/// sam, and security parameters are accepted and uninterpreted.
///
/// # Safety
///
/// - `sub_key` and `class`, if non-null, must be NUL-terminated UTF-16
/// - `phk_result`, if non-null, must be valid for a pointer-sized write
/// - `disposition`, if non-null, must be valid for a 4-byte write
#[no_mangle]
pub unsafe extern "C" fn vreg_create_key_ex_hooked(
    h_key: usize,
    sub_key: *const u16,
    _reserved: u32,
    _class: *const u16,
    _options: u32,
    _sam_desired: u32,
    _security_attributes: *mut c_void,
    phk_result: *mut usize,
    disposition: *mut u32,
) -> i32 {
    dispatch("RegCreateKeyEx", |bridge| {
        let sub_key = unsafe { wide_cstr(sub_key) };
        let reply = bridge.create_key_ex(GuestHandle::from_raw(h_key), sub_key.as_deref());
        if let Some(handle) = reply.handle {
            if !phk_result.is_null() {
                unsafe { *phk_result = handle.as_raw() };
            }
        }
        if let Some(value) = reply.disposition {
            if !disposition.is_null() {
                unsafe { *disposition = value.as_raw() };
            }
        }
        reply.status
    })
}

/// Hooked RegCloseKey.
#[no_mangle]
pub extern "C" fn vreg_close_key_hooked(h_key: usize) -> i32 {
    dispatch("RegCloseKey", |bridge| {
        bridge.close_key(GuestHandle::from_raw(h_key))
    })
}

/// Hooked RegQueryValueEx.
///
/// `data_size` is the two-phase in-out size: capacity in, true length
/// out. A null `data` with a non-null `data_size` is the size-only probe.
/// A non-null `data` with a null `data_size` is undefined under the
/// native contract; here the data phase is skipped and at most the type
/// code is written.
///
/// # Safety
///
/// - `value_name`, if non-null, must be a NUL-terminated UTF-16 string
/// - `kind` and `data_size`, if non-null, must be valid for 4-byte writes
/// - `data`, if non-null, must be valid for writes of `*data_size` bytes
#[no_mangle]
pub unsafe extern "C" fn vreg_query_value_ex_hooked(
    h_key: usize,
    value_name: *const u16,
    _reserved: *mut u32,
    kind: *mut u32,
    data: *mut u8,
    data_size: *mut u32,
) -> i32 {
    dispatch("RegQueryValueEx", |bridge| {
        let value_name = unsafe { wide_cstr(value_name) };
        let mut sink = QueryValueSink {
            kind: unsafe { kind.as_mut() },
            size: unsafe { data_size.as_mut() },
            data: None,
        };
        if !data.is_null() {
            if let Some(capacity) = sink.size.as_deref().copied() {
                sink.data = Some(unsafe { slice::from_raw_parts_mut(data, capacity as usize) });
            }
        }
        bridge.query_value(GuestHandle::from_raw(h_key), value_name.as_deref(), sink)
    })
}

/// Hooked RegSetValueEx.
///
/// Copies exactly `data_size` bytes out of the caller's buffer before the
/// engine sees them; no reference to guest memory is retained past the
/// call. A null `value_name` targets the key's default value.
///
/// # Safety
///
/// - `value_name`, if non-null, must be a NUL-terminated UTF-16 string
/// - `data`, if non-null, must be valid for reads of `data_size` bytes
#[no_mangle]
pub unsafe extern "C" fn vreg_set_value_ex_hooked(
    h_key: usize,
    value_name: *const u16,
    _reserved: u32,
    kind: u32,
    data: *const u8,
    data_size: u32,
) -> i32 {
    dispatch("RegSetValueEx", |bridge| {
        let value_name = unsafe { wide_cstr(value_name) };
        let payload: &[u8] = if data.is_null() {
            &[]
        } else {
            unsafe { slice::from_raw_parts(data, data_size as usize) }
        };
        bridge.set_value(
            GuestHandle::from_raw(h_key),
            value_name.as_deref(),
            ValueKind::from_raw(kind),
            payload,
        )
    })
}

/// Returns true while the calling thread is inside a bridge forwarding
/// scope. The hook-installation layer checks this before diverting a call,
/// so the bridge's own registry traffic reaches the real API untouched.
#[no_mangle]
pub extern "C" fn vreg_exclusion_guard_active() -> bool {
    installed()
        .map(|bridge| bridge.exclusion().is_active())
        .unwrap_or(false)
}
