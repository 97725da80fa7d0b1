//! Interface consumed from the virtual registry engine.
//!
//! The engine owns the key/value store, its locking discipline, and the
//! policy questions the bridge deliberately stays out of (persistence,
//! intermediate-key creation, fallback to the real registry). The bridge
//! only needs the five operations below.

use vreg_types::{CreationDisposition, RegistryResult, VirtualKeyId, VirtualRegistryValue};

/// The virtual registry storage engine, as seen from the bridge.
///
/// Implementations must be safe for concurrent access: hooked calls arrive
/// synchronously on whatever guest thread issued them, and several guest
/// threads may be inside the bridge at once.
///
/// Errors propagate to the guest unchanged; the engine is local and
/// consistent, so there is no transient-failure class and the bridge never
/// retries.
pub trait RegistryEngine: Send + Sync {
    /// Opens the key at `relative_path` under `parent`.
    ///
    /// Whether missing intermediate structure is created is engine policy.
    fn open_key(&self, parent: VirtualKeyId, relative_path: &str) -> RegistryResult<VirtualKeyId>;

    /// Creates the key at `relative_path` under `parent`, or opens it if it
    /// already exists. The disposition tells the caller which happened.
    fn create_key(
        &self,
        parent: VirtualKeyId,
        relative_path: &str,
    ) -> RegistryResult<(VirtualKeyId, CreationDisposition)>;

    /// Releases the key context bound to `id`.
    fn close_key(&self, id: VirtualKeyId) -> RegistryResult<()>;

    /// Looks up the value named `name` under the key bound to `id`.
    fn query_value(&self, id: VirtualKeyId, name: &str) -> RegistryResult<VirtualRegistryValue>;

    /// Inserts or overwrites `value` under the key bound to `id`.
    fn set_value(&self, id: VirtualKeyId, value: VirtualRegistryValue) -> RegistryResult<()>;
}
