//! Test support: an in-memory registry engine.
//!
//! Backs unit and integration tests with a real [`RegistryEngine`]
//! implementation so the bridge can be exercised end to end without the
//! product's storage engine. Not a persistence engine; paths are plain
//! case-sensitive strings and there is no fallback to a real registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use vreg_types::{
    CreationDisposition, RegistryError, RegistryResult, VirtualKeyId, VirtualRegistryValue,
};

use crate::engine::RegistryEngine;

struct KeyEntry {
    path: String,
    values: HashMap<String, VirtualRegistryValue>,
}

struct KeyTable {
    next_id: u32,
    keys: HashMap<VirtualKeyId, KeyEntry>,
}

impl KeyTable {
    fn allocate(&mut self, path: String) -> VirtualKeyId {
        let id = VirtualKeyId::from_raw(self.next_id);
        self.next_id += 1;
        self.keys.insert(
            id,
            KeyEntry {
                path,
                values: HashMap::new(),
            },
        );
        id
    }

    fn id_for_path(&self, path: &str) -> Option<VirtualKeyId> {
        self.keys
            .iter()
            .find(|(_, entry)| entry.path == path)
            .map(|(id, _)| *id)
    }

    fn child_path(&self, parent: VirtualKeyId, relative: &str) -> RegistryResult<String> {
        let entry = self
            .keys
            .get(&parent)
            .ok_or(RegistryError::InvalidHandle)?;
        if entry.path.is_empty() {
            Ok(relative.to_owned())
        } else {
            Ok(format!("{}\\{}", entry.path, relative))
        }
    }
}

/// In-memory [`RegistryEngine`] seeded with a single root key.
///
/// `open_key` resolves existing keys only; `create_key` creates missing
/// ones. Every trait call is counted so tests can assert the bridge never
/// contacted the engine on a short-circuit path.
pub struct InMemoryRegistry {
    table: Mutex<KeyTable>,
    calls: AtomicUsize,
}

impl InMemoryRegistry {
    /// Id of the pre-seeded root key.
    pub const ROOT: VirtualKeyId = VirtualKeyId::from_raw(1);

    /// Creates an engine holding only the root key.
    pub fn new() -> Self {
        let mut table = KeyTable {
            next_id: InMemoryRegistry::ROOT.as_raw(),
            keys: HashMap::new(),
        };
        table.allocate(String::new());
        InMemoryRegistry {
            table: Mutex::new(table),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of engine calls observed so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of currently-open key contexts, the root included.
    pub fn open_keys(&self) -> usize {
        self.lock_table().keys.len()
    }

    fn lock_table(&self) -> std::sync::MutexGuard<'_, KeyTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        InMemoryRegistry::new()
    }
}

impl RegistryEngine for InMemoryRegistry {
    fn open_key(&self, parent: VirtualKeyId, relative_path: &str) -> RegistryResult<VirtualKeyId> {
        self.record_call();
        let table = self.lock_table();
        let path = table.child_path(parent, relative_path)?;
        match table.id_for_path(&path) {
            Some(id) => Ok(id),
            None => Err(RegistryError::key_not_found(path)),
        }
    }

    fn create_key(
        &self,
        parent: VirtualKeyId,
        relative_path: &str,
    ) -> RegistryResult<(VirtualKeyId, CreationDisposition)> {
        self.record_call();
        let mut table = self.lock_table();
        let path = table.child_path(parent, relative_path)?;
        match table.id_for_path(&path) {
            Some(id) => Ok((id, CreationDisposition::OpenedExistingKey)),
            None => {
                let id = table.allocate(path);
                Ok((id, CreationDisposition::CreatedNewKey))
            }
        }
    }

    fn close_key(&self, id: VirtualKeyId) -> RegistryResult<()> {
        self.record_call();
        let mut table = self.lock_table();
        match table.keys.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RegistryError::InvalidHandle),
        }
    }

    fn query_value(&self, id: VirtualKeyId, name: &str) -> RegistryResult<VirtualRegistryValue> {
        self.record_call();
        let table = self.lock_table();
        let entry = table.keys.get(&id).ok_or(RegistryError::InvalidHandle)?;
        entry
            .values
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::value_not_found(name))
    }

    fn set_value(&self, id: VirtualKeyId, value: VirtualRegistryValue) -> RegistryResult<()> {
        self.record_call();
        let mut table = self.lock_table();
        let entry = table
            .keys
            .get_mut(&id)
            .ok_or(RegistryError::InvalidHandle)?;
        entry.values.insert(value.name.clone(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vreg_types::ValueKind;

    #[test]
    fn test_open_missing_key_fails() {
        let engine = InMemoryRegistry::new();
        let err = engine.open_key(InMemoryRegistry::ROOT, "Software").unwrap_err();
        assert_eq!(err, RegistryError::key_not_found("Software"));
    }

    #[test]
    fn test_create_then_open_same_id() {
        let engine = InMemoryRegistry::new();
        let (created, disposition) = engine
            .create_key(InMemoryRegistry::ROOT, "Software")
            .unwrap();
        assert_eq!(disposition, CreationDisposition::CreatedNewKey);

        let opened = engine.open_key(InMemoryRegistry::ROOT, "Software").unwrap();
        assert_eq!(opened, created);

        let (again, disposition) = engine
            .create_key(InMemoryRegistry::ROOT, "Software")
            .unwrap();
        assert_eq!(again, created);
        assert_eq!(disposition, CreationDisposition::OpenedExistingKey);
    }

    #[test]
    fn test_nested_paths() {
        let engine = InMemoryRegistry::new();
        let (software, _) = engine
            .create_key(InMemoryRegistry::ROOT, "Software")
            .unwrap();
        let (vendor, _) = engine.create_key(software, "Vendor").unwrap();

        let opened = engine
            .open_key(InMemoryRegistry::ROOT, "Software\\Vendor")
            .unwrap();
        assert_eq!(opened, vendor);
    }

    #[test]
    fn test_close_releases_context() {
        let engine = InMemoryRegistry::new();
        let (id, _) = engine.create_key(InMemoryRegistry::ROOT, "Gone").unwrap();
        engine.close_key(id).unwrap();
        assert_eq!(engine.close_key(id).unwrap_err(), RegistryError::InvalidHandle);
    }

    #[test]
    fn test_value_upsert_overwrites() {
        let engine = InMemoryRegistry::new();
        let (id, _) = engine.create_key(InMemoryRegistry::ROOT, "App").unwrap();

        let first = VirtualRegistryValue::new("Version", ValueKind::Dword, vec![1, 0, 0, 0]);
        engine.set_value(id, first).unwrap();

        let second = VirtualRegistryValue::new("Version", ValueKind::Dword, vec![2, 0, 0, 0]);
        engine.set_value(id, second.clone()).unwrap();

        assert_eq!(engine.query_value(id, "Version").unwrap(), second);
    }
}
