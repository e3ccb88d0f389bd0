//! Ordered device registry
//!
//! Maps device identifiers to LED slots. Entries are kept sorted by the
//! lexicographic order of the id's canonical decimal form (the map key is
//! the id's string form), so iteration and the persisted image traversal
//! are deterministic and reproducible after reload.

use core::cmp::Ordering;

use heapless::Vec;

/// Maximum number of registry entries
pub const REGISTRY_CAPACITY: usize = 20;

/// A single device → slot association
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Device identifier; zero is never valid
    pub id: u32,
    /// LED slot lit when this device is active
    pub slot: u16,
}

/// Error returned when inserting a new id into a full registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryFull;

/// Ordered fixed-capacity device registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRegistry {
    entries: Vec<RegistryEntry, REGISTRY_CAPACITY>,
}

impl DeviceRegistry {
    /// Create an empty registry
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Number of registered devices
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no devices are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the slot for a device id
    pub fn lookup(&self, id: u32) -> Option<u16> {
        self.position(id).ok().map(|index| self.entries[index].slot)
    }

    /// Insert or overwrite the mapping for `id`.
    ///
    /// Fails only when a new id would exceed the capacity; overwriting an
    /// existing id always succeeds.
    pub fn upsert(&mut self, id: u32, slot: u16) -> Result<(), RegistryFull> {
        match self.position(id) {
            Ok(index) => {
                self.entries[index].slot = slot;
                Ok(())
            }
            Err(index) => self
                .entries
                .insert(index, RegistryEntry { id, slot })
                .map_err(|_| RegistryFull),
        }
    }

    /// Delete the mapping for `id` if present.
    ///
    /// Deletion is idempotent; returns whether an entry was removed.
    pub fn remove(&mut self, id: u32) -> bool {
        match self.position(id) {
            Ok(index) => {
                self.entries.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    /// Entries in key-sort order
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    fn position(&self, id: u32) -> Result<usize, usize> {
        self.entries.binary_search_by(|entry| key_cmp(entry.id, id))
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare two ids by their canonical decimal string form.
fn key_cmp(a: u32, b: u32) -> Ordering {
    let mut a_buf = [0u8; 10];
    let mut b_buf = [0u8; 10];
    decimal(a, &mut a_buf).cmp(decimal(b, &mut b_buf))
}

#[allow(clippy::cast_possible_truncation)]
fn decimal(mut value: u32, buf: &mut [u8; 10]) -> &[u8] {
    let mut index = buf.len();
    loop {
        index -= 1;
        buf[index] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    &buf[index..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_inserts_and_overwrites() {
        let mut registry = DeviceRegistry::new();
        registry.upsert(1001, 2).unwrap();
        assert_eq!(registry.lookup(1001), Some(2));

        registry.upsert(1001, 5).unwrap();
        assert_eq!(registry.lookup(1001), Some(5));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn iteration_order_is_string_sorted() {
        let mut registry = DeviceRegistry::new();
        registry.upsert(9, 0).unwrap();
        registry.upsert(10, 1).unwrap();
        registry.upsert(100, 2).unwrap();

        // "10" < "100" < "9" lexicographically
        let ids: std::vec::Vec<u32> = registry.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, [10, 100, 9]);
    }

    #[test]
    fn removal_is_idempotent() {
        let mut registry = DeviceRegistry::new();
        registry.upsert(42, 1).unwrap();

        assert!(registry.remove(42));
        assert!(!registry.remove(42));
        assert!(registry.is_empty());
    }

    #[test]
    fn lookup_misses_return_none() {
        let registry = DeviceRegistry::new();
        assert_eq!(registry.lookup(69_732_482), None);
    }

    #[test]
    fn full_registry_rejects_new_ids_but_allows_overwrites() {
        let mut registry = DeviceRegistry::new();
        for id in 1..=REGISTRY_CAPACITY as u32 {
            registry.upsert(id, 0).unwrap();
        }

        assert_eq!(registry.upsert(9999, 0), Err(RegistryFull));
        assert_eq!(registry.upsert(7, 1), Ok(()));
        assert_eq!(registry.lookup(7), Some(1));
        assert_eq!(registry.len(), REGISTRY_CAPACITY);
    }
}
