//! Durable storage abstraction
//!
//! The persisted image is read and rewritten in full; wear-leveling and
//! partial updates are out of scope. Writes are synchronous.

/// Error type for storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    Read,
    Write,
}

/// Abstract durable storage
///
/// Implement this trait to back the registry with an actual medium
/// (flash partition, EEPROM, in-memory buffer in tests).
pub trait Storage {
    /// Fill `buffer` from the start of the storage region
    fn read(&mut self, buffer: &mut [u8]) -> Result<(), StorageError>;
    /// Overwrite the storage region with `buffer`
    fn write(&mut self, buffer: &[u8]) -> Result<(), StorageError>;
}
