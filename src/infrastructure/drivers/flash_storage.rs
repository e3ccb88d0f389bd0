//! Flash-backed durable storage for the registry image
//!
//! The image occupies the start of a dedicated flash region; every write
//! erases the block and rewrites the staged image in full.

use embedded_storage::nor_flash::{NorFlash, ReadNorFlash};
use esp_storage::FlashStorage;

use monmon_indicator_core::{Storage, StorageError};

use crate::config::REGISTRY_PARTITION_OFFSET;

const BLOCK_SIZE: u32 = 4096;

/// Flash writes are word-granular; the image is staged into a padded
/// buffer before writing.
const STAGED_LEN: usize = 128;

/// Registry image storage on the ESP flash
pub struct EspFlashStorage {
    flash: FlashStorage<'static>,
    addr: u32,
}

impl EspFlashStorage {
    pub fn new(flash: FlashStorage<'static>) -> Self {
        Self {
            flash,
            addr: REGISTRY_PARTITION_OFFSET,
        }
    }
}

impl Storage for EspFlashStorage {
    fn read(&mut self, buffer: &mut [u8]) -> Result<(), StorageError> {
        self.flash
            .read(self.addr, buffer)
            .map_err(|_| StorageError::Read)
    }

    fn write(&mut self, buffer: &[u8]) -> Result<(), StorageError> {
        let mut staged = [0xFFu8; STAGED_LEN];
        let len = buffer.len().min(STAGED_LEN);
        staged[..len].copy_from_slice(&buffer[..len]);

        self.flash
            .erase(self.addr, self.addr + BLOCK_SIZE)
            .map_err(|_| StorageError::Write)?;
        self.flash
            .write(self.addr, &staged)
            .map_err(|_| StorageError::Write)
    }
}
