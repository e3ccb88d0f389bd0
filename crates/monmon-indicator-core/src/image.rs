//! Persisted registry image codec
//!
//! Fixed 125-byte little-endian layout:
//!
//! ```text
//! 0:   count           (u32)
//! 4:   entries         (REGISTRY_CAPACITY x { id: u32, slot: u16 })
//! 124: strip brightness (u8)
//! ```
//!
//! There is no magic number, checksum or version field; the byte layout
//! is the contract and a structural change invalidates stored data.
//! Decoding never fails: it clamps the count, skips invalid entries and
//! reports what it dropped so the caller can re-persist a clean image.

use crate::registry::{DeviceRegistry, REGISTRY_CAPACITY};

/// Bytes per stored entry: id (u32) + slot (u16)
pub const ENTRY_LEN: usize = 6;

const COUNT_LEN: usize = 4;
const BRIGHTNESS_OFFSET: usize = COUNT_LEN + REGISTRY_CAPACITY * ENTRY_LEN;

/// Total size of the persisted image
pub const IMAGE_LEN: usize = BRIGHTNESS_OFFSET + 1;

/// Result of decoding a persisted image
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Registry rebuilt from the valid entries
    pub registry: DeviceRegistry,
    /// Global strip brightness byte
    pub strip_brightness: u8,
    /// Stored count after clamping to capacity
    pub stored_count: usize,
    /// Entries rejected by validation
    pub dropped: usize,
}

/// Encode the registry and brightness into a fresh image.
///
/// The count is capped at [`REGISTRY_CAPACITY`]; entries beyond it would
/// be silently dropped, but the registry cannot outgrow its capacity.
#[allow(clippy::cast_possible_truncation)]
pub fn encode(registry: &DeviceRegistry, strip_brightness: u8) -> [u8; IMAGE_LEN] {
    let mut image = [0u8; IMAGE_LEN];

    let count = registry.len().min(REGISTRY_CAPACITY);
    image[..COUNT_LEN].copy_from_slice(&(count as u32).to_le_bytes());

    for (index, entry) in registry.entries().iter().take(count).enumerate() {
        let offset = COUNT_LEN + index * ENTRY_LEN;
        image[offset..offset + 4].copy_from_slice(&entry.id.to_le_bytes());
        image[offset + 4..offset + 6].copy_from_slice(&entry.slot.to_le_bytes());
    }

    image[BRIGHTNESS_OFFSET] = strip_brightness;
    image
}

/// Decode a persisted image, admitting only valid entries.
///
/// An entry is valid when `id > 0` and `slot < pixel_count`. Bytes beyond
/// the stored count are ignored.
pub fn decode(bytes: &[u8; IMAGE_LEN], pixel_count: usize) -> DecodedImage {
    let raw_count = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let stored_count = (raw_count as usize).min(REGISTRY_CAPACITY);

    let mut registry = DeviceRegistry::new();
    let mut dropped = 0;
    for index in 0..stored_count {
        let offset = COUNT_LEN + index * ENTRY_LEN;
        let id = u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ]);
        let slot = u16::from_le_bytes([bytes[offset + 4], bytes[offset + 5]]);

        if id == 0 || usize::from(slot) >= pixel_count {
            dropped += 1;
            continue;
        }
        // Capacity cannot overflow here; duplicate ids collapse into one
        // entry, which the self-heal pass then writes back out.
        let _ = registry.upsert(id, slot);
    }

    DecodedImage {
        registry,
        strip_brightness: bytes[BRIGHTNESS_OFFSET],
        stored_count,
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIXEL_COUNT: usize = 2;

    fn registry(entries: &[(u32, u16)]) -> DeviceRegistry {
        let mut registry = DeviceRegistry::new();
        for &(id, slot) in entries {
            registry.upsert(id, slot).unwrap();
        }
        registry
    }

    #[test]
    fn layout_is_fixed_little_endian() {
        let image = encode(&registry(&[(9, 1), (10, 0)]), 64);

        assert_eq!(image.len(), 125);
        assert_eq!(&image[..4], &2u32.to_le_bytes());
        // Key-sort order puts "10" before "9"
        assert_eq!(&image[4..8], &10u32.to_le_bytes());
        assert_eq!(&image[8..10], &0u16.to_le_bytes());
        assert_eq!(&image[10..14], &9u32.to_le_bytes());
        assert_eq!(&image[14..16], &1u16.to_le_bytes());
        assert!(image[16..124].iter().all(|&b| b == 0));
        assert_eq!(image[124], 64);
    }

    #[test]
    fn roundtrip_preserves_entries_and_brightness() {
        let original = registry(&[(69_732_482, 0), (478_210_625, 1)]);
        let decoded = decode(&encode(&original, 100), PIXEL_COUNT);

        assert_eq!(decoded.registry, original);
        assert_eq!(decoded.strip_brightness, 100);
        assert_eq!(decoded.stored_count, 2);
        assert_eq!(decoded.dropped, 0);
    }

    #[test]
    fn invalid_entries_are_dropped_on_decode() {
        let mut image = encode(&registry(&[(1001, 0)]), 64);
        // Append a zero-id entry and an out-of-range slot entry by hand.
        image[..4].copy_from_slice(&3u32.to_le_bytes());
        image[10..14].copy_from_slice(&0u32.to_le_bytes());
        image[14..16].copy_from_slice(&1u16.to_le_bytes());
        image[16..20].copy_from_slice(&2002u32.to_le_bytes());
        image[20..22].copy_from_slice(&(PIXEL_COUNT as u16).to_le_bytes());

        let decoded = decode(&image, PIXEL_COUNT);
        assert_eq!(decoded.registry, registry(&[(1001, 0)]));
        assert_eq!(decoded.stored_count, 3);
        assert_eq!(decoded.dropped, 2);
    }

    #[test]
    fn count_is_clamped_to_capacity() {
        let mut image = encode(&DeviceRegistry::new(), 0);
        image[..4].copy_from_slice(&u32::MAX.to_le_bytes());

        let decoded = decode(&image, PIXEL_COUNT);
        assert_eq!(decoded.stored_count, REGISTRY_CAPACITY);
        assert!(decoded.registry.is_empty());
    }

    #[test]
    fn bytes_beyond_count_are_ignored() {
        let full = encode(&registry(&[(1, 0), (2, 1)]), 64);
        let mut truncated = full;
        truncated[..4].copy_from_slice(&1u32.to_le_bytes());

        let decoded = decode(&truncated, PIXEL_COUNT);
        assert_eq!(decoded.registry, registry(&[(1, 0)]));
    }

    #[test]
    fn erased_storage_decodes_to_an_empty_registry() {
        let image = [0xFFu8; IMAGE_LEN];
        let decoded = decode(&image, PIXEL_COUNT);

        // Count clamps to capacity, every 0xFF entry fails validation.
        assert_eq!(decoded.stored_count, REGISTRY_CAPACITY);
        assert_eq!(decoded.dropped, REGISTRY_CAPACITY);
        assert!(decoded.registry.is_empty());
    }
}
