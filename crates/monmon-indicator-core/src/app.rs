//! Owned application state
//!
//! One [`App`] value owns the command buffer, the registry, the storage
//! backend and the indicator engine; the main loop passes it bytes and
//! elapsed time. Nothing in the crate reaches into ambient globals.
//!
//! Dispatch runs entirely before any mutation is applied: argument count
//! and argument parsing are validated first, so malformed input never
//! corrupts the registry.

use core::fmt::Write as _;

use embassy_time::Duration;
use heapless::String;

use crate::command::{CommandBuffer, CommandError, Responder};
use crate::driver::LedDriver;
use crate::engine::{EngineConfig, IndicatorEngine};
use crate::image::{self, IMAGE_LEN};
use crate::registry::DeviceRegistry;
use crate::storage::{Storage, StorageError};

/// Outcome of loading the persisted image at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootReport {
    /// Entries admitted into the registry
    pub entries: usize,
    /// Entries rejected by validation
    pub dropped: usize,
    /// Whether the image was rewritten to shed invalid entries
    pub healed: bool,
}

/// Application state: buffer, registry, storage and engine in one value
pub struct App<S: Storage, D: LedDriver<N>, const N: usize> {
    buffer: CommandBuffer,
    /// Device → slot registry
    pub registry: DeviceRegistry,
    storage: S,
    /// Fade engine driving the LED strip
    pub engine: IndicatorEngine<D, N>,
}

impl<S: Storage, D: LedDriver<N>, const N: usize> App<S, D, N> {
    /// Create an app with an empty registry
    pub fn new(storage: S, driver: D, config: EngineConfig) -> Self {
        Self {
            buffer: CommandBuffer::new(),
            registry: DeviceRegistry::new(),
            storage,
            engine: IndicatorEngine::new(driver, config),
        }
    }

    /// Load the persisted image, filtering invalid entries.
    ///
    /// If validation rejected anything (or duplicate ids collapsed), the
    /// image is immediately rewritten so durable storage reflects only
    /// valid data - a one-shot self-healing pass. A read failure leaves
    /// the registry empty and the image untouched.
    pub fn boot(&mut self) -> Result<BootReport, StorageError> {
        let mut bytes = [0u8; IMAGE_LEN];
        self.storage.read(&mut bytes)?;

        let decoded = image::decode(&bytes, N);
        self.registry = decoded.registry;
        self.engine.set_strip_brightness(decoded.strip_brightness);

        let healed = self.registry.len() != decoded.stored_count;
        if healed {
            self.persist();
        }
        Ok(BootReport {
            entries: self.registry.len(),
            dropped: decoded.dropped,
            healed,
        })
    }

    /// Feed one byte from the input stream.
    ///
    /// Appending, flushing and dispatching (mutation + persistence +
    /// response) all happen here, in the caller's single context.
    pub fn feed(&mut self, byte: u8, out: &mut impl Responder) {
        if let Some(line) = self.buffer.push(byte) {
            self.handle_line(&line, out);
        }
    }

    /// Advance the fade animation by the elapsed time
    pub fn tick(&mut self, delta: Duration) -> bool {
        self.engine.tick(delta)
    }

    /// Dispatch one complete command line
    pub fn handle_line(&mut self, line: &str, out: &mut impl Responder) {
        let mut tokens = line.split(' ');
        let verb = tokens.next().unwrap_or("");

        if verb == "list" {
            out.line("OK");
            for entry in self.registry.entries() {
                let mut text: String<48> = String::new();
                let _ = write!(text, "DISPLAY: {} ({})", entry.id, entry.slot);
                out.line(&text);
            }
            return;
        }

        let result = match verb {
            "set" => self.cmd_set(&mut tokens),
            "add" => self.cmd_add(&mut tokens),
            "remove" => self.cmd_remove(&mut tokens),
            "brightness" => self.cmd_brightness(&mut tokens),
            _ => Err(CommandError::UnknownCommand),
        };

        match result {
            Ok(()) => out.line("OK"),
            Err(error) => {
                let mut text: String<48> = String::new();
                let _ = write!(text, "ERROR: {}", error.reason());
                out.line(&text);
            }
        }
    }

    fn cmd_set<'a>(
        &mut self,
        args: &mut impl Iterator<Item = &'a str>,
    ) -> Result<(), CommandError> {
        let id = args.next().ok_or(CommandError::InsufficientParameters)?;

        match id.parse::<u32>().ok().and_then(|id| self.registry.lookup(id)) {
            Some(slot) => {
                self.engine.set_active(Some(usize::from(slot)));
                Ok(())
            }
            None => {
                // Never leave a stale selection active on a miss.
                self.engine.set_active(None);
                Err(CommandError::UnknownDevice)
            }
        }
    }

    pub(crate) fn cmd_add<'a>(
        &mut self,
        args: &mut impl Iterator<Item = &'a str>,
    ) -> Result<(), CommandError> {
        let id = args.next().ok_or(CommandError::InsufficientParameters)?;
        let slot = args.next().ok_or(CommandError::InsufficientParameters)?;

        let id: u32 = id.parse().map_err(|_| CommandError::InvalidArgument)?;
        if id == 0 {
            return Err(CommandError::InvalidArgument);
        }
        let slot: u16 = slot.parse().map_err(|_| CommandError::InvalidArgument)?;
        if usize::from(slot) >= N {
            return Err(CommandError::InvalidArgument);
        }

        self.registry
            .upsert(id, slot)
            .map_err(|_| CommandError::RegistryFull)?;
        self.persist();
        Ok(())
    }

    pub(crate) fn cmd_remove<'a>(
        &mut self,
        args: &mut impl Iterator<Item = &'a str>,
    ) -> Result<(), CommandError> {
        let id = args.next().ok_or(CommandError::InsufficientParameters)?;
        let id: u32 = id.parse().map_err(|_| CommandError::InvalidArgument)?;

        // Idempotent: removing an absent id still reports success.
        self.registry.remove(id);
        self.persist();
        Ok(())
    }

    fn cmd_brightness<'a>(
        &mut self,
        args: &mut impl Iterator<Item = &'a str>,
    ) -> Result<(), CommandError> {
        let value = args.next().ok_or(CommandError::InsufficientParameters)?;
        let value: u8 = value.parse().map_err(|_| CommandError::InvalidArgument)?;

        self.engine.set_strip_brightness(value);
        self.persist();
        Ok(())
    }

    /// Rewrite the full image. Write failures are unreported by contract;
    /// the next mutation rewrites the image anyway.
    fn persist(&mut self) {
        let image = image::encode(&self.registry, self.engine.strip_brightness());
        let _ = self.storage.write(&image);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::string::String as StdString;
    use std::vec::Vec;

    use super::*;
    use crate::color::Rgb;
    use crate::image::encode;

    const PIXEL_COUNT: usize = 6;

    /// Shared in-memory storage, starting in the erased (0xFF) state
    #[derive(Clone)]
    struct MemStorage {
        bytes: Rc<RefCell<[u8; IMAGE_LEN]>>,
    }

    impl MemStorage {
        fn new() -> Self {
            Self {
                bytes: Rc::new(RefCell::new([0xFF; IMAGE_LEN])),
            }
        }

        fn image(&self) -> [u8; IMAGE_LEN] {
            *self.bytes.borrow()
        }

        fn set_image(&self, image: &[u8; IMAGE_LEN]) {
            *self.bytes.borrow_mut() = *image;
        }
    }

    impl Storage for MemStorage {
        fn read(&mut self, buffer: &mut [u8]) -> Result<(), StorageError> {
            buffer.copy_from_slice(&self.bytes.borrow()[..buffer.len()]);
            Ok(())
        }

        fn write(&mut self, buffer: &[u8]) -> Result<(), StorageError> {
            self.bytes.borrow_mut()[..buffer.len()].copy_from_slice(buffer);
            Ok(())
        }
    }

    struct NullDriver;

    impl<const N: usize> LedDriver<N> for NullDriver {
        fn write(&mut self, _frame: &[Rgb; N], _brightness: u8) {}
    }

    #[derive(Default)]
    struct Lines(Vec<StdString>);

    impl Responder for Lines {
        fn line(&mut self, line: &str) {
            self.0.push(line.into());
        }
    }

    type TestApp = App<MemStorage, NullDriver, PIXEL_COUNT>;

    fn app() -> (TestApp, MemStorage) {
        let storage = MemStorage::new();
        let app = App::new(storage.clone(), NullDriver, EngineConfig::default());
        (app, storage)
    }

    fn send(app: &mut TestApp, input: &str) -> Vec<StdString> {
        let mut out = Lines::default();
        for byte in input.bytes() {
            app.feed(byte, &mut out);
        }
        out.0
    }

    #[test]
    fn add_registers_device_and_persists() {
        let (mut app, storage) = app();
        let lines = send(&mut app, "add 1001 2\n");

        assert_eq!(lines, ["OK"]);
        assert_eq!(app.registry.lookup(1001), Some(2));
        assert_eq!(storage.image(), encode(&app.registry, 64));
    }

    #[test]
    fn set_selects_the_registered_slot() {
        let (mut app, _) = app();
        send(&mut app, "add 1001 2\n");

        let lines = send(&mut app, "set 1001\n");
        assert_eq!(lines, ["OK"]);
        assert_eq!(app.engine.active(), Some(2));
    }

    #[test]
    fn set_unknown_clears_the_indicator() {
        let (mut app, _) = app();
        send(&mut app, "add 1001 2\nset 1001\n");

        let lines = send(&mut app, "set 9999\n");
        assert_eq!(lines, ["ERROR: Unknown device"]);
        assert_eq!(app.engine.active(), None);
    }

    #[test]
    fn remove_then_list_shows_no_devices() {
        let (mut app, _) = app();
        send(&mut app, "add 1001 2\nremove 1001\n");

        let lines = send(&mut app, "list\n");
        assert_eq!(lines, ["OK"]);
    }

    #[test]
    fn unknown_verb_is_an_error() {
        let (mut app, _) = app();
        let lines = send(&mut app, "bogus\n");
        assert_eq!(lines, ["ERROR: Unknown command"]);
    }

    #[test]
    fn missing_arguments_are_reported_before_positional_access() {
        let (mut app, _) = app();
        assert_eq!(send(&mut app, "add 5\n"), ["ERROR: Insufficient parameters"]);
        assert_eq!(send(&mut app, "set\n"), ["ERROR: Insufficient parameters"]);
        assert_eq!(send(&mut app, "remove\n"), ["ERROR: Insufficient parameters"]);
    }

    #[test]
    fn consecutive_spaces_yield_empty_tokens() {
        let (mut app, _) = app();
        // Tokens are not collapsed: the empty token is the id argument.
        let lines = send(&mut app, "add  1001 2\n");
        assert_eq!(lines, ["ERROR: Invalid argument"]);
        assert!(app.registry.is_empty());
    }

    #[test]
    fn list_emits_entries_in_key_sort_order() {
        let (mut app, _) = app();
        send(&mut app, "add 9 0\nadd 10 1\n");

        let lines = send(&mut app, "list\n");
        assert_eq!(lines, ["OK", "DISPLAY: 10 (1)", "DISPLAY: 9 (0)"]);
    }

    #[test]
    fn remove_of_absent_id_is_idempotent() {
        let (mut app, storage) = app();
        send(&mut app, "add 1001 2\n");
        let before = storage.image();

        let lines = send(&mut app, "remove 4242\n");
        assert_eq!(lines, ["OK"]);
        assert_eq!(storage.image(), before);
    }

    #[test]
    fn add_rejects_invalid_id_and_slot_without_mutating() {
        let (mut app, _) = app();
        assert_eq!(send(&mut app, "add abc 1\n"), ["ERROR: Invalid argument"]);
        assert_eq!(send(&mut app, "add 0 1\n"), ["ERROR: Invalid argument"]);
        assert_eq!(
            send(&mut app, "add 7 6\n"), // slot == PIXEL_COUNT
            ["ERROR: Invalid argument"]
        );
        assert!(app.registry.is_empty());
    }

    #[test]
    fn add_to_full_registry_reports_registry_full() {
        let (mut app, _) = app();
        for id in 1..=20u32 {
            let command = std::format!("add {id} 0\n");
            assert_eq!(send(&mut app, &command), ["OK"]);
        }

        assert_eq!(send(&mut app, "add 9999 0\n"), ["ERROR: Registry full"]);
        // Overwriting an existing id still works at capacity.
        assert_eq!(send(&mut app, "add 7 1\n"), ["OK"]);
    }

    #[test]
    fn brightness_updates_engine_and_image() {
        let (mut app, storage) = app();
        let lines = send(&mut app, "brightness 100\n");

        assert_eq!(lines, ["OK"]);
        assert_eq!(app.engine.strip_brightness(), 100);
        assert_eq!(storage.image()[IMAGE_LEN - 1], 100);

        assert_eq!(send(&mut app, "brightness 300\n"), ["ERROR: Invalid argument"]);
        assert_eq!(app.engine.strip_brightness(), 100);
    }

    #[test]
    fn boot_restores_a_previously_persisted_registry() {
        let (mut app, storage) = app();
        send(&mut app, "add 1001 2\nadd 2002 0\nbrightness 90\n");

        let mut rebooted: TestApp =
            App::new(storage.clone(), NullDriver, EngineConfig::default());
        let report = rebooted.boot().unwrap();

        assert_eq!(report, BootReport { entries: 2, dropped: 0, healed: false });
        assert_eq!(rebooted.registry, app.registry);
        assert_eq!(rebooted.engine.strip_brightness(), 90);
    }

    #[test]
    fn boot_self_heals_images_with_invalid_entries() {
        let storage = MemStorage::new();
        let mut registry = DeviceRegistry::new();
        registry.upsert(1001, 0).unwrap();
        let mut image = encode(&registry, 64);
        // Claim three entries; the extra two fail validation.
        image[..4].copy_from_slice(&3u32.to_le_bytes());
        image[10..14].copy_from_slice(&0u32.to_le_bytes());
        image[16..20].copy_from_slice(&2002u32.to_le_bytes());
        image[20..22].copy_from_slice(&(PIXEL_COUNT as u16).to_le_bytes());
        storage.set_image(&image);

        let mut app: TestApp = App::new(storage.clone(), NullDriver, EngineConfig::default());
        let report = app.boot().unwrap();

        assert_eq!(report, BootReport { entries: 1, dropped: 2, healed: true });
        // The rewritten image now matches the in-memory set exactly.
        assert_eq!(storage.image(), encode(&app.registry, 64));
    }

    #[test]
    fn boot_on_erased_storage_heals_to_a_clean_empty_image() {
        let (mut app, storage) = app();
        let report = app.boot().unwrap();

        assert!(report.healed);
        assert_eq!(report.entries, 0);
        assert!(app.registry.is_empty());
        // Erased brightness byte (0xFF) is taken as-is.
        assert_eq!(app.engine.strip_brightness(), 255);
        assert_eq!(storage.image(), encode(&DeviceRegistry::new(), 255));
    }
}
