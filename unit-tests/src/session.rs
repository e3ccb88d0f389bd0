use std::cell::RefCell;
use std::rc::Rc;

use embassy_time::Duration;

use monmon_indicator_core::{
    App, BRIDGE_ERR, BRIDGE_OK, EngineConfig, IMAGE_LEN, LedDriver, Responder, Rgb, Storage,
    StorageError, bridge_add, bridge_remove, wheel,
};

/// Pixel count the firmware ships with
const PIXEL_COUNT: usize = 2;

const FADE: Duration = Duration::from_millis(300);

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

/// LED driver that records every pushed frame
#[derive(Clone)]
struct RecordingDriver {
    frames: Rc<RefCell<Vec<([Rgb; PIXEL_COUNT], u8)>>>,
}

impl RecordingDriver {
    fn new() -> Self {
        Self {
            frames: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn last_frame(&self) -> ([Rgb; PIXEL_COUNT], u8) {
        *self.frames.borrow().last().expect("no frame pushed")
    }

    fn frame_count(&self) -> usize {
        self.frames.borrow().len()
    }
}

impl LedDriver<PIXEL_COUNT> for RecordingDriver {
    fn write(&mut self, frame: &[Rgb; PIXEL_COUNT], brightness: u8) {
        self.frames.borrow_mut().push((*frame, brightness));
    }
}

#[derive(Default)]
struct Lines(Vec<String>);

impl Responder for Lines {
    fn line(&mut self, line: &str) {
        self.0.push(line.into());
    }
}

type TestApp = App<MemStorage, RecordingDriver, PIXEL_COUNT>;

fn app() -> (TestApp, MemStorage, RecordingDriver) {
    let storage = MemStorage::new();
    let driver = RecordingDriver::new();
    let app = App::new(storage.clone(), driver.clone(), EngineConfig::default());
    (app, storage, driver)
}

fn send(app: &mut TestApp, input: &str) -> Vec<String> {
    let mut out = Lines::default();
    for byte in input.bytes() {
        app.feed(byte, &mut out);
    }
    out.0
}

const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

#[test]
fn full_command_session() {
    let (mut app, _, driver) = app();

    assert_eq!(send(&mut app, "add 69732482 0\n"), ["OK"]);
    assert_eq!(send(&mut app, "add 478210625 1\n"), ["OK"]);

    // Key-sort order: "478210625" < "69732482"
    assert_eq!(
        send(&mut app, "list\n"),
        ["OK", "DISPLAY: 478210625 (1)", "DISPLAY: 69732482 (0)"]
    );

    assert_eq!(send(&mut app, "set 69732482\n"), ["OK"]);
    app.tick(FADE);
    let (frame, brightness) = driver.last_frame();
    assert_eq!(frame, [wheel(55, 1.0), BLACK]);
    assert_eq!(brightness, 64);

    // Unknown device clears the indicator and the strip fades out.
    assert_eq!(send(&mut app, "set 9999\n"), ["ERROR: Unknown device"]);
    app.tick(FADE);
    assert_eq!(driver.last_frame().0, [BLACK, BLACK]);

    assert_eq!(send(&mut app, "remove 69732482\n"), ["OK"]);
    assert_eq!(send(&mut app, "list\n"), ["OK", "DISPLAY: 478210625 (1)"]);

    assert_eq!(send(&mut app, "bogus\n"), ["ERROR: Unknown command"]);
}

#[test]
fn reboot_preserves_registry_and_brightness() {
    let (mut app, storage, _) = app();
    send(&mut app, "add 69732482 0\nadd 478210625 1\nbrightness 90\n");

    let mut rebooted: TestApp = App::new(
        storage.clone(),
        RecordingDriver::new(),
        EngineConfig::default(),
    );
    let report = rebooted.boot().unwrap();

    assert!(!report.healed);
    assert_eq!(report.entries, 2);
    assert_eq!(rebooted.registry.lookup(69_732_482), Some(0));
    assert_eq!(rebooted.registry.lookup(478_210_625), Some(1));
    assert_eq!(rebooted.engine.strip_brightness(), 90);
}

#[test]
fn self_heal_is_a_one_shot_pass() {
    let (mut app, storage, _) = app();
    send(&mut app, "add 69732482 0\n");

    // Corrupt the image: claim a second entry with an out-of-range slot.
    let mut image = storage.image();
    image[..4].copy_from_slice(&2u32.to_le_bytes());
    image[10..14].copy_from_slice(&7u32.to_le_bytes());
    image[14..16].copy_from_slice(&(PIXEL_COUNT as u16).to_le_bytes());
    storage.set_image(&image);

    let mut healed: TestApp = App::new(
        storage.clone(),
        RecordingDriver::new(),
        EngineConfig::default(),
    );
    let report = healed.boot().unwrap();
    assert!(report.healed);
    assert_eq!(report.dropped, 1);
    assert_eq!(report.entries, 1);

    // The rewritten image is clean: the next boot has nothing to fix.
    let mut clean: TestApp = App::new(
        storage.clone(),
        RecordingDriver::new(),
        EngineConfig::default(),
    );
    let report = clean.boot().unwrap();
    assert!(!report.healed);
    assert_eq!(report.entries, 1);
}

#[test]
fn bridge_matches_the_line_protocol() {
    let (mut app, storage, _) = app();

    assert_eq!(bridge_add(&mut app, "69732482 0"), BRIDGE_OK);
    assert_eq!(bridge_add(&mut app, "69732482"), BRIDGE_ERR);
    assert_eq!(bridge_add(&mut app, "0 1"), BRIDGE_ERR);
    assert_eq!(app.registry.len(), 1);

    let persisted_before_remove = storage.image();
    assert_eq!(bridge_remove(&mut app, "69732482"), BRIDGE_OK);
    assert!(app.registry.is_empty());
    assert_ne!(storage.image(), persisted_before_remove);

    // Idempotent, like the line verb.
    assert_eq!(bridge_remove(&mut app, "69732482"), BRIDGE_OK);
}

#[test]
fn overflowing_line_is_dispatched_truncated() {
    let (mut app, _, _) = app();

    // 130 bytes with no terminator: the buffer flushes at capacity and
    // dispatches the truncated line; the tail starts a new line.
    let mut out = Lines::default();
    for _ in 0..130 {
        app.feed(b'z', &mut out);
    }
    assert_eq!(out.0, ["ERROR: Unknown command"]);

    let mut out = Lines::default();
    app.feed(b'\n', &mut out);
    assert_eq!(out.0, ["ERROR: Unknown command"]);

    // Dispatch still works after the overflow.
    assert_eq!(send(&mut app, "add 69732482 0\n"), ["OK"]);
}

#[test]
fn fade_animates_through_intermediate_frames() {
    let (mut app, _, driver) = app();
    send(&mut app, "add 69732482 0\nset 69732482\n");

    app.tick(Duration::from_millis(100));
    app.tick(Duration::from_millis(100));
    app.tick(Duration::from_millis(100));
    assert_eq!(driver.frame_count(), 3);
    assert_eq!(driver.last_frame().0[0], wheel(55, 1.0));

    // Settled: further ticks push nothing.
    app.tick(Duration::from_millis(100));
    assert_eq!(driver.frame_count(), 3);
}
