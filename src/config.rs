//! Firmware configuration constants

use embassy_time::Duration;

/// Number of pixels on the indicator strip
pub const PIXEL_COUNT: usize = 2;

/// Wheel angle of the indicator color
pub const INDICATOR_HUE: u8 = 55;

/// Default global strip brightness, used until the persisted image
/// supplies one
pub const INDICATOR_BRIGHTNESS: u8 = 64;

/// Time for a full fade in or out
pub const FADE_DURATION: Duration = Duration::from_millis(300);

/// Cadence of the fade update tick (~60 fps)
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Base address of the flash region holding the registry image
pub const REGISTRY_PARTITION_OFFSET: u32 = 0x31_0000;

/// Command link baud rate
pub const UART_BAUD: u32 = 9600;

/// Build timestamp injected by build.rs
pub const BUILD_VERSION: &str = env!("BUILD_VERSION");
