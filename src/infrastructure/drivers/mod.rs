mod flash_storage;
mod led_ws2812;

pub use flash_storage::EspFlashStorage;
pub use led_ws2812::EspLedDriver;
