use static_cell::make_static;

use esp_hal::xtensa_lx::interrupt;
use esp_hal::{gpio::interconnect::PeripheralOutput, peripherals::RMT, rmt::Rmt, time::Rate};
use esp_hal_smartled::{SmartLedsAdapter, buffer_size, smart_led_buffer};
use smart_leds::{SmartLedsWrite, brightness};

use monmon_indicator_core::{LedDriver, Rgb};

use crate::config::PIXEL_COUNT;

/// ESP-specific LED driver using the RMT peripheral
///
/// The RMT (Remote Control) peripheral generates the precise timing
/// signals required by WS2812B strips.
pub struct EspLedDriver<'a> {
    adapter: SmartLedsAdapter<'a, { buffer_size(PIXEL_COUNT) }>,
}

impl<'a> EspLedDriver<'a> {
    /// Create a new ESP LED driver
    ///
    /// # Arguments
    /// * `rmt` - RMT peripheral
    /// * `pin` - GPIO pin connected to the LED data line
    pub fn new<O>(rmt: RMT<'a>, pin: O) -> Self
    where
        O: PeripheralOutput<'a>,
    {
        let rmt = Rmt::new(rmt, Rate::from_mhz(80)).unwrap();

        // Safety: This is a static buffer that lives for the entire program
        // We use make_static! to ensure the buffer has 'static lifetime
        let rmt_buffer = make_static!(smart_led_buffer!(PIXEL_COUNT));
        let adapter = SmartLedsAdapter::new(rmt.channel0, pin, rmt_buffer);

        Self { adapter }
    }
}

impl LedDriver<PIXEL_COUNT> for EspLedDriver<'static> {
    fn write(&mut self, frame: &[Rgb; PIXEL_COUNT], level: u8) {
        // Frame and global brightness go out together; the adapter write
        // is the `show`.
        interrupt::free(|| {
            let _ = self
                .adapter
                .write(brightness(frame.iter().copied(), level));
        });
    }
}
