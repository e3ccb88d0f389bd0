//! Indicator engine - per-slot brightness fade state machine
//!
//! Each slot fades toward a target derived from the active indicator:
//! 1.0 for the active slot, 0.0 for every other slot. There is no stored
//! state enum; the fade direction falls out of comparing the current
//! level with its target. A frame is pushed to the driver only on ticks
//! where at least one level actually moved.

use embassy_time::Duration;

use crate::color::{Rgb, wheel};
use crate::driver::LedDriver;

/// Configuration for the indicator engine
#[derive(Clone, Copy)]
pub struct EngineConfig {
    /// Wheel angle used for every lit pixel
    pub hue: u8,
    /// Global strip brightness (0-255)
    pub strip_brightness: u8,
    /// Time for a full 0.0 → 1.0 fade
    pub fade_duration: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hue: 55,
            strip_brightness: 64,
            fade_duration: Duration::from_millis(300),
        }
    }
}

/// Indicator engine - drives the fade animation
///
/// Generic over `D: LedDriver` to support different hardware backends.
pub struct IndicatorEngine<D: LedDriver<N>, const N: usize> {
    /// Hardware driver for LED output
    driver: D,
    /// Current per-slot brightness (0.0-1.0)
    level: [f32; N],
    /// Slot currently marking the active device, if any
    active: Option<usize>,
    /// Wheel angle for lit pixels
    hue: u8,
    /// Global strip brightness
    strip_brightness: u8,
    /// Duration of a full fade
    fade_duration: Duration,
}

impl<D: LedDriver<N>, const N: usize> IndicatorEngine<D, N> {
    /// Create a new engine with all slots dark and no active indicator
    pub fn new(driver: D, config: EngineConfig) -> Self {
        Self {
            driver,
            level: [0.0; N],
            active: None,
            hue: config.hue,
            strip_brightness: config.strip_brightness,
            fade_duration: config.fade_duration,
        }
    }

    /// Get the slot currently selected as the active indicator
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Select the slot to fade in; `None` fades every slot out
    pub fn set_active(&mut self, slot: Option<usize>) {
        self.active = slot;
    }

    /// Get the global strip brightness
    pub fn strip_brightness(&self) -> u8 {
        self.strip_brightness
    }

    /// Set the global strip brightness, re-pushing the frame if it changed
    pub fn set_strip_brightness(&mut self, value: u8) {
        if value != self.strip_brightness {
            self.strip_brightness = value;
            self.push_frame();
        }
    }

    /// Push an all-dark frame, regardless of current levels.
    ///
    /// Used once at boot so the strip starts dark before the first
    /// transition.
    pub fn blank(&mut self) {
        self.level = [0.0; N];
        self.push_frame();
    }

    /// Advance every slot by the elapsed time `delta`.
    ///
    /// The step is derived from actual elapsed time, not tick count, so
    /// missed ticks still converge in accumulated time. Returns whether a
    /// frame was pushed to the driver.
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    pub fn tick(&mut self, delta: Duration) -> bool {
        let step = if self.fade_duration.as_millis() == 0 {
            1.0
        } else {
            delta.as_millis() as f32 / self.fade_duration.as_millis() as f32
        };

        let mut changed = false;
        for (slot, level) in self.level.iter_mut().enumerate() {
            let target = if Some(slot) == self.active { 1.0 } else { 0.0 };
            let next = if *level < target {
                (*level + step).min(target)
            } else if *level > target {
                (*level - step).max(target)
            } else {
                *level
            };
            if next != *level {
                *level = next;
                changed = true;
            }
        }

        // Skip the hardware write once every slot sits at its target.
        if changed {
            self.push_frame();
        }
        changed
    }

    fn push_frame(&mut self) {
        let mut frame = [Rgb::default(); N];
        for (slot, level) in self.level.iter().enumerate() {
            frame[slot] = wheel(self.hue, *level);
        }
        self.driver.write(&frame, self.strip_brightness);
    }
}
