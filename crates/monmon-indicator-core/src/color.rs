//! Hue wheel and brightness scaling for the indicator pixels

use smart_leds::RGB;

/// RGB color type used throughout the crate
pub type Rgb = RGB<u8>;

/// Map a wheel angle (0-255) to a rainbow color, scaled by brightness.
///
/// The angle is partitioned into three 85-wide segments forming a linear
/// ramp red → green, green → blue, blue → red.
pub fn wheel(angle: u8, brightness: f32) -> Rgb {
    let color = ramp(angle);
    Rgb {
        r: scale(color.r, brightness),
        g: scale(color.g, brightness),
        b: scale(color.b, brightness),
    }
}

/// Scale an 8-bit channel value by a brightness fraction (0.0-1.0).
///
/// Zero brightness maps to exactly zero, so a fully faded slot never
/// shows a rounding residue.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::float_cmp)]
pub fn scale(value: u8, brightness: f32) -> u8 {
    if brightness == 0.0 {
        return 0;
    }
    // Round half up; inputs are non-negative so `+ 0.5` then truncate.
    let scaled = f32::from(value) * brightness + 0.5;
    if scaled >= 255.0 { 255 } else { scaled as u8 }
}

fn ramp(angle: u8) -> Rgb {
    if angle < 85 {
        Rgb {
            r: angle * 3,
            g: 255 - angle * 3,
            b: 0,
        }
    } else if angle < 170 {
        let angle = angle - 85;
        Rgb {
            r: 255 - angle * 3,
            g: 0,
            b: angle * 3,
        }
    } else {
        let angle = angle - 170;
        Rgb {
            r: 0,
            g: angle * 3,
            b: 255 - angle * 3,
        }
    }
}
