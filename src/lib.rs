#![no_std]

pub mod config;
pub mod infrastructure;

/// GPIO pin wired to the LED strip data line
#[macro_export]
macro_rules! led_gpio {
    ($peripherals:ident) => {
        $peripherals.GPIO2
    };
}
