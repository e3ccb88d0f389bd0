#![no_std]

//! Indicator core - active-monitor LED indicator logic
//!
//! Architecture layers:
//! - `driver` - Hardware abstraction ([`LedDriver`] trait)
//! - `storage` - Durable storage abstraction ([`Storage`] trait)
//! - `color` - Hue wheel and brightness scaling
//! - `engine` - Per-slot brightness fade state machine
//! - `registry` - Ordered device-id → slot map
//! - `image` - Fixed-layout persisted image codec
//! - `command` - Line buffer, response taxonomy and [`Responder`] seam
//! - `app` - Owned application state tying the layers together
//! - `bridge` - Cloud-function style entry points
//!
//! The crate is hardware-free: the firmware supplies an [`LedDriver`] and
//! a [`Storage`] implementation and forwards bytes and elapsed time.

#[cfg(test)]
extern crate std;

pub mod app;
pub mod bridge;
pub mod color;
pub mod command;
pub mod driver;
pub mod engine;
pub mod image;
pub mod registry;
pub mod storage;

// Driver exports
pub use driver::LedDriver;

// Color exports
pub use color::{Rgb, scale, wheel};

// Engine exports
pub use engine::{EngineConfig, IndicatorEngine};

// Registry exports
pub use registry::{DeviceRegistry, REGISTRY_CAPACITY, RegistryEntry, RegistryFull};

// Image exports
pub use image::{DecodedImage, IMAGE_LEN, decode, encode};

// Command exports
pub use command::{COMMAND_BUFFER_SIZE, CommandError, Responder};

// Storage exports
pub use storage::{Storage, StorageError};

// App exports
pub use app::{App, BootReport};

// Bridge exports
pub use bridge::{BRIDGE_ERR, BRIDGE_OK, bridge_add, bridge_remove};
