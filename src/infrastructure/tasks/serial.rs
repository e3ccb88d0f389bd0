//! UART reader task
//!
//! The receive half of the command link runs in its own task and forwards
//! raw bytes through a bounded channel. The indicator task drains the
//! channel between ticks, so a command dispatch can never be torn by a
//! concurrent buffer append.

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embedded_io_async::Read;
use esp_hal::Async;
use esp_hal::uart::UartRx;

const SERIAL_CHANNEL_SIZE: usize = 128;

type SerialByteChannel = Channel<CriticalSectionRawMutex, u8, SERIAL_CHANNEL_SIZE>;

/// Bytes received on the command link, in arrival order
pub(crate) static SERIAL_BYTES: SerialByteChannel = Channel::new();

#[embassy_executor::task]
pub async fn serial_reader_task(mut rx: UartRx<'static, Async>) {
    let mut chunk = [0u8; 64];
    loop {
        match Read::read(&mut rx, &mut chunk).await {
            Ok(n) if n > 0 => {
                for &byte in &chunk[..n] {
                    SERIAL_BYTES.send(byte).await;
                }
            }
            Ok(_) => {}
            Err(_err) => {
                #[cfg(feature = "log")]
                esp_println::println!("serial: uart read error: {:?}", _err);
            }
        }
    }
}
