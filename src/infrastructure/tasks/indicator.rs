//! Indicator task
//!
//! Owns the whole application state. Incoming bytes and the fade tick are
//! multiplexed with `select`, so byte handling (append, flush, dispatch,
//! persistence, response) and fade work happen in one context.

use embassy_futures::select::{Either, select};
use embassy_time::{Instant, Ticker};
use embedded_io_async::Write;
use esp_hal::Async;
use esp_hal::uart::UartTx;
use heapless::{String, Vec};

use monmon_indicator_core::{App, COMMAND_BUFFER_SIZE, Responder};

use super::serial::SERIAL_BYTES;
use crate::config::{FRAME_INTERVAL, PIXEL_COUNT};
use crate::infrastructure::drivers::{EspFlashStorage, EspLedDriver};

/// Application state wired to the ESP drivers
pub type IndicatorApp = App<EspFlashStorage, EspLedDriver<'static>, PIXEL_COUNT>;

/// One `OK` plus up to a full registry of `DISPLAY:` lines
const RESPONSE_LINES: usize = 24;

/// Collects response lines during dispatch; the task writes them to the
/// UART afterwards.
#[derive(Default)]
struct LineSink {
    lines: Vec<String<COMMAND_BUFFER_SIZE>, RESPONSE_LINES>,
}

impl Responder for LineSink {
    fn line(&mut self, line: &str) {
        let mut owned = String::new();
        let _ = owned.push_str(line);
        let _ = self.lines.push(owned);
    }
}

#[embassy_executor::task]
pub async fn indicator_task(mut app: IndicatorApp, mut tx: UartTx<'static, Async>) {
    let receiver = SERIAL_BYTES.receiver();
    let mut ticker = Ticker::every(FRAME_INTERVAL);
    let mut sink = LineSink::default();
    let mut last_tick = Instant::now();

    loop {
        match select(receiver.receive(), ticker.next()).await {
            Either::First(byte) => {
                app.feed(byte, &mut sink);
                if sink.lines.is_empty() {
                    continue;
                }
                for line in &sink.lines {
                    let _ = tx.write_all(line.as_bytes()).await;
                    let _ = tx.write_all(b"\n").await;
                }
                let _ = tx.flush().await;
                sink.lines.clear();
            }
            Either::Second(()) => {
                // Step from measured elapsed time, not the nominal frame
                // interval, so missed ticks still converge on schedule.
                let now = Instant::now();
                app.tick(now - last_tick);
                last_tick = now;
            }
        }
    }
}
