#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};

use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::uart::{Config as UartConfig, Uart};
use esp_storage::FlashStorage;

use monmon_esp_indicator::config::{
    FADE_DURATION, INDICATOR_BRIGHTNESS, INDICATOR_HUE, UART_BAUD,
};
use monmon_esp_indicator::infrastructure::drivers::{EspFlashStorage, EspLedDriver};
use monmon_esp_indicator::infrastructure::tasks::{
    IndicatorApp, indicator_task, serial_reader_task,
};
use monmon_indicator_core::{App, EngineConfig};

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    esp_println::logger::init_logger_from_env();

    // Initialize hardware
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Start rtos
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    #[cfg(feature = "log")]
    esp_println::println!(
        "app: build {}",
        monmon_esp_indicator::config::BUILD_VERSION
    );

    // Durable storage, LED driver and application state
    let storage = EspFlashStorage::new(FlashStorage::new(peripherals.FLASH));
    let driver = EspLedDriver::new(peripherals.RMT, monmon_esp_indicator::led_gpio!(peripherals));
    let mut app: IndicatorApp = App::new(
        storage,
        driver,
        EngineConfig {
            hue: INDICATOR_HUE,
            strip_brightness: INDICATOR_BRIGHTNESS,
            fade_duration: FADE_DURATION,
        },
    );

    // Load the registry before accepting any commands
    match app.boot() {
        Ok(_report) => {
            #[cfg(feature = "log")]
            esp_println::println!(
                "app: registry loaded: {} entries, {} dropped, healed={}",
                _report.entries,
                _report.dropped,
                _report.healed
            );
        }
        Err(_err) => {
            #[cfg(feature = "log")]
            esp_println::println!("app: storage read failed, starting empty: {:?}", _err);
        }
    }

    // All pixels off until the first transition
    app.engine.blank();

    // Command link on UART1
    let uart_config = UartConfig::default().with_baudrate(UART_BAUD);
    let uart = Uart::new(peripherals.UART1, uart_config)
        .unwrap()
        .with_rx(peripherals.GPIO4)
        .with_tx(peripherals.GPIO5)
        .into_async();
    let (rx, tx) = uart.split();

    spawner.spawn(serial_reader_task(rx)).ok();
    spawner.spawn(indicator_task(app, tx)).ok();

    loop {
        Timer::after(Duration::from_secs(5)).await;
    }
}
