mod indicator;
mod serial;

pub use indicator::{IndicatorApp, indicator_task};
pub use serial::serial_reader_task;
