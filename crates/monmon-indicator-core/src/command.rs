//! Command line buffering and response taxonomy
//!
//! Bytes accumulate until a `\n` terminator or until the line would reach
//! [`COMMAND_BUFFER_SIZE`] bytes including the terminator; in the overflow
//! case the (possibly mid-token) line is dispatched anyway. Responses go
//! through the [`Responder`] seam, one line per call, so the firmware and
//! the host tests share the dispatch path.

use heapless::{String, Vec};

/// Maximum command line length, terminator included
pub const COMMAND_BUFFER_SIZE: usize = 128;

/// Sink for response lines
pub trait Responder {
    /// Emit one response line, without the terminator
    fn line(&mut self, line: &str);
}

/// Errors surfaced as one `ERROR: <reason>` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Verb not in the dispatch table
    UnknownCommand,
    /// Too few tokens for the verb
    InsufficientParameters,
    /// Lookup miss on `set`
    UnknownDevice,
    /// Argument present but unparseable or out of range
    InvalidArgument,
    /// `add` of a new id into a full registry
    RegistryFull,
}

impl CommandError {
    /// Reason text used in the `ERROR:` response line
    pub fn reason(self) -> &'static str {
        match self {
            Self::UnknownCommand => "Unknown command",
            Self::InsufficientParameters => "Insufficient parameters",
            Self::UnknownDevice => "Unknown device",
            Self::InvalidArgument => "Invalid argument",
            Self::RegistryFull => "Registry full",
        }
    }
}

/// Accumulates raw bytes into complete command lines
pub(crate) struct CommandBuffer {
    buf: Vec<u8, COMMAND_BUFFER_SIZE>,
}

impl CommandBuffer {
    pub(crate) const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append one byte; returns the completed line on flush.
    ///
    /// Non-UTF-8 lines flush as empty, which the dispatcher rejects as an
    /// unknown command without touching any state.
    pub(crate) fn push(&mut self, byte: u8) -> Option<String<COMMAND_BUFFER_SIZE>> {
        if byte != b'\n' {
            let _ = self.buf.push(byte);
        }

        if byte == b'\n' || self.buf.len() + 1 == COMMAND_BUFFER_SIZE {
            let line = core::str::from_utf8(&self.buf)
                .ok()
                .and_then(|s| String::try_from(s).ok())
                .unwrap_or_default();
            self.buf.clear();
            return Some(line);
        }
        None
    }
}
