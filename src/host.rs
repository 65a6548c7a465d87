/*!
Host interface glue.

The core never touches a clock, a keyboard, or a terminal directly — it talks
to a small trait object instead. A `TerminalHost` backed by `crossterm`
supplies the real implementation for the binary; tests use an in-memory fake.
*/

use std::time::Instant;

use crossterm::event::{self, Event, KeyCode};
use crossterm::terminal;

use crate::error::CoreError;

/// Everything the instruction executor needs from the outside world.
pub trait Host {
    /// Seconds elapsed since the host was constructed, as a monotonic clock.
    fn monotonic_seconds(&self) -> f64;

    /// Non-blocking: `Some(byte)` if a key is waiting, `None` otherwise.
    fn poll_keyboard(&mut self) -> Result<Option<u8>, CoreError>;

    /// Write raw bytes to the console (PRN's decimal text, PRA's single
    /// character).
    fn write_bytes(&mut self, bytes: &[u8]);
}

/// Real terminal host, backed by `crossterm` raw mode and non-blocking
/// event polling.
pub struct TerminalHost {
    start: Instant,
    raw_mode: bool,
}

impl TerminalHost {
    pub fn new() -> Result<Self, CoreError> {
        terminal::enable_raw_mode().map_err(|e| CoreError::HostIo(e.to_string()))?;
        Ok(Self {
            start: Instant::now(),
            raw_mode: true,
        })
    }
}

impl Drop for TerminalHost {
    fn drop(&mut self) {
        if self.raw_mode {
            let _ = terminal::disable_raw_mode();
        }
    }
}

impl Host for TerminalHost {
    fn monotonic_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn poll_keyboard(&mut self) -> Result<Option<u8>, CoreError> {
        if !event::poll(std::time::Duration::ZERO).map_err(|e| CoreError::HostIo(e.to_string()))? {
            return Ok(None);
        }
        match event::read().map_err(|e| CoreError::HostIo(e.to_string()))? {
            Event::Key(key) => Ok(match key.code {
                KeyCode::Char(c) => Some(c as u8),
                KeyCode::Enter => Some(b'\n'),
                KeyCode::Backspace => Some(0x08),
                KeyCode::Tab => Some(b'\t'),
                KeyCode::Esc => Some(0x1B),
                _ => None,
            }),
            _ => Ok(None),
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        use std::io::Write;
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(bytes);
        let _ = stdout.flush();
    }
}

/// Deterministic in-memory host for tests: a scripted clock value, a queue of
/// keyboard bytes, and a buffer capturing everything written to the console.
#[cfg(test)]
#[derive(Default)]
pub struct FakeHost {
    pub clock: f64,
    pub keyboard_queue: std::collections::VecDeque<u8>,
    pub console_output: Vec<u8>,
}

#[cfg(test)]
impl Host for FakeHost {
    fn monotonic_seconds(&self) -> f64 {
        self.clock
    }

    fn poll_keyboard(&mut self) -> Result<Option<u8>, CoreError> {
        Ok(self.keyboard_queue.pop_front())
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.console_output.extend_from_slice(bytes);
    }
}
