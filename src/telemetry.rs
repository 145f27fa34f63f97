//! `tracing` output routed to the browser console.

use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;
use wasm_bindgen::JsValue;

use crate::config::DEFAULT_LOG_FILTER;

/// Install the global subscriber. Invalid filter strings fall back to `info`.
pub fn init(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|e| {
        web_sys::console::warn_1(&format!("Invalid log filter {:?}: {}", filter, e).into());
        EnvFilter::new(DEFAULT_LOG_FILTER)
    });

    // wasm32 has no system clock for the default timer.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(ConsoleMakeWriter)
        .with_ansi(false)
        .without_time()
        .try_init();
}

/// Hands out one [`ConsoleWriter`] per event.
pub struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::new(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter::new(*meta.level())
    }
}

/// Buffers one formatted event and prints it with the matching console method on drop.
pub struct ConsoleWriter {
    level: Level,
    buffer: Vec<u8>,
}

impl ConsoleWriter {
    fn new(level: Level) -> Self {
        Self {
            level,
            buffer: Vec::new(),
        }
    }

    fn take_line(&mut self) -> Option<String> {
        let text = String::from_utf8_lossy(&self.buffer).trim_end().to_string();
        self.buffer.clear();
        (!text.is_empty()).then_some(text)
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let Some(line) = self.take_line() else {
            return;
        };
        let value = JsValue::from(line);
        match self.level {
            Level::ERROR => web_sys::console::error_1(&value),
            Level::WARN => web_sys::console::warn_1(&value),
            Level::INFO => web_sys::console::log_1(&value),
            _ => web_sys::console::debug_1(&value),
        }
    }
}
