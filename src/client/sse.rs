//! # client::sse — incremental `text/event-stream` decoder
//!
//! Bytes arrive from reqwest in arbitrary chunks; this buffers partial lines
//! and emits complete events following the EventSource processing model:
//!
//! * lines end in `\r\n`, `\n` or a lone `\r`
//! * a blank line dispatches the pending event
//! * `data:` lines are joined with `\n`
//! * `event:` sets the event name (default `message`)
//! * `id:` sets the last event id, `retry:` the reconnection delay
//! * lines starting with `:` are comments (keep-alives)

use std::time::Duration;

const DEFAULT_EVENT: &str = "message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: String,
    has_data: bool,
    last_id: Option<String>,
    retry: Option<Duration>,
    started: bool,
    /// Last chunk ended on `\r`; a leading `\n` belongs to that line break.
    skip_lf: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconnection delay most recently advertised by the server.
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_id.as_deref()
    }

    /// Feed one chunk, returning every event it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut chunk = chunk;
        if !chunk.is_empty() && std::mem::take(&mut self.skip_lf) && chunk[0] == b'\n' {
            chunk = &chunk[1..];
        }
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n' || b == b'\r') {
            let crlf = self.buffer[pos] == b'\r' && self.buffer.get(pos + 1) == Some(&b'\n');
            let end = if crlf { pos + 2 } else { pos + 1 };
            if self.buffer[pos] == b'\r' && end == self.buffer.len() {
                self.skip_lf = true;
            }
            let mut line: Vec<u8> = self.buffer.drain(..end).collect();
            line.truncate(pos);

            let mut text = String::from_utf8_lossy(&line).into_owned();
            if !self.started {
                self.started = true;
                if let Some(stripped) = text.strip_prefix('\u{feff}') {
                    text = stripped.to_string();
                }
            }

            if let Some(event) = self.process_line(&text) {
                events.push(event);
            }
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            "id" if !value.contains('\0') => self.last_id = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if !self.has_data {
            return None;
        }

        self.has_data = false;
        Some(SseEvent {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data: std::mem::take(&mut self.data),
            id: self.last_id.clone(),
        })
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
