use std::collections::VecDeque;
use std::fmt::Display;

use bytes::Bytes;
use compartment_core::UploadError;
use engine_logging::engine_warn;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};

/// Data payloads of a server-sent event stream, one item per event.
pub type EventStream = BoxStream<'static, Result<String, UploadError>>;

/// Incremental decoder for `text/event-stream` bodies.
///
/// Only `data` fields matter here; `event`, `id`, `retry` and comments are
/// skipped. Multi-line data is joined with `\n` as the format requires.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds raw bytes and returns every event completed by them.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if self.data_lines.is_empty() {
                return None;
            }
            let data = self.data_lines.join("\n");
            self.data_lines.clear();
            return Some(data);
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data_lines.push(value.to_string());
        }
        None
    }
}

/// Turns a byte stream into a stream of event payloads.
///
/// A transport error is reported once as a connection error and ends the
/// stream; an event left unterminated at end of input is discarded.
pub fn data_stream<S, E>(bytes: S) -> EventStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = (bytes.boxed(), SseDecoder::new(), VecDeque::new(), false);
    stream::unfold(state, |(mut bytes, mut decoder, mut pending, failed)| async move {
        loop {
            if let Some(data) = pending.pop_front() {
                return Some((Ok(data), (bytes, decoder, pending, failed)));
            }
            if failed {
                return None;
            }
            match bytes.next().await {
                Some(Ok(chunk)) => pending.extend(decoder.feed(&chunk)),
                Some(Err(err)) => {
                    engine_warn!("Progress stream transport error: {}", err);
                    return Some((
                        Err(UploadError::connection_lost()),
                        (bytes, decoder, pending, true),
                    ));
                }
                None => return None,
            }
        }
    })
    .boxed()
}
