#[cfg(test)]
#[path = "chunks_test.rs"]
mod tests;

use std::collections::VecDeque;

use anyhow::Result;
use futures::stream::Stream;
use futures::stream::StreamExt;
use futures::stream::TryStreamExt;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::domain::models::CompletionStream;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionDelta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub delta: CompletionDelta,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionChunk {
    pub choices: Vec<CompletionChoice>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BodyFormat {
    Chunks,
    PlainText,
}

fn strip_sse(line: &str) -> &str {
    let payload = line.trim();
    if let Some(stripped) = payload.strip_prefix("data:") {
        return stripped.trim();
    }
    return payload;
}

fn parse_chunk(payload: &str) -> serde_json::Result<String> {
    let chunk = serde_json::from_str::<CompletionChunk>(payload)?;
    return Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| return choice.delta.content)
        .unwrap_or_default());
}

fn decode_chunk_line(line: &str) -> Option<String> {
    let payload = strip_sse(line);
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }

    match parse_chunk(payload) {
        Ok(content) => {
            if content.is_empty() {
                return None;
            }
            return Some(content);
        }
        Err(err) => {
            tracing::warn!(error = ?err, line = payload, "Skipping undecodable chunk");
            return None;
        }
    }
}

/// Turns raw body bytes into text deltas.
///
/// The body format is sniffed from its first non-whitespace bytes. Chat
/// completion chunks, with or without an SSE `data:` prefix, are split into
/// lines and yield their delta content. Anything else is plain text and is
/// forwarded byte for byte, including whatever was held back while sniffing.
/// Only incomplete UTF-8 sequences are carried over to the next feed.
#[derive(Default)]
pub struct ChunkDecoder {
    format: Option<BodyFormat>,
    pending: Vec<u8>,
}

impl ChunkDecoder {
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        if self.format.is_none() {
            self.format = self.sniff();
        }

        match self.format {
            Some(BodyFormat::Chunks) => return self.drain_lines(false),
            Some(BodyFormat::PlainText) => return self.drain_text(false),
            None => return vec![],
        }
    }

    /// Flushes whatever is left once the body has ended.
    pub fn finish(&mut self) -> Vec<String> {
        if self.format.is_none() {
            let rest = String::from_utf8_lossy(&self.pending).to_string();
            let payload = strip_sse(&rest);
            if payload.starts_with('{') && parse_chunk(payload).is_ok() {
                self.format = Some(BodyFormat::Chunks);
            } else {
                self.format = Some(BodyFormat::PlainText);
            }
        }

        match self.format {
            Some(BodyFormat::Chunks) => return self.drain_lines(true),
            _ => return self.drain_text(true),
        }
    }

    fn sniff(&self) -> Option<BodyFormat> {
        let start = self
            .pending
            .iter()
            .position(|byte| return !byte.is_ascii_whitespace())?;
        let rest = &self.pending[start..];

        if rest.starts_with(b"data:") {
            return Some(BodyFormat::Chunks);
        }
        if b"data:".starts_with(rest) {
            return None;
        }
        if rest[0] != b'{' {
            return Some(BodyFormat::PlainText);
        }

        // A leading brace is only a chunk if the whole first line parses.
        let end = rest.iter().position(|byte| return *byte == b'\n')?;
        let line = String::from_utf8_lossy(&rest[..end]);
        if parse_chunk(line.trim()).is_ok() {
            return Some(BodyFormat::Chunks);
        }
        return Some(BodyFormat::PlainText);
    }

    fn drain_lines(&mut self, finished: bool) -> Vec<String> {
        let mut deltas = vec![];
        while let Some(end) = self.pending.iter().position(|byte| return *byte == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            if let Some(delta) = decode_chunk_line(&String::from_utf8_lossy(&line)) {
                deltas.push(delta);
            }
        }

        if finished && !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            if let Some(delta) = decode_chunk_line(&String::from_utf8_lossy(&line)) {
                deltas.push(delta);
            }
        }

        return deltas;
    }

    fn drain_text(&mut self, finished: bool) -> Vec<String> {
        let ready = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(err) if err.error_len().is_none() && !finished => err.valid_up_to(),
            Err(_) => self.pending.len(),
        };
        if ready == 0 {
            return vec![];
        }

        let bytes: Vec<u8> = self.pending.drain(..ready).collect();
        return vec![String::from_utf8_lossy(&bytes).to_string()];
    }
}

struct BodyState<S> {
    body: S,
    decoder: ChunkDecoder,
    ready: VecDeque<String>,
    finished: bool,
}

/// Decodes a stream of body byte chunks into text deltas. The stream ends
/// when the body does.
pub fn decode_body<S, B>(body: S) -> CompletionStream
where
    S: Stream<Item = Result<B>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = BodyState {
        body,
        decoder: ChunkDecoder::default(),
        ready: VecDeque::new(),
        finished: false,
    };

    return futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(delta) = state.ready.pop_front() {
                return Some((Ok(delta), state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(bytes)) => {
                    let deltas = state.decoder.feed(bytes.as_ref());
                    state.ready.extend(deltas);
                }
                Some(Err(err)) => {
                    tracing::error!(error = ?err, "Failed to read completion body");
                    state.finished = true;
                    return Some((Err(err), state));
                }
                None => {
                    state.finished = true;
                    let deltas = state.decoder.finish();
                    state.ready.extend(deltas);
                }
            }
        }
    })
    .boxed();
}

pub fn into_completion_stream(res: reqwest::Response) -> CompletionStream {
    let body = res.bytes_stream().map_err(anyhow::Error::from).boxed();
    return decode_body(body);
}
