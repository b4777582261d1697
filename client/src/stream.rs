//! Streamed answers for the `completions` and `chat` endpoints.
//!
//! With `stream` set, the server writes one JSON document per chunk, each
//! followed by a blank line, and marks the last one with `reached_end`.

use bytes::{Buf, Bytes, BytesMut};
use futures::{
    Stream, StreamExt,
    stream::{self, BoxStream},
};
use log::trace;
use reqwest::StatusCode;
use serde_json::Value;
use std::{
    fmt,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    endpoints::{Answer, chat::Chat, completions::Completions, decode_answer},
    error::{Result, TextSynthError},
};

const SEPARATOR: &[u8] = b"\n\n";

/// An answer type that can be received in several chunks.
pub trait StreamedAnswer: Answer + Send + 'static {
    /// Whether this is the last chunk of the stream.
    fn reached_end(&self) -> bool;

    /// The text carried by this chunk.
    fn fragment(&self) -> String;
}

impl StreamedAnswer for Completions {
    fn reached_end(&self) -> bool {
        self.reached_end
    }

    fn fragment(&self) -> String {
        self.text.to_string()
    }
}

impl StreamedAnswer for Chat {
    fn reached_end(&self) -> bool {
        self.reached_end
    }

    fn fragment(&self) -> String {
        self.text.clone()
    }
}

/// Splits a response body into the documents separated by blank lines.
#[derive(Debug, Default)]
pub(crate) struct ChunkDecoder {
    buffer: BytesMut,
}

impl ChunkDecoder {
    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Returns the next complete document, if one is buffered.
    pub(crate) fn next_document(&mut self) -> Option<Bytes> {
        loop {
            let end = self
                .buffer
                .windows(SEPARATOR.len())
                .position(|window| window == SEPARATOR)?;
            let document = self.buffer.split_to(end).freeze();
            self.buffer.advance(SEPARATOR.len());
            if !is_blank(&document) {
                return Some(document);
            }
        }
    }

    /// Returns what is left once the body has ended.
    pub(crate) fn finish(&mut self) -> Option<Bytes> {
        let rest = self.buffer.split().freeze();
        (!is_blank(&rest)).then_some(rest)
    }
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

/// Decodes one chunk. The server may report a failure in the middle of a
/// stream with an `{"error": ...}` document.
fn decode_chunk<T: StreamedAnswer>(document: &[u8]) -> Result<T> {
    let raw: Value = serde_json::from_slice(document)?;
    if raw.get("error").is_some_and(Value::is_string) {
        let status = raw
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = String::from_utf8_lossy(document);
        return Err(TextSynthError::from_status(status, None, &body));
    }
    decode_answer(raw)
}

struct State {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    decoder: ChunkDecoder,
    done: bool,
}

/// A lazy, finite stream of answer chunks, in the order the server sent them.
///
/// The stream ends after the chunk with `reached_end` set, at the end of the
/// body, or after the first error. Dropping it early closes the connection.
pub struct AnswerStream<T> {
    inner: BoxStream<'static, Result<T>>,
}

impl<T: StreamedAnswer> AnswerStream<T> {
    pub(crate) fn from_response(response: reqwest::Response) -> Self {
        Self::from_body(response.bytes_stream().boxed())
    }

    pub(crate) fn from_body(body: BoxStream<'static, reqwest::Result<Bytes>>) -> Self {
        let state = State {
            body,
            decoder: ChunkDecoder::default(),
            done: false,
        };
        let inner = stream::unfold(state, |mut state| async move {
            if state.done {
                return None;
            }
            loop {
                if let Some(document) = state.decoder.next_document() {
                    let chunk = decode_chunk::<T>(&document);
                    state.done = match &chunk {
                        Ok(answer) => answer.reached_end(),
                        Err(_) => true,
                    };
                    trace!("received stream chunk ({} bytes)", document.len());
                    return Some((chunk, state));
                }
                match state.body.next().await {
                    Some(Ok(bytes)) => state.decoder.push(&bytes),
                    Some(Err(e)) => {
                        state.done = true;
                        return Some((Err(e.into()), state));
                    }
                    None => {
                        state.done = true;
                        let rest = state.decoder.finish()?;
                        return Some((decode_chunk::<T>(&rest), state));
                    }
                }
            }
        });
        Self {
            inner: inner.boxed(),
        }
    }

    /// Consumes the stream and concatenates the text of every chunk.
    pub async fn collect_text(mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(chunk) = self.inner.next().await {
            text.push_str(&chunk?.fragment());
        }
        Ok(text)
    }
}

impl<T> Stream for AnswerStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl<T> fmt::Debug for AnswerStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnswerStream").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use futures::TryStreamExt;

    fn body(parts: &[&'static str]) -> BoxStream<'static, reqwest::Result<Bytes>> {
        let parts: Vec<reqwest::Result<Bytes>> = parts
            .iter()
            .map(|part| Ok(Bytes::from_static(part.as_bytes())))
            .collect();
        stream::iter(parts).boxed()
    }

    #[test]
    fn test_decoder_splits_on_blank_lines() {
        let mut decoder = ChunkDecoder::default();
        decoder.push(b"{\"text\":\"a\"}\n\n{\"te");
        assert_eq!(decoder.next_document().unwrap(), &b"{\"text\":\"a\"}"[..]);
        assert!(decoder.next_document().is_none());
        decoder.push(b"xt\":\"b\"}\n\n\n\n");
        assert_eq!(decoder.next_document().unwrap(), &b"{\"text\":\"b\"}"[..]);
        assert!(decoder.next_document().is_none());
        assert!(decoder.finish().is_none());
    }

    #[tokio::test]
    async fn test_chunks_split_across_reads() {
        let stream = AnswerStream::<Completions>::from_body(body(&[
            "{\"text\": \"a\", \"reached_end\": false}\n",
            "\n{\"text\": \"b\", \"reache",
            "d_end\": false}\n\n{\"text\": \"c\", \"reached_end\": true}\n\n",
        ]));
        let chunks: Vec<Completions> = stream.try_collect().await.unwrap();
        let texts: Vec<String> = chunks.iter().map(|c| c.text.to_string()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert!(chunks[2].reached_end);
    }

    #[tokio::test]
    async fn test_stream_stops_at_reached_end() {
        let stream = AnswerStream::<Chat>::from_body(body(&[
            "{\"text\": \"done\", \"reached_end\": true}\n\n",
            "{\"text\": \"ignored\"}\n\n",
        ]));
        assert_eq!(stream.collect_text().await.unwrap(), "done");
    }

    #[tokio::test]
    async fn test_trailing_document_without_separator() {
        let stream = AnswerStream::<Completions>::from_body(body(&[
            "{\"text\": \"a\"}\n\n{\"text\": \"b\", \"reached_end\": true}",
        ]));
        assert_eq!(stream.collect_text().await.unwrap(), "ab");
    }

    #[tokio::test]
    async fn test_error_document_ends_the_stream() {
        let mut stream = AnswerStream::<Completions>::from_body(body(&[
            "{\"text\": \"a\"}\n\n{\"status\": 500, \"error\": \"engine crashed\"}\n\n{\"text\": \"b\"}\n\n",
        ]));
        assert!(stream.next().await.unwrap().is_ok());
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Service);
        assert!(err.to_string().contains("engine crashed"));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_chunk_is_a_protocol_error() {
        let stream = AnswerStream::<Completions>::from_body(body(&["not json\n\n"]));
        let err = stream.collect_text().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }
}
