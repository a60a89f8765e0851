//! Stream decoding for agent responses
//!
//! `eventsource-stream` frames the transport bytes into events; [`SseDecoder`]
//! projects each one, and [`decode_stream`] wraps both into a pull-based
//! [`EventStream`].

pub mod decoder;

pub use decoder::SseDecoder;

use crate::error::{AiSdkError, AiSdkResult};
use crate::http::ByteStream;
use crate::protocol::StreamEvent;
use bytes::Bytes;
use eventsource_stream::{EventStreamError, Eventsource};
use futures::{stream, Stream, StreamExt};
use std::pin::Pin;
use tracing::warn;

/// Lazily decoded sequence of stream events
///
/// Dropping it drops the underlying byte stream, which closes the connection.
pub type EventStream = Pin<Box<dyn Stream<Item = AiSdkResult<StreamEvent>> + Send>>;

/// Decode a byte stream with default settings
pub fn decode_stream(bytes: ByteStream) -> EventStream {
    decode_stream_with(bytes, SseDecoder::new())
}

/// Decode a byte stream with a preconfigured decoder
///
/// The stream ends after the first `end` or `error` event, after a transport
/// error, or when the byte stream closes. An event the service left without a
/// closing blank line is still delivered at end of input.
pub fn decode_stream_with(bytes: ByteStream, mut decoder: SseDecoder) -> EventStream {
    // Close any unterminated trailing event
    let closing = stream::once(async { Ok::<_, AiSdkError>(Bytes::from_static(b"\n\n")) });
    let mut events = Box::pin(bytes.chain(closing).eventsource());

    Box::pin(async_stream::stream! {
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => {
                    for event in decoder.decode_event(&event.event, &event.data) {
                        let terminal = event.is_terminal();
                        yield Ok(event);
                        if terminal {
                            return;
                        }
                    }
                }
                Err(EventStreamError::Transport(e)) => {
                    yield Err(e);
                    return;
                }
                Err(e) => {
                    warn!("Malformed event stream: {}", e);
                    yield Err(AiSdkError::Parse(format!("Invalid event stream: {}", e)));
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AiSdkError;
    use bytes::Bytes;
    use futures::stream;

    fn byte_stream(chunks: Vec<Result<&'static str, AiSdkError>>) -> ByteStream {
        Box::pin(stream::iter(
            chunks
                .into_iter()
                .map(|c| c.map(|s| Bytes::from_static(s.as_bytes()))),
        ))
    }

    #[tokio::test]
    async fn test_stops_after_terminal_event() {
        let bytes = byte_stream(vec![
            Ok("data: {\"content\":\"hi\"}\n\nevent: stream-completed\ndata: {}\n\n"),
            Ok("data: {\"content\":\"after end\"}\n\n"),
        ]);
        let events: Vec<_> = decode_stream(bytes).collect().await;
        assert_eq!(events.len(), 2);
        assert!(events[1].as_ref().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let bytes = byte_stream(vec![
            Ok("data: {\"content\":\"partial\"}\n\n"),
            Err(AiSdkError::Network("connection reset".into())),
            Ok("data: {\"content\":\"never\"}\n\n"),
        ]);
        let events: Vec<_> = decode_stream(bytes).collect().await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], Err(AiSdkError::Network(_))));
    }

    #[tokio::test]
    async fn test_closure_without_delimiter_flushes_tail() {
        let bytes = byte_stream(vec![Ok("data: {\"content\":\"last words\"}")]);
        let events: Vec<_> = decode_stream(bytes).collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().text(), Some("last words"));
    }
}
