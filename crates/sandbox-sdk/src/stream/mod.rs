//! Decoding of streaming-execution responses.
//!
//! The service answers `POST /sandboxes/{id}/execute/stream` with a body of
//! newline-delimited `data: <json>` lines. [`StreamDecoder`] turns raw body
//! chunks into [`StreamEvent`]s; [`dispatch_stream`] drives a decoder over a
//! chunk stream and hands each event to a [`StreamCallbacks`] set, while
//! [`ExecutionStream`] exposes the same events as a pull-based stream.
mod callbacks;
mod decoder;
mod event;

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{self, Stream, StreamExt as _};
use tracing::debug;

use crate::errors::SandboxError;
use crate::execution::ExecutionResult;

pub use callbacks::StreamCallbacks;
pub use decoder::{DATA_PREFIX, DecoderState, StreamDecoder};
pub use event::{
    EventKind, ExecutionEnd, ExecutionFailure, ExecutionStart, OutputChunk, StreamEvent,
};

/// Counters describing a finished [`dispatch_stream`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Events decoded from the body, dispatched or not.
    pub events: u64,
    /// Events that found a registered handler.
    pub dispatched: u64,
    /// `data:` frames dropped because their payload was invalid.
    pub dropped_frames: u64,
    /// Bytes of an unterminated final line discarded at end of stream.
    pub discarded_bytes: usize,
}

/// Reads `body` until end-of-stream, dispatching every decoded event to
/// `callbacks` in arrival order.
///
/// Each chunk is fully decoded and dispatched before the next one is
/// requested, so a slow handler slows down reading. A chunk read error ends
/// the call with [`SandboxError::Transport`]; malformed frames do not.
pub async fn dispatch_stream<S, B, E>(
    body: S,
    callbacks: &mut StreamCallbacks<'_>,
) -> Result<StreamSummary, SandboxError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let mut body = std::pin::pin!(body);
    let mut decoder = StreamDecoder::new();
    let mut summary = StreamSummary::default();

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                decoder.finish();
                return Err(SandboxError::transport(format!(
                    "execution stream read failed: {e}"
                )));
            }
        };
        for event in decoder.push_chunk(chunk) {
            summary.events += 1;
            if callbacks.dispatch(event) {
                summary.dispatched += 1;
            }
        }
    }

    summary.discarded_bytes = decoder.finish();
    summary.dropped_frames = decoder.dropped_frames();
    debug!(
        events = summary.events,
        dispatched = summary.dispatched,
        dropped_frames = summary.dropped_frames,
        "execution stream closed"
    );
    Ok(summary)
}

type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, SandboxError>> + Send>>;

/// Pull-based view of a streaming execution.
///
/// Yields decoded events until the body ends; a transport failure is yielded
/// once as `Err` and ends the stream. Dropping the value abandons the
/// response.
pub struct ExecutionStream {
    inner: EventStream,
}

impl ExecutionStream {
    /// Wraps a raw body chunk stream.
    pub fn from_body<S, B, E>(body: S) -> Self
    where
        S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
        B: AsRef<[u8]> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        Self {
            inner: Box::pin(event_stream(body)),
        }
    }

    /// Waits for the next event. Returns `None` after the stream has ended.
    pub async fn next_event(&mut self) -> Option<Result<StreamEvent, SandboxError>> {
        self.inner.next().await
    }

    /// Drains the stream into an [`ExecutionResult`].
    ///
    /// Output chunks are concatenated in order; the last `error` event wins;
    /// execution time and exit code come from the `end` event.
    pub async fn collect_result(mut self) -> Result<ExecutionResult, SandboxError> {
        let mut result = ExecutionResult::default();
        let mut saw_end = false;
        while let Some(event) = self.next_event().await {
            match event? {
                StreamEvent::Start(_) => {}
                StreamEvent::Output(chunk) => result.output.push_str(&chunk.data),
                StreamEvent::Error(failure) => result.error = Some(failure.message),
                StreamEvent::End(end) => {
                    saw_end = true;
                    result.execution_time = end.execution_time;
                    result.exit_code = end.exit_code;
                }
            }
        }
        if !saw_end {
            debug!("execution stream ended without an end event");
        }
        Ok(result)
    }
}

impl Stream for ExecutionStream {
    type Item = Result<StreamEvent, SandboxError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for ExecutionStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionStream").finish_non_exhaustive()
    }
}

fn event_stream<S, B, E>(body: S) -> impl Stream<Item = Result<StreamEvent, SandboxError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    struct State<S> {
        body: S,
        decoder: StreamDecoder,
        pending: VecDeque<StreamEvent>,
    }

    stream::try_unfold(
        State {
            body,
            decoder: StreamDecoder::new(),
            pending: VecDeque::new(),
        },
        |mut state| async move {
            loop {
                if let Some(event) = state.pending.pop_front() {
                    return Ok(Some((event, state)));
                }
                if state.decoder.state() == DecoderState::Closed {
                    return Ok(None);
                }

                match state.body.next().await {
                    Some(Ok(chunk)) => {
                        state.pending.extend(state.decoder.push_chunk(chunk));
                    }
                    Some(Err(e)) => {
                        state.decoder.finish();
                        return Err(SandboxError::transport(format!(
                            "execution stream read failed: {e}"
                        )));
                    }
                    None => {
                        state.decoder.finish();
                    }
                }
            }
        },
    )
}
