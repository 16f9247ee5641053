use std::fmt;

use super::event::{ExecutionEnd, ExecutionFailure, ExecutionStart, OutputChunk, StreamEvent};

type Handler<'a, T> = Box<dyn FnMut(T) + Send + 'a>;

/// Caller-supplied handlers for a streaming execution, one optional slot per
/// event kind. Events whose slot is empty are discarded.
///
/// ```
/// use sandbox_sdk::StreamCallbacks;
///
/// let mut output = String::new();
/// let callbacks = StreamCallbacks::new()
///     .on_output(|chunk| output.push_str(&chunk.data))
///     .on_error(|failure| eprintln!("execution error: {}", failure.message));
/// # drop(callbacks);
/// ```
#[derive(Default)]
pub struct StreamCallbacks<'a> {
    on_start: Option<Handler<'a, ExecutionStart>>,
    on_output: Option<Handler<'a, OutputChunk>>,
    on_error: Option<Handler<'a, ExecutionFailure>>,
    on_end: Option<Handler<'a, ExecutionEnd>>,
}

impl<'a> StreamCallbacks<'a> {
    /// Creates a set with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, handler: impl FnMut(ExecutionStart) + Send + 'a) -> Self {
        self.on_start = Some(Box::new(handler));
        self
    }

    pub fn on_output(mut self, handler: impl FnMut(OutputChunk) + Send + 'a) -> Self {
        self.on_output = Some(Box::new(handler));
        self
    }

    pub fn on_error(mut self, handler: impl FnMut(ExecutionFailure) + Send + 'a) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    pub fn on_end(mut self, handler: impl FnMut(ExecutionEnd) + Send + 'a) -> Self {
        self.on_end = Some(Box::new(handler));
        self
    }

    /// Invokes the handler registered for the event's kind.
    ///
    /// Returns `false` when the slot is empty and the event was discarded.
    pub fn dispatch(&mut self, event: StreamEvent) -> bool {
        match event {
            StreamEvent::Start(start) => call(&mut self.on_start, start),
            StreamEvent::Output(chunk) => call(&mut self.on_output, chunk),
            StreamEvent::Error(failure) => call(&mut self.on_error, failure),
            StreamEvent::End(end) => call(&mut self.on_end, end),
        }
    }
}

fn call<T>(slot: &mut Option<Handler<'_, T>>, value: T) -> bool {
    match slot {
        Some(handler) => {
            handler(value);
            true
        }
        None => false,
    }
}

impl fmt::Debug for StreamCallbacks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamCallbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_output", &self.on_output.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_end", &self.on_end.is_some())
            .finish()
    }
}
