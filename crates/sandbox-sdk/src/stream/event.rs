use std::fmt;

use serde_json::{Map, Value};

/// Discriminator carried in the `type` field of every stream payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    Output,
    Error,
    End,
}

impl EventKind {
    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Output => "output",
            Self::Error => "error",
            Self::End => "end",
        }
    }

    fn from_wire(value: &str) -> Option<Self> {
        match value {
            "start" => Some(Self::Start),
            "output" => Some(Self::Output),
            "error" => Some(Self::Error),
            "end" => Some(Self::End),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata announced before an execution begins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExecutionStart {
    /// Every payload field except `type`.
    pub metadata: Map<String, Value>,
}

/// Incremental chunk of program output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputChunk {
    pub data: String,
}

/// Failure reported mid-execution.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionFailure {
    pub message: String,
    /// The raw `error` value when the service sent a structured error.
    pub details: Option<Value>,
}

/// Completion metadata sent as the last event of an execution.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExecutionEnd {
    /// Elapsed time from the `executionTime` field, as reported by the service.
    pub execution_time: Option<f64>,
    pub exit_code: Option<i32>,
    /// Remaining payload fields.
    pub metadata: Map<String, Value>,
}

/// One decoded event of a streaming execution.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    Start(ExecutionStart),
    Output(OutputChunk),
    Error(ExecutionFailure),
    End(ExecutionEnd),
}

impl StreamEvent {
    /// Returns the kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Start(_) => EventKind::Start,
            Self::Output(_) => EventKind::Output,
            Self::Error(_) => EventKind::Error,
            Self::End(_) => EventKind::End,
        }
    }

    /// Parses the JSON payload of a `data:` frame.
    pub(crate) fn from_payload(payload: &str) -> Result<Self, FrameError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| FrameError::InvalidJson(e.to_string()))?;
        let Value::Object(mut object) = value else {
            return Err(FrameError::NotAnObject);
        };
        let kind = match object.remove("type") {
            Some(Value::String(name)) => {
                EventKind::from_wire(&name).ok_or(FrameError::UnknownType(name))?
            }
            Some(_) | None => return Err(FrameError::MissingType),
        };

        match kind {
            EventKind::Start => Ok(Self::Start(ExecutionStart { metadata: object })),
            EventKind::Output => match object.remove("data") {
                Some(Value::String(data)) => Ok(Self::Output(OutputChunk { data })),
                _ => Err(FrameError::MissingField { kind, field: "data" }),
            },
            EventKind::Error => {
                let raw = object
                    .remove("error")
                    .ok_or(FrameError::MissingField { kind, field: "error" })?;
                Ok(Self::Error(failure_from_value(raw)))
            }
            EventKind::End => {
                let execution_time = object.remove("executionTime").and_then(|v| v.as_f64());
                let exit_code = object
                    .remove("exitCode")
                    .and_then(|v| v.as_i64())
                    .and_then(|code| i32::try_from(code).ok());
                Ok(Self::End(ExecutionEnd {
                    execution_time,
                    exit_code,
                    metadata: object,
                }))
            }
        }
    }
}

fn failure_from_value(raw: Value) -> ExecutionFailure {
    match raw {
        Value::String(message) => ExecutionFailure {
            message,
            details: None,
        },
        other => {
            let message = other
                .get("message")
                .and_then(|m| m.as_str())
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| other.to_string());
            ExecutionFailure {
                message,
                details: Some(other),
            }
        }
    }
}

/// Reason a `data:` frame was dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum FrameError {
    #[error("frame is not valid UTF-8")]
    InvalidUtf8,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("payload has no string `type` field")]
    MissingType,
    #[error("unknown event type `{0}`")]
    UnknownType(String),
    #[error("`{kind}` event is missing `{field}`")]
    MissingField { kind: EventKind, field: &'static str },
}
