//! Async client for a remote code-execution sandbox service.
//!
//! The service owns sandboxes, runtimes and files; this crate only issues the
//! REST calls and decodes responses, including the `data: <json>` event
//! stream of streaming executions.
//!
//! # Usage
//!
//! ```no_run
//! use sandbox_sdk::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), SandboxError> {
//! let client = SandboxClient::new(ClientConfig::new("http://localhost:8080").api_key("sk-test"))?;
//! let sandbox = client
//!     .create_sandbox(CreateSandboxRequest::new(Language::Python))
//!     .await?;
//!
//! sandbox.write_file("/tmp/name.txt", "world").await?;
//! let result = sandbox
//!     .run_code("print('hello', open('/tmp/name.txt').read())")
//!     .await?;
//! println!("{}", result.output);
//!
//! let mut callbacks = StreamCallbacks::new()
//!     .on_output(|chunk| print!("{}", chunk.data))
//!     .on_error(|failure| eprintln!("error: {}", failure.message))
//!     .on_end(|end| println!("\ndone in {:?}", end.execution_time));
//! sandbox
//!     .run_code_stream("for i in range(3): print(i)", &mut callbacks)
//!     .await?;
//!
//! sandbox.delete().await?;
//! # Ok(())
//! # }
//! ```

/// HTTP client and per-call request handling.
pub mod client;
/// Client configuration and environment loading.
pub mod config;
/// Public error types.
pub mod errors;
/// Execution requests and results.
pub mod execution;
/// Sandbox, file and package types.
pub mod model;
/// Optional `tracing` subscriber setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Handle bound to a single sandbox.
pub mod sandbox;
/// Streaming execution decoding and dispatch.
pub mod stream;

pub use client::SandboxClient;
pub use config::ClientConfig;
pub use errors::{ErrorKind, SandboxError};
pub use execution::{ExecutionResult, RunCodeRequest};
pub use model::{
    CreateSandboxRequest, FileEntry, InstallPackagesRequest, Language, PackageInstallResult,
    PackageManager, SandboxId, SandboxInfo, SandboxStatus,
};
pub use sandbox::Sandbox;
pub use stream::{
    DecoderState, EventKind, ExecutionEnd, ExecutionFailure, ExecutionStart, ExecutionStream,
    OutputChunk, StreamCallbacks, StreamDecoder, StreamEvent, StreamSummary, dispatch_stream,
};
