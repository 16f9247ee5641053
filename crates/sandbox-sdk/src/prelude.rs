//! Common imports for typical SDK usage.
pub use crate::{
    ClientConfig, CreateSandboxRequest, ExecutionResult, ExecutionStream, InstallPackagesRequest,
    Language, RunCodeRequest, Sandbox, SandboxClient, SandboxError, SandboxId, StreamCallbacks,
    StreamEvent,
};
