use crate::client::SandboxClient;
use crate::errors::SandboxError;
use crate::execution::{ExecutionResult, RunCodeRequest};
use crate::model::{FileEntry, InstallPackagesRequest, PackageInstallResult, SandboxId, SandboxInfo};
use crate::stream::{ExecutionStream, StreamCallbacks, StreamSummary};

/// Handle bound to one remote sandbox.
///
/// Obtained from [`SandboxClient::create_sandbox`] or
/// [`SandboxClient::connect`]. Holds no server state beyond the last fetched
/// [`SandboxInfo`]; every method is a single API call.
#[derive(Clone, Debug)]
pub struct Sandbox {
    client: SandboxClient,
    info: SandboxInfo,
}

impl Sandbox {
    pub(crate) fn new(client: SandboxClient, info: SandboxInfo) -> Self {
        Self { client, info }
    }

    pub fn id(&self) -> &SandboxId {
        &self.info.id
    }

    /// Sandbox description as of creation or the last [`Self::refresh`].
    pub fn info(&self) -> &SandboxInfo {
        &self.info
    }

    pub fn client(&self) -> &SandboxClient {
        &self.client
    }

    /// Re-fetches the sandbox description.
    pub async fn refresh(&mut self) -> Result<&SandboxInfo, SandboxError> {
        self.info = self.client.get_sandbox(&self.info.id).await?;
        Ok(&self.info)
    }

    pub async fn run_code(
        &self,
        request: impl Into<RunCodeRequest>,
    ) -> Result<ExecutionResult, SandboxError> {
        self.client.run_code(&self.info.id, request).await
    }

    pub async fn run_code_stream(
        &self,
        request: impl Into<RunCodeRequest>,
        callbacks: &mut StreamCallbacks<'_>,
    ) -> Result<StreamSummary, SandboxError> {
        self.client
            .run_code_stream(&self.info.id, request, callbacks)
            .await
    }

    pub async fn execution_stream(
        &self,
        request: impl Into<RunCodeRequest>,
    ) -> Result<ExecutionStream, SandboxError> {
        self.client.execution_stream(&self.info.id, request).await
    }

    pub async fn read_file(&self, path: &str) -> Result<String, SandboxError> {
        self.client.read_file(&self.info.id, path).await
    }

    pub async fn write_file(
        &self,
        path: &str,
        content: impl Into<String>,
    ) -> Result<(), SandboxError> {
        self.client.write_file(&self.info.id, path, content).await
    }

    pub async fn list_files(&self, path: &str) -> Result<Vec<FileEntry>, SandboxError> {
        self.client.list_files(&self.info.id, path).await
    }

    pub async fn install_packages(
        &self,
        request: InstallPackagesRequest,
    ) -> Result<PackageInstallResult, SandboxError> {
        self.client.install_packages(&self.info.id, request).await
    }

    /// Deletes the sandbox. The handle is consumed since the id is no longer
    /// valid afterwards.
    pub async fn delete(self) -> Result<(), SandboxError> {
        self.client.delete_sandbox(self.info.id).await
    }
}
