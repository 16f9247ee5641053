use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, Url, header};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::errors::{SandboxError, api_error_message};
use crate::execution::{ExecutionResult, RunCodeRequest};
use crate::model::{
    CreateSandboxRequest, FileEntry, InstallPackagesRequest, Language, PackageInstallResult,
    SandboxId, SandboxInfo,
};
use crate::sandbox::Sandbox;
use crate::stream::{ExecutionStream, StreamCallbacks, StreamSummary, dispatch_stream};

const REQUEST_ID_HEADER: &str = "x-request-id";

type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static>>;

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
}

/// Client for the sandbox service REST API.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Clone)]
pub struct SandboxClient {
    inner: Arc<ClientInner>,
}

impl SandboxClient {
    /// Creates a client from explicit configuration.
    pub fn new(config: ClientConfig) -> Result<Self, SandboxError> {
        config.validate()?;
        // Timeouts are set per request; streamed bodies are unbounded by default.
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SandboxError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            inner: Arc::new(ClientInner { http, config }),
        })
    }

    /// Creates a client using `SANDBOX_API_URL` / `SANDBOX_API_KEY`.
    pub fn from_env() -> Result<Self, SandboxError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Creates a sandbox and returns a handle bound to it.
    pub async fn create_sandbox(
        &self,
        request: CreateSandboxRequest,
    ) -> Result<Sandbox, SandboxError> {
        if request.language == Language::Other {
            return Err(SandboxError::Validation(
                "a concrete language is required to create a sandbox".into(),
            ));
        }
        let url = self.inner.config.endpoint(&["sandboxes"])?;
        let info: SandboxInfo = self
            .send_json("create sandbox", self.request(Method::POST, url).json(&request))
            .await?;
        debug!(sandbox_id = %info.id, "sandbox created");
        Ok(Sandbox::new(self.clone(), info))
    }

    /// Returns a handle for an existing sandbox after checking that it exists.
    pub async fn connect(&self, id: impl Into<SandboxId>) -> Result<Sandbox, SandboxError> {
        let info = self.get_sandbox(id).await?;
        Ok(Sandbox::new(self.clone(), info))
    }

    pub async fn get_sandbox(&self, id: impl Into<SandboxId>) -> Result<SandboxInfo, SandboxError> {
        let id = validated_id(id)?;
        let url = self.inner.config.endpoint(&["sandboxes", id.as_str()])?;
        self.send_json("get sandbox", self.request(Method::GET, url))
            .await
    }

    pub async fn list_sandboxes(&self) -> Result<Vec<SandboxInfo>, SandboxError> {
        let url = self.inner.config.endpoint(&["sandboxes"])?;
        self.send_json("list sandboxes", self.request(Method::GET, url))
            .await
    }

    pub async fn delete_sandbox(&self, id: impl Into<SandboxId>) -> Result<(), SandboxError> {
        let id = validated_id(id)?;
        let url = self.inner.config.endpoint(&["sandboxes", id.as_str()])?;
        self.send("delete sandbox", self.request(Method::DELETE, url))
            .await?;
        debug!(sandbox_id = %id, "sandbox deleted");
        Ok(())
    }

    /// Runs code and waits for the complete result.
    pub async fn run_code(
        &self,
        id: impl Into<SandboxId>,
        request: impl Into<RunCodeRequest>,
    ) -> Result<ExecutionResult, SandboxError> {
        let id = validated_id(id)?;
        let request = validated_run(request.into())?;
        let url = self
            .inner
            .config
            .endpoint(&["sandboxes", id.as_str(), "execute"])?;
        let mut builder = self.request(Method::POST, url).json(&request);
        if let Some(secs) = request.timeout_secs {
            builder = builder.timeout(self.inner.config.timeout.max(Duration::from_secs(secs)));
        }
        self.send_json("run code", builder).await
    }

    /// Runs code and feeds every streamed event to `callbacks` as it arrives.
    ///
    /// Returns once the service closes the stream. Malformed frames are
    /// skipped; HTTP and read failures end the call with an error.
    pub async fn run_code_stream(
        &self,
        id: impl Into<SandboxId>,
        request: impl Into<RunCodeRequest>,
        callbacks: &mut StreamCallbacks<'_>,
    ) -> Result<StreamSummary, SandboxError> {
        let response = self.open_stream(id.into(), request.into()).await?;
        dispatch_stream(response.bytes_stream(), callbacks).await
    }

    /// Runs code and returns the streamed events as an [`ExecutionStream`].
    pub async fn execution_stream(
        &self,
        id: impl Into<SandboxId>,
        request: impl Into<RunCodeRequest>,
    ) -> Result<ExecutionStream, SandboxError> {
        let response = self.open_stream(id.into(), request.into()).await?;
        let body: ByteStream = Box::pin(response.bytes_stream());
        Ok(ExecutionStream::from_body(body))
    }

    /// Reads a text file from the sandbox filesystem.
    pub async fn read_file(
        &self,
        id: impl Into<SandboxId>,
        path: &str,
    ) -> Result<String, SandboxError> {
        #[derive(serde::Deserialize)]
        struct FileContent {
            content: String,
        }

        let id = validated_id(id)?;
        let url = self.file_url(&id, &["files"], path)?;
        let file: FileContent = self
            .send_json("read file", self.request(Method::GET, url))
            .await?;
        Ok(file.content)
    }

    /// Writes a text file, creating or replacing it.
    pub async fn write_file(
        &self,
        id: impl Into<SandboxId>,
        path: &str,
        content: impl Into<String>,
    ) -> Result<(), SandboxError> {
        let id = validated_id(id)?;
        let path = validated_path(path)?;
        let url = self
            .inner
            .config
            .endpoint(&["sandboxes", id.as_str(), "files"])?;
        let body = serde_json::json!({ "path": path, "content": content.into() });
        self.send("write file", self.request(Method::PUT, url).json(&body))
            .await?;
        Ok(())
    }

    /// Lists the entries of a directory.
    pub async fn list_files(
        &self,
        id: impl Into<SandboxId>,
        path: &str,
    ) -> Result<Vec<FileEntry>, SandboxError> {
        let id = validated_id(id)?;
        let url = self.file_url(&id, &["files", "list"], path)?;
        self.send_json("list files", self.request(Method::GET, url))
            .await
    }

    pub async fn install_packages(
        &self,
        id: impl Into<SandboxId>,
        request: InstallPackagesRequest,
    ) -> Result<PackageInstallResult, SandboxError> {
        let id = validated_id(id)?;
        if request.packages.is_empty() {
            return Err(SandboxError::Validation(
                "at least one package is required".into(),
            ));
        }
        if request.packages.iter().any(|p| p.trim().is_empty()) {
            return Err(SandboxError::Validation(
                "package names must not be empty".into(),
            ));
        }
        let url = self
            .inner
            .config
            .endpoint(&["sandboxes", id.as_str(), "packages"])?;
        let builder = self
            .request(Method::POST, url)
            .timeout(self.inner.config.timeout.saturating_mul(5))
            .json(&request);
        self.send_json("install packages", builder).await
    }

    async fn open_stream(
        &self,
        id: SandboxId,
        request: RunCodeRequest,
    ) -> Result<Response, SandboxError> {
        let id = validated_id(id)?;
        let request = validated_run(request)?;
        let url = self
            .inner
            .config
            .endpoint(&["sandboxes", id.as_str(), "execute", "stream"])?;
        let mut builder = self
            .stream_request(Method::POST, url)
            .header(header::ACCEPT, "text/event-stream")
            .json(&request);
        if let Some(secs) = request.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let response = self.send("run code stream", builder).await?;
        debug!(sandbox_id = %id, "execution stream opened");
        Ok(response)
    }

    fn file_url(&self, id: &SandboxId, segments: &[&str], path: &str) -> Result<Url, SandboxError> {
        let path = validated_path(path)?;
        let mut full = vec!["sandboxes", id.as_str()];
        full.extend_from_slice(segments);
        let mut url = self.inner.config.endpoint(&full)?;
        url.query_pairs_mut().append_pair("path", path);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.base_request(method, url)
            .timeout(self.inner.config.timeout)
    }

    /// Like [`Self::request`] but without the default timeout, for responses
    /// that are read incrementally.
    fn stream_request(&self, method: Method, url: Url) -> RequestBuilder {
        self.base_request(method, url)
    }

    fn base_request(&self, method: Method, url: Url) -> RequestBuilder {
        let request_id = uuid::Uuid::new_v4();
        debug!(%method, %url, %request_id, "sandbox API request");
        let mut builder = self
            .inner
            .http
            .request(method, url)
            .header(REQUEST_ID_HEADER, request_id.to_string());
        if let Some(key) = &self.inner.config.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    async fn send(&self, op: &str, builder: RequestBuilder) -> Result<Response, SandboxError> {
        let response = builder
            .send()
            .await
            .map_err(|e| SandboxError::transport(format!("{op} request failed: {e}")))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        debug!(op, status = status.as_u16(), "sandbox API returned an error status");
        Err(SandboxError::api(
            status.as_u16(),
            format!("{op} failed: {}", api_error_message(&body)),
        ))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        op: &str,
        builder: RequestBuilder,
    ) -> Result<T, SandboxError> {
        let response = self.send(op, builder).await?;
        let body = response
            .text()
            .await
            .map_err(|e| SandboxError::transport(format!("{op} response read failed: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| SandboxError::decode(format!("invalid {op} response: {e}")))
    }
}

impl std::fmt::Debug for SandboxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxClient")
            .field("base_url", &self.inner.config.base_url)
            .finish_non_exhaustive()
    }
}

fn validated_id(id: impl Into<SandboxId>) -> Result<SandboxId, SandboxError> {
    let id = id.into();
    if id.as_str().trim().is_empty() {
        return Err(SandboxError::Validation(
            "sandbox id must not be empty".into(),
        ));
    }
    Ok(id)
}

fn validated_run(request: RunCodeRequest) -> Result<RunCodeRequest, SandboxError> {
    if request.code.trim().is_empty() {
        return Err(SandboxError::Validation("code must not be empty".into()));
    }
    if request.language == Some(Language::Other) {
        return Err(SandboxError::Validation(
            "execution language must be a concrete language".into(),
        ));
    }
    Ok(request)
}

fn validated_path(path: &str) -> Result<&str, SandboxError> {
    if path.trim().is_empty() {
        return Err(SandboxError::Validation("file path must not be empty".into()));
    }
    Ok(path)
}
