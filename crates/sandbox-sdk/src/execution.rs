use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Language;

/// Code to run inside an existing sandbox.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCodeRequest {
    pub code: String,
    /// Overrides the sandbox's default language for this execution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl RunCodeRequest {
    /// Creates a request that runs `code` with the sandbox defaults.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: None,
            timeout_secs: None,
            env: BTreeMap::new(),
        }
    }

    /// Sets the execution language.
    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    /// Sets a server-side execution timeout.
    ///
    /// For streaming calls this also bounds the HTTP request on the client.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Adds an environment variable for this execution only.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl From<&str> for RunCodeRequest {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for RunCodeRequest {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

/// Final result of an execution.
///
/// Returned directly by the non-streaming call, or assembled from a stream by
/// [`ExecutionStream::collect_result`](crate::ExecutionStream::collect_result).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Combined program output.
    #[serde(default)]
    pub output: String,
    /// Failure description, when the program or the runtime failed.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    /// Elapsed execution time as reported by the service.
    #[serde(default)]
    pub execution_time: Option<f64>,
}

impl ExecutionResult {
    /// True when no error was reported and the exit code (if any) is zero.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.exit_code.unwrap_or(0) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_code_request_serializes_only_set_fields() {
        let body = serde_json::to_value(RunCodeRequest::new("print(1)")).expect("encode");
        assert_eq!(body, serde_json::json!({ "code": "print(1)" }));

        let body = serde_json::to_value(
            RunCodeRequest::new("echo $X")
                .language(Language::Bash)
                .timeout_secs(10)
                .env("X", "1"),
        )
        .expect("encode");
        assert_eq!(body["language"], "bash");
        assert_eq!(body["timeoutSecs"], 10);
        assert_eq!(body["env"]["X"], "1");
    }

    #[test]
    fn execution_result_success_depends_on_error_and_exit_code() {
        let ok: ExecutionResult = serde_json::from_value(serde_json::json!({
            "output": "hi\n",
            "exitCode": 0,
            "executionTime": 12.5
        }))
        .expect("decode");
        assert!(ok.is_success());
        assert_eq!(ok.execution_time, Some(12.5));

        let failed = ExecutionResult {
            exit_code: Some(1),
            ..ExecutionResult::default()
        };
        assert!(!failed.is_success());

        let errored = ExecutionResult {
            error: Some("NameError".into()),
            ..ExecutionResult::default()
        };
        assert!(!errored.is_success());
    }
}
