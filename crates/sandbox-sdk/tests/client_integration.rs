use sandbox_sdk::{
    ClientConfig, CreateSandboxRequest, ErrorKind, InstallPackagesRequest, Language,
    PackageManager, RunCodeRequest, SandboxClient, SandboxError, SandboxStatus, StreamCallbacks,
    StreamEvent,
};
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sandbox_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "language": "python",
        "status": "running",
        "createdAt": "2026-10-01T12:00:00Z",
        "metadata": { "image": "python:3.12" }
    })
}

fn client_for(server: &MockServer) -> SandboxClient {
    SandboxClient::new(ClientConfig::new(server.uri()).api_key("sk-test")).expect("client build")
}

#[tokio::test]
async fn create_sandbox_sends_auth_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sandboxes"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header_exists("x-request-id"))
        .and(body_json(json!({
            "language": "python",
            "timeoutSecs": 120,
            "env": { "MODE": "test" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(sandbox_json("sb-1")))
        .expect(1)
        .mount(&server)
        .await;

    let sandbox = client_for(&server)
        .create_sandbox(
            CreateSandboxRequest::new(Language::Python)
                .timeout_secs(120)
                .env("MODE", "test"),
        )
        .await
        .expect("create");

    assert_eq!(sandbox.id().as_str(), "sb-1");
    assert_eq!(sandbox.info().status, SandboxStatus::Running);
    assert_eq!(sandbox.info().metadata["image"], "python:3.12");

    server.verify().await;
}

#[tokio::test]
async fn get_list_and_connect() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sandboxes/sb-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sandbox_json("sb-1")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sandboxes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([sandbox_json("sb-1"), sandbox_json("sb-2")])),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let info = client.get_sandbox("sb-1").await.expect("get");
    assert_eq!(info.language, Some(Language::Python));

    let all = client.list_sandboxes().await.expect("list");
    let ids: Vec<_> = all.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["sb-1", "sb-2"]);

    let mut sandbox = client.connect("sb-1").await.expect("connect");
    let refreshed = sandbox.refresh().await.expect("refresh");
    assert_eq!(refreshed.id.as_str(), "sb-1");
}

#[tokio::test]
async fn delete_missing_sandbox_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/sandboxes/sb-gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "sandbox sb-gone not found"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .delete_sandbox("sb-gone")
        .await
        .expect_err("404 should fail");

    assert!(err.is_not_found());
    assert_eq!(err.kind(), ErrorKind::Api);
    assert!(err.message().contains("sandbox sb-gone not found"));
}

#[tokio::test]
async fn run_code_returns_execution_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sandboxes/sb-1/execute"))
        .and(body_json(json!({ "code": "print(2 + 2)", "language": "python" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": "4\n",
            "exitCode": 0,
            "executionTime": 31.5
        })))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .run_code(
            "sb-1",
            RunCodeRequest::new("print(2 + 2)").language(Language::Python),
        )
        .await
        .expect("run");

    assert_eq!(result.output, "4\n");
    assert_eq!(result.exit_code, Some(0));
    assert_eq!(result.execution_time, Some(31.5));
    assert!(result.is_success());
}

#[tokio::test]
async fn run_code_stream_dispatches_events_and_skips_bad_frames() {
    let server = MockServer::start().await;

    let body = concat!(
        "data: {\"type\":\"start\",\"language\":\"python\"}\n",
        "\n",
        ": keep-alive\n",
        "data: {\"type\":\"output\",\"data\":\"line 1\\n\"}\n",
        "data: not-json\n",
        "data: {\"type\":\"output\",\"data\":\"line 2\\n\"}\n",
        "data: {\"type\":\"end\",\"executionTime\":5}\n",
    );
    Mock::given(method("POST"))
        .and(path("/sandboxes/sb-1/execute/stream"))
        .and(header("accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let log = Mutex::new(Vec::new());
    let mut callbacks = StreamCallbacks::new()
        .on_start(|start| {
            log.lock()
                .expect("lock")
                .push(format!("start:{}", start.metadata["language"]))
        })
        .on_output(|chunk| log.lock().expect("lock").push(format!("output:{}", chunk.data)))
        .on_end(|end| {
            log.lock()
                .expect("lock")
                .push(format!("end:{:?}", end.execution_time))
        });

    let summary = client_for(&server)
        .run_code_stream("sb-1", "print('x')", &mut callbacks)
        .await
        .expect("stream");
    drop(callbacks);

    assert_eq!(
        log.into_inner().expect("lock"),
        vec![
            "start:\"python\"",
            "output:line 1\n",
            "output:line 2\n",
            "end:Some(5.0)",
        ]
    );
    assert_eq!(summary.events, 4);
    assert_eq!(summary.dropped_frames, 1);
}

#[tokio::test]
async fn execution_stream_collects_output_and_errors() {
    let server = MockServer::start().await;

    let body = concat!(
        "data: {\"type\":\"start\"}\n",
        "data: {\"type\":\"output\",\"data\":\"partial\"}\n",
        "data: {\"type\":\"error\",\"error\":{\"name\":\"ValueError\",\"message\":\"bad value\"}}\n",
        "data: {\"type\":\"end\",\"executionTime\":9,\"exitCode\":1}\n",
    );
    Mock::given(method("POST"))
        .and(path("/sandboxes/sb-1/execute/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let mut stream = client
        .execution_stream("sb-1", "raise ValueError('bad value')")
        .await
        .expect("open stream");
    let mut kinds = Vec::new();
    while let Some(event) = stream.next_event().await {
        kinds.push(event.expect("event").kind().as_str());
    }
    assert_eq!(kinds, vec!["start", "output", "error", "end"]);

    let result = client
        .execution_stream("sb-1", "raise ValueError('bad value')")
        .await
        .expect("open stream")
        .collect_result()
        .await
        .expect("collect");
    assert_eq!(result.output, "partial");
    assert_eq!(result.error.as_deref(), Some("bad value"));
    assert_eq!(result.exit_code, Some(1));
    assert!(!result.is_success());
}

#[tokio::test]
async fn streaming_call_fails_on_error_status_before_dispatch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sandboxes/sb-1/execute/stream"))
        .respond_with(ResponseTemplate::new(503).set_body_string("service overloaded"))
        .mount(&server)
        .await;

    let mut dispatched = 0;
    let mut callbacks = StreamCallbacks::new().on_output(|_| dispatched += 1);
    let err = client_for(&server)
        .run_code_stream("sb-1", "print(1)", &mut callbacks)
        .await
        .expect_err("503 should fail");
    drop(callbacks);

    assert_eq!(dispatched, 0);
    assert_eq!(err.status(), Some(503));
    assert!(err.message().contains("service overloaded"));
}

#[tokio::test]
async fn file_operations_round_trip_through_api() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/sandboxes/sb-1/files"))
        .and(body_json(json!({ "path": "/home/user/a.txt", "content": "hello" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sandboxes/sb-1/files"))
        .and(query_param("path", "/home/user/a.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": "hello" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sandboxes/sb-1/files/list"))
        .and(query_param("path", "/home/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "a.txt", "path": "/home/user/a.txt", "isDir": false, "size": 5 },
            { "name": "data", "path": "/home/user/data", "isDir": true }
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .write_file("sb-1", "/home/user/a.txt", "hello")
        .await
        .expect("write");
    let content = client
        .read_file("sb-1", "/home/user/a.txt")
        .await
        .expect("read");
    assert_eq!(content, "hello");

    let entries = client.list_files("sb-1", "/home/user").await.expect("list");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].size, Some(5));
    assert!(entries[1].is_dir);

    server.verify().await;
}

#[tokio::test]
async fn install_packages_posts_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sandboxes/sb-1/packages"))
        .and(body_json(json!({ "packages": ["lodash"], "manager": "npm" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "installed": ["lodash@4.17.21"],
            "output": "added 1 package"
        })))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .install_packages(
            "sb-1",
            InstallPackagesRequest::new(["lodash"]).manager(PackageManager::Npm),
        )
        .await
        .expect("install");

    assert_eq!(result.installed, vec!["lodash@4.17.21"]);
    assert_eq!(result.output, "added 1 package");
}

#[tokio::test]
async fn install_packages_with_unbounded_timeout_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sandboxes/sb-1/packages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "installed": ["numpy"],
            "output": ""
        })))
        .mount(&server)
        .await;

    let client = SandboxClient::new(
        ClientConfig::new(server.uri())
            .api_key("sk-test")
            .timeout(Duration::MAX),
    )
    .expect("client build");
    let result = client
        .install_packages("sb-1", InstallPackagesRequest::new(["numpy"]))
        .await
        .expect("install");

    assert_eq!(result.installed, vec!["numpy"]);
}

#[tokio::test]
async fn malformed_response_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sandboxes/sb-1/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .run_code("sb-1", "print(1)")
        .await
        .expect_err("html is not an execution result");

    assert!(matches!(err, SandboxError::Decode(msg) if msg.contains("run code")));
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    // Port 9 (discard) has no listener in the test environment.
    let client = SandboxClient::new(ClientConfig::new("http://127.0.0.1:9")).expect("client build");
    let err = client.list_sandboxes().await.expect_err("server is gone");
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn sandbox_handle_forwards_to_its_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sandboxes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sandbox_json("sb-9")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sandboxes/sb-9/execute/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: {\"type\":\"output\",\"data\":\"ok\"}\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/sandboxes/sb-9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let sandbox = client_for(&server)
        .create_sandbox(CreateSandboxRequest::default())
        .await
        .expect("create");

    let mut stream = sandbox.execution_stream("print('ok')").await.expect("stream");
    match stream.next_event().await {
        Some(Ok(StreamEvent::Output(chunk))) => assert_eq!(chunk.data, "ok"),
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(stream.next_event().await.is_none());

    sandbox.delete().await.expect("delete");
    server.verify().await;
}
