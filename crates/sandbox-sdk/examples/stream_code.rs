use sandbox_sdk::observability::init_logging;
use sandbox_sdk::prelude::*;

const PROGRAM: &str = r#"
import time
for i in range(5):
    print(f"tick {i}", flush=True)
    time.sleep(0.2)
"#;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), SandboxError> {
    init_logging();
    let client = SandboxClient::from_env()?;
    let sandbox = client
        .create_sandbox(CreateSandboxRequest::new(Language::Python))
        .await?;

    let mut callbacks = StreamCallbacks::new()
        .on_start(|start| println!("started: {:?}", start.metadata))
        .on_output(|chunk| print!("{}", chunk.data))
        .on_error(|failure| eprintln!("run error: {}", failure.message))
        .on_end(|end| println!("finished in {:?}", end.execution_time));
    let summary = sandbox.run_code_stream(PROGRAM, &mut callbacks).await?;
    println!("{} events ({} dropped frames)", summary.events, summary.dropped_frames);

    // The same execution, consumed as a pull-based stream.
    let mut stream = sandbox.execution_stream(PROGRAM).await?;
    while let Some(event) = stream.next_event().await {
        match event? {
            StreamEvent::Output(chunk) => print!("{}", chunk.data),
            StreamEvent::End(end) => println!("exit code {:?}", end.exit_code),
            StreamEvent::Start(_) | StreamEvent::Error(_) => {}
        }
    }

    sandbox.delete().await
}
