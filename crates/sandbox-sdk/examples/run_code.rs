use sandbox_sdk::observability::init_logging;
use sandbox_sdk::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), SandboxError> {
    init_logging();
    let client = SandboxClient::from_env()?;

    let sandbox = client
        .create_sandbox(CreateSandboxRequest::new(Language::Python).timeout_secs(300))
        .await?;
    println!("created sandbox {}", sandbox.id());

    let install = sandbox
        .install_packages(InstallPackagesRequest::new(["requests"]))
        .await?;
    println!("installed: {:?}", install.installed);

    sandbox
        .write_file("/tmp/greeting.txt", "hello from the sandbox sdk")
        .await?;
    let result = sandbox
        .run_code("print(open('/tmp/greeting.txt').read().upper())")
        .await?;
    if result.is_success() {
        print!("{}", result.output);
    } else {
        eprintln!("execution failed: {:?}", result.error);
    }

    for entry in sandbox.list_files("/tmp").await? {
        println!("{}{}", entry.path, if entry.is_dir { "/" } else { "" });
    }

    sandbox.delete().await
}
