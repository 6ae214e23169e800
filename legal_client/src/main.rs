use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    legal_client::run().await
}
