use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    cotiza_cli::run().await
}
