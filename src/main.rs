#[tokio::main]
async fn main() -> anyhow::Result<()> {
    anvil_cli::main().await
}
