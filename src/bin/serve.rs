#[tokio::main]
pub async fn main() -> Result<(), anyhow::Error> {
    token_supply::start_server().await?;
    Ok(())
}
