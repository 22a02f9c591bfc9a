use clap::{Parser, Subcommand};
use tracing::info;

use token_supply::{
    caching::CacheKey, env::EnvConfig, log, registry::AddressRegistry, supply::SupplyService,
};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one fetch pass against the configured upstream and print the snapshot as JSON.
    Metrics {},
    /// Validate the built-in excluded address registry and print it, without upstream calls.
    CheckRegistry {},
}

async fn print_metrics() -> anyhow::Result<()> {
    let config = EnvConfig::from_env()?;
    let supply = SupplyService::from_env_config(&config)?;

    info!(addresses = supply.registry().len(), "running fetch pass");

    let snapshot = supply.get_snapshot(&CacheKey::Supply).await?;
    println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);

    Ok(())
}

fn check_registry() -> anyhow::Result<()> {
    let registry = AddressRegistry::built_in()?;

    for holder in registry.list() {
        println!(
            "{} {} {} {}",
            holder.address, holder.chain, holder.category, holder.wallet_label
        );
    }

    info!(addresses = registry.len(), "registry is well formed");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    log::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Metrics {} => print_metrics().await?,
        Commands::CheckRegistry {} => check_registry()?,
    }

    Ok(())
}
