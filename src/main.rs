use clap::Parser;
use tenant_ai_gateway::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::GenerateMasterKey => cli::keys::generate_master_key(),
        Command::Seal => cli::keys::seal(),
    }
}
