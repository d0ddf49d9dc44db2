//! CLI for the Tenant AI Gateway
//!
//! - `serve`: run the HTTP gateway
//! - `generate-master-key`: print a fresh vault master key
//! - `seal`: encrypt an API key read from stdin for manual row seeding

pub mod keys;
pub mod serve;

use clap::{Parser, Subcommand};

/// Tenant AI Gateway - credential resolution, rate limiting and usage recording
#[derive(Parser)]
#[command(name = "tenant-ai-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP gateway
    Serve,

    /// Print a new base64 master key from the OS random source
    GenerateMasterKey,

    /// Encrypt an API key from stdin with the configured master key
    Seal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["tenant-ai-gateway", "generate-master-key"]).unwrap();
        assert!(matches!(cli.command, Command::GenerateMasterKey));

        let cli = Cli::try_parse_from(["tenant-ai-gateway", "seal"]).unwrap();
        assert!(matches!(cli.command, Command::Seal));

        assert!(Cli::try_parse_from(["tenant-ai-gateway", "api"]).is_err());
    }
}
