//! Command-line configuration.

use anyhow::Context;
use clap::Parser;
use hashring::{HashAlgorithm, HashRing, RingConfig, Server, DEFAULT_REPLICA_POINTS};
use tracing::{debug, Level};

use crate::commands::{Command, CommandResult};

#[derive(Debug, Parser)]
#[command(name = "hashring-cli", about = "Query a consistent hash ring")]
pub struct CliConfig {
    /// Ring member address (repeatable).
    #[arg(short, long = "server", value_name = "ADDR")]
    pub servers: Vec<String>,

    /// Virtual positions per server.
    #[arg(short, long, default_value_t = DEFAULT_REPLICA_POINTS)]
    pub replica_points: usize,

    /// Hash function: xxh3, xxh64 or sip.
    #[arg(long, default_value_t = HashAlgorithm::default())]
    pub hash: HashAlgorithm,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .init();
    }

    pub fn ring_config(&self) -> anyhow::Result<RingConfig> {
        let config = RingConfig {
            replica_points: self.replica_points,
            hash: self.hash,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn build_ring(&self) -> anyhow::Result<HashRing> {
        let ring = HashRing::from_config(self.ring_config()?).context("building ring")?;
        let servers: Vec<Server> = self.servers.iter().map(Server::new).collect();
        let change = ring.add_servers(&servers);
        debug!(
            servers = change.added.len(),
            checksum = change.new_checksum,
            "ring ready"
        );
        Ok(ring)
    }

    pub fn run(&self) -> anyhow::Result<CommandResult> {
        let ring = self.build_ring()?;
        Ok(self.command.execute(&ring))
    }
}
