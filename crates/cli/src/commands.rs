//! Ring queries exposed by the CLI.

use clap::Subcommand;
use hashring::HashRing;

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the server owning each key.
    Lookup {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Print up to N distinct servers for each key.
    LookupN {
        n: usize,
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Print the ring checksum.
    Checksum,
    /// Print every member with its position count.
    Servers,
}

/// Output lines of a command, in print order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub lines: Vec<String>,
}

impl Command {
    pub fn execute(&self, ring: &HashRing) -> CommandResult {
        let lines = match self {
            Command::Lookup { keys } => keys
                .iter()
                .map(|key| match ring.lookup(key) {
                    Some(server) => format!("{}\t{}", key, server),
                    None => format!("{}\t-", key),
                })
                .collect(),
            Command::LookupN { n, keys } => keys
                .iter()
                .map(|key| {
                    let servers: Vec<String> = ring
                        .lookup_n_unique(key, *n)
                        .iter()
                        .map(ToString::to_string)
                        .collect();
                    format!("{}\t{}", key, servers.join(","))
                })
                .collect(),
            Command::Checksum => vec![format!("{:016x}", ring.checksum())],
            Command::Servers => {
                let vnodes = ring.vnodes();
                ring.servers()
                    .into_iter()
                    .map(|server| {
                        let positions = vnodes.iter().filter(|v| v.server == server).count();
                        format!("{}\t{}", server, positions)
                    })
                    .collect()
            }
        };
        CommandResult { lines }
    }
}
