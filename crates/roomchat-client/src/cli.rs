//! Command line arguments.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, Mode};

const EXAMPLES: &str = "\
Examples:
  Connect to local server:
    roomchat
  Connect to the hosted server:
    roomchat --server render
  Connect to custom address:
    roomchat --addr example.com:8080";

/// Terminal chat client for room-based chat servers
#[derive(Parser, Debug)]
#[command(name = "roomchat")]
#[command(version)]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    /// Server to connect to: 'local' or 'render'
    #[arg(long, value_enum)]
    pub server: Option<Mode>,

    /// HTTP service address of a local server [default: localhost:8080]
    #[arg(long)]
    pub addr: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Display name; skips the prompt
    #[arg(long)]
    pub name: Option<String>,

    /// Room to join; skips the prompt
    #[arg(long)]
    pub room: Option<String>,
}

impl Cli {
    /// Override values in `config` with the flags that were given.
    pub fn apply(&self, config: &mut Config) {
        if let Some(mode) = self.server {
            config.server.mode = mode;
        }
        if let Some(addr) = &self.addr {
            config.server.addr = addr.clone();
        }
    }
}
