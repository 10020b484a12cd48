use std::path::PathBuf;

use clap::Parser;

/// Skill assessment service
#[derive(Debug, Parser)]
#[command(name = "assessor", about = "Generates skill questions and grades answers through the Anthropic API")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "assessor.toml", env = "ASSESSOR_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "ASSESSOR_LISTEN")]
    pub listen: Option<std::net::SocketAddr>,
}
