//! WXR CLI - Command line tool for station temperature climatology.

use clap::Parser;
use log::debug;

#[derive(Parser)]
#[command(
    name = "wxr-cli",
    version,
    about = "Winter severity, temperature records and density from ISD-Lite data"
)]
struct Cli {
    #[command(subcommand)]
    command: wxr_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    debug!("wxr-cli {}", env!("CARGO_PKG_VERSION"));
    wxr_cmd::run(cli.command).await
}
