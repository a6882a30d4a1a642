//! wk-cli - stream network, instream flow and water right demand analysis.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "wk-cli",
    version,
    about = "Watershed analysis toolkit: drainage areas, flow gaps and water right demand"
)]
struct Cli {
    #[command(subcommand)]
    command: wk_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("wk-cli {}", env!("CARGO_PKG_VERSION"));
    wk_cmd::run(cli.command)
}
