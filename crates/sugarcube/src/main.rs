//! SugarCube - coupon lookup and feedback server
//!
//! Main entry point for the SugarCube server binary.

use anyhow::Result;
use clap::Parser;

mod cli;
mod logging;
mod serve;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable) + rotating JSON file
    let _guard = logging::init(cli.verbose, &cli.log_dir())?;

    serve::run(cli).await
}
