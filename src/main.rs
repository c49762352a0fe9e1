use anyhow::Context;
use clap::Parser;
use hydat_trends::cli::{run, Cli};
use hydat_trends::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet, cli.log_file.as_deref())
        .context("failed to initialize logging")?;

    run(cli).await.context("hydat-trends run failed")?;
    Ok(())
}
