use clap::Parser;
use content_ledger::cli::{dispatch, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dispatch(Cli::parse()).await
}
