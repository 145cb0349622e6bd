//! PartnerScout CLI: discover and enrich AI partnership announcements.
//!
//! Reads a table of known partnerships, searches the web for new ones, and
//! fills missing dates, links, and summaries with an LLM.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
