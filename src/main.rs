use clap::Parser;
use dotenv::dotenv;
use github_repo_harvesting_lib::{Args, HarvestError, RepoHarvester};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), HarvestError> {
    // Initialize the tracing logger
    tracing_subscriber::fmt::init();

    dotenv().ok();

    let args = Args::parse();

    let mut harvester = RepoHarvester::new(&args)?;
    let summary = harvester.run().await?;

    info!(
        "harvest complete: {} repositories collected, {} contain the target file, {} files downloaded",
        summary.total_repositories, summary.matched_repositories, summary.files
    );
    Ok(())
}
