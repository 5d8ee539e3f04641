use clap::Parser;
use climate_location_etl::cli::{run, Cli};
use climate_location_etl::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
