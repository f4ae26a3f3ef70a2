use anyhow::Result;
use clap::Parser;
use magrobo::cli::Args;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_level))
        .init();

    let summaries = magrobo::app::run(&args)?;
    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}
