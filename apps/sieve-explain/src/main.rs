// crates.io
use clap::Parser;
// self
use sieve_explain::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = Args::parse();
	sieve_explain::run(args).await
}
