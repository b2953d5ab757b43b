// crates.io
use clap::Parser;
// self
use membench_eval::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = Args::parse();
	membench_eval::run(args).await
}
