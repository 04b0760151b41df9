pub mod cmd;
pub mod generate;
pub mod goals;
pub mod locate;
pub mod stats;

use self::cmd::{CliArgs, CliSubcommands};
use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();
	let args = CliArgs::parse();
	match args.command {
		CliSubcommands::Generate(args) => generate::generate(args),
		CliSubcommands::Locate(args) => locate::locate(args),
		CliSubcommands::Stats(args) => stats::stats(args),
		CliSubcommands::Goals(args) => goals::goals(args),
	}
}
