use crate::cmd::StatsArgs;
use bingo_scribe_core::{changelog, stats::final_stats};
use color_eyre::eyre::Result;

pub fn stats(args: StatsArgs) -> Result<()> {
	for path in &args.changelogs {
		let changes = changelog::load(path)?;
		match final_stats(&changes) {
			Ok(stats) => {
				let verdict = match &args.expected {
					Some(expected) if stats.agrees_with(expected) => " (matches)",
					Some(_) => " (WRONG)",
					None => "",
				};
				println!("{}: {stats}{verdict}", path.display());
			}
			Err(failure) => println!("{}: {failure}", path.display()),
		}
	}
	Ok(())
}
