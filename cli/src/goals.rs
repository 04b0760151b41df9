use crate::cmd::GoalsArgs;
use bingo_scribe_core::{
	changelog,
	goals::goal_completions,
	matches::{load_matches, MatchDir, CHANGELOG_FILE, TABLE_FILE},
	stats::final_stats,
	table::Table,
};
use color_eyre::eyre::{Result, WrapErr};
use std::io::{self, Write};
use tracing::{debug, warn};

pub fn goals(args: GoalsArgs) -> Result<()> {
	let matches = load_matches(&args.matches)?;
	let stdout = io::stdout();
	let mut out = stdout.lock();
	for m in &matches {
		let dir = MatchDir::new(&args.output, m);
		let (changelog_path, table_path) = (dir.file(CHANGELOG_FILE), dir.file(TABLE_FILE));
		if !changelog_path.is_file() || !table_path.is_file() {
			debug!("{} has not been analyzed, skipping", m.id());
			continue;
		}
		let changes = changelog::load(&changelog_path)?;
		let table = Table::load(&table_path)?;
		let stats = match final_stats(&changes) {
			Ok(stats) => stats,
			Err(failure) => {
				warn!(%failure, "skipping {}", m.id());
				continue;
			}
		};
		for completion in goal_completions(m, &changes, &table, &stats)? {
			let line = serde_json::to_string(&completion)
				.wrap_err("failed to serialize goal completion")?;
			writeln!(out, "{line}").wrap_err("failed to write to stdout")?;
		}
	}
	Ok(())
}
