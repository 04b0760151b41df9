use crate::{
	changelog::Change,
	color::Color,
	matches::MatchDir,
	stats::{ExpectedStats, FinalStats, StatsFailure},
};
use color_eyre::eyre::{Result, WrapErr};
use itertools::Itertools;
use std::{fs, path::Path};
use tracing::warn;

pub const SCORE_WRONG_FILE: &str = "FINAL_SCORE_WRONG.txt";
pub const BAD_COLORS_FILE: &str = "BAD_COLORS.txt";

fn write_marker(path: &Path, contents: String) -> Result<()> {
	fs::write(path, contents).wrap_err_with(|| format!("failed to write {}", path.display()))
}

/// Every player color that shows up anywhere in the changelog, in order of
/// first appearance.
pub fn changelog_colors(changes: &[Change]) -> Vec<Color> {
	changes
		.iter()
		.map(|change| change.color)
		.filter(|color| color.is_claimed())
		.unique()
		.collect()
}

/// Flags the match for manual review when the computed result doesn't line up
/// with the match list or the changelog doesn't hold exactly two players.
/// Returns whether the score agreed.
pub fn write_review_markers(
	dir: &MatchDir,
	changes: &[Change],
	stats: &Result<FinalStats, StatsFailure>,
	expected: &ExpectedStats,
) -> Result<bool> {
	let score_matches = matches!(stats, Ok(stats) if stats.agrees_with(expected));
	if !score_matches {
		let actual = match stats {
			Ok(stats) => stats.to_string(),
			Err(failure) => failure.to_string(),
		};
		warn!(%actual, %expected, "final score doesn't match the match list");
		write_marker(
			&dir.file(SCORE_WRONG_FILE),
			format!("Actual stats: {actual}\nExpected stats: {expected}\n"),
		)?;
	}

	let colors = changelog_colors(changes);
	if colors.len() != 2 {
		let found = colors.iter().join(", ");
		warn!(colors = %found, "changelog doesn't have exactly two colors");
		write_marker(&dir.file(BAD_COLORS_FILE), format!("Found colors: {found}\n"))?;
	}
	Ok(score_matches)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::matches::Match;
	use csv::StringRecord;

	fn match_dir(root: &Path) -> MatchDir {
		let m = Match::from_record(&StringRecord::from(vec![
			"1", "Gold", "A", "B", "d", "s", "0", "0", "https://youtu.be/x", "2", "1", "", "A",
		]))
		.unwrap();
		let dir = MatchDir::new(root, &m);
		dir.create().unwrap();
		dir
	}

	fn change(time: f64, square: usize, color: Color) -> Change {
		Change { time, square, color }
	}

	#[test]
	fn agreeing_match_writes_nothing() {
		let root = tempfile::tempdir().unwrap();
		let dir = match_dir(root.path());
		let changes = vec![
			change(1.0, 0, Color::Red),
			change(2.0, 1, Color::Red),
			change(3.0, 5, Color::Blue),
		];
		let stats = Ok(FinalStats {
			winner: Color::Red,
			winner_score: 2,
			bingo: false,
			loser: Color::Blue,
			loser_score: 1,
		});
		let expected = ExpectedStats {
			winner_score: 2,
			bingo: false,
			loser_score: 1,
		};
		assert!(write_review_markers(&dir, &changes, &stats, &expected).unwrap());
		assert!(!dir.file(SCORE_WRONG_FILE).exists());
		assert!(!dir.file(BAD_COLORS_FILE).exists());
	}

	#[test]
	fn failures_leave_markers() {
		let root = tempfile::tempdir().unwrap();
		let dir = match_dir(root.path());
		let changes = vec![
			change(1.0, 0, Color::Red),
			change(2.0, 1, Color::Blue),
			change(3.0, 2, Color::Yellow),
		];
		let stats = Err(StatsFailure::TooManyColors(vec![Color::Red, Color::Blue, Color::Yellow]));
		let expected = ExpectedStats {
			winner_score: 2,
			bingo: false,
			loser_score: 1,
		};
		assert!(!write_review_markers(&dir, &changes, &stats, &expected).unwrap());

		let wrong = fs::read_to_string(dir.file(SCORE_WRONG_FILE)).unwrap();
		assert!(wrong.starts_with("Actual stats: final board has 3 colors"));
		assert!(wrong.contains("Expected stats: winner 2 - 1 loser"));
		let colors = fs::read_to_string(dir.file(BAD_COLORS_FILE)).unwrap();
		assert_eq!(colors, "Found colors: red, blue, yellow\n");
	}

	#[test]
	fn black_is_not_a_player_color() {
		let changes = vec![
			change(1.0, 0, Color::Black),
			change(2.0, 0, Color::Teal),
			change(3.0, 0, Color::Black),
		];
		assert_eq!(changelog_colors(&changes), vec![Color::Teal]);
	}
}
