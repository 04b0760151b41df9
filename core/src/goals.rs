use crate::{
	changelog::Change,
	color::Color,
	link::url_at_time,
	matches::Match,
	stats::FinalStats,
	table::Table,
};
use color_eyre::eyre::{Result, WrapErr};
use serde::Serialize;
use std::collections::BTreeMap;

/// A goal a player held at the end of the match, and how long it took them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalCompletion {
	pub week: String,
	pub tier: String,
	pub player: String,
	pub opponent: String,
	pub square: usize,
	pub goal: String,
	pub color: Color,
	/// Seconds into the VOD.
	pub start_time: f64,
	pub end_time: f64,
	pub minutes: f64,
	pub start_url: String,
	pub end_url: String,
}

/// Timing of a claimed square, before player names are attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareTiming {
	pub square: usize,
	pub color: Color,
	pub start_time: f64,
	pub end_time: f64,
}

/// Times every square that ends the match claimed.
///
/// A square counts as done at its last change. Its clock starts at the
/// player's previous claim anywhere on the board before they first took this
/// square, or at `match_start` if there is none.
pub fn square_timings(changes: &[Change], match_start: f64) -> Vec<SquareTiming> {
	let mut by_square: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
	for (idx, change) in changes.iter().enumerate() {
		by_square.entry(change.square).or_default().push(idx);
	}

	let mut timings = Vec::new();
	for (square, indices) in by_square {
		let Some(&last) = indices.last() else {
			continue;
		};
		let final_change = changes[last];
		if !final_change.color.is_claimed() {
			continue;
		}
		let first_claim = indices
			.iter()
			.copied()
			.find(|&idx| changes[idx].color == final_change.color)
			.unwrap_or(last);
		let start_time = changes[..first_claim]
			.iter()
			.rev()
			.find(|change| change.color == final_change.color)
			.map_or(match_start, |change| change.time);
		timings.push(SquareTiming {
			square,
			color: final_change.color,
			start_time,
			end_time: final_change.time,
		});
	}
	timings
}

/// Goal completions for both players of a match.
pub fn goal_completions(
	m: &Match,
	changes: &[Change],
	table: &Table,
	stats: &FinalStats,
) -> Result<Vec<GoalCompletion>> {
	let (winner, loser) = m.winner_and_loser();
	square_timings(changes, m.start)
		.into_iter()
		.map(|timing| {
			let (player, opponent) = if timing.color == stats.winner {
				(winner, loser)
			} else {
				(loser, winner)
			};
			Ok(GoalCompletion {
				week: m.week.clone(),
				tier: m.tier.clone(),
				player: player.to_owned(),
				opponent: opponent.to_owned(),
				square: timing.square,
				goal: table.text(timing.square).to_owned(),
				color: timing.color,
				start_time: timing.start_time,
				end_time: timing.end_time,
				minutes: ((timing.end_time - timing.start_time) / 60.0 * 10.0).round() / 10.0,
				start_url: url_at_time(&m.vod, timing.start_time)
					.wrap_err_with(|| format!("failed to link start of square {}", timing.square))?,
				end_url: url_at_time(&m.vod, timing.end_time)
					.wrap_err_with(|| format!("failed to link end of square {}", timing.square))?,
			})
		})
		.collect()
}
