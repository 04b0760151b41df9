//! Reducing a changelog to the match result.
//!
//! The final board decides the result: a bingo wins outright, otherwise the
//! color holding more squares wins. Equal square counts go to whoever got
//! there first, so the color that made the last standing change loses.

use crate::{
	changelog::{final_board, Change},
	color::Color,
};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FinalStats {
	pub winner: Color,
	pub winner_score: usize,
	pub bingo: bool,
	pub loser: Color,
	pub loser_score: usize,
}

/// Why a changelog couldn't be reduced to a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsFailure {
	/// Nobody claimed a square.
	EmptyBoard,
	/// The final board holds more than two player colors.
	TooManyColors(Vec<Color>),
	/// Square counts are tied and no change explains who finished last.
	UnresolvedTie,
}

impl fmt::Display for StatsFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StatsFailure::EmptyBoard => f.write_str("no squares were claimed"),
			StatsFailure::TooManyColors(colors) => {
				write!(f, "final board has {} colors:", colors.len())?;
				for color in colors {
					write!(f, " {color}")?;
				}
				Ok(())
			}
			StatsFailure::UnresolvedTie => f.write_str("tied score with no deciding change"),
		}
	}
}

impl std::error::Error for StatsFailure {}

/// Runner-up color when only one color made it onto the final board.
fn runner_up(changes: &[Change], leader: Color) -> Color {
	changes
		.iter()
		.map(|change| change.color)
		.find(|&color| color.is_claimed() && color != leader)
		.unwrap_or(if leader != Color::Green { Color::Green } else { Color::Navy })
}

pub fn final_stats(changes: &[Change]) -> Result<FinalStats, StatsFailure> {
	let board = final_board(changes);
	let counts = board.counts();
	let (first, first_score, second, second_score) = match counts[..] {
		[] => return Err(StatsFailure::EmptyBoard),
		[(color, score)] => (color, score, runner_up(changes, color), 0),
		[(first, first_score), (second, second_score)] => {
			(first, first_score, second, second_score)
		}
		_ => {
			return Err(StatsFailure::TooManyColors(
				counts.iter().map(|(color, _)| *color).collect(),
			))
		}
	};
	let ordered = |winner_first: bool, bingo: bool| {
		if winner_first {
			FinalStats {
				winner: first,
				winner_score: first_score,
				bingo,
				loser: second,
				loser_score: second_score,
			}
		} else {
			FinalStats {
				winner: second,
				winner_score: second_score,
				bingo,
				loser: first,
				loser_score: first_score,
			}
		}
	};

	if let Some(bingo) = board.bingo() {
		return Ok(ordered(bingo == first, true));
	}
	if first_score != second_score {
		return Ok(ordered(first_score > second_score, false));
	}
	let last_to_finish = changes
		.iter()
		.rev()
		.find(|change| change.color.is_claimed() && board.get(change.square) == change.color)
		.map(|change| change.color)
		.ok_or(StatsFailure::UnresolvedTie)?;
	Ok(ordered(last_to_finish != first, false))
}

/// The result recorded in the match list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpectedStats {
	pub winner_score: usize,
	pub bingo: bool,
	pub loser_score: usize,
}

impl FinalStats {
	pub fn agrees_with(&self, expected: &ExpectedStats) -> bool {
		self.winner_score == expected.winner_score
			&& self.bingo == expected.bingo
			&& self.loser_score == expected.loser_score
	}
}

impl fmt::Display for FinalStats {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} {} - {} {}{}",
			self.winner,
			self.winner_score,
			self.loser_score,
			self.loser,
			if self.bingo { " (bingo)" } else { "" }
		)
	}
}

impl fmt::Display for ExpectedStats {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"winner {} - {} loser{}",
			self.winner_score,
			self.loser_score,
			if self.bingo { " (bingo)" } else { "" }
		)
	}
}
