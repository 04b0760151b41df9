//! The changelog: every observed change of a square's color, in time order.
//!
//! On disk it is plain text, one change per line:
//!
//! ```text
//! 0:42:15.00 - 12 - teal
//! ```
//!
//! where the first field is the video timestamp (`H:MM:SS.ss`), the second the
//! square index (row-major, 0-24) and the third the new color.

use crate::{
	board::{Board, BOARD_CELLS},
	color::Color,
};
use color_eyre::eyre::{bail, ensure, Result, WrapErr};
use std::{fmt, fs, path::Path};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change {
	/// Seconds into the video.
	pub time: f64,
	pub square: usize,
	pub color: Color,
}

/// Splits seconds into whole hours, whole minutes and remaining seconds.
pub fn hms(time: f64) -> (u64, u64, f64) {
	let hrs = (time / 3600.0).trunc();
	let remaining = time - 3600.0 * hrs;
	let mins = (remaining / 60.0).trunc();
	(hrs as u64, mins as u64, remaining - 60.0 * mins)
}

impl fmt::Display for Change {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let (hrs, mins, secs) = hms(self.time);
		write!(f, "{hrs}:{mins:02}:{secs:05.2} - {} - {}", self.square, self.color)
	}
}

fn parse_time(field: &str) -> Result<f64> {
	let parts = field.trim().split(':').collect::<Vec<_>>();
	let [hrs, mins, secs] = parts[..] else {
		bail!("expected a H:MM:SS time, got '{field}'");
	};
	let hrs = hrs.parse::<u64>().wrap_err("invalid hours")?;
	let mins = mins.parse::<u64>().wrap_err("invalid minutes")?;
	let secs = secs.parse::<f64>().wrap_err("invalid seconds")?;
	Ok((hrs * 3600 + mins * 60) as f64 + secs)
}

impl std::str::FromStr for Change {
	type Err = color_eyre::Report;

	fn from_str(line: &str) -> Result<Self> {
		let parts = line.split('-').collect::<Vec<_>>();
		let [time, square, color] = parts[..] else {
			bail!("expected 3 fields separated by '-', got {}", parts.len());
		};
		let square = square
			.trim()
			.parse::<usize>()
			.wrap_err_with(|| format!("invalid square index '{}'", square.trim()))?;
		ensure!(square < BOARD_CELLS, "square index {square} is off the board");
		Ok(Self {
			time: parse_time(time)?,
			square,
			color: color.trim().parse()?,
		})
	}
}

pub fn serialize(changes: &[Change]) -> String {
	changes
		.iter()
		.map(Change::to_string)
		.collect::<Vec<_>>()
		.join("\n")
}

pub fn deserialize(text: &str) -> Result<Vec<Change>> {
	text.lines()
		.enumerate()
		.filter(|(_, line)| !line.trim().is_empty())
		.map(|(idx, line)| {
			line.parse::<Change>()
				.wrap_err_with(|| format!("invalid changelog line {}: '{line}'", idx + 1))
		})
		.collect()
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Change>> {
	let path = path.as_ref();
	let text = fs::read_to_string(path)
		.wrap_err_with(|| format!("failed to read changelog from {}", path.display()))?;
	deserialize(&text).wrap_err_with(|| format!("failed to parse changelog {}", path.display()))
}

pub fn save<P: AsRef<Path>>(changes: &[Change], path: P) -> Result<()> {
	let path = path.as_ref();
	fs::write(path, serialize(changes))
		.wrap_err_with(|| format!("failed to write changelog to {}", path.display()))
}

/// Replays the changelog onto an empty board.
pub fn final_board(changes: &[Change]) -> Board {
	let mut board = Board::default();
	for change in changes {
		board.set(change.square, change.color);
	}
	board
}
