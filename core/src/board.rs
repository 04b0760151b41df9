use crate::color::Color;
use itertools::Itertools;
use std::fmt;

pub const BOARD_SIZE: usize = 5;
pub const BOARD_CELLS: usize = BOARD_SIZE * BOARD_SIZE;

/// Every line that scores a bingo, in the order they are checked.
pub const BINGO_LINES: [[usize; BOARD_SIZE]; 12] = [
	// rows
	[0, 1, 2, 3, 4],
	[5, 6, 7, 8, 9],
	[10, 11, 12, 13, 14],
	[15, 16, 17, 18, 19],
	[20, 21, 22, 23, 24],
	// columns
	[0, 5, 10, 15, 20],
	[1, 6, 11, 16, 21],
	[2, 7, 12, 17, 22],
	[3, 8, 13, 18, 23],
	[4, 9, 14, 19, 24],
	// diagonals
	[0, 6, 12, 18, 24],
	[4, 8, 12, 16, 20],
];

/// Colors of all 25 squares in row-major order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Board([Color; BOARD_CELLS]);

impl Board {
	#[inline]
	pub fn new(squares: [Color; BOARD_CELLS]) -> Self {
		Self(squares)
	}

	#[inline]
	pub fn squares(&self) -> &[Color; BOARD_CELLS] {
		&self.0
	}

	#[inline]
	pub fn get(&self, index: usize) -> Color {
		self.0[index]
	}

	#[inline]
	pub fn set(&mut self, index: usize, color: Color) {
		self.0[index] = color;
	}

	pub fn diff_count(&self, other: &Board) -> usize {
		self.0
			.iter()
			.zip(other.0.iter())
			.filter(|(a, b)| a != b)
			.count()
	}

	/// Claimed squares per color, most squares first. Ties keep the order in
	/// which the colors first appear on the board.
	pub fn counts(&self) -> Vec<(Color, usize)> {
		let mut counts: Vec<(Color, usize)> = Vec::new();
		for color in self.0.iter().copied().filter(|c| c.is_claimed()) {
			match counts.iter_mut().find(|(c, _)| *c == color) {
				Some((_, count)) => *count += 1,
				None => counts.push((color, 1)),
			}
		}
		// stable sort keeps first-appearance order among equal counts
		counts.sort_by(|a, b| b.1.cmp(&a.1));
		counts
	}

	/// Distinct colors on the board, black included.
	pub fn distinct_colors(&self) -> usize {
		self.0.iter().unique().count()
	}

	/// The color of the first completed line in [`BINGO_LINES`] order.
	pub fn bingo(&self) -> Option<Color> {
		BINGO_LINES.iter().find_map(|line| {
			let first = self.0[line[0]];
			(first.is_claimed() && line.iter().all(|&idx| self.0[idx] == first)).then_some(first)
		})
	}
}

impl fmt::Display for Board {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for row in self.0.chunks(BOARD_SIZE) {
			for color in row {
				write!(f, "{color:<10}")?;
			}
			writeln!(f)?;
		}
		Ok(())
	}
}
