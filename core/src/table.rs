//! Finding the 5x5 goal grid among detected table cells.
//!
//! The cell detector reports every rectangle that looks like a table cell,
//! including stray ones from the rest of the stream layout. The grid is
//! recovered by picking an anchor cell and walking right and down through
//! neighboring cells, using tolerances proportional to the anchor's size.

use crate::board::{BOARD_CELLS, BOARD_SIZE};
use color_eyre::eyre::{bail, eyre, Report, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
	pub x_min: f64,
	pub y_min: f64,
	pub x_max: f64,
	pub y_max: f64,
}

impl Rect {
	pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
		Self {
			x_min,
			y_min,
			x_max,
			y_max,
		}
	}

	/// Builds a rect from an `[x0, y0, x1, y1]` model coordinate.
	pub fn from_coords(coords: &[f64]) -> Result<Self> {
		match *coords {
			[x_min, y_min, x_max, y_max] => Ok(Self::new(x_min, y_min, x_max, y_max)),
			_ => Err(eyre!("expected 4 coordinates, got {}", coords.len())),
		}
	}

	#[inline]
	pub fn width(&self) -> f64 {
		self.x_max - self.x_min
	}

	#[inline]
	pub fn height(&self) -> f64 {
		self.y_max - self.y_min
	}

	/// Sum of the center coordinates; sorting by it orders rects roughly from
	/// the top left corner outwards.
	#[inline]
	pub fn taxi_dist(&self) -> f64 {
		(self.x_max + self.x_min) / 2.0 + (self.y_max + self.y_min) / 2.0
	}
}

/// A piece of OCR output.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
	pub rect: Rect,
	pub text: String,
}

#[inline]
fn approx(a: f64, b: f64, tolerance: f64) -> bool {
	(a - b).abs() <= tolerance
}

/// A cell candidate with its neighbor tolerances and contained text.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
	pub rect: Rect,
	pub text: String,
	x_tolerance: f64,
	y_tolerance: f64,
}

impl Cell {
	pub fn new(
		rect: Rect,
		position_tolerance: f64,
		texts: &[TextFragment],
		text_tolerance: f64,
	) -> Self {
		let text = texts
			.iter()
			.filter(|fragment| contains(&rect, &fragment.rect, text_tolerance))
			.map(|fragment| fragment.text.as_str())
			.collect::<Vec<_>>()
			.join(" ");
		Self {
			rect,
			text,
			x_tolerance: rect.width() * position_tolerance,
			y_tolerance: rect.height() * position_tolerance,
		}
	}

	pub fn is_right_neighbor(&self, other: &Cell) -> bool {
		let (a, b) = (&self.rect, &other.rect);
		approx(a.x_max, b.x_min, self.x_tolerance)
			&& approx(b.x_min + a.width(), b.x_max, self.x_tolerance)
			&& approx(a.y_min, b.y_min, self.y_tolerance)
			&& approx(a.y_max, b.y_max, self.y_tolerance)
	}

	pub fn is_bottom_neighbor(&self, other: &Cell) -> bool {
		let (a, b) = (&self.rect, &other.rect);
		approx(a.y_max, b.y_min, self.y_tolerance)
			&& approx(b.y_min + a.height(), b.y_max, self.y_tolerance)
			&& approx(a.x_min, b.x_min, self.x_tolerance)
			&& approx(a.x_max, b.x_max, self.x_tolerance)
	}
}

/// Whether `inner` fits inside `outer` grown by `tolerance` of its size.
pub fn contains(outer: &Rect, inner: &Rect, tolerance: f64) -> bool {
	let x_tolerance = outer.width() * tolerance;
	let y_tolerance = outer.height() * tolerance;
	outer.x_min - x_tolerance < inner.x_min
		&& outer.x_max + x_tolerance > inner.x_max
		&& outer.y_min - y_tolerance < inner.y_min
		&& outer.y_max + y_tolerance > inner.y_max
}

/// Turns raw detections into cells sorted by [`Rect::taxi_dist`]. Returns
/// `None` when there are too few candidates to hold a full board.
pub fn sorted_cells(
	rects: &[Rect],
	texts: &[TextFragment],
	position_tolerance: f64,
	text_tolerance: f64,
) -> Option<Vec<Cell>> {
	if rects.len() < BOARD_CELLS {
		return None;
	}
	let mut texts = texts.to_vec();
	texts.sort_by(|a, b| a.rect.taxi_dist().total_cmp(&b.rect.taxi_dist()));
	let mut cells = rects
		.iter()
		.map(|rect| Cell::new(*rect, position_tolerance, &texts, text_tolerance))
		.collect::<Vec<_>>();
	cells.sort_by(|a, b| a.rect.taxi_dist().total_cmp(&b.rect.taxi_dist()));
	Some(cells)
}

fn find_right(cells: &[Cell], index: usize) -> Option<usize> {
	let cell = &cells[index];
	(index + 1..cells.len()).find(|&i| cell.is_right_neighbor(&cells[i]))
}

fn find_bottom(cells: &[Cell], index: usize) -> Option<usize> {
	let cell = &cells[index];
	(index + 1..cells.len()).find(|&i| cell.is_bottom_neighbor(&cells[i]))
}

/// Walks a 5x5 grid using `anchor` as the top left cell.
fn grid_from_anchor(cells: &[Cell], anchor: usize) -> Option<Vec<usize>> {
	let mut grid = Vec::with_capacity(BOARD_CELLS);
	grid.push(anchor);
	let mut row_start = anchor;
	let mut prev = anchor;
	for i in 1..BOARD_CELLS {
		let next = if i % BOARD_SIZE == 0 {
			let below = find_bottom(cells, row_start)?;
			row_start = below;
			below
		} else {
			find_right(cells, prev)?
		};
		grid.push(next);
		prev = next;
	}
	Some(grid)
}

/// Finds the best 5x5 grid. The first anchor whose cells all contain text
/// wins outright; otherwise the grid with the most text-filled cells.
pub fn find_grid(cells: &[Cell]) -> Option<Vec<&Cell>> {
	let mut best: Option<(usize, Vec<usize>)> = None;
	for anchor in 0..cells.len() {
		let Some(grid) = grid_from_anchor(cells, anchor) else {
			continue;
		};
		let with_text = grid.iter().filter(|&&i| !cells[i].text.is_empty()).count();
		if with_text == BOARD_CELLS {
			best = Some((with_text, grid));
			break;
		}
		if best.as_ref().map_or(true, |(count, _)| with_text > *count) {
			best = Some((with_text, grid));
		}
	}
	best.map(|(_, grid)| grid.into_iter().map(|i| &cells[i]).collect())
}

/// One located board square.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Square {
	#[serde(flatten)]
	pub rect: Rect,
	pub text: String,
}

/// The 25 located squares in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Square>", into = "Vec<Square>")]
pub struct Table(Vec<Square>);

impl TryFrom<Vec<Square>> for Table {
	type Error = Report;

	fn try_from(squares: Vec<Square>) -> Result<Self> {
		if squares.len() != BOARD_CELLS {
			bail!("a table needs {BOARD_CELLS} squares, got {}", squares.len());
		}
		Ok(Self(squares))
	}
}

impl From<Table> for Vec<Square> {
	fn from(table: Table) -> Self {
		table.0
	}
}

impl Table {
	/// Locates the board among detected cells and texts.
	pub fn locate(
		rects: &[Rect],
		texts: &[TextFragment],
		position_tolerance: f64,
		text_tolerance: f64,
	) -> Option<Self> {
		let cells = sorted_cells(rects, texts, position_tolerance, text_tolerance)?;
		let grid = find_grid(&cells)?;
		Some(Self(
			grid.into_iter()
				.map(|cell| Square {
					rect: cell.rect,
					text: cell.text.clone(),
				})
				.collect(),
		))
	}

	#[inline]
	pub fn squares(&self) -> &[Square] {
		&self.0
	}

	#[inline]
	pub fn text(&self, index: usize) -> &str {
		&self.0[index].text
	}

	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let json = fs::read_to_string(path)
			.wrap_err_with(|| format!("failed to read table from {}", path.display()))?;
		serde_json::from_str(&json)
			.wrap_err_with(|| format!("failed to parse table in {}", path.display()))
	}

	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let path = path.as_ref();
		let json = serde_json::to_string(self).wrap_err("failed to serialize table")?;
		fs::write(path, json)
			.wrap_err_with(|| format!("failed to write table to {}", path.display()))
	}
}
