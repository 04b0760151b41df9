use crate::{
	board::{Board, BOARD_CELLS},
	color::Color,
	swatches::{mean_bgr, Bgr, Swatches},
	table::{Rect, Table},
};
use color_eyre::eyre::{ContextCompat, Result, WrapErr};
use opencv::core::{self, Mat, MatTraitConst};

/// The middle of a square, shrunk by an eighth on every side so the detected
/// border pixels don't leak into the mean.
pub fn center_rect(rect: &Rect, frame_width: i32, frame_height: i32) -> Option<core::Rect> {
	let x_delta = rect.width() / 8.0;
	let y_delta = rect.height() / 8.0;
	let x_min = ((rect.x_min + x_delta).round() as i32).clamp(0, frame_width);
	let x_max = ((rect.x_max - x_delta).round() as i32).clamp(0, frame_width);
	let y_min = ((rect.y_min + y_delta).round() as i32).clamp(0, frame_height);
	let y_max = ((rect.y_max - y_delta).round() as i32).clamp(0, frame_height);
	(x_max > x_min && y_max > y_min)
		.then(|| core::Rect::new(x_min, y_min, x_max - x_min, y_max - y_min))
}

/// Mean color of every square's center.
pub fn raw_colors(table: &Table, frame: &Mat) -> Result<Vec<Bgr>> {
	let (width, height) = (frame.cols(), frame.rows());
	table
		.squares()
		.iter()
		.enumerate()
		.map(|(idx, square)| {
			let roi = center_rect(&square.rect, width, height)
				.wrap_err_with(|| format!("square {idx} lies outside the {width}x{height} frame"))?;
			let region = Mat::roi(frame, roi).wrap_err_with(|| format!("invalid roi: {roi:?}"))?;
			mean_bgr(&region).wrap_err_with(|| format!("failed to sample square {idx}"))
		})
		.collect()
}

/// Classifies every square of the frame. Returns `None` when more than
/// `max_colors` distinct colors show up, which happens when overlays such as
/// stream alerts cover the board.
pub fn classify_frame(
	table: &Table,
	frame: &Mat,
	swatches: &Swatches,
	max_colors: usize,
) -> Result<Option<Board>> {
	let raw = raw_colors(table, frame)?;
	let mut squares = [Color::Black; BOARD_CELLS];
	for (square, bgr) in squares.iter_mut().zip(raw) {
		*square = swatches.closest(bgr);
	}
	let board = Board::new(squares);
	if board.distinct_colors() > max_colors {
		return Ok(None);
	}
	Ok(Some(board))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		swatches::Swatch,
		table::{Square, Table},
	};
	use opencv::{
		core::{self, Scalar, CV_8UC3},
		imgproc::{self, FILLED, LINE_8},
	};

	const CELL: i32 = 40;

	fn table() -> Table {
		let squares = (0..BOARD_CELLS as i32)
			.map(|i| {
				let (x, y) = ((i % 5 * CELL) as f64, (i / 5 * CELL) as f64);
				Square {
					rect: Rect::new(x, y, x + CELL as f64, y + CELL as f64),
					text: String::new(),
				}
			})
			.collect::<Vec<_>>();
		Table::try_from(squares).unwrap()
	}

	fn swatches() -> Swatches {
		let swatch = |color, bgr| Swatch {
			color,
			highlight: false,
			bgr,
		};
		Swatches::new(vec![
			swatch(Color::Black, [0.0, 0.0, 0.0]),
			swatch(Color::Red, [0.0, 0.0, 255.0]),
			swatch(Color::Blue, [255.0, 0.0, 0.0]),
			swatch(Color::Green, [0.0, 255.0, 0.0]),
		])
	}

	fn paint(frame: &mut Mat, index: i32, bgr: Scalar) {
		let rect = core::Rect::new(index % 5 * CELL, index / 5 * CELL, CELL, CELL);
		imgproc::rectangle(frame, rect, bgr, FILLED, LINE_8, 0).unwrap();
	}

	fn blank_frame() -> Mat {
		Mat::new_rows_cols_with_default(5 * CELL, 5 * CELL, CV_8UC3, Scalar::all(0.0)).unwrap()
	}

	#[test]
	fn center_rect_shrinks_and_clamps() {
		let rect = Rect::new(0.0, 0.0, 80.0, 40.0);
		assert_eq!(center_rect(&rect, 100, 100), Some(core::Rect::new(10, 5, 60, 30)));
		let edge = Rect::new(90.0, 90.0, 130.0, 130.0);
		assert_eq!(center_rect(&edge, 100, 100), Some(core::Rect::new(95, 95, 5, 5)));
		let outside = Rect::new(200.0, 200.0, 240.0, 240.0);
		assert_eq!(center_rect(&outside, 100, 100), None);
	}

	#[test]
	fn classifies_painted_squares() {
		let mut frame = blank_frame();
		paint(&mut frame, 0, Scalar::new(0.0, 0.0, 230.0, 0.0));
		paint(&mut frame, 24, Scalar::new(240.0, 10.0, 10.0, 0.0));
		let board = classify_frame(&table(), &frame, &swatches(), 3).unwrap().unwrap();
		assert_eq!(board.get(0), Color::Red);
		assert_eq!(board.get(24), Color::Blue);
		assert_eq!(board.get(12), Color::Black);
	}

	#[test]
	fn border_pixels_do_not_leak() {
		let mut frame = blank_frame();
		// a thick red border around square 6 that stays within the outer eighth
		paint(&mut frame, 6, Scalar::new(0.0, 0.0, 255.0, 0.0));
		let inner = core::Rect::new(CELL + 5, CELL + 5, CELL - 10, CELL - 10);
		imgproc::rectangle(&mut frame, inner, Scalar::all(0.0), FILLED, LINE_8, 0).unwrap();
		let board = classify_frame(&table(), &frame, &swatches(), 3).unwrap().unwrap();
		assert_eq!(board.get(6), Color::Black);
	}

	#[test]
	fn too_many_colors_rejects_frame() {
		let mut frame = blank_frame();
		paint(&mut frame, 0, Scalar::new(0.0, 0.0, 255.0, 0.0));
		paint(&mut frame, 1, Scalar::new(255.0, 0.0, 0.0, 0.0));
		paint(&mut frame, 2, Scalar::new(0.0, 255.0, 0.0, 0.0));
		assert_eq!(classify_frame(&table(), &frame, &swatches(), 3).unwrap(), None);
		assert!(classify_frame(&table(), &frame, &swatches(), 4).unwrap().is_some());
	}

	#[test]
	fn classification_is_deterministic() {
		let mut frame = blank_frame();
		paint(&mut frame, 3, Scalar::new(0.0, 0.0, 200.0, 0.0));
		let first = classify_frame(&table(), &frame, &swatches(), 3).unwrap();
		let second = classify_frame(&table(), &frame, &swatches(), 3).unwrap();
		assert_eq!(first, second);
	}
}
