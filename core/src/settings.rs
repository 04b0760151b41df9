/// Tunables for table detection, color sampling and noise rejection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
	/// Neighbor tolerance as a fraction of a cell's width/height.
	pub position_tolerance: f64,
	/// How far (fraction of cell size) a text box may poke out of its cell.
	pub text_tolerance: f64,
	/// A frame with more distinct colors than this is covered by something.
	pub max_colors: usize,
	/// Boards differing from the last kept state in this many squares or more
	/// are treated as a scene change.
	pub max_state_jump: usize,
	/// Seconds between sampled frames.
	pub sample_step: f64,
	/// Seconds to skip ahead after failing to find the table.
	pub table_retry_step: f64,
	/// Videos shorter than this (pixels) are too blurry to OCR.
	pub min_video_height: u32,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			position_tolerance: 0.2,
			text_tolerance: 0.05,
			max_colors: 3,
			max_state_jump: 5,
			sample_step: 5.0,
			table_retry_step: 120.0,
			min_video_height: 700,
		}
	}
}
