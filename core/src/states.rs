use crate::{
	board::{Board, BOARD_CELLS},
	changelog::Change,
	classify::classify_frame,
	settings::Settings,
	swatches::Swatches,
	table::Table,
	video::MatchVideo,
};
use color_eyre::eyre::{ensure, Result, WrapErr};
use opencv::core::Mat;
use tracing::{debug, trace, warn};

/// A board as it looked from `time` on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardState {
	pub time: f64,
	pub board: Board,
}

/// Collects the distinct boards seen while sampling.
///
/// A sampled board is kept when it differs from the last kept board, but in
/// fewer than `max_jump` squares. Bigger jumps are scene changes (the stream
/// switching away after the match, a transition) and are dropped without
/// replacing the reference board.
#[derive(Debug, Clone)]
pub struct StateTracker {
	max_jump: usize,
	states: Vec<BoardState>,
}

impl StateTracker {
	pub fn new(max_jump: usize) -> Self {
		Self {
			max_jump,
			states: Vec::new(),
		}
	}

	#[inline]
	pub fn latest(&self) -> Option<&BoardState> {
		self.states.last()
	}

	/// Returns whether the board was kept.
	pub fn observe(&mut self, time: f64, board: Board) -> bool {
		let changed = match self.states.last() {
			Some(last) if last.board == board => return false,
			Some(last) => last.board.diff_count(&board),
			None => 0,
		};
		if changed >= self.max_jump {
			debug!(time, changed, "dropping board that jumped too far");
			return false;
		}
		self.states.push(BoardState { time, board });
		true
	}

	#[inline]
	pub fn states(&self) -> &[BoardState] {
		&self.states
	}

	#[inline]
	pub fn into_states(self) -> Vec<BoardState> {
		self.states
	}
}

/// Diffs consecutive states square by square.
pub fn changelog_from_states(states: &[BoardState]) -> Vec<Change> {
	let mut changes = Vec::new();
	for pair in states.windows(2) {
		let (old, new) = (&pair[0], &pair[1]);
		for square in 0..BOARD_CELLS {
			if old.board.get(square) != new.board.get(square) {
				changes.push(Change {
					time: new.time,
					square,
					color: new.board.get(square),
				});
			}
		}
	}
	changes
}

/// What sampling the whole video produced.
pub struct Sampling {
	pub states: Vec<BoardState>,
	/// The last frame that was decoded, kept for manual review.
	pub last_frame: Option<Mat>,
}

/// Samples the video from `start` to its end every `settings.sample_step`
/// seconds. Frames that can't be decoded or classified are skipped.
pub fn sample_states<F>(
	video: &mut MatchVideo,
	table: &Table,
	swatches: &Swatches,
	settings: &Settings,
	start: f64,
	mut on_progress: F,
) -> Result<Sampling>
where
	F: FnMut(f64),
{
	ensure!(
		settings.sample_step > 0.0,
		"sample step must be positive, got {}",
		settings.sample_step
	);
	let mut tracker = StateTracker::new(settings.max_state_jump);
	let mut last_frame = None;
	let end = video.duration();
	let mut time = start;
	while time <= end {
		on_progress(time);
		if let Some(frame) = video
			.frame_at(time)
			.wrap_err_with(|| format!("failed to sample frame at {time:.1}s"))?
		{
			match classify_frame(table, &frame, swatches, settings.max_colors) {
				Ok(Some(board)) => {
					if tracker.observe(time, board) {
						trace!(time, "new board state\n{board}");
					}
				}
				Ok(None) => debug!(time, "too many colors on the board, skipping frame"),
				Err(err) => warn!(time, "failed to classify frame, skipping it: {err:#}"),
			}
			last_frame = Some(frame);
		}
		time += settings.sample_step;
	}
	Ok(Sampling {
		states: tracker.into_states(),
		last_frame,
	})
}
