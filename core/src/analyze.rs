//! The per-match pipeline: find the board, sample it across the recording,
//! and check the result against the match list.

use crate::{
	changelog::{self, Change},
	detect::{locate_table, Detector},
	matches::{
		Match, MatchDir, CHANGELOG_FILE, FRAME_FILE, OVERRIDE_FRAME_FILE, TABLE_FILE,
		TABLE_PREVIEW_FILE,
	},
	review::write_review_markers,
	settings::Settings,
	states::{changelog_from_states, sample_states},
	stats::{final_stats, FinalStats, StatsFailure},
	swatches::Swatches,
	table::Table,
	video::{draw_table, save_frame, MatchVideo},
};
use color_eyre::eyre::{bail, ensure, ContextCompat, Result, WrapErr};
use opencv::imgcodecs::{imread, IMREAD_COLOR};
use tracing::{debug, info, warn};

/// Outcome of analyzing one match.
#[derive(Debug)]
pub struct Report {
	pub changes: Vec<Change>,
	pub stats: Result<FinalStats, StatsFailure>,
	/// Whether the computed result agrees with the match list.
	pub score_matches: bool,
}

/// The table saved by an earlier run or placed there by hand.
pub fn cached_table(dir: &MatchDir) -> Result<Option<Table>> {
	let path = dir.file(TABLE_FILE);
	if !path.is_file() {
		return Ok(None);
	}
	Table::load(&path).map(Some)
}

/// Locates the table in the hand-picked override frame, if there is one.
pub fn override_table<D: Detector + ?Sized>(
	dir: &MatchDir,
	detector: &D,
	settings: &Settings,
) -> Result<Option<Table>> {
	let path = dir.file(OVERRIDE_FRAME_FILE);
	if !path.is_file() {
		return Ok(None);
	}
	info!("using override frame {}", path.display());
	let table = locate_table(detector, &path, settings)?
		.wrap_err_with(|| format!("no table found in override frame {}", path.display()))?;
	let frame = imread(
		path.to_str()
			.wrap_err("invalid path cannot be represented as a str")?,
		IMREAD_COLOR,
	)
	.wrap_err_with(|| format!("failed to read {}", path.display()))?;
	draw_table(&frame, &table, dir.file(TABLE_PREVIEW_FILE))?;
	Ok(Some(table))
}

/// Steps through the video from `start` until the detector finds the board.
fn scan_for_table<D: Detector + ?Sized>(
	video: &mut MatchVideo,
	dir: &MatchDir,
	detector: &D,
	settings: &Settings,
	start: f64,
) -> Result<Option<Table>> {
	ensure!(
		settings.table_retry_step > 0.0,
		"table retry step must be positive, got {}",
		settings.table_retry_step
	);
	let frame_path = dir.file(FRAME_FILE);
	let mut time = start;
	while time <= video.duration() {
		let Some(frame) = video.frame_at(time)? else {
			debug!(time, "no frame decoded while looking for the table");
			time += settings.table_retry_step;
			continue;
		};
		save_frame(&frame, &frame_path)?;
		match locate_table(detector, &frame_path, settings)? {
			Some(table) => {
				info!(time, "found table");
				draw_table(&frame, &table, dir.file(TABLE_PREVIEW_FILE))?;
				return Ok(Some(table));
			}
			None => {
				warn!(time, "grid not found, trying {}s later", settings.table_retry_step);
				time += settings.table_retry_step;
			}
		}
	}
	Ok(None)
}

/// Finds the board for a match and caches it as `table.json`.
pub fn find_table<D: Detector + ?Sized>(
	video: &mut MatchVideo,
	dir: &MatchDir,
	detector: &D,
	settings: &Settings,
	start: f64,
) -> Result<Table> {
	if let Some(table) = cached_table(dir)? {
		debug!("using cached table");
		return Ok(table);
	}
	let height = video.info().height;
	if height < settings.min_video_height {
		bail!(
			"{} is only {height}p, too low quality to read the board (need {}p)",
			video.path().display(),
			settings.min_video_height
		);
	}
	let table = match override_table(dir, detector, settings)? {
		Some(table) => table,
		None => scan_for_table(video, dir, detector, settings, start)?
			.wrap_err_with(|| format!("no table found in {}", video.path().display()))?,
	};
	table.save(dir.file(TABLE_FILE))?;
	Ok(table)
}

/// Runs the whole pipeline for one match. `on_progress` receives the sampled
/// position and the video duration in seconds.
pub fn analyze_match<D, F>(
	m: &Match,
	dir: &MatchDir,
	swatches: &Swatches,
	detector: &D,
	settings: &Settings,
	mut on_progress: F,
) -> Result<Report>
where
	D: Detector + ?Sized,
	F: FnMut(f64, f64),
{
	dir.create()?;
	let video_path = dir.video()?;
	let mut video = MatchVideo::open(&video_path)?;
	let table = find_table(&mut video, dir, detector, settings, m.board_start)
		.wrap_err("failed to find table")?;

	let swatches = match dir.color_restrictions()? {
		Some(allowed) => {
			info!(?allowed, "restricting colors");
			swatches.restrict(&allowed)
		}
		None => swatches.clone(),
	};

	let duration = video.duration();
	let sampling = sample_states(&mut video, &table, &swatches, settings, m.board_start, |time| {
		on_progress(time, duration)
	})?;
	debug!(states = sampling.states.len(), "sampled board states");

	let changes = changelog_from_states(&sampling.states);
	changelog::save(&changes, dir.file(CHANGELOG_FILE))?;
	if let Some(frame) = &sampling.last_frame {
		save_frame(frame, dir.file(FRAME_FILE))?;
	}

	let stats = final_stats(&changes);
	let score_matches = write_review_markers(dir, &changes, &stats, &m.expected_stats())?;
	match &stats {
		Ok(stats) => info!(%stats, score_matches, "{} done", m.id()),
		Err(failure) => warn!(%failure, "{} has no result", m.id()),
	}
	Ok(Report {
		changes,
		stats,
		score_matches,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		detect::Detections,
		swatches::{mean_bgr, Bgr},
		table::{Rect, Square},
		video::clip::{self, blue, red},
	};
	use csv::StringRecord;
	use opencv::{
		core::{Mat, Scalar, Vector, CV_8UC3},
		imgcodecs::imwrite,
	};
	use std::{
		cell::{Cell, RefCell},
		path::Path,
	};

	struct Counting {
		detections: Detections,
		calls: Cell<usize>,
	}

	impl Detector for Counting {
		fn detect(&self, _image: &Path) -> Result<Detections> {
			self.calls.set(self.calls.get() + 1);
			Ok(self.detections.clone())
		}
	}

	fn grid() -> Vec<Rect> {
		(0..25)
			.map(|i| {
				let (x, y) = ((i % 5) as f64 * 40.0, (i / 5) as f64 * 40.0);
				Rect::new(x, y, x + 40.0, y + 40.0)
			})
			.collect()
	}

	fn match_dir(root: &Path) -> MatchDir {
		let m = Match::from_record(&StringRecord::from(vec![
			"1", "Gold", "A", "B", "d", "s", "0", "0", "https://youtu.be/x", "1", "0", "", "A",
		]))
		.unwrap();
		let dir = MatchDir::new(root, &m);
		dir.create().unwrap();
		dir
	}

	#[test]
	fn no_cached_table_is_none() {
		let root = tempfile::tempdir().unwrap();
		assert!(cached_table(&match_dir(root.path())).unwrap().is_none());
	}

	#[test]
	fn cached_table_is_loaded() {
		let root = tempfile::tempdir().unwrap();
		let dir = match_dir(root.path());
		let squares = grid()
			.into_iter()
			.map(|rect| Square {
				rect,
				text: "goal".to_owned(),
			})
			.collect::<Vec<_>>();
		let table = Table::try_from(squares).unwrap();
		table.save(dir.file(TABLE_FILE)).unwrap();
		assert_eq!(cached_table(&dir).unwrap(), Some(table));
	}

	#[test]
	fn override_frame_is_used_when_present() {
		let root = tempfile::tempdir().unwrap();
		let dir = match_dir(root.path());
		let detector = Counting {
			detections: Detections {
				cells: grid(),
				texts: vec![],
			},
			calls: Cell::new(0),
		};
		assert!(override_table(&dir, &detector, &Settings::default()).unwrap().is_none());
		assert_eq!(detector.calls.get(), 0);

		let frame = Mat::new_rows_cols_with_default(200, 200, CV_8UC3, Scalar::all(30.0)).unwrap();
		imwrite(dir.file(OVERRIDE_FRAME_FILE).to_str().unwrap(), &frame, &Vector::new()).unwrap();
		let table = override_table(&dir, &detector, &Settings::default()).unwrap().unwrap();
		assert_eq!(detector.calls.get(), 1);
		assert_eq!(table.squares()[6].rect, Rect::new(40.0, 40.0, 80.0, 80.0));
		assert!(dir.file(TABLE_PREVIEW_FILE).is_file());
	}

	#[test]
	fn override_frame_without_grid_is_an_error() {
		let root = tempfile::tempdir().unwrap();
		let dir = match_dir(root.path());
		let frame = Mat::new_rows_cols_with_default(50, 50, CV_8UC3, Scalar::all(0.0)).unwrap();
		imwrite(dir.file(OVERRIDE_FRAME_FILE).to_str().unwrap(), &frame, &Vector::new()).unwrap();
		let detector = Counting {
			detections: Detections::default(),
			calls: Cell::new(0),
		};
		assert!(override_table(&dir, &detector, &Settings::default()).is_err());
	}

	/// Finds nothing on its first call, then the clip's grid. Remembers the
	/// mean color of every image it was shown.
	struct SecondTry {
		seen: RefCell<Vec<Bgr>>,
	}

	impl Detector for SecondTry {
		fn detect(&self, image: &Path) -> Result<Detections> {
			let frame = imread(image.to_str().unwrap(), IMREAD_COLOR)?;
			let mut seen = self.seen.borrow_mut();
			seen.push(mean_bgr(&frame)?);
			if seen.len() == 1 {
				return Ok(Detections::default());
			}
			let cells = clip::table(0.0).squares().iter().map(|square| square.rect).collect();
			Ok(Detections { cells, texts: vec![] })
		}
	}

	fn scan_clip(dir: &MatchDir) -> MatchVideo {
		let path = dir.file("video.avi");
		clip::write(&path, &[&[], &[], &[(0, red()), (24, blue())]]);
		MatchVideo::open(&path).unwrap()
	}

	#[test]
	fn missing_grid_is_retried_later() {
		let root = tempfile::tempdir().unwrap();
		let dir = match_dir(root.path());
		let mut video = scan_clip(&dir);
		let detector = SecondTry {
			seen: RefCell::new(Vec::new()),
		};
		let settings = Settings {
			table_retry_step: 2.0,
			..Settings::default()
		};
		let table = scan_for_table(&mut video, &dir, &detector, &settings, 0.5)
			.unwrap()
			.unwrap();
		assert_eq!(table.squares()[24].rect, clip::table(0.0).squares()[24].rect);

		// the first look at 0.5s saw a blank board, the retry at 2.5s the claimed one
		let seen = detector.seen.borrow();
		assert_eq!(seen.len(), 2);
		assert!(seen[0][2] < 2.0);
		assert!(seen[1][2] > 5.0);
		assert!(dir.file(FRAME_FILE).is_file());
		assert!(dir.file(TABLE_PREVIEW_FILE).is_file());
	}

	#[test]
	fn scan_without_grid_gives_up_at_the_end() {
		let root = tempfile::tempdir().unwrap();
		let dir = match_dir(root.path());
		let mut video = scan_clip(&dir);
		let detector = Counting {
			detections: Detections::default(),
			calls: Cell::new(0),
		};
		let settings = Settings {
			table_retry_step: 1.0,
			..Settings::default()
		};
		let table = scan_for_table(&mut video, &dir, &detector, &settings, 0.5).unwrap();
		assert!(table.is_none());
		assert_eq!(detector.calls.get(), 3);
	}

	#[test]
	fn scan_needs_positive_step() {
		let root = tempfile::tempdir().unwrap();
		let dir = match_dir(root.path());
		let mut video = scan_clip(&dir);
		let detector = Counting {
			detections: Detections::default(),
			calls: Cell::new(0),
		};
		let settings = Settings {
			table_retry_step: 0.0,
			..Settings::default()
		};
		assert!(scan_for_table(&mut video, &dir, &detector, &settings, 0.5).is_err());
		assert_eq!(detector.calls.get(), 0);
	}
}
