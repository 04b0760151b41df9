use crate::{
	probe::{probe, VideoInfo},
	table::Table,
};
use color_eyre::eyre::{ensure, ContextCompat, Result, WrapErr};
use opencv::{
	core::{self, Mat, MatTraitConst, Scalar, Vector},
	imgcodecs, imgproc,
	videoio::{
		VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst, CAP_ANY, CAP_PROP_FPS,
		CAP_PROP_POS_FRAMES,
	},
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A match recording opened for random access by timestamp.
pub struct MatchVideo {
	path: PathBuf,
	capture: VideoCapture,
	info: VideoInfo,
	fps: f64,
}

impl MatchVideo {
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let info = probe(path).wrap_err_with(|| format!("failed to probe {}", path.display()))?;
		let capture = VideoCapture::from_file(
			path.to_str()
				.wrap_err("invalid input path cannot be represented as a str")?,
			CAP_ANY,
		)
		.wrap_err_with(|| format!("failed to read video from {}", path.display()))?;
		ensure!(
			capture.is_opened().wrap_err("failed to query video capture")?,
			"could not open video {}",
			path.display()
		);
		let fps = match capture
			.get(CAP_PROP_FPS)
			.wrap_err("failed to read fps property from video")?
		{
			fps if fps > 0.0 => fps,
			_ => info.fps,
		};
		ensure!(fps > 0.0, "video {} reports no frame rate", path.display());
		debug!(?info, fps, "opened {}", path.display());
		Ok(Self {
			path: path.to_owned(),
			capture,
			info,
			fps,
		})
	}

	#[inline]
	pub fn path(&self) -> &Path {
		&self.path
	}

	#[inline]
	pub fn info(&self) -> &VideoInfo {
		&self.info
	}

	#[inline]
	pub fn duration(&self) -> f64 {
		self.info.duration
	}

	/// Seeks to `seconds` and decodes one frame. `None` when nothing could be
	/// decoded there.
	pub fn frame_at(&mut self, seconds: f64) -> Result<Option<Mat>> {
		let position = (self.fps * seconds).round();
		self.capture
			.set(CAP_PROP_POS_FRAMES, position)
			.wrap_err_with(|| format!("failed to seek to frame {position}"))?;
		let mut frame = Mat::default();
		let read = self
			.capture
			.read(&mut frame)
			.wrap_err_with(|| format!("failed to read frame {position} from video capture input"))?;
		Ok((read && !frame.empty()).then_some(frame))
	}
}

pub fn save_frame<P: AsRef<Path>>(frame: &Mat, path: P) -> Result<()> {
	let path = path.as_ref();
	let written = imgcodecs::imwrite(
		path.to_str()
			.wrap_err("invalid path cannot be represented as a str")?,
		frame,
		&Vector::new(),
	)
	.wrap_err_with(|| format!("failed to write frame to {}", path.display()))?;
	ensure!(written, "no image writer for {}", path.display());
	Ok(())
}

/// Outlines every square of the table in red and writes the result.
pub fn draw_table<P: AsRef<Path>>(frame: &Mat, table: &Table, path: P) -> Result<()> {
	let mut annotated = frame.clone();
	let red = Scalar::new(0.0, 0.0, 255.0, 255.0);
	for square in table.squares() {
		let rect = core::Rect::new(
			square.rect.x_min.round() as i32,
			square.rect.y_min.round() as i32,
			square.rect.width().round() as i32,
			square.rect.height().round() as i32,
		);
		imgproc::rectangle(&mut annotated, rect, red, 4, imgproc::LINE_8, 0)
			.wrap_err("failed to draw square")?;
	}
	save_frame(&annotated, path)
}


#[cfg(test)]
mod tests {
	use super::*;
	use crate::table::{Rect, Square};
	use opencv::{
		core::CV_8UC3,
		imgcodecs::{imread, IMREAD_COLOR},
	};

	#[test]
	fn annotated_frame_is_written() {
		let dir = tempfile::tempdir().unwrap();
		let frame = Mat::new_rows_cols_with_default(120, 120, CV_8UC3, Scalar::all(0.0)).unwrap();
		let squares = (0..25)
			.map(|i| {
				let (x, y) = ((i % 5 * 20) as f64, (i / 5 * 20) as f64);
				Square {
					rect: Rect::new(x, y, x + 20.0, y + 20.0),
					text: String::new(),
				}
			})
			.collect::<Vec<_>>();
		let table = Table::try_from(squares).unwrap();
		let out = dir.path().join("table.png");
		draw_table(&frame, &table, &out).unwrap();

		let written = imread(out.to_str().unwrap(), IMREAD_COLOR).unwrap();
		assert_eq!((written.rows(), written.cols()), (120, 120));
		let mean = crate::swatches::mean_bgr(&written).unwrap();
		assert!(mean[2] > mean[0]);
		// the original frame is untouched
		assert_eq!(crate::swatches::mean_bgr(&frame).unwrap(), [0.0, 0.0, 0.0]);
	}

	#[test]
	fn opens_clip_and_seeks_by_time() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("video.avi");
		clip::write(&path, &[&[], &[(0, clip::red())]]);
		let mut video = MatchVideo::open(&path).unwrap();
		assert_eq!((video.info().width, video.info().height), (200, 200));
		assert!((video.duration() - 2.0).abs() < 0.2);

		let first = video.frame_at(0.5).unwrap().unwrap();
		let second = video.frame_at(1.5).unwrap().unwrap();
		assert!(crate::swatches::mean_bgr(&first).unwrap()[2] < 2.0);
		assert!(crate::swatches::mean_bgr(&second).unwrap()[2] > 5.0);
	}
}
