use color_eyre::eyre::{ContextCompat, Result, WrapErr};
use ffmpeg_next as ffmpeg;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
	pub width: u32,
	pub height: u32,
	pub fps: f64,
	/// Seconds.
	pub duration: f64,
}

/// Reads stream metadata from the container. OpenCV's frame count is an
/// estimate for most web formats, so the duration comes from here instead.
pub fn probe<P: AsRef<Path>>(path: P) -> Result<VideoInfo> {
	probe_impl(path.as_ref())
}

fn probe_impl(path: &Path) -> Result<VideoInfo> {
	ffmpeg::init().wrap_err("failed to initialize ffmpeg")?;

	let ictx = ffmpeg::format::input(&path)
		.wrap_err_with(|| format!("failed to open input file at {}", path.display()))?;
	let stream = ictx
		.streams()
		.best(ffmpeg::media::Type::Video)
		.wrap_err_with(|| format!("no video stream in {}", path.display()))?;

	let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
		.wrap_err("failed to read codec parameters")?
		.decoder()
		.video()
		.wrap_err("failed to open video decoder")?;

	let fps = f64::from(stream.avg_frame_rate());
	let duration = if ictx.duration() > 0 {
		ictx.duration() as f64 * f64::from(ffmpeg::rescale::TIME_BASE)
	} else {
		stream.duration() as f64 * f64::from(stream.time_base())
	};

	Ok(VideoInfo {
		width: decoder.width(),
		height: decoder.height(),
		fps,
		duration,
	})
}
