use crate::color::Color;
use color_eyre::eyre::{ensure, ContextCompat, Result, WrapErr};
use opencv::{
	core::{self, Mat, MatTraitConst},
	imgcodecs::{self, IMREAD_COLOR},
};
use std::{collections::HashSet, path::Path};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Mean color of an image region, in OpenCV's BGR channel order.
pub type Bgr = [f64; 3];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swatch {
	pub color: Color,
	pub highlight: bool,
	pub bgr: Bgr,
}

/// Reference colors for every square state, including the lighter variant a
/// square shows while the cursor hovers it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Swatches {
	swatches: Vec<Swatch>,
}

pub fn mean_bgr(image: &Mat) -> Result<Bgr> {
	let mean = core::mean(image, &core::no_array()).wrap_err("failed to compute mean color")?;
	let [b, g, r, _] = mean.0;
	Ok([b, g, r])
}

fn load_swatch(path: &Path) -> Result<Option<Swatch>> {
	let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
		return Ok(None);
	};
	let (name, highlight) = match stem.strip_suffix("_highlight") {
		Some(name) => (name, true),
		None => (stem, false),
	};
	let Ok(color) = name.parse::<Color>() else {
		warn!("ignoring swatch with unknown color name: {}", path.display());
		return Ok(None);
	};
	let path_str = path
		.to_str()
		.wrap_err("invalid path cannot be represented as a str")?;
	let image = imgcodecs::imread(path_str, IMREAD_COLOR)
		.wrap_err_with(|| format!("failed to read swatch from {}", path.display()))?;
	ensure!(!image.empty(), "swatch image {} is empty or unreadable", path.display());
	let bgr = mean_bgr(&image)
		.wrap_err_with(|| format!("failed to sample swatch {}", path.display()))?;
	debug!(%color, highlight, ?bgr, "loaded swatch");
	Ok(Some(Swatch {
		color,
		highlight,
		bgr,
	}))
}

impl Swatches {
	pub fn new(mut swatches: Vec<Swatch>) -> Self {
		swatches.sort_by_key(|swatch| (swatch.color, swatch.highlight));
		Self { swatches }
	}

	/// Loads `<color>.png` and `<color>_highlight.png` style images from a
	/// directory.
	pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
		let dir = dir.as_ref();
		let mut swatches = Vec::new();
		for entry in WalkDir::new(dir).max_depth(1).into_iter().filter_map(|e| e.ok()) {
			let entry_path = entry.path();
			let readable = entry_path
				.to_str()
				.map(|path| imgcodecs::have_image_reader(path).unwrap_or(false))
				.unwrap_or(false);
			if !entry_path.is_file() || !readable {
				continue;
			}
			if let Some(swatch) = load_swatch(entry_path)? {
				swatches.push(swatch);
			}
		}
		ensure!(!swatches.is_empty(), "no color swatches found in {}", dir.display());
		Ok(Self::new(swatches))
	}

	#[inline]
	pub fn swatches(&self) -> &[Swatch] {
		&self.swatches
	}

	/// Keeps only the allowed colors.
	pub fn restrict(&self, allowed: &HashSet<Color>) -> Self {
		Self {
			swatches: self
				.swatches
				.iter()
				.filter(|swatch| allowed.contains(&swatch.color))
				.copied()
				.collect(),
		}
	}

	/// Nearest reference color by squared euclidean distance. Equal distances
	/// resolve to the earlier swatch.
	pub fn closest(&self, bgr: Bgr) -> Color {
		let mut best: Option<(f64, Color)> = None;
		for swatch in &self.swatches {
			let dist = swatch
				.bgr
				.iter()
				.zip(bgr.iter())
				.map(|(a, b)| (a - b).powi(2))
				.sum::<f64>();
			if best.map_or(true, |(best_dist, _)| dist < best_dist) {
				best = Some((dist, swatch.color));
			}
		}
		best.map(|(_, color)| color).unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use opencv::core::{Scalar, Vector, CV_8UC3};

	fn swatch(color: Color, highlight: bool, bgr: Bgr) -> Swatch {
		Swatch {
			color,
			highlight,
			bgr,
		}
	}

	fn reference() -> Swatches {
		Swatches::new(vec![
			swatch(Color::Red, true, [90.0, 90.0, 250.0]),
			swatch(Color::Black, false, [10.0, 10.0, 10.0]),
			swatch(Color::Red, false, [40.0, 40.0, 200.0]),
			swatch(Color::Blue, false, [200.0, 60.0, 30.0]),
		])
	}

	#[test]
	fn closest_picks_nearest_including_highlight() {
		let swatches = reference();
		assert_eq!(swatches.closest([12.0, 8.0, 15.0]), Color::Black);
		assert_eq!(swatches.closest([85.0, 95.0, 240.0]), Color::Red);
		assert_eq!(swatches.closest([180.0, 70.0, 40.0]), Color::Blue);
	}

	#[test]
	fn order_is_stable_regardless_of_input_order() {
		let mut shuffled = reference().swatches().to_vec();
		shuffled.reverse();
		assert_eq!(Swatches::new(shuffled), reference());
		assert_eq!(reference().swatches()[0].color, Color::Black);
	}

	#[test]
	fn equal_distance_resolves_to_first() {
		let swatches = Swatches::new(vec![
			swatch(Color::Teal, false, [0.0, 0.0, 10.0]),
			swatch(Color::Orange, false, [0.0, 0.0, 20.0]),
		]);
		// orange sorts before teal
		assert_eq!(swatches.closest([0.0, 0.0, 15.0]), Color::Orange);
	}

	#[test]
	fn restriction_removes_colors() {
		let allowed = HashSet::from([Color::Black, Color::Blue]);
		let swatches = reference().restrict(&allowed);
		assert_eq!(swatches.closest([85.0, 95.0, 240.0]), Color::Blue);
		assert_eq!(Swatches::default().closest([0.0, 0.0, 0.0]), Color::Black);
	}

	#[test]
	fn loads_swatches_from_directory() {
		let dir = tempfile::tempdir().unwrap();
		let write = |name: &str, bgr: Scalar| {
			let image = Mat::new_rows_cols_with_default(8, 8, CV_8UC3, bgr).unwrap();
			let path = dir.path().join(name);
			assert!(imgcodecs::imwrite(path.to_str().unwrap(), &image, &Vector::new()).unwrap());
		};
		write("green.png", Scalar::new(20.0, 200.0, 20.0, 0.0));
		write("green_highlight.png", Scalar::new(80.0, 250.0, 80.0, 0.0));
		write("mystery.png", Scalar::all(128.0));

		let swatches = Swatches::load(dir.path()).unwrap();
		assert_eq!(swatches.swatches().len(), 2);
		assert_eq!(swatches.swatches()[0], swatch(Color::Green, false, [20.0, 200.0, 20.0]));
		assert!(swatches.swatches()[1].highlight);
	}

	#[test]
	fn empty_directory_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		assert!(Swatches::load(dir.path()).is_err());
	}
}
