use crate::{
	settings::Settings,
	table::{Rect, Table, TextFragment},
};
use color_eyre::eyre::{bail, ensure, ContextCompat, Result, WrapErr};
use serde::Deserialize;
use std::{
	fs, io,
	path::{Path, PathBuf},
	process::Command,
};
use tracing::debug;

/// Everything the models found in one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detections {
	pub cells: Vec<Rect>,
	pub texts: Vec<TextFragment>,
}

pub trait Detector {
	fn detect(&self, image: &Path) -> Result<Detections>;
}

#[derive(Deserialize)]
struct CellOutput {
	boxes: Vec<CellBox>,
}

#[derive(Deserialize)]
struct CellBox {
	label: String,
	coordinate: Vec<f64>,
}

#[derive(Deserialize)]
struct OcrOutput {
	rec_texts: Vec<String>,
	rec_boxes: Vec<Vec<f64>>,
}

/// Parses the table cell model's JSON result, keeping only `cell` boxes.
pub fn parse_cells(json: &str) -> Result<Vec<Rect>> {
	let output: CellOutput =
		serde_json::from_str(json).wrap_err("failed to parse cell detection output")?;
	output
		.boxes
		.iter()
		.filter(|b| b.label == "cell")
		.map(|b| Rect::from_coords(&b.coordinate))
		.collect::<Result<Vec<_>>>()
		.wrap_err("invalid cell box")
}

/// Parses the OCR model's JSON result.
pub fn parse_texts(json: &str) -> Result<Vec<TextFragment>> {
	let output: OcrOutput = serde_json::from_str(json).wrap_err("failed to parse ocr output")?;
	ensure!(
		output.rec_texts.len() == output.rec_boxes.len(),
		"ocr output has {} texts but {} boxes",
		output.rec_texts.len(),
		output.rec_boxes.len()
	);
	output
		.rec_texts
		.into_iter()
		.zip(output.rec_boxes.iter())
		.map(|(text, coords)| {
			Ok(TextFragment {
				rect: Rect::from_coords(coords)
					.wrap_err_with(|| format!("invalid box for text '{text}'"))?,
				text,
			})
		})
		.collect()
}

/// Runs the table cell model and the OCR model as external programs.
///
/// Each command is a program followed by its arguments. `{input}` in an
/// argument is replaced with the image path and `{output}` with the path the
/// program must write its JSON result to.
#[derive(Debug, Clone)]
pub struct CommandDetector {
	pub cell_command: Vec<String>,
	pub ocr_command: Vec<String>,
	/// Where the JSON results are kept.
	pub work_dir: PathBuf,
}

impl CommandDetector {
	fn run(&self, command: &[String], image: &Path, output: &Path) -> Result<String> {
		let (program, args) = command.split_first().wrap_err("empty detector command")?;
		let image = image.to_str().wrap_err("invalid image path cannot be represented as a str")?;
		let output_str = output
			.to_str()
			.wrap_err("invalid output path cannot be represented as a str")?;
		let args = args
			.iter()
			.map(|arg| arg.replace("{input}", image).replace("{output}", output_str))
			.collect::<Vec<_>>();
		match fs::remove_file(output) {
			Err(err) if err.kind() != io::ErrorKind::NotFound => {
				return Err(err)
					.wrap_err_with(|| format!("failed to clear old output {}", output.display()));
			}
			_ => {}
		}
		debug!(%program, ?args, "running detector");
		let status = Command::new(program)
			.args(&args)
			.status()
			.wrap_err_with(|| format!("failed to run {program}"))?;
		if !status.success() {
			bail!("{program} exited with {status}");
		}
		fs::read_to_string(output)
			.wrap_err_with(|| format!("failed to read {program} output from {}", output.display()))
	}
}

impl Detector for CommandDetector {
	fn detect(&self, image: &Path) -> Result<Detections> {
		let cells_json = self
			.run(&self.cell_command, image, &self.work_dir.join("cells.json"))
			.wrap_err("table cell detection failed")?;
		let ocr_json = self
			.run(&self.ocr_command, image, &self.work_dir.join("ocr.json"))
			.wrap_err("ocr failed")?;
		Ok(Detections {
			cells: parse_cells(&cells_json)?,
			texts: parse_texts(&ocr_json)?,
		})
	}
}

/// Detects and locates the board in a single image.
pub fn locate_table<D: Detector + ?Sized>(
	detector: &D,
	image: &Path,
	settings: &Settings,
) -> Result<Option<Table>> {
	let detections = detector
		.detect(image)
		.wrap_err_with(|| format!("failed to run detection on {}", image.display()))?;
	debug!(
		cells = detections.cells.len(),
		texts = detections.texts.len(),
		"detections for {}",
		image.display()
	);
	Ok(Table::locate(
		&detections.cells,
		&detections.texts,
		settings.position_tolerance,
		settings.text_tolerance,
	))
}
