use bingo_scribe_core::{settings::Settings, stats::ExpectedStats};
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{ensure, ContextCompat, Result, WrapErr};
use itertools::Itertools;
use std::{path::PathBuf, str::FromStr};

#[derive(Parser)]
#[command(author, version, about, long_about = None, propagate_version = true)]
pub struct CliArgs {
	#[command(subcommand)]
	pub command: CliSubcommands,
}

#[derive(Subcommand)]
pub enum CliSubcommands {
	/// Build changelogs for every match in the match list.
	Generate(GenerateArgs),
	/// Find the board in a single image.
	Locate(LocateArgs),
	/// Compute the final result from changelog files.
	Stats(StatsArgs),
	/// Print goal completion times for every analyzed match as JSON lines.
	Goals(GoalsArgs),
}

#[derive(Args)]
pub struct DetectorArgs {
	/// The table cell detection command, ended with `;` when more options
	/// follow. `{input}` and `{output}` are replaced with the image path and
	/// the JSON result path.
	#[arg(
		long,
		required = true,
		num_args = 1..,
		allow_hyphen_values = true,
		value_terminator = ";"
	)]
	pub cell_command: Vec<String>,
	/// The OCR command, with the same placeholders and terminator.
	#[arg(
		long,
		required = true,
		num_args = 1..,
		allow_hyphen_values = true,
		value_terminator = ";"
	)]
	pub ocr_command: Vec<String>,
}

#[derive(Args)]
pub struct SettingsArgs {
	/// How far apart neighboring cells may be (fraction of cell size).
	#[arg(long, default_value = "0.2")]
	pub position_tolerance: f64,
	/// How far a text box may stick out of its cell (fraction of cell size).
	#[arg(long, default_value = "0.05")]
	pub text_tolerance: f64,
	/// Frames with more colors on the board than this are skipped.
	#[arg(long, default_value = "3")]
	pub max_colors: usize,
	/// Boards that change this many squares at once are ignored.
	#[arg(long, default_value = "5")]
	pub max_state_jump: usize,
	/// Seconds between sampled frames.
	#[arg(long, default_value = "5.0", value_parser = parse_step)]
	pub sample_step: f64,
	/// Seconds to skip ahead when the board isn't found.
	#[arg(long, default_value = "120.0", value_parser = parse_step)]
	pub table_retry_step: f64,
	/// Minimum video height needed to read the board.
	#[arg(long, default_value = "700")]
	pub min_video_height: u32,
}

impl SettingsArgs {
	pub fn settings(&self) -> Settings {
		Settings {
			position_tolerance: self.position_tolerance,
			text_tolerance: self.text_tolerance,
			max_colors: self.max_colors,
			max_state_jump: self.max_state_jump,
			sample_step: self.sample_step,
			table_retry_step: self.table_retry_step,
			min_video_height: self.min_video_height,
		}
	}
}

#[derive(Args)]
pub struct GenerateArgs {
	/// The match list.
	#[arg(short, long, default_value = "all_matches.csv")]
	pub matches: PathBuf,
	/// The directory holding one folder per match.
	#[arg(short, long, default_value = "matches")]
	pub output: PathBuf,
	/// The directory of reference color images.
	#[arg(short, long, default_value = "swatches")]
	pub swatches: PathBuf,
	/// Only process these match ids.
	#[arg(long, num_args = 1..)]
	pub only: Vec<String>,
	/// Rerun matches that already have a changelog.
	#[arg(short, long)]
	pub force: bool,
	#[command(flatten)]
	pub detector: DetectorArgs,
	#[command(flatten)]
	pub settings: SettingsArgs,
}

#[derive(Args)]
pub struct LocateArgs {
	/// The input image file.
	#[arg(short, long)]
	pub input: PathBuf,
	/// Where to save the located table.
	#[arg(short, long)]
	pub output: Option<PathBuf>,
	/// Where to save a copy of the image with the grid drawn on it.
	#[arg(short, long)]
	pub annotate: Option<PathBuf>,
	/// Where the detectors write their results.
	#[arg(short, long, default_value = ".")]
	pub work_dir: PathBuf,
	#[command(flatten)]
	pub detector: DetectorArgs,
	#[command(flatten)]
	pub settings: SettingsArgs,
}

#[derive(Args)]
pub struct StatsArgs {
	/// The changelog files.
	#[arg(required = true, num_args = 1..)]
	pub changelogs: Vec<PathBuf>,
	/// The expected result (winner score,bingo,loser score).
	#[arg(short, long, value_parser = parse_expected)]
	pub expected: Option<ExpectedStats>,
}

#[derive(Args)]
pub struct GoalsArgs {
	/// The match list.
	#[arg(short, long, default_value = "all_matches.csv")]
	pub matches: PathBuf,
	/// The directory holding one folder per match.
	#[arg(short, long, default_value = "matches")]
	pub output: PathBuf,
}

fn parse_step(arg: &str) -> Result<f64> {
	let step = f64::from_str(arg.trim()).wrap_err_with(|| format!("invalid number '{arg}'"))?;
	ensure!(step > 0.0, "step must be a positive number of seconds, got {step}");
	Ok(step)
}

fn parse_expected(arg: &str) -> Result<ExpectedStats> {
	let (winner_score, bingo, loser_score) = arg
		.split(',')
		.map(str::trim)
		.collect_tuple()
		.context("expected stats should be formatted as winner,bingo,loser")?;
	let score = |value: &str| {
		usize::from_str(value).wrap_err_with(|| format!("invalid score '{value}'"))
	};
	let bingo = bool::from_str(bingo).wrap_err_with(|| format!("invalid bingo flag '{bingo}'"))?;
	Ok(ExpectedStats {
		winner_score: score(winner_score)?,
		bingo,
		loser_score: score(loser_score)?,
	})
}
