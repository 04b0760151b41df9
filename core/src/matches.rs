use crate::{color::Color, stats::ExpectedStats};
use color_eyre::eyre::{eyre, ContextCompat, Result, WrapErr};
use csv::StringRecord;
use std::{
	collections::HashSet,
	fs,
	path::{Path, PathBuf},
};

pub const TABLE_FILE: &str = "table.json";
pub const CHANGELOG_FILE: &str = "changelog.txt";
pub const FRAME_FILE: &str = "frame.png";
pub const TABLE_PREVIEW_FILE: &str = "table.png";
pub const OVERRIDE_FRAME_FILE: &str = "ocr_override_frame.png";
pub const COLOR_RESTRICTIONS_FILE: &str = "color_restrictions.json";

/// One row of the match list.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
	pub week: String,
	pub tier: String,
	pub p1_name: String,
	pub p2_name: String,
	pub date: String,
	pub streamer: String,
	/// Seconds into the VOD where the match starts.
	pub start: f64,
	/// Seconds into the VOD where the board is first fully visible.
	pub board_start: f64,
	pub vod: String,
	pub p1_score: usize,
	pub p2_score: usize,
	pub bingo: bool,
	pub winner_name: String,
}

fn field<'r>(record: &'r StringRecord, idx: usize, name: &str) -> Result<&'r str> {
	record
		.get(idx)
		.map(str::trim)
		.wrap_err_with(|| format!("missing column {} ({name})", idx + 1))
}

impl Match {
	pub fn from_record(record: &StringRecord) -> Result<Self> {
		let number = |idx, name| -> Result<f64> {
			let value = field(record, idx, name)?;
			value.parse().wrap_err_with(|| format!("invalid {name} '{value}'"))
		};
		let score = |idx, name| -> Result<usize> {
			let value = field(record, idx, name)?;
			value.parse().wrap_err_with(|| format!("invalid {name} '{value}'"))
		};
		let bingo = field(record, 11, "bingo")?;
		Ok(Self {
			week: field(record, 0, "week")?.to_owned(),
			tier: field(record, 1, "tier")?.to_owned(),
			p1_name: field(record, 2, "player 1")?.to_owned(),
			p2_name: field(record, 3, "player 2")?.to_owned(),
			date: field(record, 4, "date")?.to_owned(),
			streamer: field(record, 5, "streamer")?.to_owned(),
			start: number(6, "match start")?,
			board_start: number(7, "board start")?,
			vod: field(record, 8, "vod")?.to_owned(),
			p1_score: score(9, "player 1 score")?,
			p2_score: score(10, "player 2 score")?,
			bingo: bingo == "P1" || bingo == "P2",
			winner_name: field(record, 12, "winner")?.to_owned(),
		})
	}

	/// `week__p1__p2` with spaces replaced, used as the directory name.
	pub fn id(&self) -> String {
		format!("{}__{}__{}", self.week, self.p1_name, self.p2_name).replace(' ', "_")
	}

	#[inline]
	pub fn p1_is_winner(&self) -> bool {
		self.winner_name == self.p1_name
	}

	pub fn winner_and_loser(&self) -> (&str, &str) {
		if self.p1_is_winner() {
			(&self.p1_name, &self.p2_name)
		} else {
			(&self.p2_name, &self.p1_name)
		}
	}

	pub fn expected_stats(&self) -> ExpectedStats {
		let (winner_score, loser_score) = if self.p1_is_winner() {
			(self.p1_score, self.p2_score)
		} else {
			(self.p2_score, self.p1_score)
		};
		ExpectedStats {
			winner_score,
			bingo: self.bingo,
			loser_score,
		}
	}
}

/// Reads the match list, skipping the header row.
pub fn load_matches<P: AsRef<Path>>(path: P) -> Result<Vec<Match>> {
	let path = path.as_ref();
	let mut reader = csv::ReaderBuilder::new()
		.has_headers(true)
		.flexible(true)
		.from_path(path)
		.wrap_err_with(|| format!("failed to open match list {}", path.display()))?;
	reader
		.records()
		.enumerate()
		.map(|(idx, record)| {
			let record = record.wrap_err_with(|| format!("failed to read row {}", idx + 2))?;
			Match::from_record(&record)
				.wrap_err_with(|| format!("invalid match on row {}", idx + 2))
		})
		.collect()
}

/// A match's working directory under the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDir {
	path: PathBuf,
}

impl MatchDir {
	pub fn new<P: AsRef<Path>>(root: P, m: &Match) -> Self {
		Self {
			path: root.as_ref().join(m.id()),
		}
	}

	pub fn create(&self) -> Result<()> {
		fs::create_dir_all(&self.path)
			.wrap_err_with(|| format!("failed to create {}", self.path.display()))
	}

	#[inline]
	pub fn path(&self) -> &Path {
		&self.path
	}

	#[inline]
	pub fn file(&self, name: &str) -> PathBuf {
		self.path.join(name)
	}

	/// The downloaded recording: `video.<ext>`, ignoring partial downloads.
	pub fn video(&self) -> Result<PathBuf> {
		let entries = fs::read_dir(&self.path)
			.wrap_err_with(|| format!("failed to list {}", self.path.display()))?;
		for entry in entries {
			let entry = entry.wrap_err("failed to read directory entry")?;
			let name = entry.file_name();
			let Some(name) = name.to_str() else {
				continue;
			};
			if name.starts_with("video")
				&& !name.ends_with(".part")
				&& !name.ends_with(".ytdl")
				&& name.matches('.').count() == 1
			{
				return Ok(entry.path());
			}
		}
		Err(eyre!("no video found in {}", self.path.display()))
	}

	/// Colors the classifier may choose from, when the match was restricted
	/// by hand.
	pub fn color_restrictions(&self) -> Result<Option<HashSet<Color>>> {
		let path = self.file(COLOR_RESTRICTIONS_FILE);
		if !path.is_file() {
			return Ok(None);
		}
		let json = fs::read_to_string(&path)
			.wrap_err_with(|| format!("failed to read {}", path.display()))?;
		let colors: Vec<Color> = serde_json::from_str(&json)
			.wrap_err_with(|| format!("failed to parse {}", path.display()))?;
		Ok(Some(colors.into_iter().collect()))
	}
}
