use crate::cmd::GenerateArgs;
use bingo_scribe_core::{
	analyze::analyze_match,
	detect::CommandDetector,
	matches::{load_matches, MatchDir, CHANGELOG_FILE},
	swatches::Swatches,
};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{HumanDuration, ProgressBar, ProgressState, ProgressStyle};
use std::{fmt::Write, time::Duration};
use tracing::{error, info};

fn video_progress_bar(id: &str) -> Result<ProgressBar> {
	let style = ProgressStyle::with_template(
		"[{elapsed}] {msg} {wide_bar:.green/red} {pos}/{len} of video (ETA: {eta})",
	)
	.wrap_err("invalid progress bar template")?
	.with_key("pos", |state: &ProgressState, w: &mut dyn Write| {
		let _ = write!(w, "{}", HumanDuration(Duration::from_secs(state.pos())));
	})
	.with_key("len", |state: &ProgressState, w: &mut dyn Write| {
		let len = state.len().unwrap_or_default();
		let _ = write!(w, "{}", HumanDuration(Duration::from_secs(len)));
	});
	Ok(ProgressBar::new(0).with_style(style).with_message(id.to_owned()))
}

pub fn generate(args: GenerateArgs) -> Result<()> {
	let settings = args.settings.settings();
	let matches = load_matches(&args.matches)?;
	let swatches = Swatches::load(&args.swatches).wrap_err("failed to load color swatches")?;

	let (mut done, mut skipped, mut wrong, mut failed) = (0, 0, 0, 0);
	for m in &matches {
		let id = m.id();
		if !args.only.is_empty() && !args.only.contains(&id) {
			continue;
		}
		let dir = MatchDir::new(&args.output, m);
		if !args.force && dir.file(CHANGELOG_FILE).is_file() {
			skipped += 1;
			continue;
		}
		info!("analyzing {id}");
		let detector = CommandDetector {
			cell_command: args.detector.cell_command.clone(),
			ocr_command: args.detector.ocr_command.clone(),
			work_dir: dir.path().to_owned(),
		};
		let progress_bar = video_progress_bar(&id)?;
		let result = analyze_match(m, &dir, &swatches, &detector, &settings, |time, duration| {
			progress_bar.set_length(duration.round() as u64);
			progress_bar.set_position(time.round() as u64);
		});
		progress_bar.finish_and_clear();
		match result {
			Ok(report) => {
				done += 1;
				if !report.score_matches {
					wrong += 1;
				}
			}
			Err(err) => {
				failed += 1;
				error!("{id} failed: {err:?}");
			}
		}
	}

	info!(done, skipped, wrong, failed, "finished generating changelogs");
	Ok(())
}
