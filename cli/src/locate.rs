use crate::cmd::LocateArgs;
use bingo_scribe_core::{
	board::BOARD_SIZE,
	detect::{locate_table, CommandDetector},
	opencv::imgcodecs::{imread, IMREAD_COLOR},
	video::draw_table,
};
use color_eyre::eyre::{ContextCompat, Result, WrapErr};
use itertools::Itertools;

pub fn locate(args: LocateArgs) -> Result<()> {
	let settings = args.settings.settings();
	let detector = CommandDetector {
		cell_command: args.detector.cell_command,
		ocr_command: args.detector.ocr_command,
		work_dir: args.work_dir,
	};
	let table = locate_table(&detector, &args.input, &settings)?
		.wrap_err_with(|| format!("no board found in {}", args.input.display()))?;

	for row in &table.squares().iter().chunks(BOARD_SIZE) {
		println!("{}", row.map(|square| format!("[{}]", square.text)).join(" "));
	}

	if let Some(output) = &args.output {
		table.save(output)?;
		println!("saved table to {}", output.display());
	}
	if let Some(annotate) = &args.annotate {
		let frame = imread(
			args.input
				.to_str()
				.wrap_err("invalid input path cannot be represented as a str")?,
			IMREAD_COLOR,
		)
		.wrap_err_with(|| format!("failed to read {}", args.input.display()))?;
		draw_table(&frame, &table, annotate)?;
		println!("saved annotated image to {}", annotate.display());
	}
	Ok(())
}
