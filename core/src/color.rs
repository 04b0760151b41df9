use color_eyre::eyre::{eyre, Report};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A square's owner color. `Black` is an unclaimed square.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
	#[default]
	Black,
	Orange,
	Red,
	Blue,
	Green,
	Purple,
	Navy,
	Teal,
	Brown,
	Pink,
	Yellow,
}

impl Color {
	pub const ALL: [Color; 11] = [
		Color::Black,
		Color::Orange,
		Color::Red,
		Color::Blue,
		Color::Green,
		Color::Purple,
		Color::Navy,
		Color::Teal,
		Color::Brown,
		Color::Pink,
		Color::Yellow,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Color::Black => "black",
			Color::Orange => "orange",
			Color::Red => "red",
			Color::Blue => "blue",
			Color::Green => "green",
			Color::Purple => "purple",
			Color::Navy => "navy",
			Color::Teal => "teal",
			Color::Brown => "brown",
			Color::Pink => "pink",
			Color::Yellow => "yellow",
		}
	}

	#[inline]
	pub fn is_claimed(self) -> bool {
		self != Color::Black
	}
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.pad(self.as_str())
	}
}

impl FromStr for Color {
	type Err = Report;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Color::ALL
			.into_iter()
			.find(|color| color.as_str() == s)
			.ok_or_else(|| eyre!("unknown color '{s}'"))
	}
}
