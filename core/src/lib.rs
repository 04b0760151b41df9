pub mod analyze;
pub mod board;
pub mod changelog;
pub mod classify;
pub mod color;
pub mod detect;
pub mod goals;
pub mod link;
pub mod matches;
pub mod probe;
pub mod review;
pub mod settings;
pub mod states;
pub mod stats;
pub mod swatches;
pub mod table;
pub mod video;

pub use opencv;
