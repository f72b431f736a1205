//! Terminal dashboard and plain-text output.
//!
//! - `loop_runner` - event loop and terminal setup
//! - `input` - key handling for browse and query editing
//! - `events` - background refreshes and their results
//! - `render` - header and overall layout
//! - `cards` - news cards and per-source status lines
//! - `status` - status bar
//! - `plain` - `--plain` and `--json` output

mod cards;
mod events;
mod input;
mod loop_runner;
mod plain;
mod render;
mod status;

pub use cards::{card_summary, outcome_line, NO_RESULTS};
pub use loop_runner::{run, Action};
pub use plain::{write_json, write_plain};
