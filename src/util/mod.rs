//! Display helpers shared by the dashboard and plain output.
//!
//! - **Text**: tag stripping, character/column truncation, control-char removal
//! - **Links**: scheme check before opening a record's link in the browser

mod text;
mod url_validator;

pub use text::{strip_control_chars, strip_tags, truncate_chars, truncate_to_width};
pub use url_validator::{validate_link, LinkError};
