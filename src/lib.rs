//! METI press releases and Google News search results, merged into one
//! newest-first list and shown in a terminal dashboard.

pub mod app;
pub mod config;
pub mod feed;
pub mod news;
pub mod ui;
pub mod util;
