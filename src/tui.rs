//! Interactive front-end: a configuration form with a live preview, then a
//! file list that follows the executor's progress stream.

pub mod app;
pub mod events;
pub mod models;
pub mod processing;
pub mod rendering;
pub mod utils;

pub use events::run_tui;
