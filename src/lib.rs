pub mod error;
pub mod rename_engine;
pub mod scan;
pub mod tui;
