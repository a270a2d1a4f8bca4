use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use ratatui::widgets::{ListState, ScrollbarState};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::rename_engine::{
    BatchReport, ConfigBuilder, Dispatch, FileMutationPort, FileRef, LocalFsPort, PreviewSummary,
    RenameConfig, RenameExecutor, RenameProgress, SortStrategy, build_preview, summarize,
};
use crate::scan;
use super::models::{ConfigInputMode, FileItem, ProcessingStats};

/// A batch running on a background task, reporting through a channel.
#[derive(Debug)]
pub struct RunningBatch {
    pub task: JoinHandle<()>,
    pub progress: UnboundedReceiver<RenameProgress>,
    /// Checked by the forwarding task before it pulls the next event.
    pub cancel: Arc<AtomicBool>,
}

#[derive(Debug)]
pub struct App<P = LocalFsPort> {
    pub files: Vec<FileRef>,
    pub items: Vec<FileItem>,
    pub summary: PreviewSummary,
    pub list_state: ListState,
    pub scroll_state: ScrollbarState,
    pub show_help: bool,
    pub show_preview: bool,
    pub show_config: bool,
    pub config_input_mode: ConfigInputMode,
    pub directory_input: String,
    pub prefix_input: String,
    pub start_input: String,
    pub digits_input: String,
    pub preserve_extension: bool,
    pub sort_strategy: SortStrategy,
    pub config_error: Option<String>,
    pub preselected: bool,
    pub current_processing: Option<usize>,
    pub processing_progress: f64,
    pub start_time: Option<Instant>,
    pub finished: bool,
    pub stats: ProcessingStats,
    pub report: BatchReport,
    pub running: Option<RunningBatch>,
    pub needs_refresh: bool,
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,
    pub executor: RenameExecutor<P>,
}

impl App {
    pub fn new(dispatch: Dispatch) -> Self {
        Self::with_port(Arc::new(LocalFsPort), dispatch)
    }

    pub fn with_directory(directory: String, dispatch: Dispatch) -> Self {
        let mut app = Self::new(dispatch);
        app.directory_input = directory;
        app
    }

    pub fn with_selected_files(selected_files: &[PathBuf], dispatch: Dispatch) -> Self {
        let mut app = Self::new(dispatch);
        app.files = scan::file_refs(selected_files);

        if let Some(first) = app.files.first() {
            app.directory_input = first.location.to_string_lossy().into_owned();
        }

        // Skip directory configuration if we have pre-selected files
        if !app.files.is_empty() {
            app.preselected = true;
            app.config_input_mode = ConfigInputMode::Prefix;
        }

        app
    }
}

impl<P: FileMutationPort + 'static> App<P> {
    pub fn with_port(port: Arc<P>, dispatch: Dispatch) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        Self {
            files: Vec::new(),
            items: Vec::new(),
            summary: PreviewSummary::default(),
            list_state,
            scroll_state: ScrollbarState::default(),
            show_help: false,
            show_preview: true,
            show_config: true,
            config_input_mode: ConfigInputMode::Directory,
            directory_input: String::new(),
            prefix_input: String::new(),
            start_input: "1".to_string(),
            digits_input: "3".to_string(),
            preserve_extension: true,
            sort_strategy: SortStrategy::Natural,
            config_error: None,
            preselected: false,
            current_processing: None,
            processing_progress: 0.0,
            start_time: None,
            finished: false,
            stats: ProcessingStats::default(),
            report: BatchReport::default(),
            running: None,
            needs_refresh: false,
            status_message: None,
            status_message_time: None,
            executor: RenameExecutor::new(port, dispatch),
        }
    }

    /// The config the form currently describes. Parsing failures of the
    /// numeric fields are reported here; rule violations are left to the
    /// preview so they show up per file.
    pub fn current_config(&self) -> Result<RenameConfig> {
        let start_number = self
            .start_input
            .trim()
            .parse::<u64>()
            .context("Start number must be a non-negative integer")?;
        let digit_count = self
            .digits_input
            .trim()
            .parse::<u8>()
            .context("Digit count must be a small positive integer")?;

        let config = ConfigBuilder::new()
            .prefix(self.prefix_input.clone())
            .start_number(start_number)
            .digit_count(digit_count)
            .preserve_extension(self.preserve_extension)
            .sort_strategy(self.sort_strategy)
            .build()?;
        Ok(config)
    }

    pub fn load_directory(&mut self) -> Result<()> {
        let dir = Path::new(self.directory_input.trim());
        self.files = scan::scan_directory(dir)
            .with_context(|| format!("Cannot read directory {}", dir.display()))?;
        Ok(())
    }

    /// Rebuilds the preview rows from the current form. Clears any results
    /// of a previous run.
    pub fn refresh_preview(&mut self) {
        let config = match self.current_config() {
            Ok(config) => config,
            Err(e) => {
                self.config_error = Some(format!("{:#}", e));
                self.items.clear();
                self.summary = PreviewSummary::default();
                return;
            }
        };
        self.config_error = config.validate().err().map(|e| e.to_string());

        let preview = build_preview(&self.files, &config);
        self.summary = summarize(&preview);
        self.items = preview.into_iter().map(FileItem::from).collect();

        self.stats = ProcessingStats {
            total: self.items.len(),
            ..Default::default()
        };
        self.report = BatchReport::default();
        self.finished = false;
        self.processing_progress = 0.0;
        self.scroll_state = ScrollbarState::new(self.items.len());
        if self.list_state.selected().is_none_or(|i| i >= self.items.len()) {
            self.list_state.select(Some(0));
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
        self.scroll_state = self.scroll_state.position(i);
    }

    pub fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
        self.scroll_state = self.scroll_state.position(i);
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn toggle_preview(&mut self) {
        self.show_preview = !self.show_preview;
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_message_time = Some(Instant::now());
    }

    pub fn clear_status_message_if_expired(&mut self) {
        if let (Some(_), Some(time)) = (&self.status_message, self.status_message_time) {
            if time.elapsed() > Duration::from_secs(3) {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    fn edit_field(&mut self, c: char) {
        let field = match self.config_input_mode {
            ConfigInputMode::Directory => &mut self.directory_input,
            ConfigInputMode::Prefix => &mut self.prefix_input,
            ConfigInputMode::StartNumber => &mut self.start_input,
            ConfigInputMode::DigitCount => &mut self.digits_input,
            _ => return,
        };

        let numeric = matches!(
            self.config_input_mode,
            ConfigInputMode::StartNumber | ConfigInputMode::DigitCount
        );
        if c == '\x08' {
            field.pop();
        } else if !numeric || c.is_ascii_digit() {
            field.push(c);
        } else {
            return;
        }

        if self.config_input_mode != ConfigInputMode::Directory {
            self.needs_refresh = true;
        }
    }

    pub fn handle_config_input(&mut self, c: char) {
        match self.config_input_mode {
            ConfigInputMode::Extension => match c {
                'y' | 'Y' => {
                    self.preserve_extension = true;
                    self.needs_refresh = true;
                    self.advance_config_step();
                }
                'n' | 'N' => {
                    self.preserve_extension = false;
                    self.needs_refresh = true;
                    self.advance_config_step();
                }
                _ => {}
            },
            ConfigInputMode::Sort | ConfigInputMode::Confirm => {}
            _ => {
                if c == '\n' || c == '\r' {
                    self.advance_config_step();
                } else {
                    self.edit_field(c);
                }
            }
        }
    }

    pub fn cycle_sort(&mut self, forward: bool) {
        let all = SortStrategy::ALL;
        let current = all.iter().position(|s| *s == self.sort_strategy).unwrap_or(0);
        let next = if forward {
            (current + 1) % all.len()
        } else {
            (current + all.len() - 1) % all.len()
        };
        self.sort_strategy = all[next];
        self.needs_refresh = true;
    }

    pub fn advance_config_step(&mut self) {
        self.config_input_mode = match self.config_input_mode {
            ConfigInputMode::Directory => {
                if let Err(e) = self.load_directory() {
                    self.set_status_message(format!("{:#}", e));
                    return;
                }
                self.needs_refresh = true;
                ConfigInputMode::Prefix
            }
            ConfigInputMode::Prefix => ConfigInputMode::StartNumber,
            ConfigInputMode::StartNumber => ConfigInputMode::DigitCount,
            ConfigInputMode::DigitCount => ConfigInputMode::Extension,
            ConfigInputMode::Extension => ConfigInputMode::Sort,
            ConfigInputMode::Sort => ConfigInputMode::Confirm,
            ConfigInputMode::Confirm => ConfigInputMode::Confirm,
        };
    }

    pub fn previous_config_step(&mut self) {
        self.config_input_mode = match self.config_input_mode {
            ConfigInputMode::Directory => ConfigInputMode::Directory,
            ConfigInputMode::Prefix if self.preselected => ConfigInputMode::Prefix,
            ConfigInputMode::Prefix => ConfigInputMode::Directory,
            ConfigInputMode::StartNumber => ConfigInputMode::Prefix,
            ConfigInputMode::DigitCount => ConfigInputMode::StartNumber,
            ConfigInputMode::Extension => ConfigInputMode::DigitCount,
            ConfigInputMode::Sort => ConfigInputMode::Extension,
            ConfigInputMode::Confirm => ConfigInputMode::Sort,
        };
    }

    pub fn handle_config_navigation(&mut self, key: KeyCode) {
        match key {
            KeyCode::Left if self.config_input_mode == ConfigInputMode::Sort => self.cycle_sort(false),
            KeyCode::Right if self.config_input_mode == ConfigInputMode::Sort => self.cycle_sort(true),
            KeyCode::Left | KeyCode::Up | KeyCode::Backspace => self.previous_config_step(),
            KeyCode::Down => self.advance_config_step(),
            _ => {}
        }
    }

    /// Leaves the form for the file list once the preview is built.
    pub fn confirm_config(&mut self) {
        self.refresh_preview();
        if self.items.is_empty() {
            let message = self
                .config_error
                .clone()
                .unwrap_or_else(|| "No files to rename".to_string());
            self.set_status_message(message);
            return;
        }
        self.show_config = false;
    }

    pub fn edit_config(&mut self) {
        if !self.is_running() {
            if self.finished {
                self.rescan();
            }
            self.show_config = true;
            self.config_input_mode = ConfigInputMode::Prefix;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn app_for(dir: &Path) -> App {
        let mut app = App::with_directory(dir.to_string_lossy().into_owned(), Dispatch::Current);
        app.advance_config_step();
        for c in "trip_".chars() {
            app.handle_config_input(c);
        }
        app
    }

    #[test]
    fn directory_step_loads_files_and_previews() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("img10.jpg"), "x").unwrap();
        fs::write(tmp.path().join("img2.jpg"), "x").unwrap();

        let mut app = app_for(tmp.path());
        assert_eq!(app.config_input_mode, ConfigInputMode::Prefix);
        assert_eq!(app.files.len(), 2);

        app.confirm_config();
        assert!(!app.show_config);
        assert_eq!(app.items[0].original.name, "img2.jpg");
        assert_eq!(app.items[0].new_name, "trip_001.jpg");
        assert!(app.summary.can_proceed());
    }

    #[test]
    fn bad_numbers_block_the_preview() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.jpg"), "x").unwrap();

        let mut app = app_for(tmp.path());
        app.digits_input = "999".to_string();
        app.refresh_preview();
        assert!(app.items.is_empty());
        assert!(app.config_error.is_some());
    }

    #[test]
    fn numeric_fields_reject_letters() {
        let mut app = App::new(Dispatch::Current);
        app.config_input_mode = ConfigInputMode::StartNumber;
        app.start_input.clear();
        app.handle_config_input('4');
        app.handle_config_input('x');
        assert_eq!(app.start_input, "4");
        assert!(app.needs_refresh);
    }

    #[test]
    fn sort_cycles_through_strategies() {
        let mut app = App::new(Dispatch::Current);
        app.cycle_sort(false);
        assert_eq!(app.sort_strategy, SortStrategy::OriginalOrder);
        app.cycle_sort(true);
        assert_eq!(app.sort_strategy, SortStrategy::Natural);
    }
}
