use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::rename_engine::Dispatch;
use super::app::App;
use super::models::ConfigInputMode;
use super::rendering::ui;

/// Runs the interactive renamer until the user quits. Renames are dispatched
/// onto the current runtime so the UI keeps drawing during a batch.
pub async fn run_tui(directory: Option<String>, selected_files: Vec<PathBuf>) -> Result<()> {
    let dispatch = Dispatch::Runtime(Handle::current());
    let mut app = if !selected_files.is_empty() {
        App::with_selected_files(&selected_files, dispatch)
    } else if let Some(dir) = directory {
        App::with_directory(dir, dispatch)
    } else {
        App::new(dispatch)
    };
    if app.preselected {
        app.refresh_preview();
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!("tui started");
    let res = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    app.shutdown().await;
    info!(
        succeeded = app.report.succeeded,
        failed = app.report.failed,
        skipped = app.report.skipped,
        "tui closed"
    );
    res
}

enum Flow {
    Continue,
    Quit,
}

async fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.clear_status_message_if_expired();
        app.poll_progress();

        if app.needs_refresh && app.show_config {
            app.needs_refresh = false;
            app.refresh_preview();
        }

        terminal.draw(|f| ui(f, app))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let flow = if app.show_help {
            handle_help_key(app, key)
        } else if app.show_config {
            handle_config_key(app, key)
        } else {
            handle_main_key(app, key).await
        };
        if let Flow::Quit = flow {
            return Ok(());
        }
    }
}

fn handle_help_key(app: &mut App, key: KeyEvent) -> Flow {
    if matches!(key.code, KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('q') | KeyCode::F(1)) {
        app.toggle_help();
    }
    Flow::Continue
}

/// Printable keys are field input here, so only Esc quits.
fn handle_config_key(app: &mut App, key: KeyEvent) -> Flow {
    let text_field = matches!(
        app.config_input_mode,
        ConfigInputMode::Directory
            | ConfigInputMode::Prefix
            | ConfigInputMode::StartNumber
            | ConfigInputMode::DigitCount
    );

    match key.code {
        KeyCode::Esc => return Flow::Quit,
        KeyCode::F(1) => app.toggle_help(),
        KeyCode::Enter => {
            if app.config_input_mode == ConfigInputMode::Confirm {
                app.confirm_config();
            } else {
                app.advance_config_step();
            }
        }
        KeyCode::Backspace if text_field => app.handle_config_input('\x08'),
        KeyCode::Char(c) => app.handle_config_input(c),
        code @ (KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right | KeyCode::Backspace) => {
            app.handle_config_navigation(code)
        }
        _ => {}
    }
    Flow::Continue
}

async fn handle_main_key(app: &mut App, key: KeyEvent) -> Flow {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
        KeyCode::Char('h') | KeyCode::F(1) => app.toggle_help(),
        KeyCode::Char('p') => app.toggle_preview(),
        KeyCode::Down | KeyCode::Char('j') => app.next(),
        KeyCode::Up | KeyCode::Char('k') => app.previous(),
        KeyCode::Enter | KeyCode::Char(' ') => app.start_processing(),
        KeyCode::Char('c') => app.cancel_processing(),
        KeyCode::Char('v') => app.verify_on_disk().await,
        KeyCode::Char('R') => app.rescan(),
        KeyCode::Char('e') => app.edit_config(),
        other => debug!(key = ?other, "unbound key"),
    }
    Flow::Continue
}
