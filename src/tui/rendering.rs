use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation, Wrap},
};

use super::app::App;
use super::models::{ConfigInputMode, ItemStatus};
use super::utils::centered_rect;

const TITLE: &str = "Renumber";

pub fn ui(f: &mut Frame, app: &App) {
    let size = f.area();

    if app.show_config {
        render_config_screen(f, size, app);
    } else {
        render_main_screen(f, size, app);
    }

    if app.show_help {
        render_help_popup(f);
    }
}

fn field<'a>(title: &'a str, value: String, active: bool) -> Paragraph<'a> {
    let (text_style, border_style) = if active {
        (
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::Yellow),
        )
    } else {
        (Style::default().fg(Color::White), Style::default().fg(Color::Gray))
    };

    Paragraph::new(value).style(text_style).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border_style),
    )
}

pub fn render_config_screen(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10), Constraint::Length(5)])
        .split(area);

    let header = Paragraph::new(format!("{TITLE} - Configuration"))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
    f.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    let form = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Directory
            Constraint::Length(3), // Prefix
            Constraint::Length(3), // Start number
            Constraint::Length(3), // Digits
            Constraint::Length(3), // Extension
            Constraint::Length(3), // Sort
            Constraint::Length(3), // Confirm
            Constraint::Min(0),
        ])
        .split(body[0]);

    let mode = app.config_input_mode;
    let directory = if app.preselected {
        format!("{} ({} selected files)", app.directory_input, app.files.len())
    } else {
        app.directory_input.clone()
    };
    f.render_widget(field("Directory", directory, mode == ConfigInputMode::Directory), form[0]);
    f.render_widget(field("Prefix", app.prefix_input.clone(), mode == ConfigInputMode::Prefix), form[1]);
    f.render_widget(
        field("Start number", app.start_input.clone(), mode == ConfigInputMode::StartNumber),
        form[2],
    );
    f.render_widget(
        field("Digit count", app.digits_input.clone(), mode == ConfigInputMode::DigitCount),
        form[3],
    );
    let extension = if app.preserve_extension { "Keep (y/n)" } else { "Drop (y/n)" };
    f.render_widget(
        field("Extension", extension.to_string(), mode == ConfigInputMode::Extension),
        form[4],
    );
    f.render_widget(
        field(
            "Sort order",
            format!("< {} >", app.sort_strategy.label()),
            mode == ConfigInputMode::Sort,
        ),
        form[5],
    );

    if mode == ConfigInputMode::Confirm {
        let (text, color) = if app.summary.can_proceed() {
            ("Press ENTER to review the renames".to_string(), Color::Green)
        } else {
            (
                format!("{} conflict(s) must be fixed before running", app.summary.conflicts),
                Color::Red,
            )
        };
        let confirm = Paragraph::new(text)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Ready")
                    .border_style(Style::default().fg(color)),
            );
        f.render_widget(confirm, form[6]);
    }

    render_sample(f, body[1], app);

    let instructions = match mode {
        ConfigInputMode::Directory => "Directory containing the files to renumber",
        ConfigInputMode::Prefix => "Text placed before every number",
        ConfigInputMode::StartNumber => "First number of the sequence",
        ConfigInputMode::DigitCount => "Minimum width; numbers are zero-padded",
        ConfigInputMode::Extension => "Keep the original extension? y/n",
        ConfigInputMode::Sort => "←/→ to choose how files are ordered before numbering",
        ConfigInputMode::Confirm => "Review the sample and press Enter",
    };

    let mut help_lines = vec![Line::from(instructions)];
    if let Some(message) = &app.status_message {
        help_lines.push(Line::from(Span::styled(message.clone(), Style::default().fg(Color::Cyan))));
    } else {
        help_lines.push(Line::from(""));
    }
    help_lines.push(Line::from("Navigation: ↑/← Back | ↓/Enter: Next | Esc: Quit"));

    let help_text = Paragraph::new(help_lines)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Instructions"));
    f.render_widget(help_text, chunks[2]);
}

/// The first few previewed names, refreshed as the form changes.
fn render_sample(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = Vec::new();

    if let Some(error) = &app.config_error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
        lines.push(Line::from(""));
    }

    if app.items.is_empty() {
        lines.push(Line::from(Span::styled(
            "No files loaded",
            Style::default().fg(Color::Gray),
        )));
    }

    let visible = area.height.saturating_sub(4) as usize;
    for item in app.items.iter().take(visible) {
        let color = status_color(item.status);
        lines.push(Line::from(vec![
            Span::styled(item.original.name.clone(), Style::default().fg(Color::Gray)),
            Span::raw(" → "),
            Span::styled(item.new_name.clone(), Style::default().fg(color)),
        ]));
    }
    if app.items.len() > visible {
        lines.push(Line::from(format!("… and {} more", app.items.len() - visible)));
    }

    let title = format!(
        "Preview: {} to rename, {} conflicts, {} unchanged",
        app.summary.valid_renames, app.summary.conflicts, app.summary.unchanged
    );
    let sample = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(sample, area);
}

fn status_color(status: ItemStatus) -> Color {
    match status {
        ItemStatus::Pending => Color::Yellow,
        ItemStatus::Unchanged | ItemStatus::Skipped => Color::Gray,
        ItemStatus::Conflict | ItemStatus::Failed => Color::Red,
        ItemStatus::Processing => Color::Blue,
        ItemStatus::Success => Color::Green,
    }
}

fn status_tag(status: ItemStatus) -> &'static str {
    match status {
        ItemStatus::Pending => "[PENDING]",
        ItemStatus::Unchanged => "[SAME]",
        ItemStatus::Conflict => "[CONFLICT]",
        ItemStatus::Processing => "[PROCESSING]",
        ItemStatus::Success => "[DONE]",
        ItemStatus::Failed => "[FAILED]",
        ItemStatus::Skipped => "[SKIPPED]",
    }
}

pub fn render_main_screen(f: &mut Frame, area: Rect, app: &App) {
    let chunks = if app.show_preview {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area)
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(area)
    };

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10), Constraint::Length(3)])
        .split(chunks[0]);

    render_header(f, left_chunks[0], app);
    render_file_list(f, left_chunks[1], app);
    render_status_bar(f, left_chunks[2], app);

    if app.show_preview && chunks.len() > 1 {
        render_preview_panel(f, chunks[1], app);
    }
}

pub fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let title = if app.finished {
        format!("{TITLE} - Completed")
    } else if app.is_running() {
        format!("{TITLE} - Processing...")
    } else {
        format!("{TITLE} - {}", app.directory_input)
    };

    let header = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
    f.render_widget(header, area);
}

pub fn render_file_list(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let color = status_color(item.status);
            let name_style = if app.current_processing == Some(i) {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", status_tag(item.status)), Style::default().fg(color)),
                Span::styled(item.original.name.clone(), name_style),
                Span::raw(" → "),
                Span::styled(item.new_name.clone(), Style::default().fg(color)),
            ]))
        })
        .collect();

    let files_list = List::new(items)
        .block(
            Block::default()
                .title(format!("Files ({})", app.items.len()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    f.render_stateful_widget(files_list, area, &mut app.list_state.clone());

    if app.items.len() > area.height.saturating_sub(2) as usize {
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        f.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut app.scroll_state.clone(),
        );
    }
}

pub fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let progress_label = if let Some(status_msg) = &app.status_message {
        status_msg.clone()
    } else if app.finished {
        format!(
            "Complete! {} renamed, {} failed, {} skipped",
            app.stats.successful, app.stats.failed, app.stats.skipped
        )
    } else if app.is_running() {
        let elapsed = app.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0);
        format!("Processing... {}/{} ({}s)", app.stats.processed, app.stats.total, elapsed)
    } else if app.summary.can_proceed() {
        format!("Ready to rename {} files", app.summary.valid_renames)
    } else {
        format!(
            "{} conflict(s), {} to rename",
            app.summary.conflicts, app.summary.valid_renames
        )
    };

    let progress_style = if app.status_message.is_some() {
        Style::default().fg(Color::Cyan)
    } else if app.stats.failed > 0 || app.summary.conflicts > 0 {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };

    let progress = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(progress_style)
        .ratio(app.processing_progress.clamp(0.0, 1.0))
        .label(progress_label);
    f.render_widget(progress, chunks[0]);

    let controls_text = if app.is_running() {
        "c to cancel, h for help"
    } else if app.finished {
        "R to rescan, e to edit, q to quit"
    } else {
        "ENTER to start, v to verify, h for help"
    };

    let controls = Paragraph::new(controls_text)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Controls"));
    f.render_widget(controls, chunks[1]);
}

pub fn render_preview_panel(f: &mut Frame, area: Rect, app: &App) {
    let Some(item) = app.list_state.selected().and_then(|i| app.items.get(i)) else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let file = &item.original;
    let mut before = vec![
        Line::from("Original:"),
        Line::from(Span::styled(file.name.clone(), Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(format!("Size: {} bytes", file.size)),
        Line::from(format!("Modified: {}", file.modified.format("%Y-%m-%d %H:%M"))),
    ];
    if let Some(mime) = &file.mime_type {
        before.push(Line::from(format!("Type: {mime}")));
    }

    let original = Paragraph::new(Text::from(before))
        .block(
            Block::default()
                .title("Before")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(original, chunks[0]);

    let color = status_color(item.status);
    let mut after = vec![
        Line::from("New:"),
        Line::from(Span::styled(item.new_name.clone(), Style::default().fg(color))),
    ];
    if let Some(message) = &item.message {
        let label = match item.status {
            ItemStatus::Conflict => "Conflict",
            ItemStatus::Failed => "Error",
            _ => "Note",
        };
        after.push(Line::from(""));
        after.push(Line::from(Span::styled(
            format!("{label}: {message}"),
            Style::default().fg(color),
        )));
    }

    let new = Paragraph::new(Text::from(after))
        .block(
            Block::default()
                .title("After")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(new, chunks[1]);
}

pub fn render_help_popup(f: &mut Frame) {
    let popup_area = centered_rect(60, 60, f.area());

    let help_text = vec![
        Line::from(Span::styled(
            format!("{TITLE} - Help"),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  Up/k    - Move up"),
        Line::from("  Down/j  - Move down"),
        Line::from(""),
        Line::from("Actions:"),
        Line::from("  Enter   - Start renaming"),
        Line::from("  v       - Check new names against the directory"),
        Line::from("  c       - Cancel a running batch"),
        Line::from("  R       - Rescan after a run"),
        Line::from("  e       - Edit the configuration"),
        Line::from("  p       - Toggle before/after panel"),
        Line::from("  h/F1    - Toggle this help"),
        Line::from("  q/Esc   - Quit"),
        Line::from(""),
        Line::from("Files are sorted, then named <prefix><number>[.ext]."),
        Line::from("Conflicting names block the whole batch."),
        Line::from(""),
        Line::from(Span::styled("Press Esc or h to close", Style::default().fg(Color::Gray))),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(Clear, popup_area);
    f.render_widget(paragraph, popup_area);
}
