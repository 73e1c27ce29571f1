use crate::app::{App, Focus, NoticeKind};
use crate::error::Result;
use crate::task::Status;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Clear, Paragraph, Row, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Table, Wrap,
    },
    Frame, Terminal,
};

/// Draw, block on the next key, dispatch. Returns on quit or on a storage fault.
pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|f| draw(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                app.handle_key(key)?;
            }
        }
    }
    Ok(())
}

pub fn draw(f: &mut Frame, app: &mut App) {
    let outer = Block::default()
        .title(format!(" Task Manager ({}) ", app.store().db_path().display()))
        .borders(Borders::ALL);
    let inner = outer.inner(f.area());
    f.render_widget(outer, f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    render_input(f, chunks[0], "Title", &app.title_input, app.focus == Focus::Title);
    render_input(
        f,
        chunks[1],
        "Description",
        &app.description_input,
        app.focus == Focus::Description,
    );
    f.render_widget(
        button_bar(&[
            ("Add Task", "Enter"),
            ("Export Tasks", "Ctrl+E"),
            ("Import Tasks", "Ctrl+O"),
        ]),
        chunks[2],
    );
    render_table(f, chunks[3], app);
    f.render_widget(
        button_bar(&[("Mark Completed", "c"), ("Unmark", "u"), ("Delete Task", "d")]),
        chunks[4],
    );
    f.render_widget(
        Paragraph::new("Tab: switch field   Up/Down: select   q/Esc: quit")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        chunks[5],
    );

    if let Some(notice) = &app.notice {
        let (title, color) = match notice.kind {
            NoticeKind::Info => ("Success", Color::Green),
            NoticeKind::Error => ("Error", Color::Red),
        };
        let area = centered_rect(60, 7, f.area());
        let popup = Paragraph::new(vec![
            Line::from(notice.message.as_str()),
            Line::default(),
            Line::from(Span::styled("[Enter] OK", Style::default().fg(Color::DarkGray))),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(format!(" {} ({}) ", title, notice.raised_at.format("%H:%M:%S")))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
        f.render_widget(Clear, area);
        f.render_widget(popup, area);
    }
}

fn render_input(f: &mut Frame, area: Rect, label: &str, value: &str, focused: bool) {
    let input = Paragraph::new(value).block(
        Block::default()
            .title(label)
            .borders(Borders::ALL)
            .border_style(focus_style(focused)),
    );
    f.render_widget(input, area);

    if focused {
        let width = u16::try_from(Span::raw(value).width()).unwrap_or(u16::MAX);
        let x = area
            .x
            .saturating_add(1)
            .saturating_add(width)
            .min(area.right().saturating_sub(2));
        f.set_cursor_position((x, area.y + 1));
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(["ID", "Title", "Description", "Status"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = app.tasks.iter().map(|t| {
        let status_style = match t.status {
            Status::Pending => Style::default().fg(Color::Yellow),
            Status::Completed => Style::default().fg(Color::Green),
        };
        Row::new(vec![
            Cell::from(t.id.to_string()),
            Cell::from(t.title.as_str()),
            Cell::from(t.description.as_deref().unwrap_or_default()),
            Cell::from(t.status.as_str()).style(status_style),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Ratio(1, 10),
            Constraint::Ratio(3, 10),
            Constraint::Ratio(4, 10),
            Constraint::Ratio(2, 10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title("Tasks")
            .borders(Borders::ALL)
            .border_style(focus_style(app.focus == Focus::List)),
    )
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .highlight_symbol("> ");
    f.render_stateful_widget(table, area, &mut app.table_state);

    let mut scroll = ScrollbarState::new(app.tasks.len())
        .position(app.table_state.selected().unwrap_or(0));
    f.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight),
        area.inner(Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut scroll,
    );
}

fn button_bar(buttons: &[(&str, &str)]) -> Paragraph<'static> {
    let mut spans = Vec::new();
    for (i, (label, key)) in buttons.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("   "));
        }
        spans.push(Span::styled(
            format!(" {label} "),
            Style::default().add_modifier(Modifier::REVERSED),
        ));
        spans.push(Span::styled(
            format!(" {key}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Paragraph::new(Line::from(spans)).alignment(Alignment::Center)
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Action;
    use crate::config::Config;
    use crate::store::TaskStore;
    use ratatui::backend::TestBackend;
    use tempfile::TempDir;

    fn create_test_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let config = Config {
            db_path: dir.path().join("tasks.db"),
            export_path: dir.path().join("tasks.json"),
            log_path: dir.path().join("tasklist.log"),
        };
        let store = TaskStore::new(config.db_path.clone()).unwrap();
        (dir, App::new(store, config).unwrap())
    }

    fn render(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_renders_form_and_buttons() {
        let (_dir, mut app) = create_test_app();
        let screen = render(&mut app);
        for label in [
            "Task Manager",
            "Title",
            "Description",
            "Add Task",
            "Export Tasks",
            "Import Tasks",
            "Mark Completed",
            "Unmark",
            "Delete Task",
            "Status",
        ] {
            assert!(screen.contains(label), "missing {label}");
        }
    }

    #[test]
    fn test_renders_task_rows() {
        let (_dir, mut app) = create_test_app();
        app.store().create("Buy milk", Some("semi-skimmed")).unwrap();
        let done = app.store().create("Walk dog", None).unwrap();
        app.store().set_status(done.id, Status::Completed).unwrap();
        // export goes through on_change, which reloads the list
        app.dispatch(Action::Export).unwrap();
        app.notice = None;

        let screen = render(&mut app);
        assert!(screen.contains("Buy milk"));
        assert!(screen.contains("semi-skimmed"));
        assert!(screen.contains("pending"));
        assert!(screen.contains("Walk dog"));
        assert!(screen.contains("completed"));
    }

    #[test]
    fn test_renders_notice_popup() {
        let (_dir, mut app) = create_test_app();
        app.dispatch(Action::Add).unwrap();
        let screen = render(&mut app);
        assert!(screen.contains("Error"));
        assert!(screen.contains("The title cannot be empty."));
    }

    #[test]
    fn test_cursor_follows_display_width() {
        let (_dir, mut app) = create_test_app();
        app.title_input = "日本".to_string();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();
        let cursor = terminal.get_cursor_position().unwrap();
        // outer border, input border, then two double-width glyphs
        assert_eq!((cursor.x, cursor.y), (6, 2));
    }

    #[test]
    fn test_cursor_clamped_for_huge_input() {
        let (_dir, mut app) = create_test_app();
        app.title_input = "a".repeat(70_000);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();
        let cursor = terminal.get_cursor_position().unwrap();
        assert_eq!((cursor.x, cursor.y), (97, 2));
    }
}
