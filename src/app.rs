use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::TableState;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, TaskError};
use crate::store::TaskStore;
use crate::task::{Status, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Title,
    Description,
    List,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Title => Focus::Description,
            Focus::Description => Focus::List,
            Focus::List => Focus::Title,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Title => Focus::List,
            Focus::Description => Focus::Title,
            Focus::List => Focus::Description,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Export,
    Import,
    MarkCompleted,
    Unmark,
    Delete,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Modal message shown after an action.
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub raised_at: DateTime<Local>,
}

impl Notice {
    fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raised_at: Local::now(),
        }
    }
}

pub struct App {
    store: TaskStore,
    config: Config,
    pub tasks: Vec<Task>,
    pub table_state: TableState,
    pub focus: Focus,
    pub title_input: String,
    pub description_input: String,
    pub notice: Option<Notice>,
    pub should_quit: bool,
}

impl App {
    pub fn new(store: TaskStore, config: Config) -> Result<Self> {
        let mut app = Self {
            store,
            config,
            tasks: Vec::new(),
            table_state: TableState::default(),
            focus: Focus::Title,
            title_input: String::new(),
            description_input: String::new(),
            notice: None,
            should_quit: false,
        };
        app.refresh()?;
        Ok(app)
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn selected_id(&self) -> Option<i64> {
        self.table_state
            .selected()
            .and_then(|i| self.tasks.get(i))
            .map(|t| t.id)
    }

    /// Runs `action` against the store. User mistakes become an error notice;
    /// anything else is returned to the caller.
    pub fn dispatch(&mut self, action: Action) -> Result<()> {
        info!(?action, "dispatching");
        let outcome = match action {
            Action::Add => self.add_task(),
            Action::Export => self.export(),
            Action::Import => self.import(),
            Action::MarkCompleted => self.set_selected_status(Status::Completed),
            Action::Unmark => self.set_selected_status(Status::Pending),
            Action::Delete => self.delete_selected(),
            Action::Quit => {
                self.should_quit = true;
                return Ok(());
            }
        };
        match outcome {
            Ok(message) => self.on_change(message),
            Err(err) if err.is_user_facing() => {
                warn!(%err, ?action, "action rejected");
                self.notice = Some(Notice::new(NoticeKind::Error, err.to_string()));
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Single post-action hook: reload from storage and confirm.
    fn on_change(&mut self, message: String) -> Result<()> {
        self.refresh()?;
        self.notice = Some(Notice::new(NoticeKind::Info, message));
        Ok(())
    }

    fn refresh(&mut self) -> Result<()> {
        self.tasks = self.store.list()?;
        match self.table_state.selected() {
            Some(_) if self.tasks.is_empty() => self.table_state.select(None),
            Some(i) if i >= self.tasks.len() => {
                self.table_state.select(Some(self.tasks.len() - 1))
            }
            _ => {}
        }
        Ok(())
    }

    fn add_task(&mut self) -> Result<String> {
        self.store
            .create(&self.title_input, Some(self.description_input.as_str()))?;
        self.title_input.clear();
        self.description_input.clear();
        self.focus = Focus::Title;
        Ok("Task added.".to_string())
    }

    fn export(&mut self) -> Result<String> {
        let path = &self.config.export_path;
        let count = self.store.export_all(path)?;
        Ok(format!("Exported {count} tasks to {}", path.display()))
    }

    fn import(&mut self) -> Result<String> {
        let path = &self.config.export_path;
        let count = self.store.import_all(path)?;
        Ok(format!("Imported {count} tasks from {}", path.display()))
    }

    fn set_selected_status(&mut self, status: Status) -> Result<String> {
        let id = self.selected_id().ok_or(TaskError::NoSelection)?;
        self.store.set_status(id, status)?;
        Ok(match status {
            Status::Completed => format!("Task {id} marked as completed."),
            Status::Pending => format!("Task {id} unmarked."),
        })
    }

    fn delete_selected(&mut self) -> Result<String> {
        let id = self.selected_id().ok_or(TaskError::NoSelection)?;
        self.store.delete(id)?;
        Ok(format!("Task {id} deleted."))
    }

    fn select_next(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        let next = match self.table_state.selected() {
            Some(i) => (i + 1).min(self.tasks.len() - 1),
            None => 0,
        };
        self.table_state.select(Some(next));
    }

    fn select_prev(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        let prev = self.table_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.table_state.select(Some(prev));
    }

    fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        if focus == Focus::List
            && self.table_state.selected().is_none()
            && !self.tasks.is_empty()
        {
            self.table_state.select(Some(0));
        }
    }

    fn focused_input(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::Title => Some(&mut self.title_input),
            Focus::Description => Some(&mut self.description_input),
            Focus::List => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return self.dispatch(Action::Quit);
        }

        if self.notice.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.notice = None;
            }
            return Ok(());
        }

        if ctrl {
            return match key.code {
                KeyCode::Char('e') => self.dispatch(Action::Export),
                KeyCode::Char('o') => self.dispatch(Action::Import),
                _ => Ok(()),
            };
        }

        match key.code {
            KeyCode::Esc => return self.dispatch(Action::Quit),
            KeyCode::Tab => {
                self.set_focus(self.focus.next());
                return Ok(());
            }
            KeyCode::BackTab => {
                self.set_focus(self.focus.prev());
                return Ok(());
            }
            _ => {}
        }

        if self.focus != Focus::List {
            if key.code == KeyCode::Enter {
                return self.dispatch(Action::Add);
            }
            if let Some(input) = self.focused_input() {
                match key.code {
                    KeyCode::Char(c) => input.push(c),
                    KeyCode::Backspace => {
                        input.pop();
                    }
                    _ => {}
                }
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Char('q') => self.dispatch(Action::Quit),
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_prev();
                Ok(())
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next();
                Ok(())
            }
            KeyCode::Char('c') => self.dispatch(Action::MarkCompleted),
            KeyCode::Char('u') => self.dispatch(Action::Unmark),
            KeyCode::Char('d') | KeyCode::Delete => self.dispatch(Action::Delete),
            _ => Ok(()),
        }
    }
}
