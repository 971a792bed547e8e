//! Interactive task list: the input row moves through the list, and every
//! task operation goes through either a bare local store or the optimistic
//! sync layer.

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Terminal,
};
use std::io::{self, Stdout};

use tally_core::{Row, Task, TaskStore, TaskSync};

use crate::api::TodoistClient;
use crate::sync_bridge::block_on;

/// The two evolutionary modes of the app: in-memory only, or backed by the
/// remote service through the sync layer.
pub enum Session {
    Local(TaskStore),
    Remote(TaskSync<TodoistClient>),
}

impl Session {
    fn store(&self) -> &TaskStore {
        match self {
            Session::Local(store) => store,
            Session::Remote(sync) => sync.store(),
        }
    }

    fn set_input_index(&mut self, index: usize) {
        match self {
            Session::Local(store) => store.set_input_index(index),
            Session::Remote(sync) => sync.set_input_index(index),
        }
    }

    /// Local mode inserts at the input slot (mid-list add); remote mode
    /// waits for the canonical task and appends it.
    fn submit_add(&mut self, text: &str) -> Result<()> {
        match self {
            Session::Local(store) => {
                if !text.trim().is_empty() {
                    store.insert_at_slot(Task::local(text));
                }
                Ok(())
            }
            Session::Remote(sync) => block_on(async { sync.add_task(text).await.map(|_| ()) }),
        }
    }

    fn toggle(&mut self, id: &str) -> Result<()> {
        match self {
            Session::Local(store) => {
                store.toggle(id);
                Ok(())
            }
            Session::Remote(sync) => block_on(sync.toggle_task(id)),
        }
    }

    fn edit(&mut self, id: &str, text: &str) -> Result<()> {
        match self {
            Session::Local(store) => {
                store.set_text(id, text);
                Ok(())
            }
            Session::Remote(sync) => block_on(sync.edit_task(id, text)),
        }
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        match self {
            Session::Local(store) => {
                store.remove(id);
                Ok(())
            }
            Session::Remote(sync) => block_on(sync.delete_task(id)),
        }
    }

    fn refresh(&mut self) -> Result<()> {
        match self {
            Session::Local(_) => Ok(()),
            Session::Remote(sync) => block_on(sync.load_tasks()),
        }
    }

    fn error(&self) -> Option<&str> {
        match self {
            Session::Local(_) => None,
            Session::Remote(sync) => sync.error(),
        }
    }

    fn loading(&self) -> bool {
        match self {
            Session::Local(_) => false,
            Session::Remote(sync) => sync.loading(),
        }
    }

    fn mode_label(&self) -> &'static str {
        match self {
            Session::Local(_) => "local",
            Session::Remote(_) => "todoist",
        }
    }
}

/// The task the shortcut keys act on: the row at the input slot, or the
/// last row once the slot sits past the end.
fn target_index(len: usize, slot: usize) -> Option<usize> {
    if len == 0 {
        None
    } else {
        Some(slot.min(len - 1))
    }
}

struct App {
    session: Session,
    input: String,
    /// id of the task being edited; `Enter` commits as an edit instead of
    /// an add while this is set.
    editing: Option<String>,
}

impl App {
    fn target_id(&self) -> Option<String> {
        let store = self.session.store();
        target_index(store.len(), store.input_index())
            .map(|i| store.tasks()[i].id.clone())
    }
}

pub fn run_tui(session: Session) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = tui_loop(&mut terminal, session);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

fn tui_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, session: Session) -> Result<()> {
    let mut app = App {
        session,
        input: String::new(),
        editing: None,
    };

    loop {
        terminal.draw(|f| {
            let size = f.area();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(3),
                    Constraint::Length(3),
                ])
                .split(size);

            let header = Paragraph::new(Line::from(vec![
                Span::styled(
                    "tally",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(
                    format!("[{}]", app.session.mode_label()),
                    Style::default().fg(Color::Gray),
                ),
            ]))
            .block(Block::default().borders(Borders::ALL));
            f.render_widget(header, chunks[0]);

            let mut lines: Vec<Line> = Vec::new();
            for row in app.session.store().rows() {
                match row {
                    Row::Input => {
                        let label = if app.editing.is_some() { "edit› " } else { "    › " };
                        lines.push(Line::from(vec![
                            Span::styled(label, Style::default().fg(Color::Cyan)),
                            Span::raw(app.input.clone()),
                            Span::styled("▏", Style::default().fg(Color::Cyan)),
                        ]));
                    }
                    Row::Task(t) => {
                        let checkbox = if t.completed { "[x] " } else { "[ ] " };
                        let text_style = if t.completed {
                            Style::default()
                                .fg(Color::DarkGray)
                                .add_modifier(Modifier::CROSSED_OUT)
                        } else {
                            Style::default()
                        };
                        lines.push(Line::from(vec![
                            Span::raw(checkbox),
                            Span::styled(t.text.clone(), text_style),
                        ]));
                    }
                }
            }
            let list = Paragraph::new(Text::from(lines))
                .block(Block::default().borders(Borders::ALL).title("tasks"))
                .wrap(Wrap { trim: false });
            f.render_widget(list, chunks[1]);

            let status = if let Some(err) = app.session.error() {
                Line::from(Span::styled(err.to_string(), Style::default().fg(Color::Red)))
            } else if app.session.loading() {
                Line::from(Span::styled("working…", Style::default().fg(Color::Gray)))
            } else {
                Line::from(Span::styled(
                    "Enter=add  ↑/↓=move slot  ^T=toggle  ^E=edit  ^D=delete  ^R=reload  Esc=quit",
                    Style::default().fg(Color::Gray),
                ))
            };
            let status = Paragraph::new(status).block(Block::default().borders(Borders::ALL));
            f.render_widget(status, chunks[2]);
        })?;

        if event::poll(std::time::Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                match key.code {
                    KeyCode::Esc => {
                        if app.editing.take().is_some() {
                            app.input.clear();
                        } else {
                            break;
                        }
                    }
                    KeyCode::Enter => {
                        let text = app.input.clone();
                        match app.editing.take() {
                            Some(id) => {
                                if !text.trim().is_empty() {
                                    // remote failures roll back and show up
                                    // in the status line
                                    let _ = app.session.edit(&id, &text);
                                }
                                app.input.clear();
                            }
                            None => {
                                if !text.trim().is_empty() {
                                    let _ = app.session.submit_add(&text);
                                    app.input.clear();
                                }
                            }
                        }
                    }
                    KeyCode::Up => {
                        let slot = app.session.store().input_index();
                        app.session.set_input_index(slot.saturating_sub(1));
                    }
                    KeyCode::Down => {
                        let slot = app.session.store().input_index();
                        app.session.set_input_index(slot + 1);
                    }
                    KeyCode::Char('t') if ctrl => {
                        if let Some(id) = app.target_id() {
                            let _ = app.session.toggle(&id);
                        }
                    }
                    KeyCode::Char('e') if ctrl => {
                        if let Some(id) = app.target_id() {
                            if let Some(task) = app.session.store().task(&id) {
                                app.input = task.text.clone();
                                app.editing = Some(id);
                            }
                        }
                    }
                    KeyCode::Char('d') if ctrl => {
                        if let Some(id) = app.target_id() {
                            let _ = app.session.delete(&id);
                        }
                    }
                    KeyCode::Char('r') if ctrl => {
                        let _ = app.session.refresh();
                    }
                    KeyCode::Backspace => {
                        app.input.pop();
                    }
                    KeyCode::Char(c) if !ctrl => {
                        app.input.push(c);
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_is_the_row_at_the_slot_or_the_last_one() {
        assert_eq!(target_index(0, 0), None);
        assert_eq!(target_index(3, 0), Some(0));
        assert_eq!(target_index(3, 2), Some(2));
        assert_eq!(target_index(3, 3), Some(2));
    }

    #[test]
    fn local_session_inserts_at_the_slot() {
        let mut session = Session::Local(TaskStore::from_tasks(vec![
            Task::new("1", "a"),
            Task::new("2", "b"),
        ]));
        session.set_input_index(1);
        session.submit_add("between").unwrap();

        let texts: Vec<&str> = session.store().tasks().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "between", "b"]);
        assert_eq!(session.store().input_index(), 2);

        // blank input is ignored
        session.submit_add("   ").unwrap();
        assert_eq!(session.store().len(), 3);
    }
}
