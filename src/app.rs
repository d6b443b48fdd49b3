//! The tabbed editor screen.
//!
//! Key presses are translated into [`TableEditor`] calls here; the editor
//! does the work and reports through the notifier. Drawing only reads state.
use crate::core::db::{Gateway, TableSpec};
use crate::core::{Notifier, Result};
use crate::table_editor::{Outcome, Refusal, RowSelection, TableEditor};
use crate::results_grid::display_value;
use crate::tui::Tui;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Tabs};
use ratatui::Frame;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

const HELP: &str = "F2 insert  F3 update  F4 delete  F5 refresh  F6 clear  \
Tab focus  Ctrl-\u{2190}/\u{2192} tab  Ctrl-Q quit";

/// Which input receives typed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Field(usize),
    Search,
    Grid,
}

pub struct App {
    title: String,
    editors: Vec<TableEditor>,
    cursors: Vec<TableState>,
    active: usize,
    focus: Focus,
    status: String,
    should_quit: bool,
}

impl App {
    /// Builds one editor per spec and loads every tab.
    pub fn new(
        title: impl Into<String>,
        specs: Vec<TableSpec>,
        gateway: Rc<dyn Gateway>,
        notifier: Rc<dyn Notifier>,
    ) -> Self {
        let mut editors: Vec<TableEditor> = specs
            .into_iter()
            .map(|spec| TableEditor::new(spec, gateway.clone(), notifier.clone()))
            .collect();
        for editor in &mut editors {
            editor.refresh();
        }
        let cursors = editors.iter().map(|_| TableState::default()).collect();

        App {
            title: title.into(),
            editors,
            cursors,
            active: 0,
            focus: Focus::Field(0),
            status: String::new(),
            should_quit: false,
        }
    }

    /// Draws and handles keys until the operator quits.
    pub fn run(&mut self, tui: &RefCell<Tui>) -> Result<()> {
        while !self.should_quit {
            tui.borrow_mut().draw(|f| self.draw(f))?;
            if let Event::Key(key) = event::read()? {
                self.handle_key(key);
            }
        }
        Ok(())
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn active_tab(&self) -> usize {
        self.active
    }

    pub fn editor(&self) -> &TableEditor {
        &self.editors[self.active]
    }

    fn editor_mut(&mut self) -> &mut TableEditor {
        &mut self.editors[self.active]
    }

    /// Grid row under the cursor on the active tab.
    pub fn cursor(&self) -> Option<usize> {
        self.cursors[self.active].selected()
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Right if ctrl => self.switch_tab(true),
            KeyCode::Left if ctrl => self.switch_tab(false),
            KeyCode::Tab => self.cycle_focus(true),
            KeyCode::BackTab => self.cycle_focus(false),
            KeyCode::F(2) => {
                let outcome = self.editor_mut().insert();
                self.finish("INSERT", outcome, true);
            }
            KeyCode::F(3) => {
                let outcome = self.editor_mut().update();
                self.finish("UPDATE", outcome, true);
            }
            KeyCode::F(4) => {
                let outcome = self.editor_mut().delete();
                self.finish("DELETE", outcome, true);
            }
            KeyCode::F(5) => {
                let outcome = self.editor_mut().refresh();
                self.finish("Refresh", outcome, false);
            }
            KeyCode::F(6) => {
                self.editor_mut().clear();
                self.cursors[self.active].select(None);
                self.status = "Form cleared".to_string();
            }
            _ => match self.focus {
                Focus::Field(index) => self.field_key(index, key),
                Focus::Search => self.search_key(key),
                Focus::Grid => self.grid_key(key),
            },
        }
    }

    fn field_key(&mut self, index: usize, key: KeyEvent) {
        let fields = self.editor().form().len();
        match key.code {
            KeyCode::Enter | KeyCode::Down => self.focus = Focus::Field((index + 1) % fields),
            KeyCode::Up => self.focus = Focus::Field((index + fields - 1) % fields),
            code => {
                if let Some(value) = self.editor_mut().form_mut().field_mut(index) {
                    edit_text(value, code, key.modifiers);
                }
            }
        }
    }

    fn search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let outcome = self.editor_mut().refresh();
                self.finish("Search", outcome, false);
            }
            KeyCode::Esc => {
                let outcome = self.editor_mut().reset_search();
                self.finish("Show all", outcome, false);
            }
            code => edit_text(self.editor_mut().search_mut(), code, key.modifiers),
        }
    }

    fn grid_key(&mut self, key: KeyEvent) {
        let len = self.editor().grid().len();
        let cursor = self.cursor();
        let next = match key.code {
            KeyCode::Down => Some(cursor.map_or(0, |i| (i + 1).min(len.saturating_sub(1)))),
            KeyCode::Up => Some(cursor.map_or(0, |i| i.saturating_sub(1))),
            KeyCode::PageDown => Some(cursor.map_or(0, |i| (i + 10).min(len.saturating_sub(1)))),
            KeyCode::PageUp => Some(cursor.map_or(0, |i| i.saturating_sub(10))),
            KeyCode::Home => Some(0),
            KeyCode::End => Some(len.saturating_sub(1)),
            KeyCode::Enter => {
                if let Some(index) = cursor {
                    if self.editor_mut().select_index(index) {
                        self.status = format!("Row {} loaded into the form", self.selection_label());
                    }
                }
                return;
            }
            _ => return,
        };
        if len > 0 {
            self.cursors[self.active].select(next);
        }
    }

    fn switch_tab(&mut self, forward: bool) {
        let count = self.editors.len();
        self.active = if forward {
            (self.active + 1) % count
        } else {
            (self.active + count - 1) % count
        };
        self.focus = Focus::Field(0);
        debug!(tab = %self.editor().spec().title(), "Switched tab");
    }

    fn cycle_focus(&mut self, forward: bool) {
        let fields = self.editor().form().len();
        self.focus = match (self.focus, forward) {
            (Focus::Field(i), true) if i + 1 < fields => Focus::Field(i + 1),
            (Focus::Field(_), true) => Focus::Search,
            (Focus::Search, true) => Focus::Grid,
            (Focus::Grid, true) => Focus::Field(0),
            (Focus::Field(0), false) => Focus::Grid,
            (Focus::Field(i), false) => Focus::Field(i - 1),
            (Focus::Search, false) => Focus::Field(fields - 1),
            (Focus::Grid, false) => Focus::Search,
        };
    }

    /// Records an action's outcome and keeps the grid cursor in range. An
    /// applied mutation leaves nothing selected, so its cursor is dropped.
    fn finish(&mut self, action: &str, outcome: Outcome, mutation: bool) {
        self.status = match outcome {
            Outcome::Applied => format!("{} done", action),
            Outcome::Refused(Refusal::MissingData) => format!("{}: missing data", action),
            Outcome::Refused(Refusal::NoRowChosen) => format!("{}: no row chosen", action),
            Outcome::Declined => format!("{} cancelled", action),
            Outcome::Failed => format!("{} failed", action),
        };

        let len = self.editor().grid().len();
        let cursor = &mut self.cursors[self.active];
        if len == 0 || (mutation && outcome == Outcome::Applied) {
            cursor.select(None);
        } else if let Some(i) = cursor.selected() {
            cursor.select(Some(i.min(len - 1)));
        }
    }

    fn selection_label(&self) -> String {
        let editor = self.editor();
        match editor.selection() {
            RowSelection::Selected(pk) => {
                format!("{}={}", editor.spec().primary_key(), display_value(pk))
            }
            RowSelection::Unselected => "none".to_string(),
        }
    }

    pub fn draw<B: Backend>(&mut self, f: &mut Frame<B>) {
        let fields = self.editor().form().len() as u16;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                [
                    Constraint::Length(3),
                    Constraint::Length(fields + 2),
                    Constraint::Length(3),
                    Constraint::Min(5),
                    Constraint::Length(1),
                ]
                .as_ref(),
            )
            .split(f.size());

        self.draw_tabs(f, chunks[0]);
        self.draw_form(f, chunks[1]);
        self.draw_search(f, chunks[2]);
        self.draw_grid(f, chunks[3]);
        self.draw_status(f, chunks[4]);
    }

    fn draw_tabs<B: Backend>(&self, f: &mut Frame<B>, area: Rect) {
        let titles = self
            .editors
            .iter()
            .map(|e| Spans::from(e.spec().title().to_string()))
            .collect();
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title(self.title.clone()))
            .select(self.active)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_widget(tabs, area);
    }

    fn draw_form<B: Backend>(&self, f: &mut Frame<B>, area: Rect) {
        let editor = self.editor();
        let spec = editor.spec();
        let label_width = spec
            .columns()
            .iter()
            .map(|c| c.label.chars().count())
            .max()
            .unwrap_or(0);

        let lines: Vec<Spans> = spec
            .columns()
            .iter()
            .zip(editor.form().values())
            .enumerate()
            .map(|(i, (column, value))| {
                let style = if self.focus == Focus::Field(i) {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                Spans::from(vec![
                    Span::styled(
                        format!("{:>width$}: ", column.label, width = label_width),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(value.clone(), style),
                ])
            })
            .collect();

        let mode = match editor.selection() {
            RowSelection::Selected(_) => format!("editing {}", self.selection_label()),
            RowSelection::Unselected => "new row".to_string(),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{} form ({})", spec.title(), mode));
        f.render_widget(Paragraph::new(lines).block(block), area);

        if let Focus::Field(i) = self.focus {
            let value_width = editor.form().values()[i].chars().count();
            let x = area.x + 1 + (label_width + 2 + value_width) as u16;
            f.set_cursor(x.min(area.right().saturating_sub(2)), area.y + 1 + i as u16);
        }
    }

    fn draw_search<B: Backend>(&self, f: &mut Frame<B>, area: Rect) {
        let style = if self.focus == Focus::Search {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let text = self.editor().search_text();
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Search (Enter: filter, Esc: show all)");
        f.render_widget(
            Paragraph::new(Spans::from(Span::styled(text.to_string(), style))).block(block),
            area,
        );
        if self.focus == Focus::Search {
            let x = area.x + 1 + text.chars().count() as u16;
            f.set_cursor(x.min(area.right().saturating_sub(2)), area.y + 1);
        }
    }

    fn draw_grid<B: Backend>(&mut self, f: &mut Frame<B>, area: Rect) {
        let editor = &self.editors[self.active];
        let grid = editor.grid();

        let header = Row::new(
            grid.headers
                .iter()
                .map(|h| Cell::from(h.clone()).style(Style::default().add_modifier(Modifier::BOLD))),
        );
        let rows = grid.display_rows().into_iter().map(Row::new);

        let others = grid.headers.len().saturating_sub(1).max(1) as u16;
        let mut widths = vec![Constraint::Length(12)];
        widths.extend(std::iter::repeat(Constraint::Percentage(90 / others)).take(others as usize));

        let border_style = if self.focus == Focus::Grid {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let table = Table::new(rows)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(format!("{} ({} rows)", editor.spec().name(), grid.len())),
            )
            .widths(&widths)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        f.render_stateful_widget(table, area, &mut self.cursors[self.active]);
    }

    fn draw_status<B: Backend>(&self, f: &mut Frame<B>, area: Rect) {
        let line = Spans::from(vec![
            Span::styled(self.status.clone(), Style::default().fg(Color::Green)),
            Span::raw("  "),
            Span::styled(HELP, Style::default().add_modifier(Modifier::DIM)),
        ]);
        f.render_widget(Paragraph::new(line), area);
    }
}

/// Applies a single editing key to a text input.
fn edit_text(value: &mut String, code: KeyCode, modifiers: KeyModifiers) {
    match code {
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => value.push(c),
        KeyCode::Backspace => {
            value.pop();
        }
        KeyCode::Delete => value.clear(),
        _ => {}
    }
}
