use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;
use time::Date;

use crate::config::themes::Theme;
use crate::config::AppConfig;
use crate::dates;
use crate::search;
use crate::storage::{
    ListRecord, NewTodo, StorageHandle, StatusFilter, TodoFilter, TodoPatch, TodoRecord,
};
use crate::ui;

pub mod forms;
pub mod hints;
pub mod state;
pub mod today;
pub mod toggle;

use forms::{FormField, FormState, ListOption};
use hints::Hint;
pub use state::{GroupBy, Intent, Modal, NavState, View};
use toggle::{ToggleController, ToggleEvent, ToggleOutcome};

/// What a confirm-delete modal is about to remove.
#[derive(Debug, Clone)]
enum DeleteTarget {
    Todo(String),
    Todos(Vec<String>),
    List(String),
}

/// One selectable row of the current view.
#[derive(Debug, Clone)]
pub enum RowItem {
    Todo {
        record: TodoRecord,
        pending: bool,
        selected: bool,
    },
    List {
        record: ListRecord,
    },
}

#[derive(Debug, Clone)]
pub struct RowGroup {
    pub title: Option<String>,
    pub rows: Vec<RowItem>,
}

/// Render data for a modal overlay.
pub enum ModalModel<'a> {
    Form(&'a FormState),
    Confirm { message: String },
    Help,
    Search {
        query: &'a str,
        results: Vec<&'a TodoRecord>,
        cursor: usize,
    },
}

/// Everything a frame needs, assembled once per draw. The cursor is
/// already clamped to the rows actually shown.
pub struct FrameModel<'a> {
    pub view: View,
    pub header: String,
    pub groups: Vec<RowGroup>,
    pub detail: Option<&'a TodoRecord>,
    pub cursor: usize,
    pub hints: Vec<Hint>,
    pub status: Option<&'a str>,
    pub filter_label: Option<&'static str>,
    pub modal: Option<ModalModel<'a>>,
    pub today: Date,
    pub theme: Theme,
}

pub struct App {
    pub config: Arc<AppConfig>,
    pub storage: StorageHandle,
    nav: NavState,
    todos: Vec<TodoRecord>,
    lists: Vec<ListRecord>,
    toggles: ToggleController,
    form: Option<FormState>,
    delete_target: Option<DeleteTarget>,
    search_query: String,
    search_cursor: usize,
    status: Option<String>,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, storage: StorageHandle) -> Result<Self> {
        let toggles = ToggleController::new(config.toggle.delay());
        let mut app = Self {
            config,
            storage,
            nav: NavState::default(),
            todos: Vec::new(),
            lists: Vec::new(),
            toggles,
            form: None,
            delete_target: None,
            search_query: String::new(),
            search_cursor: 0,
            status: None,
            should_quit: false,
            tick_rate: Duration::from_millis(250),
        };
        app.reload().context("loading todos for initial state")?;
        Ok(app)
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        // armed toggles must not be lost at quit
        for event in self.toggles.flush_all(&self.storage) {
            if let ToggleEvent::Failed { todo_id, error } = event {
                tracing::error!(?error, %todo_id, "toggle flush at quit failed");
            }
        }
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        let mut list_state = ListState::default();
        loop {
            let frame_model = self.build_frame();
            terminal
                .draw(|frame| {
                    ui::draw_app(frame, &frame_model, &mut list_state);
                })
                .context("rendering frame")?;
            drop(frame_model);

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {
                        // next draw adapts to the new size
                    }
                    _ => {}
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick();
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn on_tick(&mut self) {
        let events = self.toggles.poll(&self.storage);
        if events.is_empty() {
            return;
        }
        for event in &events {
            if let ToggleEvent::Failed { todo_id, error } = event {
                tracing::error!(?error, %todo_id, "deferred toggle failed");
                self.status = Some("Failed to save completion change".to_string());
            }
        }
        self.reload_or_report();
    }

    // ---- data -----------------------------------------------------------

    fn reload(&mut self) -> Result<()> {
        self.todos = self.storage.query_todos(&TodoFilter {
            list_id: None,
            status: StatusFilter::All,
        })?;
        self.lists = self.storage.fetch_all_lists()?;
        Ok(())
    }

    fn reload_or_report(&mut self) {
        if let Err(err) = self.reload() {
            tracing::error!(?err, "failed to reload todos from storage");
            self.status = Some("Could not refresh todos".to_string());
        }
    }

    fn apply_intent(&mut self, intent: Intent) {
        self.nav = self.nav.apply(intent);
    }

    fn today(&self) -> Date {
        dates::local_today()
    }

    /// Rows of the current view in display order. Membership follows the
    /// stored completion state; a pending target only changes how the row
    /// is drawn, so an armed row stays in place and a second press can
    /// still reach it.
    fn visible_todos(&self) -> Vec<TodoRecord> {
        match self.nav.view {
            View::Today => {
                let active: Vec<TodoRecord> = self
                    .todos
                    .iter()
                    .filter(|t| !t.is_completed)
                    .cloned()
                    .collect();
                let shadowed = self.toggles.apply_overrides(&active);
                let sections =
                    today::build_sections(&shadowed, self.today(), self.nav.today_group_by);
                today::flatten(&sections).into_iter().cloned().collect()
            }
            View::ListDetail => {
                let rows: Vec<TodoRecord> = self
                    .todos
                    .iter()
                    .filter(|t| Some(&t.list_id) == self.nav.selected_list_id.as_ref())
                    .filter(|t| match self.nav.list_filter {
                        StatusFilter::Active => !t.is_completed,
                        StatusFilter::Completed => t.is_completed,
                        StatusFilter::All => true,
                    })
                    .cloned()
                    .collect();
                self.toggles.apply_overrides(&rows)
            }
            View::ListIndex | View::TodoDetail => Vec::new(),
        }
    }

    fn row_count(&self) -> usize {
        match self.nav.view {
            View::ListIndex => self.lists.len(),
            View::TodoDetail => 0,
            _ => self.visible_todos().len(),
        }
    }

    fn clamped_cursor(&self) -> usize {
        let count = self.row_count();
        if count == 0 {
            0
        } else {
            self.nav.cursor_index.min(count - 1)
        }
    }

    fn cursor_todo(&self) -> Option<TodoRecord> {
        match self.nav.view {
            View::TodoDetail => {
                let id = self.nav.selected_todo_id.as_ref()?;
                self.todos.iter().find(|t| &t.id == id).cloned()
            }
            View::Today | View::ListDetail => {
                self.visible_todos().get(self.clamped_cursor()).cloned()
            }
            View::ListIndex => None,
        }
    }

    fn cursor_list(&self) -> Option<ListRecord> {
        match self.nav.view {
            View::ListIndex => self.lists.get(self.clamped_cursor()).cloned(),
            _ => None,
        }
    }

    /// Stored completion state of a row, ignoring any pending override.
    fn stored_completed(&self, todo_id: &str) -> Option<bool> {
        self.todos
            .iter()
            .find(|t| t.id == todo_id)
            .map(|t| t.is_completed)
    }

    fn search_results(&self) -> Vec<&TodoRecord> {
        let active: Vec<&TodoRecord> = self.todos.iter().filter(|t| !t.is_completed).collect();
        let ranked = search::rank(&active, &self.search_query, |t| t.title.as_str());
        ranked
            .into_iter()
            .take(self.config.search.max_results)
            .map(|hit| active[hit.index])
            .collect()
    }

    // ---- frame model ----------------------------------------------------

    pub fn build_frame(&self) -> FrameModel<'_> {
        let cursor = self.clamped_cursor();
        let theme = Theme::resolve(&self.config.theme);
        let today = self.today();

        let header = match self.nav.view {
            View::Today => match self.nav.today_group_by {
                GroupBy::Date => "Today".to_string(),
                GroupBy::List => "Today by list".to_string(),
            },
            View::ListIndex => "Lists".to_string(),
            View::ListDetail => self
                .nav
                .selected_list_id
                .as_ref()
                .and_then(|id| self.lists.iter().find(|l| &l.id == id))
                .map(|l| l.title.clone())
                .unwrap_or_else(|| "List".to_string()),
            View::TodoDetail => "Todo".to_string(),
        };

        let groups = match self.nav.view {
            View::Today => {
                let active: Vec<TodoRecord> = self
                    .todos
                    .iter()
                    .filter(|t| !t.is_completed)
                    .cloned()
                    .collect();
                let shadowed = self.toggles.apply_overrides(&active);
                today::build_sections(&shadowed, today, self.nav.today_group_by)
                    .into_iter()
                    .map(|section| RowGroup {
                        title: Some(section.title),
                        rows: section
                            .rows
                            .into_iter()
                            .map(|record| self.todo_row(record))
                            .collect(),
                    })
                    .collect()
            }
            View::ListDetail => vec![RowGroup {
                title: None,
                rows: self
                    .visible_todos()
                    .into_iter()
                    .map(|record| self.todo_row(record))
                    .collect(),
            }],
            View::ListIndex => vec![RowGroup {
                title: None,
                rows: self
                    .lists
                    .iter()
                    .cloned()
                    .map(|record| RowItem::List { record })
                    .collect(),
            }],
            View::TodoDetail => Vec::new(),
        };

        let detail = match self.nav.view {
            View::TodoDetail => self
                .nav
                .selected_todo_id
                .as_ref()
                .and_then(|id| self.todos.iter().find(|t| &t.id == id)),
            _ => None,
        };

        let modal = self.nav.modal.as_ref().map(|modal| match modal {
            Modal::Help => ModalModel::Help,
            Modal::ConfirmDelete => ModalModel::Confirm {
                message: self.delete_message(),
            },
            Modal::Search => ModalModel::Search {
                query: &self.search_query,
                results: self.search_results(),
                cursor: self.search_cursor,
            },
            _ => match &self.form {
                Some(form) => ModalModel::Form(form),
                None => ModalModel::Help,
            },
        });

        let filter_label = match self.nav.view {
            View::ListDetail => Some(self.nav.list_filter.label()),
            _ => None,
        };

        FrameModel {
            view: self.nav.view,
            header,
            groups,
            detail,
            cursor,
            hints: hints::footer_hints(
                self.nav.view,
                self.nav.modal.as_ref(),
                self.nav.selected_ids.len(),
            ),
            status: self.status.as_deref(),
            filter_label,
            modal,
            today,
            theme,
        }
    }

    fn todo_row(&self, record: TodoRecord) -> RowItem {
        let pending = self.toggles.is_pending(&record.id);
        let selected = self.nav.selected_ids.contains(&record.id);
        RowItem::Todo {
            record,
            pending,
            selected,
        }
    }

    fn delete_message(&self) -> String {
        match &self.delete_target {
            Some(DeleteTarget::Todo(id)) => {
                let title = self
                    .todos
                    .iter()
                    .find(|t| &t.id == id)
                    .map(|t| t.title.as_str())
                    .unwrap_or("this todo");
                format!("Delete '{title}'?")
            }
            Some(DeleteTarget::Todos(ids)) => format!("Delete {} selected todos?", ids.len()),
            Some(DeleteTarget::List(id)) => {
                let title = self
                    .lists
                    .iter()
                    .find(|l| &l.id == id)
                    .map(|l| l.title.as_str())
                    .unwrap_or("this list");
                format!("Delete list '{title}'? Its todos move to the default list.")
            }
            None => "Delete?".to_string(),
        }
    }

    // ---- key handling ---------------------------------------------------

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.nav.modal.is_some() {
            self.handle_modal_key(key);
            return;
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Char('?') => self.apply_intent(Intent::OpenModal(Modal::Help)),
            KeyCode::Char('/') => self.open_search(),
            KeyCode::Tab => {
                let target = match self.nav.view {
                    View::ListIndex => View::Today,
                    _ => View::ListIndex,
                };
                self.apply_intent(Intent::SwitchTopView(target));
            }
            KeyCode::Char('1') => self.apply_intent(Intent::SwitchTopView(View::Today)),
            KeyCode::Char('2') => self.apply_intent(Intent::SwitchTopView(View::ListIndex)),
            KeyCode::Esc => {
                if !self.nav.selected_ids.is_empty() {
                    self.apply_intent(Intent::ClearSelection);
                } else {
                    self.apply_intent(Intent::PopView);
                }
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Char('g') | KeyCode::Home => self.apply_intent(Intent::SetCursor(0)),
            KeyCode::Char('G') | KeyCode::End => {
                let count = self.row_count();
                self.apply_intent(Intent::SetCursor(count.saturating_sub(1)));
            }
            _ => self.handle_view_key(key),
        }
    }

    fn move_cursor(&mut self, delta: i64) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        let current = self.clamped_cursor() as i64;
        let next = (current + delta).clamp(0, count as i64 - 1) as usize;
        self.apply_intent(Intent::SetCursor(next));
    }

    fn handle_view_key(&mut self, key: KeyEvent) {
        match self.nav.view {
            View::Today => self.handle_today_key(key),
            View::ListIndex => self.handle_list_index_key(key),
            View::ListDetail => self.handle_list_detail_key(key),
            View::TodoDetail => self.handle_todo_detail_key(key),
        }
    }

    fn handle_today_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.open_cursor_todo(),
            KeyCode::Char('x') | KeyCode::Char(' ') => self.toggle_cursor_todo(),
            KeyCode::Char('b') => self.apply_intent(Intent::ToggleGroupBy),
            // quick add: the new todo lands on today's agenda
            KeyCode::Char('a') => self.open_add_item(&dates::to_str(self.today())),
            KeyCode::Char('e') => self.open_edit_item(),
            KeyCode::Char('d') => self.open_delete_todo(),
            KeyCode::Char('p') => self.cycle_cursor_priority(),
            KeyCode::Char('s') => self.open_set_due_date(),
            KeyCode::Char('t') => self.set_cursor_due(0),
            KeyCode::Char('T') => self.set_cursor_due(1),
            _ => {}
        }
    }

    fn handle_list_index_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if let Some(list) = self.cursor_list() {
                    self.apply_intent(Intent::PushView {
                        view: View::ListDetail,
                        list_id: Some(list.id),
                        todo_id: None,
                    });
                }
            }
            KeyCode::Char('a') => {
                self.form = Some(FormState::new(
                    "New list",
                    vec![FormField::text("Title", "")],
                ));
                self.apply_intent(Intent::OpenModal(Modal::AddList));
            }
            KeyCode::Char('r') => {
                if let Some(list) = self.cursor_list() {
                    self.form = Some(FormState::new(
                        "Rename list",
                        vec![FormField::text("Title", list.title.clone())],
                    ));
                    self.nav.selected_list_id = Some(list.id);
                    self.apply_intent(Intent::OpenModal(Modal::RenameList));
                }
            }
            KeyCode::Char('d') => {
                if let Some(list) = self.cursor_list() {
                    self.delete_target = Some(DeleteTarget::List(list.id));
                    self.apply_intent(Intent::OpenModal(Modal::ConfirmDelete));
                }
            }
            KeyCode::Char('J') => self.move_cursor_list(1),
            KeyCode::Char('K') => self.move_cursor_list(-1),
            _ => {}
        }
    }

    fn handle_list_detail_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.open_cursor_todo(),
            KeyCode::Char('x') | KeyCode::Char(' ') => self.toggle_cursor_todo(),
            KeyCode::Char('v') => {
                if let Some(todo) = self.cursor_todo() {
                    self.apply_intent(Intent::ToggleSelect(todo.id));
                }
            }
            KeyCode::Char('a') => self.open_add_item(""),
            KeyCode::Char('e') => {
                if self.nav.selected_ids.is_empty() {
                    self.open_edit_item();
                } else {
                    self.open_bulk_edit();
                }
            }
            KeyCode::Char('d') => self.open_delete_todo(),
            KeyCode::Char('p') => self.cycle_cursor_priority(),
            KeyCode::Char('s') => self.open_set_due_date(),
            KeyCode::Char('t') => self.set_cursor_due(0),
            KeyCode::Char('T') => self.set_cursor_due(1),
            KeyCode::Char('f') => self.apply_intent(Intent::CycleFilter),
            _ => {}
        }
    }

    fn handle_todo_detail_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('e') => self.open_edit_item(),
            KeyCode::Char('x') | KeyCode::Char(' ') => self.toggle_cursor_todo(),
            KeyCode::Char('d') => self.open_delete_todo(),
            KeyCode::Char('s') => self.open_set_due_date(),
            KeyCode::Char('t') => self.set_cursor_due(0),
            KeyCode::Char('T') => self.set_cursor_due(1),
            KeyCode::Char('p') => self.cycle_cursor_priority(),
            _ => {}
        }
    }

    // ---- view actions ---------------------------------------------------

    fn open_cursor_todo(&mut self) {
        if let Some(todo) = self.cursor_todo() {
            self.apply_intent(Intent::PushView {
                view: View::TodoDetail,
                list_id: Some(todo.list_id.clone()),
                todo_id: Some(todo.id),
            });
        }
    }

    fn toggle_cursor_todo(&mut self) {
        let Some(todo) = self.cursor_todo() else {
            return;
        };
        let Some(stored) = self.stored_completed(&todo.id) else {
            return;
        };
        match self.toggles.toggle(&todo.id, stored) {
            ToggleOutcome::Armed { target_completed } => {
                self.status = Some(if target_completed {
                    "Completing... press x again to undo".to_string()
                } else {
                    "Reopening... press x again to undo".to_string()
                });
            }
            ToggleOutcome::Canceled => {
                self.status = Some("Change canceled".to_string());
            }
        }
    }

    fn cycle_cursor_priority(&mut self) {
        let Some(todo) = self.cursor_todo() else {
            return;
        };
        let next = todo.priority.cycled();
        match self.storage.update_todo(
            &todo.id,
            &TodoPatch {
                priority: Some(next),
                ..TodoPatch::default()
            },
        ) {
            Ok(()) => {
                self.status = Some(format!("Priority set to {next}"));
                self.reload_or_report();
            }
            Err(err) => {
                tracing::error!(?err, "failed to cycle priority");
                self.status = Some("Failed to update priority".to_string());
            }
        }
    }

    /// `t`/`T` shortcuts: write a due date `days` ahead without a modal.
    fn set_cursor_due(&mut self, days: i64) {
        let Some(todo) = self.cursor_todo() else {
            return;
        };
        let due = dates::to_str(dates::plus_days(self.today(), days));
        match self.storage.update_todo(
            &todo.id,
            &TodoPatch {
                due_date: Some(Some(due.clone())),
                ..TodoPatch::default()
            },
        ) {
            Ok(()) => {
                self.status = Some(format!("Due {}", dates::display_label(&due, self.today())));
                self.reload_or_report();
            }
            Err(err) => {
                tracing::error!(?err, "failed to set due date");
                self.status = Some("Failed to set due date".to_string());
            }
        }
    }

    fn move_cursor_list(&mut self, delta: i64) {
        let Some(list) = self.cursor_list() else {
            return;
        };
        let target = list.logical_id + delta;
        if target < 1 || target > self.lists.len() as i64 {
            return;
        }
        match self.storage.reassign_list_position(&list.id, target) {
            Ok(()) => {
                self.reload_or_report();
                self.move_cursor(delta);
            }
            Err(err) => {
                tracing::error!(?err, "failed to reorder list");
                self.status = Some("Failed to reorder list".to_string());
            }
        }
    }

    fn list_options(&self) -> Vec<ListOption> {
        self.lists
            .iter()
            .map(|l| ListOption {
                id: l.id.clone(),
                title: l.title.clone(),
            })
            .collect()
    }

    fn open_add_item(&mut self, default_due: &str) {
        let options = self.list_options();
        let selected = self
            .nav
            .selected_list_id
            .as_ref()
            .and_then(|id| options.iter().position(|o| &o.id == id))
            .unwrap_or(0);
        self.form = Some(FormState::new(
            "Add todo",
            vec![
                FormField::text("Title", ""),
                FormField::multiline("Description", ""),
                FormField::priority("Priority", Default::default()),
                FormField::list_choice("List", options, selected),
                FormField::date("Due", default_due),
            ],
        ));
        self.apply_intent(Intent::OpenModal(Modal::AddItem));
    }

    fn open_edit_item(&mut self) {
        let Some(todo) = self.cursor_todo() else {
            return;
        };
        let options = self.list_options();
        let selected = options
            .iter()
            .position(|o| o.id == todo.list_id)
            .unwrap_or(0);
        self.form = Some(FormState::new(
            "Edit todo",
            vec![
                FormField::text("Title", todo.title.clone()),
                FormField::multiline("Description", todo.description.clone().unwrap_or_default()),
                FormField::priority("Priority", todo.priority),
                FormField::list_choice("List", options, selected),
                FormField::date("Due", todo.due_date.clone().unwrap_or_default()),
            ],
        ));
        self.apply_intent(Intent::SelectTodo(Some(todo.id)));
        self.apply_intent(Intent::OpenModal(Modal::EditItem));
    }

    fn open_bulk_edit(&mut self) {
        let options = self.list_options();
        self.form = Some(FormState::new(
            format!("Edit {} selected", self.nav.selected_ids.len()),
            vec![
                FormField::priority("Priority", Default::default()),
                FormField::list_choice("List", options, 0),
                FormField::date("Due", ""),
            ],
        ));
        self.apply_intent(Intent::OpenModal(Modal::BulkEditItem));
    }

    fn open_set_due_date(&mut self) {
        let Some(todo) = self.cursor_todo() else {
            return;
        };
        self.form = Some(FormState::new(
            "Set due date",
            vec![FormField::date("Due", todo.due_date.clone().unwrap_or_default())],
        ));
        self.apply_intent(Intent::SelectTodo(Some(todo.id)));
        self.apply_intent(Intent::OpenModal(Modal::SetDueDate));
    }

    fn open_delete_todo(&mut self) {
        if !self.nav.selected_ids.is_empty() {
            let ids: Vec<String> = self.nav.selected_ids.iter().cloned().collect();
            self.delete_target = Some(DeleteTarget::Todos(ids));
            self.apply_intent(Intent::OpenModal(Modal::ConfirmDelete));
            return;
        }
        if let Some(todo) = self.cursor_todo() {
            self.delete_target = Some(DeleteTarget::Todo(todo.id));
            self.apply_intent(Intent::OpenModal(Modal::ConfirmDelete));
        }
    }

    fn open_search(&mut self) {
        self.search_query.clear();
        self.search_cursor = 0;
        self.apply_intent(Intent::OpenModal(Modal::Search));
    }

    // ---- modal handling -------------------------------------------------

    fn handle_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.nav.modal.clone() else {
            return;
        };
        match modal {
            Modal::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
                    self.apply_intent(Intent::CloseModal);
                }
            }
            Modal::ConfirmDelete => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => self.submit_delete(),
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.delete_target = None;
                    self.apply_intent(Intent::CloseModal);
                    self.status = Some("Delete canceled".to_string());
                }
                _ => {}
            },
            Modal::Search => self.handle_search_key(key),
            Modal::AddItem
            | Modal::EditItem
            | Modal::BulkEditItem
            | Modal::AddList
            | Modal::RenameList
            | Modal::SetDueDate => self.handle_form_key(&modal, key),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.apply_intent(Intent::CloseModal);
            }
            KeyCode::Enter => self.open_search_hit(),
            KeyCode::Backspace => {
                self.search_query.pop();
                self.search_cursor = 0;
            }
            KeyCode::Down => {
                let count = self.search_results().len();
                if count > 0 {
                    self.search_cursor = (self.search_cursor + 1).min(count - 1);
                }
            }
            KeyCode::Up => {
                self.search_cursor = self.search_cursor.saturating_sub(1);
            }
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER) =>
            {
                self.search_query.push(ch);
                self.search_cursor = 0;
            }
            _ => {}
        }
    }

    /// Opening a hit pushes its list first and the todo on top, so Esc from
    /// the detail lands in the todo's list rather than back at the search.
    fn open_search_hit(&mut self) {
        let hit = self
            .search_results()
            .get(self.search_cursor.min(self.search_results().len().saturating_sub(1)))
            .map(|t| (t.id.clone(), t.list_id.clone()));
        let Some((todo_id, list_id)) = hit else {
            self.apply_intent(Intent::CloseModal);
            return;
        };
        self.apply_intent(Intent::CloseModal);
        self.apply_intent(Intent::PushView {
            view: View::ListDetail,
            list_id: Some(list_id.clone()),
            todo_id: None,
        });
        self.apply_intent(Intent::PushView {
            view: View::TodoDetail,
            list_id: Some(list_id),
            todo_id: Some(todo_id),
        });
    }

    fn handle_form_key(&mut self, modal: &Modal, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            self.apply_intent(Intent::CloseModal);
            return;
        };
        let choice_field = matches!(
            form.active_field().kind,
            forms::FieldKind::Priority { .. } | forms::FieldKind::ListChoice { .. }
        );
        let date_field = matches!(form.active_field().kind, forms::FieldKind::Date { .. });
        let multiline_field =
            matches!(form.active_field().kind, forms::FieldKind::Multiline { .. });
        let reference = dates::local_today();

        match key.code {
            KeyCode::Esc => {
                self.form = None;
                self.apply_intent(Intent::CloseModal);
            }
            KeyCode::Enter if multiline_field && key.modifiers.contains(KeyModifiers::ALT) => {
                form.insert_newline();
            }
            KeyCode::Enter => self.submit_form(modal),
            KeyCode::Tab => form.focus_next(),
            KeyCode::BackTab => form.focus_prev(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Down if choice_field => form.cycle_next(),
            KeyCode::Up if choice_field => form.cycle_prev(),
            KeyCode::Down | KeyCode::Left if date_field => form.shift_date(-1, reference),
            KeyCode::Up | KeyCode::Right if date_field => form.shift_date(1, reference),
            KeyCode::Char('j') if choice_field => form.cycle_next(),
            KeyCode::Char('k') if choice_field => form.cycle_prev(),
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER) =>
            {
                form.insert_char(ch);
            }
            _ => {}
        }
    }

    // ---- submits --------------------------------------------------------

    fn submit_form(&mut self, modal: &Modal) {
        let result = match modal {
            Modal::AddItem => self.submit_add_item(),
            Modal::EditItem => self.submit_edit_item(),
            Modal::BulkEditItem => self.submit_bulk_edit(),
            Modal::AddList => self.submit_add_list(),
            Modal::RenameList => self.submit_rename_list(),
            Modal::SetDueDate => self.submit_set_due_date(),
            _ => return,
        };
        match result {
            Ok(message) => {
                self.form = None;
                self.apply_intent(Intent::CloseModal);
                self.apply_intent(Intent::ClearSelection);
                self.status = Some(message);
                self.reload_or_report();
            }
            Err(err) => {
                // keep the modal open so the input is not lost
                tracing::error!(?err, "form submit failed");
                self.status = Some(format!("{err:#}"));
            }
        }
    }

    fn parse_due_field(&self, raw: &str) -> Result<Option<String>> {
        let parsed = dates::parse_input(raw, self.today())?;
        Ok(parsed.map(dates::to_str))
    }

    fn submit_add_item(&mut self) -> Result<String> {
        let form = self.form.as_ref().context("no form open")?;
        let title = form.text_value(0).unwrap_or_default().to_string();
        let description = form.text_value(1).unwrap_or_default().to_string();
        let priority = form.priority_value(2).unwrap_or_default();
        let list_id = form
            .chosen_list(3)
            .map(|o| o.id.clone())
            .context("no list available")?;
        let due_date = self.parse_due_field(form.text_value(4).unwrap_or_default())?;

        self.storage.create_todo(&NewTodo {
            title,
            description: if description.trim().is_empty() {
                None
            } else {
                Some(description)
            },
            priority,
            due_date,
            list_id,
        })?;
        Ok("Todo added".to_string())
    }

    fn submit_edit_item(&mut self) -> Result<String> {
        let todo_id = self
            .nav
            .selected_todo_id
            .clone()
            .context("no todo selected")?;
        let form = self.form.as_ref().context("no form open")?;
        let description = form.text_value(1).unwrap_or_default().to_string();
        let patch = TodoPatch {
            title: Some(form.text_value(0).unwrap_or_default().to_string()),
            description: Some(if description.trim().is_empty() {
                None
            } else {
                Some(description)
            }),
            priority: form.priority_value(2),
            list_id: form.chosen_list(3).map(|o| o.id.clone()),
            due_date: Some(self.parse_due_field(form.text_value(4).unwrap_or_default())?),
        };
        self.storage.update_todo(&todo_id, &patch)?;
        Ok("Todo updated".to_string())
    }

    fn submit_bulk_edit(&mut self) -> Result<String> {
        let form = self.form.as_ref().context("no form open")?;
        let patch = TodoPatch {
            title: None,
            description: None,
            priority: form.priority_value(0),
            list_id: form.chosen_list(1).map(|o| o.id.clone()),
            due_date: {
                let raw = form.text_value(2).unwrap_or_default();
                if raw.trim().is_empty() {
                    None
                } else {
                    Some(self.parse_due_field(raw)?)
                }
            },
        };
        let ids: Vec<String> = self.nav.selected_ids.iter().cloned().collect();
        let count = ids.len();
        for id in &ids {
            self.storage.update_todo(id, &patch)?;
        }
        Ok(format!("Updated {count} todos"))
    }

    fn submit_add_list(&mut self) -> Result<String> {
        let form = self.form.as_ref().context("no form open")?;
        let title = form.text_value(0).unwrap_or_default().to_string();
        self.storage.create_list(&title)?;
        Ok(format!("List '{}' created", title.trim()))
    }

    fn submit_rename_list(&mut self) -> Result<String> {
        let list_id = self
            .nav
            .selected_list_id
            .clone()
            .context("no list selected")?;
        let form = self.form.as_ref().context("no form open")?;
        let title = form.text_value(0).unwrap_or_default().to_string();
        self.storage.rename_list(&list_id, &title)?;
        Ok("List renamed".to_string())
    }

    fn submit_set_due_date(&mut self) -> Result<String> {
        let todo_id = self
            .nav
            .selected_todo_id
            .clone()
            .context("no todo selected")?;
        let form = self.form.as_ref().context("no form open")?;
        let due = self.parse_due_field(form.text_value(0).unwrap_or_default())?;
        let cleared = due.is_none();
        self.storage.update_todo(
            &todo_id,
            &TodoPatch {
                due_date: Some(due),
                ..TodoPatch::default()
            },
        )?;
        Ok(if cleared {
            "Due date cleared".to_string()
        } else {
            "Due date set".to_string()
        })
    }

    fn submit_delete(&mut self) {
        let Some(target) = self.delete_target.take() else {
            self.apply_intent(Intent::CloseModal);
            return;
        };
        let result = match &target {
            DeleteTarget::Todo(id) => self
                .storage
                .delete_todo(id)
                .map(|()| "Todo deleted".to_string()),
            DeleteTarget::Todos(ids) => ids
                .iter()
                .try_for_each(|id| self.storage.delete_todo(id))
                .map(|()| format!("Deleted {} todos", ids.len())),
            DeleteTarget::List(id) => self
                .storage
                .delete_list(id)
                .map(|moved| format!("List deleted, {moved} todos moved")),
        };
        self.apply_intent(Intent::CloseModal);
        self.apply_intent(Intent::ClearSelection);
        match result {
            Ok(message) => {
                self.status = Some(message);
                self.reload_or_report();
            }
            Err(err) => {
                tracing::error!(?err, "delete failed");
                self.status = Some(format!("{err:#}"));
            }
        }
    }

    #[cfg(test)]
    fn nav(&self) -> &NavState {
        &self.nav
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}
