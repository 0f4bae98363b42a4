//! Navigation state and its transition function.
//!
//! `NavState::apply` is a pure total function: every intent produces a new
//! state, and intents that make no sense for the current state fall through
//! to a copy of it. All IO-facing concerns live elsewhere; the reducer only
//! tracks where the user is and what they have selected.

use indexmap::{IndexMap, IndexSet};

use crate::storage::StatusFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Today,
    ListIndex,
    ListDetail,
    TodoDetail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    AddItem,
    EditItem,
    BulkEditItem,
    ConfirmDelete,
    AddList,
    RenameList,
    SetDueDate,
    Help,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupBy {
    #[default]
    Date,
    List,
}

impl GroupBy {
    pub fn toggled(self) -> Self {
        match self {
            GroupBy::Date => GroupBy::List,
            GroupBy::List => GroupBy::Date,
        }
    }
}

/// Cursor positions are remembered per view, and for the list detail view
/// per list, so moving between lists does not leak row positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CursorKey {
    View(View),
    ListDetail(Option<String>),
}

fn cursor_key(view: View, list_id: &Option<String>) -> CursorKey {
    match view {
        View::ListDetail => CursorKey::ListDetail(list_id.clone()),
        other => CursorKey::View(other),
    }
}

/// Everything a navigation step can carry. Pushes record the target's
/// context; pops rewind to whatever was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StackEntry {
    view: View,
    list_id: Option<String>,
    todo_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SwitchTopView(View),
    PushView {
        view: View,
        list_id: Option<String>,
        todo_id: Option<String>,
    },
    PopView,
    SetCursor(usize),
    OpenModal(Modal),
    CloseModal,
    CycleFilter,
    ToggleGroupBy,
    SelectTodo(Option<String>),
    ToggleSelect(String),
    ClearSelection,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavState {
    pub view: View,
    view_stack: Vec<StackEntry>,
    pub selected_list_id: Option<String>,
    pub selected_todo_id: Option<String>,
    pub cursor_index: usize,
    cursor_memory: IndexMap<CursorKey, usize>,
    pub modal: Option<Modal>,
    pub list_filter: StatusFilter,
    pub selected_ids: IndexSet<String>,
    pub today_group_by: GroupBy,
    pub refresh_key: u64,
}

impl Default for NavState {
    fn default() -> Self {
        Self {
            view: View::Today,
            view_stack: Vec::new(),
            selected_list_id: None,
            selected_todo_id: None,
            cursor_index: 0,
            cursor_memory: IndexMap::new(),
            modal: None,
            list_filter: StatusFilter::default(),
            selected_ids: IndexSet::new(),
            today_group_by: GroupBy::default(),
            refresh_key: 0,
        }
    }
}

impl NavState {
    pub fn stack_depth(&self) -> usize {
        self.view_stack.len()
    }

    pub fn apply(&self, intent: Intent) -> NavState {
        let mut next = self.clone();
        match intent {
            Intent::SwitchTopView(view) => {
                next.remember_cursor();
                next.view = view;
                next.view_stack.clear();
                next.selected_list_id = None;
                next.selected_todo_id = None;
                next.selected_ids.clear();
                next.modal = None;
                next.cursor_index = next.recalled_cursor();
            }
            Intent::PushView {
                view,
                list_id,
                todo_id,
            } => {
                next.remember_cursor();
                next.view_stack.push(StackEntry {
                    view: next.view,
                    list_id: next.selected_list_id.clone(),
                    todo_id: next.selected_todo_id.clone(),
                });
                next.view = view;
                if let Some(list_id) = list_id {
                    next.selected_list_id = Some(list_id);
                }
                if let Some(todo_id) = todo_id {
                    next.selected_todo_id = Some(todo_id);
                }
                next.selected_ids.clear();
                next.modal = None;
                next.cursor_index = next.recalled_cursor();
            }
            Intent::PopView => {
                if let Some(entry) = next.view_stack.pop() {
                    next.remember_cursor();
                    next.view = entry.view;
                    next.selected_list_id = entry.list_id;
                    next.selected_todo_id = entry.todo_id;
                    next.selected_ids.clear();
                    next.modal = None;
                    next.cursor_index = next.recalled_cursor();
                }
            }
            Intent::SetCursor(index) => {
                next.cursor_index = index;
            }
            Intent::OpenModal(modal) => {
                next.modal = Some(modal);
            }
            Intent::CloseModal => {
                next.modal = None;
            }
            Intent::CycleFilter => {
                next.list_filter = next.list_filter.cycled();
                next.cursor_index = 0;
            }
            Intent::ToggleGroupBy => {
                next.today_group_by = next.today_group_by.toggled();
                next.cursor_index = 0;
            }
            Intent::SelectTodo(todo_id) => {
                next.selected_todo_id = todo_id;
            }
            Intent::ToggleSelect(todo_id) => {
                if !next.selected_ids.shift_remove(&todo_id) {
                    next.selected_ids.insert(todo_id);
                }
            }
            Intent::ClearSelection => {
                next.selected_ids.clear();
            }
            Intent::Refresh => {
                next.refresh_key = next.refresh_key.wrapping_add(1);
            }
        }
        next
    }

    fn remember_cursor(&mut self) {
        let key = cursor_key(self.view, &self.selected_list_id);
        self.cursor_memory.insert(key, self.cursor_index);
    }

    fn recalled_cursor(&self) -> usize {
        let key = cursor_key(self.view, &self.selected_list_id);
        self.cursor_memory.get(&key).copied().unwrap_or(0)
    }
}
