//! Agenda assembly for the today view.
//!
//! Active todos are bucketed into urgency sections. A todo lands in the
//! first section that claims it and nowhere else, so the agenda never shows
//! the same row twice. The alternate grouping reuses the claimed set but
//! arranges it by list.

use std::collections::HashSet;

use indexmap::IndexMap;
use time::Date;

use crate::app::state::GroupBy;
use crate::dates;
use crate::storage::{Priority, TodoRecord};

#[derive(Debug, Clone)]
pub struct TodaySection {
    pub title: String,
    pub rows: Vec<TodoRecord>,
}

/// Build the agenda. `todos` should already be filtered to active rows and
/// carry any pending toggle overrides; storage order is preserved inside
/// each section.
pub fn build_sections(todos: &[TodoRecord], reference: Date, group_by: GroupBy) -> Vec<TodaySection> {
    let week_end = dates::to_str(dates::week_end(reference));
    let horizon = dates::to_str(dates::plus_days(reference, 10));
    let today = dates::to_str(reference);

    let mut overdue = Vec::new();
    let mut due_today = Vec::new();
    let mut this_week = Vec::new();
    let mut upcoming = Vec::new();
    let mut high_priority = Vec::new();

    let mut seen: HashSet<String> = HashSet::new();
    let mut take = |bucket: &mut Vec<TodoRecord>, todo: &TodoRecord, seen: &mut HashSet<String>| {
        if seen.insert(todo.id.clone()) {
            bucket.push(todo.clone());
        }
    };

    for todo in todos {
        if let Some(due) = &todo.due_date {
            if *due < today {
                take(&mut overdue, todo, &mut seen);
            } else if *due == today {
                take(&mut due_today, todo, &mut seen);
            } else if *due <= week_end {
                take(&mut this_week, todo, &mut seen);
            } else if *due <= horizon {
                take(&mut upcoming, todo, &mut seen);
            }
        }
    }
    for todo in todos {
        if todo.priority == Priority::High {
            take(&mut high_priority, todo, &mut seen);
        }
    }

    match group_by {
        GroupBy::Date => [
            ("Overdue", overdue),
            ("Due Today", due_today),
            ("This Week", this_week),
            ("Next 10 Days", upcoming),
            ("High Priority", high_priority),
        ]
        .into_iter()
        .filter(|(_, rows)| !rows.is_empty())
        .map(|(title, rows)| TodaySection {
            title: title.to_string(),
            rows,
        })
        .collect(),
        GroupBy::List => {
            let agenda = overdue
                .into_iter()
                .chain(due_today)
                .chain(this_week)
                .chain(upcoming)
                .chain(high_priority);
            let mut by_list: IndexMap<(i64, String), Vec<TodoRecord>> = IndexMap::new();
            for todo in agenda {
                by_list
                    .entry((todo.list_logical_id, todo.list_title.clone()))
                    .or_default()
                    .push(todo);
            }
            by_list.sort_keys();
            by_list
                .into_iter()
                .map(|((_, title), rows)| TodaySection { title, rows })
                .collect()
        }
    }
}

/// Rows in display order, for cursor addressing across section boundaries.
pub fn flatten(sections: &[TodaySection]) -> Vec<&TodoRecord> {
    sections
        .iter()
        .flat_map(|section| section.rows.iter())
        .collect()
}
