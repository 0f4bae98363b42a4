use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use clap::Args;
use time::Date;

use crate::app::state::GroupBy;
use crate::app::today as agenda;
use crate::config::AppConfig;
use crate::dates;
use crate::resolver::resolve_todo;
use crate::storage::{
    ListRecord, NewTodo, Priority, StatusFilter, StorageHandle, TodoFilter, TodoPatch, TodoRecord,
};

/// Global output switches, shared by every subcommand.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputMode {
    pub json: bool,
    pub plain: bool,
    pub quiet: bool,
}

impl OutputMode {
    fn confirm(&self, message: &str) {
        if !self.quiet {
            println!("{message}");
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ShowArgs {
    /// Restrict to one list, by title or logical id
    #[arg(long)]
    pub list: Option<String>,
    /// Include completed todos alongside active ones
    #[arg(long)]
    pub all: bool,
    /// Show only completed todos
    #[arg(long, conflicts_with = "all")]
    pub completed: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Todo title
    pub title: String,
    /// Target list, by title or logical id (defaults to the configured list)
    #[arg(long)]
    pub list: Option<String>,
    /// Due date: today, tomorrow, a weekday name, +Nd, or YYYY-MM-DD
    #[arg(long)]
    pub due: Option<String>,
    /// Longer description
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long, value_enum, default_value_t = Priority::None)]
    pub priority: Priority,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Todo reference: index from `todo show`, id prefix, or full id
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,
    /// Remove the due date
    #[arg(long)]
    pub clear_due: bool,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long, value_enum)]
    pub priority: Option<Priority>,
    /// Move to another list, by title or logical id
    #[arg(long)]
    pub list: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CompleteArgs {
    /// Todo reference: index from `todo show`, id prefix, or full id
    pub id: String,
    /// Mark active again instead of completing
    #[arg(long)]
    pub reopen: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Todo reference: index from `todo show`, id prefix, or full id
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    /// Todo reference: index from `todo show`, id prefix, or full id
    pub id: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// List title or logical id (omit to print all lists)
    pub name: Option<String>,
    /// Create the named list
    #[arg(long)]
    pub create: bool,
    /// Rename the named list
    #[arg(long, value_name = "NEW_TITLE")]
    pub rename: Option<String>,
    /// Delete the named list, moving its todos to the default list
    #[arg(long)]
    pub delete: bool,
    /// Move the named list to this position, swapping with the occupant
    #[arg(long, value_name = "N")]
    pub position: Option<i64>,
}

pub fn show(storage: &StorageHandle, output: &OutputMode, args: ShowArgs) -> Result<()> {
    let rendered = run_show(storage, output, &args)?;
    print!("{rendered}");
    Ok(())
}

fn run_show(storage: &StorageHandle, output: &OutputMode, args: &ShowArgs) -> Result<String> {
    let list_id = match &args.list {
        Some(token) => match storage.find_list(token)? {
            Some(list) => Some(list.id),
            None => bail!("no list named '{token}'"),
        },
        None => None,
    };
    let status = if args.completed {
        StatusFilter::Completed
    } else if args.all {
        StatusFilter::All
    } else {
        StatusFilter::Active
    };

    let todos = storage.query_todos(&TodoFilter { list_id, status })?;
    let ids: Vec<String> = todos.iter().map(|t| t.id.clone()).collect();
    storage.save_last_shown(&ids)?;

    if output.json {
        let mut json = serde_json::to_string_pretty(&todos).context("serializing todos")?;
        json.push('\n');
        return Ok(json);
    }
    Ok(format_todo_rows(&todos, output.plain))
}

fn plain_row(index: usize, todo: &TodoRecord) -> String {
    format!(
        "{index}\t{}\t{}\t{}\t{}\t{}\t{}",
        &todo.id[..8],
        if todo.is_completed { "done" } else { "open" },
        todo.priority,
        todo.due_date.as_deref().unwrap_or("-"),
        todo.list_title,
        todo.title,
    )
}

fn pretty_row(index: usize, todo: &TodoRecord, today: Date) -> String {
    let checkbox = if todo.is_completed { "[x]" } else { "[ ]" };
    let mut line = format!("{index:>4}. {checkbox} {}", todo.title);
    if todo.priority != Priority::None {
        let _ = write!(&mut line, "  !{}", todo.priority);
    }
    if let Some(due) = &todo.due_date {
        let label = dates::display_label(due, today);
        if dates::is_overdue(due, today) && !todo.is_completed {
            let _ = write!(&mut line, "  (overdue: {label})");
        } else {
            let _ = write!(&mut line, "  ({label})");
        }
    }
    line
}

fn format_todo_rows(todos: &[TodoRecord], plain: bool) -> String {
    if todos.is_empty() {
        return if plain {
            String::new()
        } else {
            "No todos. Run 'todo add <title>' to create one.\n".to_string()
        };
    }

    let today = dates::local_today();
    let mut out = String::new();
    let mut current_list: Option<&str> = None;
    for (idx, todo) in todos.iter().enumerate() {
        let index = idx + 1;
        if plain {
            let _ = writeln!(&mut out, "{}", plain_row(index, todo));
            continue;
        }

        if current_list != Some(todo.list_title.as_str()) {
            if current_list.is_some() {
                out.push('\n');
            }
            let _ = writeln!(&mut out, "{}", todo.list_title);
            current_list = Some(todo.list_title.as_str());
        }
        let _ = writeln!(&mut out, "{}", pretty_row(index, todo, today));
    }
    out
}

pub fn today(storage: &StorageHandle, output: &OutputMode) -> Result<()> {
    let rendered = run_today(storage, output)?;
    print!("{rendered}");
    Ok(())
}

/// Agenda listing with the same sections as the TUI today view. Indices
/// follow display order and overwrite the last-shown mapping.
fn run_today(storage: &StorageHandle, output: &OutputMode) -> Result<String> {
    let todos = storage.query_todos(&TodoFilter {
        list_id: None,
        status: StatusFilter::Active,
    })?;
    let sections = agenda::build_sections(&todos, dates::local_today(), GroupBy::Date);
    let flat: Vec<&TodoRecord> = agenda::flatten(&sections);
    let ids: Vec<String> = flat.iter().map(|t| t.id.clone()).collect();
    storage.save_last_shown(&ids)?;

    if output.json {
        let mut json = serde_json::to_string_pretty(&flat).context("serializing agenda")?;
        json.push('\n');
        return Ok(json);
    }
    if flat.is_empty() {
        return Ok(if output.plain {
            String::new()
        } else {
            "Nothing for today.\n".to_string()
        });
    }

    let today_ref = dates::local_today();
    let mut out = String::new();
    let mut index = 1;
    for (pos, section) in sections.iter().enumerate() {
        if output.plain {
            for todo in &section.rows {
                let _ = writeln!(&mut out, "{}", plain_row(index, todo));
                index += 1;
            }
            continue;
        }
        if pos > 0 {
            out.push('\n');
        }
        let _ = writeln!(&mut out, "{} ({}):", section.title, section.rows.len());
        for todo in &section.rows {
            let _ = writeln!(&mut out, "{}", pretty_row(index, todo, today_ref));
            index += 1;
        }
    }
    Ok(out)
}

pub fn get(storage: &StorageHandle, output: &OutputMode, args: GetArgs) -> Result<()> {
    let id = resolve_todo(storage, &args.id)?;
    let todo = storage
        .fetch_todo(&id)?
        .with_context(|| format!("todo not found: {}", args.id))?;
    if output.json {
        println!("{}", serde_json::to_string_pretty(&todo)?);
    } else if !output.quiet {
        print!("{}", format_todo_detail(&todo, output.plain));
    }
    Ok(())
}

fn format_todo_detail(todo: &TodoRecord, plain: bool) -> String {
    if plain {
        return format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            todo.id,
            if todo.is_completed { "done" } else { "open" },
            todo.priority,
            todo.due_date.as_deref().unwrap_or("-"),
            todo.list_title,
            todo.title,
            todo.description.as_deref().unwrap_or("-"),
        );
    }
    let today = dates::local_today();
    let mut out = String::new();
    let _ = writeln!(&mut out, "Title:     {}", todo.title);
    let _ = writeln!(&mut out, "List:      {}", todo.list_title);
    let _ = writeln!(
        &mut out,
        "Status:    {}",
        if todo.is_completed { "completed" } else { "active" }
    );
    let _ = writeln!(&mut out, "Priority:  {}", todo.priority);
    if let Some(due) = &todo.due_date {
        let _ = writeln!(
            &mut out,
            "Due:       {} ({})",
            due,
            dates::display_label(due, today)
        );
    }
    if let Some(notes) = &todo.description {
        let _ = writeln!(&mut out, "Notes:     {notes}");
    }
    let _ = writeln!(&mut out, "Created:   {}", todo.created_at);
    let _ = writeln!(&mut out, "Updated:   {}", todo.updated_at);
    if let Some(done_at) = &todo.completed_at {
        let _ = writeln!(&mut out, "Completed: {done_at}");
    }
    let _ = writeln!(&mut out, "Id:        {}", todo.id);
    out
}

pub fn add(
    config: &AppConfig,
    storage: &StorageHandle,
    output: &OutputMode,
    args: AddArgs,
) -> Result<()> {
    let list = match &args.list {
        Some(token) => storage
            .find_list(token)?
            .with_context(|| format!("no list named '{token}'"))?,
        None => storage
            .find_list(&config.default_list)?
            .context("default list is missing")?,
    };
    let due_date = match &args.due {
        Some(raw) => dates::parse_input(raw, dates::local_today())?.map(dates::to_str),
        None => None,
    };

    let id = storage.create_todo(&NewTodo {
        title: args.title,
        description: args.notes,
        priority: args.priority,
        due_date,
        list_id: list.id,
    })?;

    if output.json {
        let todo = storage.fetch_todo(&id)?.context("reading created todo")?;
        println!("{}", serde_json::to_string_pretty(&todo)?);
    } else {
        output.confirm(&format!("Added '{}' to {} ({})", fetch_title(storage, &id)?, list.title, &id[..8]));
    }
    Ok(())
}

pub fn edit(storage: &StorageHandle, output: &OutputMode, args: EditArgs) -> Result<()> {
    let id = resolve_todo(storage, &args.id)?;

    let due_date = if args.clear_due {
        Some(None)
    } else {
        match &args.due {
            Some(raw) => Some(dates::parse_input(raw, dates::local_today())?.map(dates::to_str)),
            None => None,
        }
    };
    let list_id = match &args.list {
        Some(token) => Some(
            storage
                .find_list(token)?
                .with_context(|| format!("no list named '{token}'"))?
                .id,
        ),
        None => None,
    };

    let patch = TodoPatch {
        title: args.title,
        description: args.notes.map(Some),
        priority: args.priority,
        due_date,
        list_id,
    };
    if patch.is_empty() {
        bail!("nothing to change; pass at least one of --title, --due, --clear-due, --notes, --priority, --list");
    }
    storage.update_todo(&id, &patch)?;

    if output.json {
        let todo = storage.fetch_todo(&id)?.context("reading edited todo")?;
        println!("{}", serde_json::to_string_pretty(&todo)?);
    } else {
        output.confirm(&format!("Updated '{}'", fetch_title(storage, &id)?));
    }
    Ok(())
}

pub fn complete(storage: &StorageHandle, output: &OutputMode, args: CompleteArgs) -> Result<()> {
    let id = resolve_todo(storage, &args.id)?;
    let title = fetch_title(storage, &id)?;
    if args.reopen {
        storage.reopen_todo(&id)?;
        output.confirm(&format!("Reopened '{title}'"));
    } else {
        storage.complete_todo(&id)?;
        output.confirm(&format!("Completed '{title}'"));
    }
    Ok(())
}

pub fn delete(storage: &StorageHandle, output: &OutputMode, args: DeleteArgs) -> Result<()> {
    let id = resolve_todo(storage, &args.id)?;
    let title = fetch_title(storage, &id)?;
    storage.delete_todo(&id)?;
    output.confirm(&format!("Deleted '{title}'"));
    Ok(())
}

pub fn list(storage: &StorageHandle, output: &OutputMode, args: ListArgs) -> Result<()> {
    let Some(name) = &args.name else {
        if args.create || args.delete || args.rename.is_some() || args.position.is_some() {
            bail!("list management flags need a list name");
        }
        let rendered = run_list_overview(storage, output)?;
        print!("{rendered}");
        return Ok(());
    };

    if args.create {
        let id = storage.create_list(name)?;
        output.confirm(&format!("Created list '{}' ({})", name.trim(), &id[..8]));
        return Ok(());
    }

    let list = storage
        .find_list(name)?
        .with_context(|| format!("no list named '{name}'"))?;

    if let Some(new_title) = &args.rename {
        storage.rename_list(&list.id, new_title)?;
        output.confirm(&format!("Renamed '{}' to '{}'", list.title, new_title.trim()));
        return Ok(());
    }
    if args.delete {
        let moved = storage.delete_list(&list.id)?;
        output.confirm(&format!(
            "Deleted '{}', moved {moved} todo{} to the default list",
            list.title,
            if moved == 1 { "" } else { "s" }
        ));
        return Ok(());
    }
    if let Some(position) = args.position {
        storage.reassign_list_position(&list.id, position)?;
        output.confirm(&format!("Moved '{}' to position {position}", list.title));
        return Ok(());
    }

    // bare `todo list <name>` shows that list's todos
    let rendered = run_show(
        storage,
        output,
        &ShowArgs {
            list: Some(name.clone()),
            all: true,
            completed: false,
        },
    )?;
    print!("{rendered}");
    Ok(())
}

fn run_list_overview(storage: &StorageHandle, output: &OutputMode) -> Result<String> {
    let lists = storage.fetch_all_lists()?;
    if output.json {
        let mut json = serde_json::to_string_pretty(&lists).context("serializing lists")?;
        json.push('\n');
        return Ok(json);
    }
    Ok(format_list_rows(&lists, output.plain))
}

fn format_list_rows(lists: &[ListRecord], plain: bool) -> String {
    let mut out = String::new();
    for list in lists {
        if plain {
            let _ = writeln!(
                &mut out,
                "{}\t{}\t{}\t{}",
                list.logical_id, list.title, list.active, list.total
            );
        } else {
            let _ = writeln!(
                &mut out,
                "{:>3}. {}  ({} active / {} total)",
                list.logical_id, list.title, list.active, list.total
            );
        }
    }
    out
}

pub fn status(storage: &StorageHandle, output: &OutputMode) -> Result<()> {
    let stats = storage.stats(&dates::to_str(dates::local_today()))?;
    if output.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    println!("Todos:     {}", stats.total);
    println!("Active:    {}", stats.active);
    println!("Completed: {}", stats.completed);
    println!("Overdue:   {}", stats.overdue);
    println!("Lists:     {}", stats.lists);
    Ok(())
}

fn fetch_title(storage: &StorageHandle, id: &str) -> Result<String> {
    Ok(storage
        .fetch_todo(id)?
        .map(|todo| todo.title)
        .unwrap_or_else(|| id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::{add as add_todo, init_storage};
    use crate::storage::DEFAULT_LIST_ID;

    #[test]
    fn show_assigns_indices_and_saves_the_mapping() -> Result<()> {
        let (_temp, storage) = init_storage()?;
        let first = add_todo(&storage, "Alpha", Priority::None, None, DEFAULT_LIST_ID)?;
        let second = add_todo(&storage, "Beta", Priority::None, None, DEFAULT_LIST_ID)?;

        let output = run_show(&storage, &OutputMode::default(), &ShowArgs::default())?;
        assert!(output.contains("   1. [ ] Alpha"));
        assert!(output.contains("   2. [ ] Beta"));

        assert_eq!(storage.todo_id_by_index(1)?, Some(first));
        assert_eq!(storage.todo_id_by_index(2)?, Some(second));
        Ok(())
    }

    #[test]
    fn show_overwrites_stale_indices_wholesale() -> Result<()> {
        let (_temp, storage) = init_storage()?;
        let keep = add_todo(&storage, "Keep", Priority::None, None, DEFAULT_LIST_ID)?;
        let gone = add_todo(&storage, "Gone", Priority::None, None, DEFAULT_LIST_ID)?;

        run_show(&storage, &OutputMode::default(), &ShowArgs::default())?;
        storage.delete_todo(&gone)?;
        run_show(&storage, &OutputMode::default(), &ShowArgs::default())?;

        assert_eq!(storage.todo_id_by_index(1)?, Some(keep));
        assert_eq!(storage.todo_id_by_index(2)?, None);
        Ok(())
    }

    #[test]
    fn show_filters_by_list_and_status() -> Result<()> {
        let (_temp, storage) = init_storage()?;
        let work = storage.create_list("Work")?;
        add_todo(&storage, "Home chore", Priority::None, None, DEFAULT_LIST_ID)?;
        let done = add_todo(&storage, "Work item", Priority::None, None, &work)?;
        storage.complete_todo(&done)?;

        let active = run_show(&storage, &OutputMode::default(), &ShowArgs::default())?;
        assert!(active.contains("Home chore"));
        assert!(!active.contains("Work item"));

        let completed = run_show(
            &storage,
            &OutputMode::default(),
            &ShowArgs {
                list: Some("Work".to_string()),
                all: false,
                completed: true,
            },
        )?;
        assert!(completed.contains("[x] Work item"));
        assert!(!completed.contains("Home chore"));
        Ok(())
    }

    #[test]
    fn show_resolves_lists_by_logical_id() -> Result<()> {
        let (_temp, storage) = init_storage()?;
        let work = storage.create_list("Work")?;
        add_todo(&storage, "Second list item", Priority::None, None, &work)?;

        let output = run_show(
            &storage,
            &OutputMode::default(),
            &ShowArgs {
                list: Some("2".to_string()),
                all: false,
                completed: false,
            },
        )?;
        assert!(output.contains("Second list item"));
        Ok(())
    }

    #[test]
    fn plain_output_is_tab_separated() -> Result<()> {
        let (_temp, storage) = init_storage()?;
        add_todo(
            &storage,
            "Tabbed",
            Priority::High,
            Some("2030-01-01"),
            DEFAULT_LIST_ID,
        )?;

        let output = run_show(
            &storage,
            &OutputMode {
                plain: true,
                ..OutputMode::default()
            },
            &ShowArgs::default(),
        )?;
        let line = output.lines().next().context("one row expected")?;
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields[0], "1");
        assert_eq!(fields[2], "open");
        assert_eq!(fields[3], "high");
        assert_eq!(fields[4], "2030-01-01");
        assert_eq!(fields[6], "Tabbed");
        Ok(())
    }

    #[test]
    fn json_output_round_trips_the_records() -> Result<()> {
        let (_temp, storage) = init_storage()?;
        add_todo(&storage, "Json me", Priority::Low, None, DEFAULT_LIST_ID)?;

        let output = run_show(
            &storage,
            &OutputMode {
                json: true,
                ..OutputMode::default()
            },
            &ShowArgs::default(),
        )?;
        let parsed: serde_json::Value = serde_json::from_str(&output)?;
        let rows = parsed.as_array().context("array of todos")?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "Json me");
        assert_eq!(rows[0]["priority"], "low");
        Ok(())
    }

    #[test]
    fn list_overview_reports_counts() -> Result<()> {
        let (_temp, storage) = init_storage()?;
        let work = storage.create_list("Work")?;
        add_todo(&storage, "One", Priority::None, None, &work)?;
        let done = add_todo(&storage, "Two", Priority::None, None, &work)?;
        storage.complete_todo(&done)?;

        let output = run_list_overview(&storage, &OutputMode::default())?;
        assert!(output.contains("  1. Todos  (0 active / 0 total)"));
        assert!(output.contains("  2. Work  (1 active / 2 total)"));
        Ok(())
    }

    #[test]
    fn edit_requires_at_least_one_change() -> Result<()> {
        let (_temp, storage) = init_storage()?;
        let id = add_todo(&storage, "Immutable", Priority::None, None, DEFAULT_LIST_ID)?;

        let err = edit(
            &storage,
            &OutputMode {
                quiet: true,
                ..OutputMode::default()
            },
            EditArgs {
                id,
                title: None,
                due: None,
                clear_due: false,
                notes: None,
                priority: None,
                list: None,
            },
        )
        .expect_err("empty edit rejected");
        assert!(err.to_string().contains("nothing to change"));
        Ok(())
    }

    #[test]
    fn edit_accepts_a_last_shown_index() -> Result<()> {
        let (_temp, storage) = init_storage()?;
        let id = add_todo(&storage, "Old title", Priority::None, None, DEFAULT_LIST_ID)?;
        run_show(&storage, &OutputMode::default(), &ShowArgs::default())?;

        edit(
            &storage,
            &OutputMode {
                quiet: true,
                ..OutputMode::default()
            },
            EditArgs {
                id: "1".to_string(),
                title: Some("New title".to_string()),
                due: None,
                clear_due: false,
                notes: None,
                priority: None,
                list: None,
            },
        )?;
        let todo = storage.fetch_todo(&id)?.context("todo present")?;
        assert_eq!(todo.title, "New title");
        Ok(())
    }

    #[test]
    fn clear_due_removes_the_date() -> Result<()> {
        let (_temp, storage) = init_storage()?;
        let id = add_todo(
            &storage,
            "Dated",
            Priority::None,
            Some("2030-01-01"),
            DEFAULT_LIST_ID,
        )?;

        edit(
            &storage,
            &OutputMode {
                quiet: true,
                ..OutputMode::default()
            },
            EditArgs {
                id: id.clone(),
                title: None,
                due: None,
                clear_due: true,
                notes: None,
                priority: None,
                list: None,
            },
        )?;
        let todo = storage.fetch_todo(&id)?.context("todo present")?;
        assert_eq!(todo.due_date, None);
        Ok(())
    }

    #[test]
    fn today_lists_the_agenda_and_saves_indices() -> Result<()> {
        let (_temp, storage) = init_storage()?;
        let today_str = dates::to_str(dates::local_today());
        let late = add_todo(
            &storage,
            "Late",
            Priority::None,
            Some("2020-01-01"),
            DEFAULT_LIST_ID,
        )?;
        let due = add_todo(&storage, "Due", Priority::None, Some(&today_str), DEFAULT_LIST_ID)?;
        add_todo(&storage, "Quiet", Priority::None, None, DEFAULT_LIST_ID)?;

        let output = run_today(&storage, &OutputMode::default())?;
        assert!(output.contains("Overdue (1):"));
        assert!(output.contains("Due Today (1):"));
        assert!(!output.contains("Quiet"), "undated rows stay off the agenda");

        assert_eq!(storage.todo_id_by_index(1)?, Some(late));
        assert_eq!(storage.todo_id_by_index(2)?, Some(due));
        assert_eq!(storage.todo_id_by_index(3)?, None);
        Ok(())
    }

    #[test]
    fn get_detail_shows_the_full_record() -> Result<()> {
        let (_temp, storage) = init_storage()?;
        let id = add_todo(
            &storage,
            "Inspect",
            Priority::High,
            Some("2030-01-01"),
            DEFAULT_LIST_ID,
        )?;

        let resolved = crate::resolver::resolve_todo(&storage, &id[..8])?;
        assert_eq!(resolved, id);

        let todo = storage.fetch_todo(&id)?.context("todo present")?;
        let detail = format_todo_detail(&todo, false);
        assert!(detail.contains("Title:     Inspect"));
        assert!(detail.contains("Priority:  high"));
        assert!(detail.contains("Due:       2030-01-01"));
        assert!(detail.contains(&format!("Id:        {id}")));

        let plain = format_todo_detail(&todo, true);
        let fields: Vec<&str> = plain.trim_end().split('\t').collect();
        assert_eq!(fields[0], id);
        assert_eq!(fields[1], "open");
        assert_eq!(fields[5], "Inspect");
        Ok(())
    }

    #[test]
    fn complete_and_reopen_flip_the_flag() -> Result<()> {
        let (_temp, storage) = init_storage()?;
        let id = add_todo(&storage, "Flip", Priority::None, None, DEFAULT_LIST_ID)?;
        let quiet = OutputMode {
            quiet: true,
            ..OutputMode::default()
        };

        complete(
            &storage,
            &quiet,
            CompleteArgs {
                id: id.clone(),
                reopen: false,
            },
        )?;
        assert!(storage.fetch_todo(&id)?.context("present")?.is_completed);

        complete(
            &storage,
            &quiet,
            CompleteArgs {
                id: id.clone(),
                reopen: true,
            },
        )?;
        assert!(!storage.fetch_todo(&id)?.context("present")?.is_completed);
        Ok(())
    }
}
