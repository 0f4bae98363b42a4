use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::forms::{FieldKind, FormState};
use crate::app::{FrameModel, ModalModel, RowGroup, RowItem, View};
use crate::config::themes::Theme;
use crate::dates;
use crate::storage::{Priority, TodoRecord};

pub fn draw_app(frame: &mut Frame, model: &FrameModel, list_state: &mut ListState) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(frame.size());

    match model.view {
        View::TodoDetail => render_detail(frame, model, vertical[0]),
        _ => render_rows(frame, model, vertical[0], list_state),
    }

    render_footer(frame, model, vertical[1]);
    render_modal(frame, model);
}

fn render_rows(frame: &mut Frame, model: &FrameModel, area: Rect, list_state: &mut ListState) {
    let theme = &model.theme;
    let inner_width = area.width.saturating_sub(4) as usize;

    let mut items = Vec::new();
    for group in &model.groups {
        if let Some(title) = &group.title {
            items.push(ListItem::new(Line::from(Span::styled(
                title.clone(),
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            ))));
        }
        for row in &group.rows {
            items.push(match row {
                RowItem::Todo {
                    record,
                    pending,
                    selected,
                } => todo_item(record, *pending, *selected, model, inner_width),
                RowItem::List { record } => ListItem::new(Line::from(vec![
                    Span::styled(
                        truncate_to_width(&record.title, inner_width.saturating_sub(10)),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(
                        format!("{}/{}", record.active, record.total),
                        theme.hint_label,
                    ),
                ])),
            });
        }
    }
    if items.is_empty() {
        let empty = match model.view {
            View::Today => "Nothing due. Press Tab to browse lists.",
            View::ListIndex => "No lists yet. Press `a` to create one.",
            _ => "No todos here. Press `a` to add one.",
        };
        items.push(ListItem::new(Span::styled(empty, theme.hint_label)));
    }

    let mut title = model.header.clone();
    if let Some(filter) = model.filter_label {
        title.push_str(&format!(" [{filter}]"));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border)),
        )
        .highlight_style(theme.cursor_row)
        .highlight_symbol("▸ ");

    list_state.select(Some(display_index(&model.groups, model.cursor)));
    frame.render_stateful_widget(list, area, list_state);
}

fn todo_item<'a>(
    record: &TodoRecord,
    pending: bool,
    selected: bool,
    model: &FrameModel,
    width: usize,
) -> ListItem<'a> {
    let theme = &model.theme;
    let mut spans = Vec::new();

    spans.push(Span::styled(
        if selected { "● " } else { "  " }.to_string(),
        theme.selection,
    ));
    let checkbox = if record.is_completed { "[x] " } else { "[ ] " };
    let checkbox_style = if pending {
        theme.status
    } else {
        Style::default()
    };
    spans.push(Span::styled(checkbox.to_string(), checkbox_style));

    let title_style = if record.is_completed {
        theme.completed
    } else if record.priority == Priority::High {
        theme.priority_high
    } else {
        Style::default()
    };
    spans.push(Span::styled(
        truncate_to_width(&record.title, width.saturating_sub(24)),
        title_style,
    ));

    if record.priority != Priority::None && record.priority != Priority::High {
        spans.push(Span::styled(
            format!("  !{}", record.priority),
            theme.hint_label,
        ));
    }

    if let Some(due) = &record.due_date {
        let due_style = if record.is_completed {
            theme.completed
        } else if dates::is_overdue(due, model.today) {
            theme.overdue
        } else {
            theme.due_soon
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(dates::display_label(due, model.today), due_style));
    }

    if pending {
        spans.push(Span::styled("  ~saving".to_string(), theme.status));
    }

    ListItem::new(Line::from(spans))
}

fn render_detail(frame: &mut Frame, model: &FrameModel, area: Rect) {
    let theme = &model.theme;
    let text: Text = match model.detail {
        Some(todo) => {
            let mut lines = Vec::new();
            let title_style = if todo.is_completed {
                theme.completed
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            lines.push(Line::from(Span::styled(todo.title.clone(), title_style)));
            lines.push(Line::from(Span::styled(
                format!("List: {}", todo.list_title),
                theme.hint_label,
            )));
            lines.push(Line::from(Span::styled(
                format!(
                    "Status: {}",
                    if todo.is_completed { "completed" } else { "active" }
                ),
                theme.hint_label,
            )));
            if todo.priority != Priority::None {
                lines.push(Line::from(Span::styled(
                    format!("Priority: {}", todo.priority),
                    if todo.priority == Priority::High {
                        theme.priority_high
                    } else {
                        theme.hint_label
                    },
                )));
            }
            if let Some(due) = &todo.due_date {
                let style = if dates::is_overdue(due, model.today) && !todo.is_completed {
                    theme.overdue
                } else {
                    theme.due_soon
                };
                lines.push(Line::from(Span::styled(
                    format!("Due: {} ({})", due, dates::display_label(due, model.today)),
                    style,
                )));
            }
            if let Some(done_at) = &todo.completed_at {
                lines.push(Line::from(Span::styled(
                    format!("Completed: {done_at}"),
                    theme.hint_label,
                )));
            }
            lines.push(Line::from(""));
            match &todo.description {
                Some(description) => {
                    for line in description.lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                }
                None => lines.push(Line::from(Span::styled(
                    "No description.",
                    theme.hint_label,
                ))),
            }
            Text::from(lines)
        }
        None => Text::from("Todo not found."),
    };

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .title(model.header.clone())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut Frame, model: &FrameModel, area: Rect) {
    let theme = &model.theme;
    let mut lines = Vec::with_capacity(2);

    let status_line = match model.status {
        Some(message) => Line::from(Span::styled(message.to_string(), theme.status)),
        None => Line::from(""),
    };
    lines.push(status_line);

    let mut hint_spans = Vec::with_capacity(model.hints.len() * 3);
    for (idx, hint) in model.hints.iter().enumerate() {
        if idx > 0 {
            hint_spans.push(Span::styled(" • ", theme.hint_label));
        }
        hint_spans.push(Span::styled(hint.key, theme.hint_key));
        hint_spans.push(Span::styled(format!(" {}", hint.label), theme.hint_label));
    }
    lines.push(Line::from(hint_spans));

    frame.render_widget(Paragraph::new(Text::from(lines)), area);
}

fn render_modal(frame: &mut Frame, model: &FrameModel) {
    let theme = &model.theme;
    match &model.modal {
        Some(ModalModel::Form(form)) => render_form(frame, form, theme),
        Some(ModalModel::Confirm { message }) => {
            let area = centered_rect(50, 25, frame.size());
            frame.render_widget(Clear, area);
            let paragraph = Paragraph::new(vec![
                Line::from(Span::styled(
                    message.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled("y confirm • n cancel", theme.hint_label)),
            ])
            .block(
                Block::default()
                    .title("Confirm")
                    .borders(Borders::ALL)
                    .border_style(theme.overdue),
            )
            .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        Some(ModalModel::Help) => render_help(frame, theme),
        Some(ModalModel::Search {
            query,
            results,
            cursor,
        }) => render_search(frame, model, query, results, *cursor, theme),
        None => {}
    }
}

fn render_form(frame: &mut Frame, form: &FormState, theme: &Theme) {
    let area = centered_rect(60, 55, frame.size());
    frame.render_widget(Clear, area);

    let mut lines = Vec::new();
    for (idx, field) in form.fields().iter().enumerate() {
        let active = idx == form.active_index();
        let marker = if active { "▸ " } else { "  " };
        let mut value = field.display_value().replace('\n', " ⏎ ");
        let editable = matches!(
            field.kind,
            FieldKind::Text { .. } | FieldKind::Multiline { .. } | FieldKind::Date { .. }
        );
        if active && editable {
            value.push('▌');
        }
        let label_style = if active {
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            theme.hint_label
        };
        lines.push(Line::from(vec![
            Span::styled(marker.to_string(), label_style),
            Span::styled(format!("{}: ", field.label), label_style),
            Span::raw(value),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab next field • Enter save • Esc cancel",
        theme.hint_label,
    )));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(form.title.clone())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_help(frame: &mut Frame, theme: &Theme) {
    let area = centered_rect(60, 70, frame.size());
    frame.render_widget(Clear, area);

    let rows: &[(&str, &str)] = &[
        ("j/k", "move cursor"),
        ("g/G", "first / last row"),
        ("Enter", "open"),
        ("Esc", "back / clear selection"),
        ("Tab", "switch today / lists"),
        ("x", "toggle complete (press again to undo)"),
        ("v", "select for bulk actions"),
        ("a", "add todo or list"),
        ("e", "edit (selection edits in bulk)"),
        ("d", "delete"),
        ("p", "cycle priority"),
        ("s", "set due date"),
        ("t/T", "due today / tomorrow"),
        ("f", "cycle active / completed / all"),
        ("b", "group today view by date or list"),
        ("J/K", "reorder lists"),
        ("/", "search titles"),
        ("q", "quit"),
    ];

    let mut lines = Vec::with_capacity(rows.len() + 2);
    for (key, label) in rows {
        lines.push(Line::from(vec![
            Span::styled(format!("{key:>6}  "), theme.hint_key),
            Span::styled((*label).to_string(), theme.hint_label),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Esc to close", theme.hint_label)));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title("Help")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.accent)),
    );
    frame.render_widget(paragraph, area);
}

fn render_search(
    frame: &mut Frame,
    model: &FrameModel,
    query: &str,
    results: &[&TodoRecord],
    cursor: usize,
    theme: &Theme,
) {
    let area = centered_rect(70, 60, frame.size());
    frame.render_widget(Clear, area);

    let mut lines = Vec::new();
    lines.push(Line::from(vec![
        Span::styled("/ ", theme.hint_key),
        Span::styled(
            format!("{query}▌"),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]));
    lines.push(Line::from(""));

    if results.is_empty() {
        lines.push(Line::from(Span::styled("No matches.", theme.hint_label)));
    } else {
        for (idx, todo) in results.iter().enumerate() {
            let marker = if idx == cursor { "▸ " } else { "  " };
            let mut spans = vec![
                Span::styled(marker.to_string(), theme.hint_key),
                Span::raw(todo.title.clone()),
                Span::styled(format!("  · {}", todo.list_title), theme.hint_label),
            ];
            if let Some(due) = &todo.due_date {
                spans.push(Span::styled(
                    format!("  {}", dates::display_label(due, model.today)),
                    if dates::is_overdue(due, model.today) {
                        theme.overdue
                    } else {
                        theme.due_soon
                    },
                ));
            }
            lines.push(Line::from(spans));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter open • Esc close",
        theme.hint_label,
    )));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title("Search")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.accent)),
    );
    frame.render_widget(paragraph, area);
}

/// Map a cursor over selectable rows to the list widget's item index, which
/// also counts section header items.
fn display_index(groups: &[RowGroup], cursor: usize) -> usize {
    let mut display = 0;
    let mut remaining = cursor;
    for group in groups {
        if group.title.is_some() {
            display += 1;
        }
        if remaining < group.rows.len() {
            return display + remaining;
        }
        remaining -= group.rows.len();
        display += group.rows.len();
    }
    display
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for grapheme in text.graphemes(true) {
        let glyph_width = UnicodeWidthStr::width(grapheme);
        if width + glyph_width + 1 > max_width {
            break;
        }
        out.push_str(grapheme);
        width += glyph_width;
    }
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}
