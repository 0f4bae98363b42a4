//! Modal input forms.
//!
//! Each field carries its own editing model in `FieldKind`, so the key
//! handler can match on the field under focus instead of interpreting
//! stringly-typed roles. Text-like fields edit by grapheme, choice fields
//! cycle, the date field shifts by whole days.

use time::Date;
use unicode_segmentation::UnicodeSegmentation;

use crate::dates;
use crate::storage::Priority;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text { value: String },
    Multiline { value: String },
    Priority { value: Priority },
    ListChoice { options: Vec<ListOption>, selected: usize },
    Date { value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOption {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FormField {
    pub fn text(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            kind: FieldKind::Text {
                value: value.into(),
            },
        }
    }

    pub fn multiline(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            kind: FieldKind::Multiline {
                value: value.into(),
            },
        }
    }

    pub fn priority(label: &'static str, value: Priority) -> Self {
        Self {
            label,
            kind: FieldKind::Priority { value },
        }
    }

    pub fn list_choice(label: &'static str, options: Vec<ListOption>, selected: usize) -> Self {
        Self {
            label,
            kind: FieldKind::ListChoice { options, selected },
        }
    }

    pub fn date(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            kind: FieldKind::Date {
                value: value.into(),
            },
        }
    }

    pub fn display_value(&self) -> String {
        match &self.kind {
            FieldKind::Text { value } | FieldKind::Multiline { value } => value.clone(),
            FieldKind::Priority { value } => value.to_string(),
            FieldKind::ListChoice { options, selected } => options
                .get(*selected)
                .map(|option| option.title.clone())
                .unwrap_or_default(),
            FieldKind::Date { value } => value.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormState {
    pub title: String,
    fields: Vec<FormField>,
    active: usize,
}

impl FormState {
    pub fn new(title: impl Into<String>, fields: Vec<FormField>) -> Self {
        Self {
            title: title.into(),
            fields,
            active: 0,
        }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_field(&self) -> &FormField {
        &self.fields[self.active.min(self.fields.len().saturating_sub(1))]
    }

    pub fn field(&self, index: usize) -> Option<&FormField> {
        self.fields.get(index)
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.active = (self.active + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.active = (self.active + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn insert_char(&mut self, ch: char) {
        match &mut self.fields[self.active].kind {
            FieldKind::Text { value } | FieldKind::Multiline { value } | FieldKind::Date { value } => {
                value.push(ch);
            }
            FieldKind::Priority { .. } | FieldKind::ListChoice { .. } => {}
        }
    }

    pub fn insert_newline(&mut self) {
        if let FieldKind::Multiline { value } = &mut self.fields[self.active].kind {
            value.push('\n');
        }
    }

    /// Remove the last grapheme cluster, never splitting one.
    pub fn backspace(&mut self) {
        match &mut self.fields[self.active].kind {
            FieldKind::Text { value } | FieldKind::Multiline { value } | FieldKind::Date { value } => {
                if let Some((offset, _)) = value.grapheme_indices(true).last() {
                    value.truncate(offset);
                }
            }
            FieldKind::Priority { .. } | FieldKind::ListChoice { .. } => {}
        }
    }

    /// `j` on a choice field: next priority level or next list.
    pub fn cycle_next(&mut self) {
        match &mut self.fields[self.active].kind {
            FieldKind::Priority { value } => *value = value.cycled(),
            FieldKind::ListChoice { options, selected } => {
                if !options.is_empty() {
                    *selected = (*selected + 1) % options.len();
                }
            }
            _ => {}
        }
    }

    /// `k` on a choice field: previous option.
    pub fn cycle_prev(&mut self) {
        match &mut self.fields[self.active].kind {
            FieldKind::Priority { value } => {
                *value = value.cycled().cycled().cycled();
            }
            FieldKind::ListChoice { options, selected } => {
                if !options.is_empty() {
                    *selected = (*selected + options.len() - 1) % options.len();
                }
            }
            _ => {}
        }
    }

    /// Arrow keys on the date field step a day at a time; an empty or
    /// malformed value snaps to the reference date first.
    pub fn shift_date(&mut self, days: i64, reference: Date) {
        if let FieldKind::Date { value } = &mut self.fields[self.active].kind {
            if value.trim().is_empty() {
                *value = dates::to_str(reference);
            } else {
                *value = dates::shift_date_str(value, days, reference);
            }
        }
    }

    pub fn text_value(&self, index: usize) -> Option<&str> {
        match &self.fields.get(index)?.kind {
            FieldKind::Text { value }
            | FieldKind::Multiline { value }
            | FieldKind::Date { value } => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn priority_value(&self, index: usize) -> Option<Priority> {
        match &self.fields.get(index)?.kind {
            FieldKind::Priority { value } => Some(*value),
            _ => None,
        }
    }

    pub fn chosen_list(&self, index: usize) -> Option<&ListOption> {
        match &self.fields.get(index)?.kind {
            FieldKind::ListChoice { options, selected } => options.get(*selected),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn sample_form() -> FormState {
        FormState::new(
            "Add todo",
            vec![
                FormField::text("Title", ""),
                FormField::priority("Priority", Priority::None),
                FormField::list_choice(
                    "List",
                    vec![
                        ListOption {
                            id: "a".to_string(),
                            title: "Todos".to_string(),
                        },
                        ListOption {
                            id: "b".to_string(),
                            title: "Work".to_string(),
                        },
                    ],
                    0,
                ),
                FormField::date("Due", ""),
            ],
        )
    }

    #[test]
    fn focus_cycles_and_wraps_both_ways() {
        let mut form = sample_form();
        assert_eq!(form.active_index(), 0);
        form.focus_prev();
        assert_eq!(form.active_index(), 3);
        form.focus_next();
        assert_eq!(form.active_index(), 0);
        for _ in 0..4 {
            form.focus_next();
        }
        assert_eq!(form.active_index(), 0);
    }

    #[test]
    fn typing_only_lands_in_text_like_fields() {
        let mut form = sample_form();
        form.insert_char('h');
        form.insert_char('i');
        assert_eq!(form.text_value(0), Some("hi"));

        form.focus_next(); // priority
        form.insert_char('x');
        assert_eq!(form.priority_value(1), Some(Priority::None));
    }

    #[test]
    fn backspace_removes_whole_graphemes() {
        let mut form = sample_form();
        for ch in "ne\u{301}e".chars() {
            form.insert_char(ch);
        }
        form.backspace();
        form.backspace();
        assert_eq!(form.text_value(0), Some("n"), "accented cluster went as one");
        form.backspace();
        form.backspace();
        assert_eq!(form.text_value(0), Some(""), "backspace on empty is safe");
    }

    #[test]
    fn priority_cycles_up_and_down() {
        let mut form = sample_form();
        form.focus_next();
        form.cycle_next();
        assert_eq!(form.priority_value(1), Some(Priority::Low));
        form.cycle_next();
        assert_eq!(form.priority_value(1), Some(Priority::Medium));
        form.cycle_prev();
        assert_eq!(form.priority_value(1), Some(Priority::Low));
        form.cycle_prev();
        assert_eq!(form.priority_value(1), Some(Priority::None));
        form.cycle_prev();
        assert_eq!(form.priority_value(1), Some(Priority::High));
    }

    #[test]
    fn list_choice_wraps_over_options() {
        let mut form = sample_form();
        form.focus_next();
        form.focus_next(); // list choice
        form.cycle_next();
        assert_eq!(form.chosen_list(2).map(|o| o.id.as_str()), Some("b"));
        form.cycle_next();
        assert_eq!(form.chosen_list(2).map(|o| o.id.as_str()), Some("a"));
        form.cycle_prev();
        assert_eq!(form.chosen_list(2).map(|o| o.id.as_str()), Some("b"));
    }

    #[test]
    fn date_field_seeds_from_reference_then_steps() {
        let reference = date!(2025 - 03 - 12);
        let mut form = sample_form();
        form.focus_prev(); // date field
        form.shift_date(1, reference);
        assert_eq!(form.text_value(3), Some("2025-03-12"), "empty seeds to today");
        form.shift_date(1, reference);
        assert_eq!(form.text_value(3), Some("2025-03-13"));
        form.shift_date(-2, reference);
        assert_eq!(form.text_value(3), Some("2025-03-11"));
    }

    #[test]
    fn newline_only_lands_in_multiline() {
        let mut form = FormState::new(
            "Edit",
            vec![
                FormField::text("Title", "t"),
                FormField::multiline("Notes", "line"),
            ],
        );
        form.insert_newline();
        assert_eq!(form.text_value(0), Some("t"));
        form.focus_next();
        form.insert_newline();
        form.insert_char('2');
        assert_eq!(form.text_value(1), Some("line\n2"));
    }
}
