//! Footer hint strip.
//!
//! The hint row is a pure function of where the user is: active modal
//! first, then view, with a bulk variant once a selection exists.

use crate::app::state::{Modal, View};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hint {
    pub key: &'static str,
    pub label: &'static str,
}

const fn hint(key: &'static str, label: &'static str) -> Hint {
    Hint { key, label }
}

pub fn footer_hints(view: View, modal: Option<&Modal>, selection_count: usize) -> Vec<Hint> {
    if let Some(modal) = modal {
        return match modal {
            Modal::AddItem
            | Modal::EditItem
            | Modal::BulkEditItem
            | Modal::AddList
            | Modal::RenameList
            | Modal::SetDueDate => vec![
                hint("Tab", "next field"),
                hint("Enter", "save"),
                hint("Esc", "cancel"),
            ],
            Modal::ConfirmDelete => vec![hint("y", "confirm"), hint("n", "cancel")],
            Modal::Help => vec![hint("Esc", "close")],
            Modal::Search => vec![
                hint("type", "to search"),
                hint("Enter", "open"),
                hint("Esc", "close"),
            ],
        };
    }

    if selection_count > 0 && matches!(view, View::ListDetail) {
        return vec![
            hint("v", "select"),
            hint("e", "edit selected"),
            hint("d", "delete selected"),
            hint("Esc", "clear selection"),
        ];
    }

    match view {
        View::Today => vec![
            hint("j/k", "move"),
            hint("Enter", "open"),
            hint("x", "toggle"),
            hint("a", "add"),
            hint("t/T", "due today/tmrw"),
            hint("b", "group"),
            hint("Tab", "lists"),
            hint("/", "search"),
            hint("?", "help"),
            hint("q", "quit"),
        ],
        View::ListIndex => vec![
            hint("j/k", "move"),
            hint("Enter", "open"),
            hint("a", "new list"),
            hint("r", "rename"),
            hint("d", "delete"),
            hint("J/K", "reorder"),
            hint("Tab", "today"),
            hint("q", "quit"),
        ],
        View::ListDetail => vec![
            hint("j/k", "move"),
            hint("Enter", "open"),
            hint("x", "toggle"),
            hint("v", "select"),
            hint("a", "add"),
            hint("e", "edit"),
            hint("d", "delete"),
            hint("s", "due date"),
            hint("f", "filter"),
            hint("Esc", "back"),
        ],
        View::TodoDetail => vec![
            hint("e", "edit"),
            hint("x", "toggle"),
            hint("d", "delete"),
            hint("s", "due date"),
            hint("Esc", "back"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modal_hints_override_view_hints() {
        let base = footer_hints(View::ListDetail, None, 0);
        let with_form = footer_hints(View::ListDetail, Some(&Modal::EditItem), 0);
        assert_ne!(base, with_form);
        assert!(with_form.iter().any(|h| h.key == "Tab"));

        let confirm = footer_hints(View::Today, Some(&Modal::ConfirmDelete), 0);
        assert_eq!(confirm, vec![hint("y", "confirm"), hint("n", "cancel")]);
    }

    #[test]
    fn selection_swaps_in_the_bulk_variant() {
        let none = footer_hints(View::ListDetail, None, 0);
        let some = footer_hints(View::ListDetail, None, 2);
        assert_ne!(none, some);
        assert!(some.iter().any(|h| h.label == "delete selected"));
        assert!(some.iter().any(|h| h.label == "clear selection"));
    }

    #[test]
    fn selection_outside_list_detail_changes_nothing() {
        assert_eq!(
            footer_hints(View::Today, None, 3),
            footer_hints(View::Today, None, 0)
        );
    }

    #[test]
    fn modal_beats_selection() {
        let hints = footer_hints(View::ListDetail, Some(&Modal::Search), 4);
        assert!(hints.iter().any(|h| h.label == "to search"));
    }

    #[test]
    fn every_view_offers_a_way_out() {
        for view in [View::Today, View::ListIndex, View::ListDetail, View::TodoDetail] {
            let hints = footer_hints(view, None, 0);
            assert!(
                hints.iter().any(|h| h.key == "q" || h.key == "Esc"),
                "no exit hint for {view:?}"
            );
        }
    }
}
