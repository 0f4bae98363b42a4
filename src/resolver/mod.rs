//! Turns user-typed todo references into canonical ids.
//!
//! A token is tried as, in order: an index into the most recent listing,
//! a full UUID, and finally a case-insensitive id prefix. The first form
//! that applies wins; later forms are not consulted.

use anyhow::Result;
use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageHandle;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No todo at index {0}. Run 'todo show' first to populate indices.")]
    IndexNotFound(i64),
    #[error("No todo found with ID {0}")]
    IdNotFound(String),
    #[error("No todo found matching '{0}'")]
    NoMatch(String),
    #[error("Ambiguous ID prefix '{prefix}' - matches {count} todos. Use a longer prefix.")]
    AmbiguousPrefix { prefix: String, count: usize },
}

pub fn resolve_todo(storage: &StorageHandle, token: &str) -> Result<String> {
    let token = token.trim();

    if let Ok(index) = token.parse::<i64>() {
        if index > 0 {
            return match storage.todo_id_by_index(index)? {
                Some(id) => Ok(id),
                None => Err(ResolveError::IndexNotFound(index).into()),
            };
        }
    }

    if token.len() == 36 && Uuid::parse_str(token).is_ok() {
        return match storage.fetch_todo(&token.to_lowercase())? {
            Some(todo) => Ok(todo.id),
            None => Err(ResolveError::IdNotFound(token.to_string()).into()),
        };
    }

    let mut matches = storage.todo_ids_with_prefix(token)?;
    match matches.len() {
        0 => Err(ResolveError::NoMatch(token.to_string()).into()),
        1 => Ok(matches.remove(0)),
        count => Err(ResolveError::AmbiguousPrefix {
            prefix: token.to_string(),
            count,
        }
        .into()),
    }
}
