//! Deferred completion toggles.
//!
//! Pressing `x` does not write immediately: the change is held for a short
//! window so a second press can cancel it without ever touching the store.
//! The pending entry doubles as the cancel handle; expiry is detected by
//! the event loop tick, so arm, cancel and commit all happen on one thread
//! and a cancel can never race a commit.

use std::time::{Duration, Instant};

use indexmap::IndexMap;

use crate::storage::{StorageHandle, TodoRecord};

#[derive(Debug, Clone, Copy)]
struct PendingToggle {
    target_completed: bool,
    deadline: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// A toggle was armed; it will commit when the window expires.
    Armed { target_completed: bool },
    /// An armed toggle was cancelled before it wrote anything.
    Canceled,
}

#[derive(Debug)]
pub enum ToggleEvent {
    Committed { todo_id: String, completed: bool },
    Failed { todo_id: String, error: anyhow::Error },
}

pub struct ToggleController {
    delay: Duration,
    pending: IndexMap<String, PendingToggle>,
}

impl ToggleController {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: IndexMap::new(),
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_pending(&self, todo_id: &str) -> bool {
        self.pending.contains_key(todo_id)
    }

    /// Arm a toggle for `todo_id`, or cancel the one already armed for it.
    /// After a cancel the next press arms again from the row's stored state.
    pub fn toggle(&mut self, todo_id: &str, currently_completed: bool) -> ToggleOutcome {
        if self.pending.shift_remove(todo_id).is_some() {
            return ToggleOutcome::Canceled;
        }
        let target_completed = !currently_completed;
        self.pending.insert(
            todo_id.to_string(),
            PendingToggle {
                target_completed,
                deadline: Instant::now() + self.delay,
            },
        );
        ToggleOutcome::Armed { target_completed }
    }

    /// Overlay pending targets onto freshly queried rows. Read-only: the
    /// pending set is not consumed and the input rows are not touched.
    pub fn apply_overrides(&self, rows: &[TodoRecord]) -> Vec<TodoRecord> {
        rows.iter()
            .map(|row| match self.pending.get(&row.id) {
                Some(pending) => {
                    let mut shadowed = row.clone();
                    shadowed.is_completed = pending.target_completed;
                    shadowed
                }
                None => row.clone(),
            })
            .collect()
    }

    /// Commit every toggle whose window has expired. Called from the event
    /// loop tick.
    pub fn poll(&mut self, storage: &StorageHandle) -> Vec<ToggleEvent> {
        let now = Instant::now();
        let expired: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();
        self.commit_ids(storage, &expired)
    }

    /// Commit everything still pending, regardless of deadline. Called on
    /// teardown so no armed toggle is lost at quit.
    pub fn flush_all(&mut self, storage: &StorageHandle) -> Vec<ToggleEvent> {
        let all: Vec<String> = self.pending.keys().cloned().collect();
        self.commit_ids(storage, &all)
    }

    fn commit_ids(&mut self, storage: &StorageHandle, ids: &[String]) -> Vec<ToggleEvent> {
        let mut events = Vec::with_capacity(ids.len());
        for id in ids {
            // the entry leaves the pending set whether or not the write
            // succeeds, otherwise a broken store would retry forever
            let Some(pending) = self.pending.shift_remove(id) else {
                continue;
            };
            let result = if pending.target_completed {
                storage.complete_todo(id)
            } else {
                storage.reopen_todo(id)
            };
            match result {
                Ok(()) => events.push(ToggleEvent::Committed {
                    todo_id: id.clone(),
                    completed: pending.target_completed,
                }),
                Err(error) => {
                    tracing::error!(?error, todo_id = %id, "deferred toggle commit failed");
                    events.push(ToggleEvent::Failed {
                        todo_id: id.clone(),
                        error,
                    });
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::{add, init_storage};
    use crate::storage::{Priority, DEFAULT_LIST_ID};
    use assert_matches::assert_matches;

    fn immediate() -> ToggleController {
        ToggleController::new(Duration::ZERO)
    }

    fn held() -> ToggleController {
        ToggleController::new(Duration::from_secs(3600))
    }

    #[test]
    fn expiry_commits_exactly_one_write() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let id = add(&storage, "Toggle me", Priority::None, None, DEFAULT_LIST_ID)?;

        let mut controller = immediate();
        assert_matches!(
            controller.toggle(&id, false),
            ToggleOutcome::Armed {
                target_completed: true
            }
        );

        let events = controller.poll(&storage);
        assert_eq!(events.len(), 1);
        assert_matches!(
            &events[0],
            ToggleEvent::Committed { todo_id, completed: true } if *todo_id == id
        );
        assert!(storage.fetch_todo(&id)?.expect("todo present").is_completed);

        // entry is gone, a later poll commits nothing
        assert!(controller.poll(&storage).is_empty());
        assert!(!controller.has_pending());
        Ok(())
    }

    #[test]
    fn second_press_cancels_with_zero_writes() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let id = add(&storage, "Waffle", Priority::None, None, DEFAULT_LIST_ID)?;

        let mut controller = immediate();
        controller.toggle(&id, false);
        assert_eq!(controller.toggle(&id, false), ToggleOutcome::Canceled);

        assert!(controller.poll(&storage).is_empty());
        assert!(!storage.fetch_todo(&id)?.expect("todo present").is_completed);
        Ok(())
    }

    #[test]
    fn third_press_after_cancel_arms_again() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let id = add(&storage, "Again", Priority::None, None, DEFAULT_LIST_ID)?;

        let mut controller = immediate();
        controller.toggle(&id, false);
        controller.toggle(&id, false);
        assert_matches!(
            controller.toggle(&id, false),
            ToggleOutcome::Armed {
                target_completed: true
            }
        );
        let events = controller.poll(&storage);
        assert_eq!(events.len(), 1);
        assert!(storage.fetch_todo(&id)?.expect("todo present").is_completed);
        Ok(())
    }

    #[test]
    fn reopen_commits_against_a_completed_row() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let id = add(&storage, "Done", Priority::None, None, DEFAULT_LIST_ID)?;
        storage.complete_todo(&id)?;

        let mut controller = immediate();
        assert_matches!(
            controller.toggle(&id, true),
            ToggleOutcome::Armed {
                target_completed: false
            }
        );
        controller.poll(&storage);
        assert!(!storage.fetch_todo(&id)?.expect("todo present").is_completed);
        Ok(())
    }

    #[test]
    fn unexpired_toggles_wait_for_their_window() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let id = add(&storage, "Patient", Priority::None, None, DEFAULT_LIST_ID)?;

        let mut controller = held();
        controller.toggle(&id, false);
        assert!(controller.poll(&storage).is_empty());
        assert!(controller.is_pending(&id));
        assert!(!storage.fetch_todo(&id)?.expect("todo present").is_completed);
        Ok(())
    }

    #[test]
    fn teardown_flushes_everything_pending() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let a = add(&storage, "One", Priority::None, None, DEFAULT_LIST_ID)?;
        let b = add(&storage, "Two", Priority::None, None, DEFAULT_LIST_ID)?;

        let mut controller = held();
        controller.toggle(&a, false);
        controller.toggle(&b, false);

        let events = controller.flush_all(&storage);
        assert_eq!(events.len(), 2);
        assert!(!controller.has_pending());
        assert!(storage.fetch_todo(&a)?.expect("todo present").is_completed);
        assert!(storage.fetch_todo(&b)?.expect("todo present").is_completed);
        Ok(())
    }

    #[test]
    fn failed_commit_still_clears_the_entry() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;

        let mut controller = immediate();
        controller.toggle("ffffffff-ffff-ffff-ffff-ffffffffffff", false);

        let events = controller.poll(&storage);
        assert_eq!(events.len(), 1);
        assert_matches!(&events[0], ToggleEvent::Failed { .. });
        assert!(!controller.has_pending());
        Ok(())
    }

    #[test]
    fn overrides_shadow_rows_without_mutating_state() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let id = add(&storage, "Shadowed", Priority::None, None, DEFAULT_LIST_ID)?;
        let rows = storage.query_todos(&Default::default())?;

        let mut controller = held();
        controller.toggle(&id, false);

        let shadowed = controller.apply_overrides(&rows);
        assert!(shadowed[0].is_completed);
        assert!(!rows[0].is_completed, "input rows untouched");
        assert!(controller.is_pending(&id), "pending set not consumed");

        // reading overrides twice gives the same answer
        let again = controller.apply_overrides(&rows);
        assert_eq!(shadowed, again);
        Ok(())
    }
}
