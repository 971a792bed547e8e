//! TaskStore — single source of truth for the task list and the input slot.
//!
//! The input slot is the position the entry control occupies in the rendered
//! list, so `0 <= input_index <= tasks.len()` must hold after every
//! mutation. All mutation goes through the named operations below; there is
//! no raw setter for the list.
//!
//! `Snapshot` / `restore` are the transaction primitive the sync layer uses
//! for optimistic updates: capture before the local apply, restore if the
//! remote commit fails.

use crate::task::Task;

/// A by-value capture of the full store state, used for rollback.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    tasks: Vec<Task>,
    input_index: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskStore {
    tasks: Vec<Task>,
    input_index: usize,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from an existing list, input slot at the end.
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let input_index = tasks.len();
        Self { tasks, input_index }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn input_index(&self) -> usize {
        self.input_index
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Move the input slot, clamped to `0..=len`.
    pub fn set_input_index(&mut self, index: usize) {
        self.input_index = index.min(self.tasks.len());
    }

    /// Replace the whole list (e.g. after a remote reload). The input slot
    /// moves to the end.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.input_index = tasks.len();
        self.tasks = tasks;
    }

    /// Append a task without moving the input slot. The sync layer's add
    /// path appends the server's canonical task and advances the slot itself.
    pub fn push_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Insert a task at the input slot and advance the slot past it. This is
    /// the local-only add: new tasks land wherever the entry row currently
    /// sits, which may be mid-list.
    pub fn insert_at_slot(&mut self, task: Task) {
        self.tasks.insert(self.input_index, task);
        self.input_index += 1;
    }

    /// Flip a task's completion state. Returns the new value, or `None` if
    /// the id is unknown.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let t = self.tasks.iter_mut().find(|t| t.id == id)?;
        t.completed = !t.completed;
        Some(t.completed)
    }

    pub fn set_completed(&mut self, id: &str, completed: bool) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(t) => {
                t.completed = completed;
                true
            }
            None => false,
        }
    }

    pub fn set_text(&mut self, id: &str, text: &str) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(t) => {
                t.text = text.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove a task by id, re-clamping the input slot so it never points
    /// past the shortened list.
    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let pos = self.tasks.iter().position(|t| t.id == id)?;
        let removed = self.tasks.remove(pos);
        self.input_index = self.input_index.min(self.tasks.len());
        Some(removed)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: self.tasks.clone(),
            input_index: self.input_index,
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.tasks = snapshot.tasks;
        self.input_index = snapshot.input_index;
    }
}
