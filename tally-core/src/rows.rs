//! Row projection: the task list plus the input slot, flattened into the
//! ordered sequence of rows a view should draw.
//!
//! Walk positions `0..=len`; at the input-slot position emit the input row,
//! at every position below `len` emit that task. The input row therefore
//! appears exactly once, and may sit before, between or after the tasks.

use crate::store::TaskStore;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Row<'a> {
    /// The entry control for a new task.
    Input,
    Task(&'a Task),
}

impl TaskStore {
    pub fn rows(&self) -> Vec<Row<'_>> {
        let tasks = self.tasks();
        let mut rows = Vec::with_capacity(tasks.len() + 1);
        for i in 0..=tasks.len() {
            if i == self.input_index() {
                rows.push(Row::Input);
            }
            if i < tasks.len() {
                rows.push(Row::Task(&tasks[i]));
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(n: usize, slot: usize) -> TaskStore {
        let mut s = TaskStore::from_tasks(
            (0..n).map(|i| Task::new(i.to_string(), format!("task {i}"))).collect(),
        );
        s.set_input_index(slot);
        s
    }

    fn task_ids(rows: &[Row<'_>]) -> Vec<String> {
        rows.iter()
            .filter_map(|r| match r {
                Row::Task(t) => Some(t.id.clone()),
                Row::Input => None,
            })
            .collect()
    }

    #[test]
    fn one_input_row_and_all_tasks_for_every_slot() {
        for n in 0..5 {
            for slot in 0..=n {
                let s = store(n, slot);
                let rows = s.rows();
                assert_eq!(rows.len(), n + 1, "n={n} slot={slot}");

                let inputs = rows.iter().filter(|r| matches!(r, Row::Input)).count();
                assert_eq!(inputs, 1, "n={n} slot={slot}");

                let expected: Vec<String> = (0..n).map(|i| i.to_string()).collect();
                assert_eq!(task_ids(&rows), expected, "n={n} slot={slot}");
            }
        }
    }

    #[test]
    fn input_row_sits_at_the_slot_position() {
        let s = store(3, 1);
        let rows = s.rows();
        assert!(matches!(rows[0], Row::Task(t) if t.id == "0"));
        assert!(matches!(rows[1], Row::Input));
        assert!(matches!(rows[2], Row::Task(t) if t.id == "1"));
        assert!(matches!(rows[3], Row::Task(t) if t.id == "2"));
    }

    #[test]
    fn input_row_can_be_first_or_last() {
        assert!(matches!(store(2, 0).rows()[0], Row::Input));
        assert!(matches!(store(2, 2).rows()[2], Row::Input));
    }

    #[test]
    fn empty_list_is_just_the_input_row() {
        let s = store(0, 0);
        let rows = s.rows();
        assert_eq!(rows, vec![Row::Input]);
    }
}
