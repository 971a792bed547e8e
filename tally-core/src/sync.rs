//! Sync layer: translates task-list intents into backend calls with
//! optimistic local updates.
//!
//! Mutations apply to the local [`TaskStore`] first, then commit against the
//! backend; if the commit fails the store is restored from a snapshot taken
//! at call time. One rollback mechanism for every operation — the snapshot
//! captures the whole list plus the input slot, so a failed delete puts the
//! slot back too.
//!
//! Add is the exception: it is not optimistic. The backend assigns the
//! canonical id, so we wait for it and append the returned task.
//!
//! Concurrency: operations run on one logical thread and are awaited to
//! completion by callers; nothing serializes overlapping edits beyond the
//! snapshot rollback. No retries, no cancellation.

use std::future::Future;

use anyhow::Result;

use crate::store::TaskStore;
use crate::task::Task;

/// Seam between the sync layer and the remote task service. Implemented by
/// the real REST client and by in-memory doubles in tests.
#[allow(async_fn_in_trait)]
pub trait TaskBackend {
    /// Lightweight connectivity / credential check.
    async fn check_connection(&mut self) -> Result<()>;
    async fn list_tasks(&mut self) -> Result<Vec<Task>>;
    async fn create_task(&mut self, text: &str) -> Result<Task>;
    async fn update_task(&mut self, id: &str, text: &str) -> Result<()>;
    async fn close_task(&mut self, id: &str) -> Result<()>;
    async fn reopen_task(&mut self, id: &str) -> Result<()>;
    async fn delete_task(&mut self, id: &str) -> Result<()>;
    fn set_token(&mut self, token: &str);
}

/// Snapshot-apply-commit-or-restore, shared by every optimistic operation.
pub async fn run_txn<'a, B, T, Fut>(
    store: &mut TaskStore,
    backend: &'a mut B,
    apply: impl FnOnce(&mut TaskStore),
    commit: impl FnOnce(&'a mut B) -> Fut,
) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    let snapshot = store.snapshot();
    apply(store);
    match commit(backend).await {
        Ok(value) => Ok(value),
        Err(err) => {
            store.restore(snapshot);
            Err(err)
        }
    }
}

/// Owns the store and the backend; every mutation of the list funnels
/// through the named operations here.
///
/// Failures are recorded as a human-readable message (readable from
/// [`TaskSync::error`]) and also propagated so callers can log or abort.
#[derive(Debug)]
pub struct TaskSync<B> {
    backend: B,
    store: TaskStore,
    loading: bool,
    error: Option<String>,
    authenticated: bool,
}

impl<B: TaskBackend> TaskSync<B> {
    pub fn new(backend: B) -> Self {
        Self::with_store(backend, TaskStore::new())
    }

    pub fn with_store(backend: B, store: TaskStore) -> Self {
        Self {
            backend,
            store,
            loading: false,
            error: None,
            authenticated: false,
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Moving the input slot is purely local; no backend involvement.
    pub fn set_input_index(&mut self, index: usize) {
        self.store.set_input_index(index);
    }

    /// Hand the credential to the backend and probe the service. Does not
    /// touch the task list; call [`TaskSync::load_tasks`] after success.
    pub async fn authenticate(&mut self, token: &str) -> Result<()> {
        self.loading = true;
        self.error = None;
        self.backend.set_token(token);
        match self.backend.check_connection().await {
            Ok(()) => {
                self.authenticated = true;
                self.loading = false;
                Ok(())
            }
            Err(err) => {
                self.authenticated = false;
                self.loading = false;
                self.error = Some(format!("Authentication failed: {err:#}"));
                Err(err)
            }
        }
    }

    /// Fetch the full task set, replacing the local list. The input slot
    /// lands at the end of the fresh list. On failure the store is left
    /// untouched.
    pub async fn load_tasks(&mut self) -> Result<()> {
        self.loading = true;
        self.error = None;
        match self.backend.list_tasks().await {
            Ok(tasks) => {
                self.store.replace_all(tasks);
                self.loading = false;
                Ok(())
            }
            Err(err) => {
                self.loading = false;
                self.error = Some(format!("Failed to load tasks: {err:#}"));
                Err(err)
            }
        }
    }

    /// Create a task remotely, then append the canonical result and advance
    /// the input slot. Whitespace-only text is rejected locally: no state
    /// change, no request.
    pub async fn add_task(&mut self, text: &str) -> Result<Option<Task>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        self.loading = true;
        self.error = None;
        match self.backend.create_task(text).await {
            Ok(task) => {
                self.store.push_task(task.clone());
                let advanced = self.store.input_index() + 1;
                self.store.set_input_index(advanced);
                self.loading = false;
                Ok(Some(task))
            }
            Err(err) => {
                self.loading = false;
                self.error = Some(format!("Failed to add task: {err:#}"));
                Err(err)
            }
        }
    }

    /// Optimistically flip completion, then close or reopen remotely.
    /// Unknown ids are a no-op. Applying this twice with no intervening
    /// change returns the task to its original state.
    pub async fn toggle_task(&mut self, id: &str) -> Result<()> {
        self.error = None;
        let Some(was_done) = self.store.task(id).map(|t| t.completed) else {
            return Ok(());
        };
        let now_done = !was_done;
        let result = run_txn(
            &mut self.store,
            &mut self.backend,
            |s| {
                s.set_completed(id, now_done);
            },
            |b| async move {
                if now_done {
                    b.close_task(id).await
                } else {
                    b.reopen_task(id).await
                }
            },
        )
        .await;
        if let Err(err) = result {
            self.error = Some(format!("Failed to toggle task: {err:#}"));
            return Err(err);
        }
        Ok(())
    }

    /// Optimistically rewrite a task's text, then commit. Unknown ids are a
    /// no-op with no request.
    pub async fn edit_task(&mut self, id: &str, new_text: &str) -> Result<()> {
        self.error = None;
        if self.store.task(id).is_none() {
            return Ok(());
        }
        let result = run_txn(
            &mut self.store,
            &mut self.backend,
            |s| {
                s.set_text(id, new_text);
            },
            |b| b.update_task(id, new_text),
        )
        .await;
        if let Err(err) = result {
            self.error = Some(format!("Failed to edit task: {err:#}"));
            return Err(err);
        }
        Ok(())
    }

    /// Optimistically remove a task (input slot re-clamped), then commit.
    /// On failure the snapshot restore brings back the task and the prior
    /// slot position.
    pub async fn delete_task(&mut self, id: &str) -> Result<()> {
        self.error = None;
        if self.store.task(id).is_none() {
            return Ok(());
        }
        let result = run_txn(
            &mut self.store,
            &mut self.backend,
            |s| {
                s.remove(id);
            },
            |b| b.delete_task(id),
        )
        .await;
        if let Err(err) = result {
            self.error = Some(format!("Failed to delete task: {err:#}"));
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    #[derive(Debug, Default)]
    struct MockBackend {
        calls: Vec<String>,
        fail: bool,
        next_id: u64,
    }

    impl MockBackend {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn record(&mut self, call: String) -> Result<()> {
            self.calls.push(call);
            if self.fail {
                bail!("503 service unavailable");
            }
            Ok(())
        }
    }

    impl TaskBackend for MockBackend {
        async fn check_connection(&mut self) -> Result<()> {
            self.record("check".into())
        }

        async fn list_tasks(&mut self) -> Result<Vec<Task>> {
            self.record("list".into())?;
            Ok(vec![Task::new("r1", "remote one"), Task::new("r2", "remote two")])
        }

        async fn create_task(&mut self, text: &str) -> Result<Task> {
            self.record(format!("create {text}"))?;
            self.next_id += 1;
            Ok(Task::new(self.next_id.to_string(), text))
        }

        async fn update_task(&mut self, id: &str, text: &str) -> Result<()> {
            self.record(format!("update {id} {text}"))
        }

        async fn close_task(&mut self, id: &str) -> Result<()> {
            self.record(format!("close {id}"))
        }

        async fn reopen_task(&mut self, id: &str) -> Result<()> {
            self.record(format!("reopen {id}"))
        }

        async fn delete_task(&mut self, id: &str) -> Result<()> {
            self.record(format!("delete {id}"))
        }

        fn set_token(&mut self, _token: &str) {}
    }

    fn sync_with(tasks: Vec<Task>, slot: usize, backend: MockBackend) -> TaskSync<MockBackend> {
        let mut store = TaskStore::from_tasks(tasks);
        store.set_input_index(slot);
        TaskSync::with_store(backend, store)
    }

    #[tokio::test]
    async fn add_blank_text_is_silent_and_offline() {
        let mut sync = sync_with(vec![Task::new("1", "a")], 1, MockBackend::default());
        let before = sync.store().clone();

        assert!(sync.add_task("").await.unwrap().is_none());
        assert!(sync.add_task("   ").await.unwrap().is_none());

        assert_eq!(sync.store(), &before);
        assert!(sync.backend().calls.is_empty());
        assert!(sync.error().is_none());
    }

    #[tokio::test]
    async fn add_appends_canonical_task_and_advances_slot() {
        // backend mints id "2" for the first create
        let backend = MockBackend {
            next_id: 1,
            ..MockBackend::default()
        };
        let mut sync = sync_with(vec![Task::new("1", "a")], 1, backend);

        let added = sync.add_task("b").await.unwrap().unwrap();
        assert_eq!(added.id, "2");
        assert!(!added.completed);

        let ids: Vec<&str> = sync.store().tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(sync.store().input_index(), 2);
        assert_eq!(sync.backend().calls, vec!["create b"]);
    }

    #[tokio::test]
    async fn add_failure_leaves_store_untouched() {
        let mut sync = sync_with(vec![Task::new("1", "a")], 1, MockBackend::failing());
        let before = sync.store().clone();

        assert!(sync.add_task("b").await.is_err());
        assert_eq!(sync.store(), &before);
        assert!(sync.error().unwrap().starts_with("Failed to add task:"));
        assert!(!sync.loading());
    }

    #[tokio::test]
    async fn toggle_twice_is_the_identity() {
        let mut sync = sync_with(vec![Task::new("1", "a")], 1, MockBackend::default());

        sync.toggle_task("1").await.unwrap();
        assert!(sync.store().task("1").unwrap().completed);

        sync.toggle_task("1").await.unwrap();
        assert!(!sync.store().task("1").unwrap().completed);

        assert_eq!(sync.backend().calls, vec!["close 1", "reopen 1"]);
    }

    #[tokio::test]
    async fn toggle_unknown_id_is_a_noop() {
        let mut sync = sync_with(vec![Task::new("1", "a")], 1, MockBackend::default());
        sync.toggle_task("zzz").await.unwrap();
        assert!(sync.backend().calls.is_empty());
    }

    #[tokio::test]
    async fn toggle_failure_rolls_back_completion() {
        let mut sync = sync_with(vec![Task::new("1", "a")], 1, MockBackend::failing());

        assert!(sync.toggle_task("1").await.is_err());
        assert!(!sync.store().task("1").unwrap().completed);
        assert!(sync.error().unwrap().starts_with("Failed to toggle task:"));
    }

    #[tokio::test]
    async fn edit_rewrites_text_and_commits() {
        let mut sync = sync_with(vec![Task::new("1", "a")], 1, MockBackend::default());

        sync.edit_task("1", "a, revised").await.unwrap();
        assert_eq!(sync.store().task("1").unwrap().text, "a, revised");
        assert_eq!(sync.backend().calls, vec!["update 1 a, revised"]);
    }

    #[tokio::test]
    async fn edit_unknown_id_changes_nothing_and_sends_nothing() {
        let mut sync = sync_with(vec![Task::new("1", "a")], 1, MockBackend::default());
        let before = sync.store().clone();

        sync.edit_task("zzz", "nope").await.unwrap();
        assert_eq!(sync.store(), &before);
        assert!(sync.backend().calls.is_empty());
    }

    #[tokio::test]
    async fn edit_failure_restores_snapshot() {
        let mut sync = sync_with(vec![Task::new("1", "a")], 1, MockBackend::failing());

        assert!(sync.edit_task("1", "changed").await.is_err());
        assert_eq!(sync.store().task("1").unwrap().text, "a");
    }

    #[tokio::test]
    async fn delete_removes_and_reclamps_slot() {
        let mut sync = sync_with(
            vec![Task::new("1", "a"), Task::new("2", "b")],
            2,
            MockBackend::default(),
        );

        sync.delete_task("2").await.unwrap();
        assert_eq!(sync.store().len(), 1);
        assert_eq!(sync.store().input_index(), 1);
        assert_eq!(sync.backend().calls, vec!["delete 2"]);
    }

    #[tokio::test]
    async fn delete_failure_restores_list_and_slot_exactly() {
        let mut sync = sync_with(
            vec![Task::new("1", "a"), Task::new("2", "b")],
            2,
            MockBackend::failing(),
        );
        let before = sync.store().clone();

        assert!(sync.delete_task("1").await.is_err());
        assert_eq!(sync.store(), &before);
        assert_eq!(sync.store().input_index(), 2);
        assert!(sync.error().unwrap().starts_with("Failed to delete task:"));
    }

    #[tokio::test]
    async fn load_replaces_list_and_parks_slot_at_end() {
        let mut sync = sync_with(vec![Task::new("old", "stale")], 0, MockBackend::default());

        sync.load_tasks().await.unwrap();
        let ids: Vec<&str> = sync.store().tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
        assert_eq!(sync.store().input_index(), 2);
    }

    #[tokio::test]
    async fn load_failure_keeps_local_list() {
        let mut sync = sync_with(vec![Task::new("old", "stale")], 1, MockBackend::failing());
        let before = sync.store().clone();

        assert!(sync.load_tasks().await.is_err());
        assert_eq!(sync.store(), &before);
        assert!(sync.error().unwrap().starts_with("Failed to load tasks:"));
    }

    #[tokio::test]
    async fn authenticate_sets_and_clears_the_flag() {
        let mut sync = TaskSync::new(MockBackend::default());
        sync.authenticate("tok").await.unwrap();
        assert!(sync.is_authenticated());

        let mut sync = TaskSync::new(MockBackend::failing());
        assert!(sync.authenticate("tok").await.is_err());
        assert!(!sync.is_authenticated());
        assert!(sync.error().unwrap().starts_with("Authentication failed:"));
    }
}
