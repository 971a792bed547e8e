//! tally-core: task model, list state and optimistic sync for the tally todo app.
//!
//! Everything in here is plain logic with no IO; the network backend is a
//! trait so the sync layer can be exercised against an in-memory double.

pub mod rows;
pub mod store;
pub mod sync;
pub mod task;

pub use rows::Row;
pub use store::{Snapshot, TaskStore};
pub use sync::{run_txn, TaskBackend, TaskSync};
pub use task::{RemoteMeta, Task};
