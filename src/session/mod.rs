/*!
 * Task tracking for background generations.
 *
 * - `start_generation` runs a pipeline on its own tokio task
 * - `poll_status` returns the latest snapshot of a task
 */

pub mod manager;
pub mod models;

pub use manager::TaskStore;
pub use models::{TaskError, TaskState, TaskStatus};
