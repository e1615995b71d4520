//! Per-user task lists.

mod store;
mod task;

pub use store::TaskStore;
pub use task::{format_list, Task};
