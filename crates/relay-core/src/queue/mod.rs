//! Queue module: job state, dead letters, the bounded work queue, and retry
//! scheduling.

mod dead_letter;
mod retry;
mod scheduler;
mod store;
pub mod work_queue;

pub use dead_letter::DeadLetterStore;
pub use retry::{Backoff, RetryPolicy};
pub use scheduler::{RetryHandle, RetryScheduler};
pub use store::JobStore;
pub use work_queue::{WorkQueue, WorkReceiver, channel};
