//! Domain model (IDs, jobs, dead letters, tasks, outbox events, errors).

pub mod dead_letter;
pub mod errors;
pub mod events;
pub mod ids;
pub mod job;
pub mod outbox;
pub mod task;

pub use self::dead_letter::DeadLetterEntry;
pub use self::errors::{ErrorKind, JobError, PublishError, RelayError, TransitionError};
pub use self::events::DomainEvent;
pub use self::ids::{EventId, Id, IdMarker, JobId, TaskId};
pub use self::job::{Job, JobStatus, JobType};
pub use self::outbox::OutboxEvent;
pub use self::task::Task;
