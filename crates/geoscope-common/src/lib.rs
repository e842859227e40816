//! # geoscope-common
//!
//! Small pieces shared by every geoscope crate:
//!
//! - [`Clock`]: an injectable source of "now", so time-to-live logic can be
//!   driven deterministically in tests ([`ManualClock`]) and by the wall clock
//!   in production ([`SystemClock`]).
//! - [`run_with_timeout`]: runs a blocking collaborator call on a worker
//!   thread and gives up waiting after a caller-supplied duration.

mod clock;
mod deadline;

pub use clock::{Clock, ManualClock, SystemClock};
pub use deadline::{run_with_timeout, DeadlineError};
