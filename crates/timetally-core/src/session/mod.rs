//! Activity session state machine.

mod machine;

pub use machine::{compute_elapsed, current_activity, start_activity, StartOutcome};
