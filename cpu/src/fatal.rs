//! Conditions from which the simulator cannot continue.
//!
//! A failing teletype channel or a runtime whose state was left
//! half-updated by a panic cannot be recovered from inside the
//! simulator.  We log the reason and abort the process.
use std::fmt::Display;

use tracing::{event, Level};

pub(crate) fn abort_with(what: &str, reason: &dyn Display) -> ! {
    event!(Level::ERROR, "{what}: {reason}");
    std::process::abort()
}
