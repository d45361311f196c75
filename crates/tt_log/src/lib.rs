//! Text logging (nothing to do with video frames) for use in the tracktext crates.
//!
//! * `trace`: spammy things
//! * `debug`: things that might be useful when debugging
//! * `info`: things that we want to show to users
//! * `warn`: problems that we can recover from
//! * `error`: problems that lead to loss of functionality or data

pub use log::{debug, error, info, trace, warn};

pub use log::{Level, LevelFilter};

#[cfg(feature = "setup")]
mod setup;

#[cfg(feature = "setup")]
pub use setup::setup_logging;
