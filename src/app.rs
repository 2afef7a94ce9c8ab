//! Application module: the model the TUI renders and the runtime mutates.
//!
//! `App` lives in `app::model`. It mirrors the audio thread's snapshots and
//! keeps purely visual state such as the cursor and panel toggles.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
