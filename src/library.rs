//! Track references, library scanning and track resolution.
//!
//! `TrackRef` is the unit the play queue holds; `scan` builds them from a
//! directory and `TrackProvider` turns them into playable sources on demand.

mod display;
mod model;
mod provider;
mod scan;

pub use display::display_from_fields;
pub use model::*;
pub use provider::*;
pub use scan::scan;

#[cfg(test)]
mod tests;
