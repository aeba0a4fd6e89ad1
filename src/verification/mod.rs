//! Running decks through an external circuit simulator.

pub mod xyce;

pub use xyce::{run_xyce, XyceParams};
