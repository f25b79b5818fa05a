//! Order collection: creation rules, the status state machine, payment marks.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
