//! User collection: profile records, unique emails, immutable roles.

pub mod entity;
pub mod error;

pub use error::*;
