//! Business entities. Plain data with no actor concerns.

pub mod user;
pub mod menu;
pub mod order;

pub use user::*;
pub use menu::*;
pub use order::*;
