//! Typed handles over the collection actors. The order client is the
//! orchestrator: it consults the user and menu clients and publishes to the
//! notification hub.

#[macro_use]
pub mod macros;

pub mod user_client;
pub mod menu_client;
pub mod order_client;

pub use user_client::*;
pub use menu_client::*;
pub use order_client::*;
