//! Defines the board side contracts devices rely on: pins data and the protocol to drive them.

mod confirmation;
mod data;
mod protocol;

pub use confirmation::*;
pub use data::*;
pub use protocol::*;
