//! Defines pieces of hardware that can be remotely controlled through IO exchange messages.

mod board;

pub use board::Board;
