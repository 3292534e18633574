//! Defines the devices that can be attached to a [`Board`](crate::hardware::Board).

use std::fmt::{Debug, Display};

use dyn_clone::DynClone;

pub use crate::devices::output::blink::{BlinkControl, DEFAULT_BLINK_INTERVAL};
pub use crate::devices::output::led::{DriveMode, Led};
pub use crate::devices::output::Output;

pub mod output;

/// Base trait of everything attached to a board.
///
/// It carries no behavior: a device only needs to be printable, cloneable (clones share their
/// hardware state) and shareable across tasks.
pub trait Device: Debug + Display + DynClone + Send + Sync {}
dyn_clone::clone_trait_object!(Device);
