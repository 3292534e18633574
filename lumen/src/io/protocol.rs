//! Defines the contract a board protocol must fulfil to drive devices.

use std::any::type_name;
use std::fmt::{Debug, Display};
use std::sync::Arc;

use dyn_clone::DynClone;
use futures::future::BoxFuture;
use parking_lot::RwLock;

use crate::errors::Error;
use crate::io::{IoData, Pin, PinModeId};

// Makes a Box<dyn IoProtocol> clone (used for Board and device cloning).
dyn_clone::clone_trait_object!(IoProtocol);

/// Defines the trait all protocols must implement.
///
/// A protocol is the "board" side of a device: it owns the pins ([`IoData`]), configures their
/// mode, writes their level and can read back the level the hardware actually reports.
#[cfg_attr(feature = "serde", typetag::serde(tag = "type"))]
pub trait IoProtocol: DynClone + Send + Sync + Debug + Display {
    // ########################################
    // Inner data related functions

    /// Returns a protected arc to the inner [`IoData`].
    fn get_io(&self) -> &Arc<RwLock<IoData>>;

    /// Returns the protocol name (used for Display only)
    fn get_protocol_name(&self) -> &'static str {
        type_name::<Self>().split("::").last().unwrap_or("IoProtocol")
    }

    // ########################################
    // Functions specifically bound to the protocol.

    /// Opens the communication using the underlying protocol.
    fn open(&mut self) -> Result<(), Error>;
    /// Gracefully shuts down the communication.
    fn close(&mut self) -> Result<(), Error>;
    /// Checks if the communication is opened using the underlying protocol.
    fn is_connected(&self) -> bool;

    // ########################################
    // Read/Write on pins

    /// Sets the `mode` of the specified `pin` (synchronous configuration).
    fn set_pin_mode(&mut self, pin: u16, mode: PinModeId) -> Result<(), Error>;

    /// Writes `level` to the digital `pin`.
    fn digital_write(&mut self, pin: u16, level: bool) -> Result<(), Error>;

    /// Writes `level` (normalized between 0 and 1) to the PWM `pin`.
    /// The protocol maps the level to the resolution of the pin.
    fn analog_write(&mut self, pin: u16, level: f64) -> Result<(), Error>;

    /// Asks the board to report the state of `pin`.
    ///
    /// The returned future resolves with the [`Pin`] once the board answered: its `state` field holds
    /// the level the hardware reports. There is no timeout: a board that never answers leaves the
    /// future pending.
    fn query_pin_state(&self, pin: u16) -> BoxFuture<'static, Result<Pin, Error>>;
}
