use std::fmt::Display;
use std::ops::{Deref, DerefMut};

use log::trace;
use parking_lot::RwLockReadGuard;

use crate::errors::Error;
use crate::io::{IoData, IoProtocol};

/// Represents a physical board (Arduino most-likely) where your [`crate::devices::Device`] can be attached
/// and controlled through this API.
///
/// The board gives access to [`IoData`] through a communication [`IoProtocol`]: talking to the
/// actual hardware is the protocol's business.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Board {
    /// The inner protocol used by this Board.
    protocol: Box<dyn IoProtocol>,
}

impl Board {
    /// Creates a board using a given protocol.
    ///
    /// **_/!\ The board will NOT be connected until the [`Board::open`] method is called._**
    pub fn new<P: IoProtocol + 'static>(protocol: P) -> Self {
        Self {
            protocol: Box::new(protocol),
        }
    }

    /// Returns the protocol used.
    ///
    /// NOTE: this is private to the crate since board already gives access to protocol methods via Deref.
    /// This method is only used internally in all device constructors to clone the protocol into the
    /// device.
    pub(crate) fn get_protocol(&self) -> Box<dyn IoProtocol> {
        self.protocol.clone()
    }

    /// Opens the board connexion (using the configured protocol).
    pub fn open(mut self) -> Result<Self, Error> {
        self.protocol.open()?;
        trace!("Board is ready: {:#?}", self.get_io());
        Ok(self)
    }

    /// Closes the board connexion (using the configured protocol).
    pub fn close(mut self) -> Result<Self, Error> {
        self.protocol.close()?;
        trace!("Board is closed");
        Ok(self)
    }

    /// Easy access to hardware data through the board.
    pub fn get_io(&self) -> RwLockReadGuard<IoData> {
        self.protocol.get_io().read()
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Board ({})", self.protocol)
    }
}

impl Deref for Board {
    type Target = Box<dyn IoProtocol>;

    fn deref(&self) -> &Self::Target {
        &self.protocol
    }
}

impl DerefMut for Board {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.protocol
    }
}
