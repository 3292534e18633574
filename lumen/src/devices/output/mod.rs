use crate::devices::Device;
use crate::errors::Error;

pub mod blink;
pub mod led;

/// A trait for devices that can act on the world: the board "outputs" some state onto them.
///
/// This trait extends [`Device`] and is intended for actuators that requires the same capabilities
/// as devices, including debugging, cloning, and concurrency support.
pub trait Output: Device {
    /// Retrieves the actuator current state.
    fn get_state(&self) -> f64;
    /// Internal only.
    fn set_state(&mut self, state: f64) -> Result<f64, Error>;
    /// Retrieves the actuator default (or neutral) state.
    fn get_default(&self) -> f64;
    /// Resets the actuator to default (or neutral) state.
    fn reset(&mut self) -> Result<f64, Error> {
        self.set_state(self.get_default())
    }
    /// Indicates the busy status, ie if the device is running a background loop.
    fn is_busy(&self) -> bool;
    /// Stops the current background loop, if any.
    fn stop(&mut self);
}
dyn_clone::clone_trait_object!(Output);
