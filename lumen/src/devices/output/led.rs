use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::Arc;

use log::{debug, trace, warn};
use parking_lot::RwLock;

use crate::devices::output::blink::{BlinkControl, BlinkState};
use crate::devices::{Device, Output};
use crate::errors::{Error, HardwareError, InvalidConfiguration};
use crate::hardware::Board;
use crate::io::{Confirmation, IoProtocol, Pin, PinIdOrName, PinModeId};
use crate::utils::task;

/// Polarity of the LED wiring: which physical level lights it.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum DriveMode {
    /// Active high: the pin sources the LED current, "on" is level 1.
    #[default]
    Source = 0,
    /// Active low: the pin sinks the LED current, "on" is level 0.
    Sync = 1,
}

impl DriveMode {
    /// The physical level turning the LED on.
    pub fn on_value(&self) -> f64 {
        match self {
            DriveMode::Source => 1.0,
            DriveMode::Sync => 0.0,
        }
    }

    /// The physical level turning the LED off.
    pub fn off_value(&self) -> f64 {
        1.0 - self.on_value()
    }

    /// Converts a logical intensity into the physical level to write.
    pub fn apply(&self, intensity: f64) -> f64 {
        match self {
            DriveMode::Source => intensity,
            DriveMode::Sync => 1.0 - intensity,
        }
    }
}

impl TryFrom<u8> for DriveMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DriveMode::Source),
            1 => Ok(DriveMode::Sync),
            x => Err(InvalidConfiguration {
                info: format!("drive mode should be SOURCE_DRIVE (0) or SYNC_DRIVE (1), got {}", x),
            }),
        }
    }
}

impl TryFrom<&str> for DriveMode {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "source" | "source_drive" => Ok(DriveMode::Source),
            "sync" | "sync_drive" => Ok(DriveMode::Sync),
            _ => Err(InvalidConfiguration {
                info: format!("drive mode should be SOURCE_DRIVE or SYNC_DRIVE, got {:?}", value),
            }),
        }
    }
}

impl Display for DriveMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DriveMode::Source => write!(f, "SOURCE_DRIVE"),
            DriveMode::Sync => write!(f, "SYNC_DRIVE"),
        }
    }
}

/// Represents a LED controlled by a digital (or PWM capable) output pin.
///
/// The pin mode is chosen once, at creation: PWM if the pin supports it (continuous intensity),
/// OUTPUT otherwise (intensity quantized to on/off).
///
/// Every level change writes the pin right away and returns a [`Confirmation`]: await it (or use
/// [`Confirmation::then`]) to know when the board actually applied the level.
///
/// Clones of a `Led` control the same LED and share its blink state.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug)]
pub struct Led {
    // ########################################
    // # Basics
    /// The pin (id) of the [`Board`] used to control the LED.
    pin: u16,
    /// The LED wiring polarity.
    drive_mode: DriveMode,
    /// Indicates if the pin is used in PWM mode.
    supports_pwm: bool,
    /// The physical level turning the LED on.
    on_value: f64,
    /// The physical level turning the LED off.
    off_value: f64,

    // ########################################
    // # Volatile utility data.
    #[cfg_attr(feature = "serde", serde(skip))]
    protocol: Box<dyn IoProtocol>,
    /// Blink state machine (shared by clones).
    #[cfg_attr(feature = "serde", serde(skip))]
    blink: Arc<RwLock<BlinkState>>,
}

impl Led {
    /// Active high wiring (see [`DriveMode::Source`]).
    pub const SOURCE_DRIVE: DriveMode = DriveMode::Source;
    /// Active low wiring (see [`DriveMode::Sync`]).
    pub const SYNC_DRIVE: DriveMode = DriveMode::Sync;

    /// Creates an instance of an active high LED attached to a given board.
    ///
    /// # Errors
    /// * `UnknownPin`: the pin does not exist for this board.
    /// * `IncompatibleMode`: the pin does not support OUTPUT mode.
    pub fn new<T: Into<PinIdOrName>>(board: &Board, pin: T) -> Result<Self, Error> {
        Self::with_drive_mode(board, pin, DriveMode::Source)
    }

    /// Creates an instance of a LED attached to a given board, with the given wiring polarity.
    ///
    /// The drive mode can be given as a [`DriveMode`], its numeric value (0: source, 1: sync) or its
    /// name ("source", "sync").
    ///
    /// # Errors
    /// * `InvalidConfiguration`: the drive mode is not recognized.
    /// * `UnknownPin`: the pin does not exist for this board.
    /// * `IncompatibleMode`: the pin does not support OUTPUT mode.
    pub fn with_drive_mode<T, D>(board: &Board, pin: T, drive_mode: D) -> Result<Self, Error>
    where
        T: Into<PinIdOrName>,
        D: TryInto<DriveMode>,
        Error: From<D::Error>,
    {
        let drive_mode: DriveMode = drive_mode.try_into()?;
        let pin = board.get_io().get_pin(pin)?.clone();
        let supports_pwm = pin.supports_mode(PinModeId::PWM).is_some();

        let mut led = Self {
            pin: pin.id,
            drive_mode,
            supports_pwm,
            on_value: drive_mode.on_value(),
            off_value: drive_mode.off_value(),
            protocol: board.get_protocol(),
            blink: Arc::new(RwLock::new(BlinkState::Idle)),
        };

        let mode = match supports_pwm {
            true => PinModeId::PWM,
            false => PinModeId::OUTPUT,
        };
        led.protocol.set_pin_mode(led.pin, mode)?;
        debug!("Led (pin={}) configured in {} mode, {}", led.pin, mode, drive_mode);

        Ok(led)
    }

    /// Turns the LED on. Any blinking is stopped first.
    pub fn on(&mut self) -> Result<Confirmation, Error> {
        self.cancel_blink();
        self.write(self.on_value)
    }

    /// Turns the LED off. Any blinking is stopped first.
    pub fn off(&mut self) -> Result<Confirmation, Error> {
        self.cancel_blink();
        self.write(self.off_value)
    }

    /// Flips the raw pin level (`1 - level`), regardless of the drive mode.
    ///
    /// While a blink is set up, toggling would fight the blink loop: the LED is turned off instead.
    pub fn toggle(&mut self) -> Result<Confirmation, Error> {
        let blinking = !self.blink.read().is_idle();
        match blinking {
            true => self.off(),
            false => self.write(1.0 - self.get_intensity()),
        }
    }

    /// Records the blink phase duration (in ms) without starting to blink.
    ///
    /// If the LED is already blinking, the running loop uses the new interval from its next phase on.
    /// Use [`Led::blink_with`] to actually start blinking.
    pub fn blink(&mut self, interval: u64) -> &Self {
        self.blink.write().set_interval(interval);
        debug!("Led (pin={}) blink interval set to {}ms", self.pin, interval);
        self
    }

    /// Blinks the LED in phases of `interval` ms. This is a background loop which can be stopped by
    /// calling [`Led::stop_blink()`] (or any of [`Led::on()`] / [`Led::off()`]).
    ///
    /// Each phase toggles the LED, waits for the board to confirm the new level, then calls `callback`
    /// with the confirmed pin. The first toggle happens before this returns. The next phase is due one `interval` after the previous toggle, whatever
    /// time the confirmation and the callback took.
    ///
    /// Calling this again restarts blinking: the previous loop is stopped before the new one starts.
    /// A board which never confirms a level stalls the loop (no more callbacks); a callback error ends it.
    ///
    /// # Errors
    /// * `RuntimeError`: not running inside `#[lumen::runtime]`.
    pub fn blink_with<F, Fut>(&mut self, interval: u64, callback: F) -> Result<&Self, Error>
    where
        F: FnMut(Pin) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        self.cancel_blink();

        // The first phase starts right away: the level is flipped before returning.
        let control = Arc::new(BlinkControl::new(interval));
        let confirmation = self.write(1.0 - self.get_intensity())?;
        control.mark_toggle();

        // Locked before spawning: the loop cannot release a state not stored yet.
        let blink = self.blink.clone();
        let mut state = blink.write();
        let handler = task::run(self.clone().blink_loop(control.clone(), confirmation, callback))?;
        *state = BlinkState::Active { control, handler };
        drop(state);
        debug!("Led (pin={}) starts blinking every {}ms", self.pin, interval);

        Ok(self)
    }

    /// Stops blinking and turns the LED off.
    pub fn stop_blink(&mut self) -> Result<Confirmation, Error> {
        self.off()
    }

    /// Alias of [`Led::stop_blink()`].
    pub fn unblink(&mut self) -> Result<Confirmation, Error> {
        self.stop_blink()
    }

    // ########################################
    // Setters and Getters.

    /// Retrieves the PIN (id) used to control the LED.
    pub fn get_pin(&self) -> u16 {
        self.pin
    }

    /// Retrieves [`Pin`] information.
    pub fn get_pin_info(&self) -> Result<Pin, Error> {
        let lock = self.protocol.get_io().read();
        Ok(lock.get_pin(self.pin)?.clone())
    }

    /// Retrieves the LED wiring polarity.
    pub fn get_drive_mode(&self) -> DriveMode {
        self.drive_mode
    }

    /// Indicates if the LED intensity can vary continuously (PWM pin).
    pub fn supports_pwm(&self) -> bool {
        self.supports_pwm
    }

    /// Retrieves the physical level turning the LED on.
    pub fn get_on_value(&self) -> f64 {
        self.on_value
    }

    /// Retrieves the physical level turning the LED off.
    pub fn get_off_value(&self) -> f64 {
        self.off_value
    }

    /// Retrieves the raw pin level (between 0 and 1).
    ///
    /// _/!\ This is NOT corrected by the drive mode: a SYNC_DRIVE LED fully on reads 0._
    pub fn get_intensity(&self) -> f64 {
        self.protocol
            .get_io()
            .read()
            .get_pin(self.pin)
            .map(|pin| pin.value)
            .unwrap_or_default()
    }

    /// Sets the LED intensity (between 0 and 1).
    ///
    /// On a pin without PWM, the intensity is rounded to on/off: below 0.5 is off, 0.5 and above is on.
    /// The level written is then inverted for a SYNC_DRIVE LED. Blinking is not interrupted.
    pub fn set_intensity(&mut self, intensity: f64) -> Result<Confirmation, Error> {
        let intensity = match self.supports_pwm {
            true => intensity,
            false => match intensity < 0.5 {
                true => 0.0,
                false => 1.0,
            },
        };
        self.write(self.drive_mode.apply(intensity))
    }

    /// Indicates if the LED is currently blinking.
    pub fn is_blinking(&self) -> bool {
        self.blink.read().is_active()
    }

    /// Retrieves the blink phase duration (in ms), if a blink is set up.
    pub fn get_blink_interval(&self) -> Option<u64> {
        self.blink.read().get_interval()
    }

    // ########################################
    // Internals.

    /// Writes a raw level to the pin and prepares the confirmation of the level actually stored.
    fn write(&mut self, level: f64) -> Result<Confirmation, Error> {
        match self.supports_pwm {
            true => self.protocol.analog_write(self.pin, level),
            false => self.protocol.digital_write(self.pin, level >= 0.5),
        }?;
        let value = self.get_intensity();
        trace!("Led (pin={}) level: {}", self.pin, value);
        Ok(Confirmation::new(self.protocol.clone(), self.pin, value))
    }

    /// Transitions the blink state machine to idle, neutralizing any running loop.
    fn cancel_blink(&mut self) {
        let mut state = self.blink.write();
        if !state.is_idle() {
            std::mem::take(&mut *state).cancel();
            debug!("Led (pin={}) stops blinking", self.pin);
        }
    }

    /// Toggles the pin unless the loop has been stopped in the meantime.
    ///
    /// The blink state lock is held meanwhile: a concurrent stop either happens before (no toggle) or
    /// after (its own level wins).
    fn blink_toggle(&mut self, control: &BlinkControl) -> Result<Option<Confirmation>, Error> {
        let blink = self.blink.clone();
        let _state = blink.read();
        if !control.is_enabled() {
            return Ok(None);
        }
        let confirmation = self.write(1.0 - self.get_intensity())?;
        control.mark_toggle();
        Ok(Some(confirmation))
    }

    /// The blink loop: confirm, callback, wait for the next phase, toggle.
    async fn blink_loop<F, Fut>(
        mut self,
        control: Arc<BlinkControl>,
        first: Confirmation,
        mut callback: F,
    ) -> Result<(), Error>
    where
        F: FnMut(Pin) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let mut confirmation = first;
        loop {
            let pin = match confirmation.wait().await {
                Ok(pin) => pin,
                Err(Error::HardwareError {
                    source: source @ HardwareError::UnconfirmedState { .. },
                }) => {
                    warn!("Led (pin={}) blink stalled: {}", self.pin, source);
                    return Ok(());
                }
                Err(err) => return Err(err),
            };

            if !control.is_enabled() {
                return Ok(());
            }
            if let Err(err) = callback(pin).await {
                self.blink.write().release(&control);
                debug!("Led (pin={}) blink ended by its callback", self.pin);
                return Err(err);
            }
            if !control.is_enabled() {
                return Ok(());
            }

            tokio::time::sleep_until(control.get_next_deadline()).await;
            confirmation = match self.blink_toggle(&control)? {
                Some(confirmation) => confirmation,
                None => return Ok(()),
            };
        }
    }
}

impl Display for Led {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Led (pin={}) [intensity={}, drive={}, pwm={}, blinking={}]",
            self.pin,
            self.get_intensity(),
            self.drive_mode,
            self.supports_pwm,
            self.is_blinking(),
        )
    }
}

impl Device for Led {}

impl Output for Led {
    /// Retrieves the raw pin level (see [`Led::get_intensity()`]).
    fn get_state(&self) -> f64 {
        self.get_intensity()
    }

    /// Internal only: you should rather use [`Led::set_intensity()`], [`Led::on()`] or [`Led::off()`].
    fn set_state(&mut self, state: f64) -> Result<f64, Error> {
        self.set_intensity(state)?;
        Ok(self.get_intensity())
    }

    /// The default intensity: 0, ie logically off.
    /// This is an intensity, not a raw level: for a SYNC_DRIVE LED it is written as 1.
    fn get_default(&self) -> f64 {
        0.0
    }

    /// Indicates the busy status, ie if the LED is blinking.
    fn is_busy(&self) -> bool {
        self.is_blinking()
    }

    /// Stops blinking.
    /// This does not turn off the LED: it remains in its current state.
    fn stop(&mut self) {
        self.cancel_blink();
    }
}


#[cfg(feature = "serde")]
#[cfg(test)]
mod serde_tests {
    use crate::devices::{DriveMode, Led};
    use crate::hardware::Board;
    use crate::mocks::io_protocol::MockIoProtocol;

    #[test]
    fn test_led_serialize() {
        let board = Board::new(MockIoProtocol::default());
        let led = Led::with_drive_mode(&board, 9, DriveMode::Sync).unwrap();
        let json = serde_json::to_string(&led).unwrap();
        assert_eq!(
            json,
            r#"{"pin":9,"drive_mode":"Sync","supports_pwm":true,"on_value":0.0,"off_value":1.0}"#
        );
    }

    #[test]
    fn test_drive_mode_deserialize() {
        let mode: DriveMode = serde_json::from_str(r#""Source""#).unwrap();
        assert_eq!(mode, DriveMode::Source);
    }
}
