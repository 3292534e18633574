use std::fmt::Display;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::RwLock;

use crate::errors::Error;
use crate::errors::HardwareError::IncompatibleMode;
use crate::io::{IoData, IoProtocol, Pin, PinModeId};
use crate::mocks::create_test_io_data;
use crate::pause;

/// Mock implementation of [`IoProtocol`]: an in-memory board.
/// Uses [`create_test_io_data`] for the pins.
///
/// The board "applies" a written level when its state is queried: the reported `state` is then
/// the last written `value` (unless the confirmation is stalled).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct MockIoProtocol {
    #[cfg_attr(feature = "serde", serde(skip))]
    data: Arc<RwLock<IoData>>,
    /// Delay (in ms) before the board answers a state query.
    latency: u64,
    /// When set, the board never applies written levels: confirmations always mismatch.
    stalled: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    queries: Arc<AtomicUsize>,
}

impl Default for MockIoProtocol {
    fn default() -> Self {
        Self {
            data: Arc::new(RwLock::new(create_test_io_data())),
            latency: 0,
            stalled: false,
            queries: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MockIoProtocol {
    /// Sets the delay (in ms) the board takes to answer a state query.
    pub fn with_latency(mut self, latency: u64) -> Self {
        self.latency = latency;
        self
    }

    /// Makes the board (not) apply written levels: confirmations never match.
    pub fn with_stalled_confirmation(mut self, stalled: bool) -> Self {
        self.stalled = stalled;
        self
    }

    /// Returns how many state queries the board received (shared by all clones).
    pub fn get_query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl Display for MockIoProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data.read();
        write!(
            f,
            "{} [firmware={}, version={}]",
            self.get_protocol_name(),
            data.firmware_name,
            data.firmware_version,
        )
    }
}

#[cfg_attr(feature = "serde", typetag::serde)]
impl IoProtocol for MockIoProtocol {
    fn get_io(&self) -> &Arc<RwLock<IoData>> {
        &self.data
    }

    fn open(&mut self) -> Result<(), Error> {
        self.data.write().connected = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        self.data.write().connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.data.read().connected
    }

    fn set_pin_mode(&mut self, pin: u16, mode: PinModeId) -> Result<(), Error> {
        let mut lock = self.data.write();
        let pin_instance = lock.get_pin_mut(pin)?;
        let supported_mode = pin_instance.supports_mode(mode).ok_or(IncompatibleMode {
            pin,
            mode,
            context: "try to set pin mode",
        })?;
        pin_instance.mode = supported_mode;
        Ok(())
    }

    fn digital_write(&mut self, pin: u16, level: bool) -> Result<(), Error> {
        let mut lock = self.data.write();
        let pin_instance = lock.get_pin_mut(pin)?;
        pin_instance.validate_current_mode(PinModeId::OUTPUT)?;
        pin_instance.value = f64::from(u8::from(level));
        Ok(())
    }

    fn analog_write(&mut self, pin: u16, level: f64) -> Result<(), Error> {
        let mut lock = self.data.write();
        let pin_instance = lock.get_pin_mut(pin)?;
        pin_instance.validate_current_mode(PinModeId::PWM)?;
        pin_instance.value = level.clamp(0.0, 1.0);
        Ok(())
    }

    fn query_pin_state(&self, pin: u16) -> BoxFuture<'static, Result<Pin, Error>> {
        let data = self.data.clone();
        let latency = self.latency;
        let stalled = self.stalled;
        self.queries.fetch_add(1, Ordering::SeqCst);

        Box::pin(async move {
            if latency > 0 {
                pause!(latency);
            }
            let mut lock = data.write();
            let pin_instance = lock.get_pin_mut(pin)?;
            if !stalled {
                pin_instance.state = pin_instance.value;
            }
            Ok(pin_instance.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::io::{IoProtocol, PinModeId};
    use crate::mocks::io_protocol::MockIoProtocol;

    #[test]
    fn test_open_close() {
        let mut protocol = MockIoProtocol::default();
        assert!(!protocol.is_connected());
        assert!(protocol.open().is_ok());
        assert!(protocol.is_connected());
        assert!(protocol.close().is_ok());
        assert!(!protocol.is_connected());
    }

    #[test]
    fn test_set_pin_mode() {
        let mut protocol = MockIoProtocol::default();
        assert!(protocol.set_pin_mode(9, PinModeId::PWM).is_ok());
        assert_eq!(protocol.get_io().read().get_pin(9).unwrap().mode.id, PinModeId::PWM);
        assert_eq!(
            protocol
                .set_pin_mode(13, PinModeId::PWM)
                .err()
                .unwrap()
                .to_string(),
            "Hardware error: Pin (13) not compatible with mode (PWM) - try to set pin mode."
        );
        assert!(protocol.set_pin_mode(66, PinModeId::OUTPUT).is_err());
    }

    #[test]
    fn test_writes() {
        let mut protocol = MockIoProtocol::default();
        assert!(protocol.digital_write(13, true).is_ok());
        assert_eq!(protocol.get_io().read().get_pin(13).unwrap().value, 1.0);
        // Pin 9 is not in PWM mode yet.
        assert!(protocol.analog_write(9, 0.5).is_err());
        protocol.set_pin_mode(9, PinModeId::PWM).unwrap();
        assert!(protocol.analog_write(9, 0.5).is_ok());
        assert_eq!(protocol.get_io().read().get_pin(9).unwrap().value, 0.5);
        assert!(protocol.analog_write(9, 1.5).is_ok());
        assert_eq!(protocol.get_io().read().get_pin(9).unwrap().value, 1.0);
        // Pin 9 is not in OUTPUT mode anymore.
        assert!(protocol.digital_write(9, true).is_err());
    }

    #[lumen_macros::test]
    async fn test_query_pin_state() {
        let mut protocol = MockIoProtocol::default();
        protocol.digital_write(13, true).unwrap();
        assert_eq!(protocol.get_io().read().get_pin(13).unwrap().state, 0.0);
        let pin = protocol.query_pin_state(13).await.unwrap();
        assert_eq!(pin.state, 1.0);
        assert_eq!(protocol.get_io().read().get_pin(13).unwrap().state, 1.0);
        assert_eq!(protocol.clone().get_query_count(), 1);

        let stalled = MockIoProtocol::default().with_stalled_confirmation(true);
        stalled.clone().digital_write(13, true).unwrap();
        assert_eq!(stalled.query_pin_state(13).await.unwrap().state, 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            format!("{}", MockIoProtocol::default()),
            "MockIoProtocol [firmware=Fake firmware, version=fake.1.0]"
        );
    }
}
