use std::fmt::{Display, Formatter};
use std::future::{Future, IntoFuture};

use futures::future::BoxFuture;
use log::{trace, warn};

use crate::errors::HardwareError::UnconfirmedState;
use crate::errors::{Error, HardwareError};
use crate::io::{IoProtocol, Pin};
use crate::utils::task;
use crate::utils::task::TaskHandler;

/// Hardware read-back of a level written to a pin.
///
/// Writing a level is synchronous, knowing that the board actually applied it is not: a
/// `Confirmation` queries the board (see [`IoProtocol::query_pin_state`]) and checks that the
/// reported state matches the written level.
///
/// Nothing is sent to the board until the confirmation is awaited (or [`Confirmation::then`] is
/// used): dropping it is a fire-and-forget write.
///
/// # Example
/// ```ignore
/// use lumen::devices::Led;
/// use lumen::hardware::Board;
/// use lumen::mocks::io_protocol::MockIoProtocol;
///
/// #[lumen::runtime]
/// async fn main() {
///     let board = Board::new(MockIoProtocol::default());
///     let mut led = Led::new(&board, 13).unwrap();
///
///     // Fire and forget.
///     led.on().unwrap();
///     // Wait for the board to confirm.
///     let pin = led.off().unwrap().await.unwrap();
///     assert_eq!(pin.state, 0.0);
///     // Callback style: the callback runs once the board confirmed.
///     led.toggle().unwrap().then(|pin| async move {
///         println!("LED is now {}", pin.state);
///         Ok(())
///     }).unwrap();
/// }
/// ```
pub struct Confirmation {
    protocol: Box<dyn IoProtocol>,
    pin: u16,
    expected: f64,
}

impl Confirmation {
    pub(crate) fn new(protocol: Box<dyn IoProtocol>, pin: u16, expected: f64) -> Self {
        Self {
            protocol,
            pin,
            expected,
        }
    }

    /// Returns the pin (id) to confirm.
    pub fn get_pin(&self) -> u16 {
        self.pin
    }

    /// Returns the level the board is expected to report.
    pub fn get_expected(&self) -> f64 {
        self.expected
    }

    /// Queries the board and waits for its answer.
    ///
    /// # Errors
    /// * `UnconfirmedState`: the board reported a state different from the written level.
    /// * any error of the underlying protocol.
    pub async fn wait(self) -> Result<Pin, Error> {
        let pin = self.protocol.query_pin_state(self.pin).await?;
        trace!(
            "Pin {} confirmation: expected={} reported={}",
            self.pin,
            self.expected,
            pin.state
        );
        match pin.state == self.expected {
            true => Ok(pin),
            false => Err(Error::from(UnconfirmedState {
                pin: self.pin,
                expected: self.expected,
                reported: pin.state,
            })),
        }
    }

    /// Runs `callback` in a background task once the board confirmed the level.
    ///
    /// The callback is never called if the board reports another state: this is logged, not
    /// reported as a task failure.
    ///
    /// # Errors
    /// * `RuntimeError`: not running inside `#[lumen::runtime]`.
    pub fn then<F, Fut>(self, callback: F) -> Result<TaskHandler, Error>
    where
        F: FnOnce(Pin) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        task::run(async move {
            match self.wait().await {
                Ok(pin) => callback(pin).await,
                Err(Error::HardwareError {
                    source: source @ HardwareError::UnconfirmedState { .. },
                }) => {
                    warn!("Confirmation callback dropped: {}", source);
                    Ok(())
                }
                Err(err) => Err(err),
            }
        })
    }
}

impl IntoFuture for Confirmation {
    type Output = Result<Pin, Error>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

impl Display for Confirmation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Confirmation (pin={}) [expected={}, protocol={}]",
            self.pin,
            self.expected,
            self.protocol.get_protocol_name()
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use crate::io::Confirmation;
    use crate::io::IoProtocol;
    use crate::mocks::io_protocol::MockIoProtocol;
    use crate::pause;

    #[lumen_macros::test]
    async fn test_wait_confirmed() {
        let mut protocol = MockIoProtocol::default();
        protocol.digital_write(13, true).unwrap();
        let confirmation = Confirmation::new(Box::new(protocol.clone()), 13, 1.0);
        let pin = confirmation.await.unwrap();
        assert_eq!(pin.id, 13);
        assert_eq!(pin.state, 1.0);
        assert_eq!(protocol.get_query_count(), 1);
    }

    #[lumen_macros::test]
    async fn test_wait_unconfirmed() {
        let protocol = MockIoProtocol::default().with_stalled_confirmation(true);
        let mut writer = protocol.clone();
        writer.digital_write(13, true).unwrap();
        let result = Confirmation::new(Box::new(protocol), 13, 1.0).wait().await;
        assert_eq!(
            result.err().unwrap().to_string(),
            "Hardware error: Pin (13) state not confirmed - expected 1, board reported 0."
        );
    }

    #[lumen_macros::test]
    async fn test_wait_unknown_pin() {
        let confirmation = Confirmation::new(Box::new(MockIoProtocol::default()), 66, 1.0);
        assert!(confirmation.wait().await.is_err());
    }

    #[lumen_macros::test]
    async fn test_then_is_not_synchronous() {
        let protocol = MockIoProtocol::default().with_latency(50);
        let flag = Arc::new(AtomicBool::new(false));
        let moved_flag = flag.clone();

        Confirmation::new(Box::new(protocol), 13, 0.0)
            .then(move |pin| async move {
                assert_eq!(pin.state, 0.0);
                moved_flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        assert!(!flag.load(Ordering::SeqCst));
        pause!(150);
        assert!(flag.load(Ordering::SeqCst));
    }

    #[lumen_macros::test]
    async fn test_then_never_fires_when_unconfirmed() {
        let protocol = MockIoProtocol::default().with_stalled_confirmation(true);
        let flag = Arc::new(AtomicBool::new(false));
        let moved_flag = flag.clone();

        let handler = Confirmation::new(Box::new(protocol), 13, 1.0)
            .then(move |_| async move {
                moved_flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        pause!(100);
        assert!(handler.is_finished());
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_display() {
        let confirmation = Confirmation::new(Box::new(MockIoProtocol::default()), 9, 0.25);
        assert_eq!(confirmation.get_pin(), 9);
        assert_eq!(confirmation.get_expected(), 0.25);
        assert_eq!(
            format!("{}", confirmation),
            "Confirmation (pin=9) [expected=0.25, protocol=MockIoProtocol]"
        );
    }
}
