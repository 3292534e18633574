use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::time::{Duration, Instant};

use crate::utils::task::TaskHandler;

/// Default blink phase duration (in ms).
pub const DEFAULT_BLINK_INTERVAL: u64 = 1000;

/// Control block shared between a [`Led`](crate::devices::Led) and its running blink loop.
///
/// The loop checks `enabled` after each hardware confirmation and before each re-arm: once disabled,
/// an in-flight confirmation ends the loop instead of rescheduling it.
#[derive(Debug)]
pub struct BlinkControl {
    enabled: AtomicBool,
    interval: AtomicU64,
    last_toggle: RwLock<Option<Instant>>,
}

impl BlinkControl {
    pub(crate) fn new(interval: u64) -> Self {
        Self {
            enabled: AtomicBool::new(true),
            interval: AtomicU64::new(interval),
            last_toggle: RwLock::new(None),
        }
    }

    /// Indicates if the loop is allowed to go on.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub(crate) fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    /// Returns the phase duration (in ms).
    pub fn get_interval(&self) -> u64 {
        self.interval.load(Ordering::SeqCst)
    }

    pub(crate) fn set_interval(&self, interval: u64) {
        self.interval.store(interval, Ordering::SeqCst);
    }

    /// Returns the instant of the last toggle, if any.
    pub fn get_last_toggle(&self) -> Option<Instant> {
        *self.last_toggle.read()
    }

    pub(crate) fn mark_toggle(&self) {
        *self.last_toggle.write() = Some(Instant::now());
    }

    /// Returns when the next toggle is due: one interval after the last toggle.
    ///
    /// The time spent confirming and running the callback is thereby absorbed by the wait: the period
    /// does not drift. A deadline already in the past means "now".
    pub fn get_next_deadline(&self) -> Instant {
        let interval = Duration::from_millis(self.get_interval());
        match self.get_last_toggle() {
            Some(last_toggle) => last_toggle + interval,
            None => Instant::now(),
        }
    }
}

/// The blink state machine: the current variant IS the state.
#[derive(Debug, Default)]
pub(crate) enum BlinkState {
    /// Not blinking.
    #[default]
    Idle,
    /// Blink interval recorded without a callback: no loop runs.
    Primed { interval: u64 },
    /// A blink loop is running.
    Active {
        control: Arc<BlinkControl>,
        handler: TaskHandler,
    },
}

impl BlinkState {
    pub(crate) fn is_idle(&self) -> bool {
        matches!(self, BlinkState::Idle)
    }

    pub(crate) fn is_active(&self) -> bool {
        matches!(self, BlinkState::Active { .. })
    }

    pub(crate) fn get_interval(&self) -> Option<u64> {
        match self {
            BlinkState::Idle => None,
            BlinkState::Primed { interval } => Some(*interval),
            BlinkState::Active { control, .. } => Some(control.get_interval()),
        }
    }

    /// Records a new interval: a running loop picks it up at its next re-arm.
    pub(crate) fn set_interval(&mut self, interval: u64) {
        match self {
            BlinkState::Active { control, .. } => control.set_interval(interval),
            _ => *self = BlinkState::Primed { interval },
        }
    }

    /// Returns to idle if `control` is still the one driving the state: a loop ending on its own
    /// must not clear the state of a loop started after it.
    pub(crate) fn release(&mut self, control: &Arc<BlinkControl>) {
        if let BlinkState::Active { control: current, .. } = self {
            if Arc::ptr_eq(current, control) {
                *self = BlinkState::Idle;
            }
        }
    }

    /// Neutralizes a running loop: disabled first, then aborted.
    pub(crate) fn cancel(self) {
        if let BlinkState::Active { control, handler } = self {
            control.disable();
            handler.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pause;
    use crate::utils::task;

    #[test]
    fn test_control() {
        let control = BlinkControl::new(100);
        assert!(control.is_enabled());
        assert_eq!(control.get_interval(), 100);
        assert!(control.get_last_toggle().is_none());
        control.set_interval(250);
        assert_eq!(control.get_interval(), 250);
        control.disable();
        assert!(!control.is_enabled());
    }

    #[lumen_macros::test]
    async fn test_control_deadline() {
        let control = BlinkControl::new(100);
        // No toggle yet: due now.
        assert!(control.get_next_deadline() <= Instant::now());

        control.mark_toggle();
        let last_toggle = control.get_last_toggle().unwrap();
        assert_eq!(
            control.get_next_deadline(),
            last_toggle + Duration::from_millis(100)
        );

        // Late: the deadline is already in the past, no extra wait.
        pause!(150);
        assert!(control.get_next_deadline() < Instant::now());
    }

    #[test]
    fn test_state_interval() {
        let mut state = BlinkState::default();
        assert!(state.is_idle());
        assert_eq!(state.get_interval(), None);

        state.set_interval(500);
        assert!(!state.is_idle());
        assert!(!state.is_active());
        assert_eq!(state.get_interval(), Some(500));

        state.set_interval(200);
        assert_eq!(state.get_interval(), Some(200));

        // Cancelling a primed state is a no-op.
        state.cancel();
    }

    #[lumen_macros::test]
    async fn test_state_cancel_active() {
        let control = Arc::new(BlinkControl::new(100));
        let handler = task::run(async move {
            pause!(10_000);
        })
        .unwrap();

        let mut state = BlinkState::Active {
            control: control.clone(),
            handler,
        };
        assert!(state.is_active());
        state.set_interval(300);
        assert_eq!(control.get_interval(), 300);
        assert_eq!(state.get_interval(), Some(300));

        state.cancel();
        assert!(!control.is_enabled());
    }

    #[lumen_macros::test]
    async fn test_state_release() {
        let control = Arc::new(BlinkControl::new(100));
        let other = Arc::new(BlinkControl::new(100));
        let handler = task::run(async move {}).unwrap();
        let mut state = BlinkState::Active {
            control: control.clone(),
            handler,
        };

        // Another loop's control does not own the state.
        state.release(&other);
        assert!(state.is_active());

        state.release(&control);
        assert!(state.is_idle());

        // Releasing a primed state does nothing.
        let mut state = BlinkState::Primed { interval: 100 };
        state.release(&control);
        assert_eq!(state.get_interval(), Some(100));
    }
}
