//! Output sink trait and error types.

use core::future::Future;

use crate::gamepad::GamepadState;

/// Error type for output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// USB/communication I/O error.
    Io,
    /// Device not ready (e.g., USB not enumerated).
    NotReady,
    /// Report dropped (e.g., host not polling fast enough).
    Dropped,
    /// Endpoint busy.
    Busy,
}

/// Async trait for gamepad output sinks.
///
/// Receives each committed [`GamepadState`] of one player slot.
pub trait OutputSink {
    /// Send a gamepad state to the output.
    ///
    /// May block until the previous report has been sent.
    fn send(&mut self, state: &GamepadState) -> impl Future<Output = Result<(), OutputError>>;

    /// Check if the output is ready to accept data.
    fn is_ready(&self) -> bool;
}

/// Forward one state, refusing it if the sink is not ready yet.
pub async fn forward<O: OutputSink>(sink: &mut O, state: &GamepadState) -> Result<(), OutputError> {
    if !sink.is_ready() {
        return Err(OutputError::NotReady);
    }
    sink.send(state).await
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::gamepad::{Button, Buttons};
    use core::pin::Pin;
    use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
    use std::vec::Vec;

    struct MockOutput {
        ready: bool,
        sent: Vec<GamepadState>,
    }

    impl OutputSink for MockOutput {
        fn send(&mut self, state: &GamepadState) -> impl Future<Output = Result<(), OutputError>> {
            self.sent.push(*state);
            core::future::ready(Ok(()))
        }

        fn is_ready(&self) -> bool {
            self.ready
        }
    }

    // Helper to run a future to completion (simple blocking executor)
    fn block_on<F: Future>(mut f: F) -> F::Output {
        fn noop_raw_waker() -> RawWaker {
            fn noop(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                noop_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
            RawWaker::new(core::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
        let mut cx = Context::from_waker(&waker);

        // SAFETY: We don't move f after pinning
        let mut f = unsafe { Pin::new_unchecked(&mut f) };

        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => result,
            Poll::Pending => panic!("Mock future returned Pending unexpectedly"),
        }
    }

    fn pressed() -> GamepadState {
        GamepadState {
            connected: true,
            buttons: Buttons::of(Button::A),
            ..GamepadState::neutral()
        }
    }

    #[test]
    fn test_forward_when_ready() {
        let mut sink = MockOutput {
            ready: true,
            sent: Vec::new(),
        };
        assert_eq!(block_on(forward(&mut sink, &pressed())), Ok(()));
        assert_eq!(sink.sent, [pressed()]);
    }

    #[test]
    fn test_forward_not_ready() {
        let mut sink = MockOutput {
            ready: false,
            sent: Vec::new(),
        };
        assert_eq!(block_on(forward(&mut sink, &pressed())), Err(OutputError::NotReady));
        assert!(sink.sent.is_empty());
    }
}
