//! Stop signal shared by every long-running activity.
//!
//! The signal is a `crossbeam-channel` that never carries a message: firing
//! the [`ShutdownTrigger`] drops the only sender, which disconnects every
//! [`Shutdown`] receiver at once. Activities sleep on the receiver with a
//! timeout, so they wake up immediately on stop instead of finishing their
//! current tick interval, and blocking loops can `select!` on it.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Creates a connected trigger/listener pair.
#[must_use]
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (sender, receiver) = crossbeam_channel::bounded(0);
    (ShutdownTrigger { _sender: sender }, Shutdown { receiver })
}

/// Owning side of the stop signal. Firing it (or dropping it) stops everyone.
#[derive(Debug)]
pub struct ShutdownTrigger {
    _sender: Sender<()>,
}

impl ShutdownTrigger {
    /// Fires the stop signal.
    pub fn fire(self) {
        drop(self);
    }
}

/// Listening side of the stop signal. Cheap to clone, one per activity.
#[derive(Debug, Clone)]
pub struct Shutdown {
    receiver: Receiver<()>,
}

impl Shutdown {
    /// Returns `true` once the trigger has fired.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        !matches!(self.receiver.try_recv(), Err(TryRecvError::Empty))
    }

    /// Sleeps for up to `interval`, waking early if the trigger fires.
    ///
    /// Returns `true` if the caller should keep running.
    #[must_use]
    pub fn wait(&self, interval: Duration) -> bool {
        matches!(
            self.receiver.recv_timeout(interval),
            Err(RecvTimeoutError::Timeout)
        )
    }

    /// Raw receiver, for use in `crossbeam_channel::select!`.
    ///
    /// Becomes ready (disconnected) when the trigger fires.
    #[must_use]
    pub fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}
