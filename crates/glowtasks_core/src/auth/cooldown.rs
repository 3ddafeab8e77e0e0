//! One-second resend cooldown timer.
//!
//! # Responsibility
//! - Run a repeating one-second ticker while an OTP cooldown is counting down.
//! - Deliver ticks as messages; the flow applies them on its own context.
//!
//! # Invariants
//! - Each arming gets a new epoch; ticks from older epochs are stale.
//! - At most one ticker task exists; re-arming or disarming aborts the old one.
//! - Dropping the timer aborts its task.

use log::{debug, warn};
use std::cell::{Cell, RefCell};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One elapsed second for the cooldown armed at `epoch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownTick {
    epoch: u64,
}

/// Receiving side of the cooldown ticker; the host loop forwards ticks to
/// [`crate::auth::AuthFlow::on_tick`].
pub struct CooldownTicks {
    rx: UnboundedReceiver<CooldownTick>,
}

impl CooldownTicks {
    pub async fn recv(&mut self) -> Option<CooldownTick> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<CooldownTick> {
        self.rx.try_recv().ok()
    }
}

pub(crate) struct CooldownTimer {
    tx: UnboundedSender<CooldownTick>,
    epoch: Cell<u64>,
    task: RefCell<Option<JoinHandle<()>>>,
}

impl CooldownTimer {
    pub(crate) fn channel() -> (Self, CooldownTicks) {
        let (tx, rx) = mpsc::unbounded_channel();
        let timer = Self {
            tx,
            epoch: Cell::new(0),
            task: RefCell::new(None),
        };
        (timer, CooldownTicks { rx })
    }

    /// Starts a fresh ticker that fires `seconds` times, replacing any other.
    pub(crate) fn arm(&self, seconds: u32) {
        self.disarm();
        let epoch = self.epoch.get();
        let tx = self.tx.clone();

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("event=cooldown_arm module=auth status=error error_code=no_runtime epoch={epoch}");
            return;
        };
        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            for _ in 0..seconds {
                ticker.tick().await;
                if tx.send(CooldownTick { epoch }).is_err() {
                    break;
                }
            }
        });
        *self.task.borrow_mut() = Some(handle);
        debug!("event=cooldown_arm module=auth status=ok epoch={epoch} seconds={seconds}");
    }

    /// Stops the ticker and invalidates ticks already queued.
    pub(crate) fn disarm(&self) {
        self.epoch.set(self.epoch.get().wrapping_add(1));
        if let Some(handle) = self.task.borrow_mut().take() {
            handle.abort();
        }
    }

    pub(crate) fn is_current(&self, tick: CooldownTick) -> bool {
        tick.epoch == self.epoch.get()
    }

    pub(crate) fn is_running(&self) -> bool {
        self.task
            .borrow()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for CooldownTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}
