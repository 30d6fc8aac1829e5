//! Inactivity watchdog
//!
//! Quits a scan session after a period with no decode activity, so an
//! abandoned scanner does not keep the camera and decode thread alive.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info};

use crate::session::{FeedbackSink, SessionHandle};

#[derive(Debug)]
enum WatchdogSignal {
    Activity,
    Pause,
    Resume,
    Shutdown,
}

/// Cloneable remote for a running [`InactivityWatchdog`]
#[derive(Debug, Clone)]
pub struct WatchdogControl {
    tx: Sender<WatchdogSignal>,
}

impl WatchdogControl {
    /// Reset the idle timer
    pub fn ping(&self) {
        let _ = self.tx.send(WatchdogSignal::Activity);
    }

    /// Stop counting, e.g. while the host is in the background
    pub fn pause(&self) {
        let _ = self.tx.send(WatchdogSignal::Pause);
    }

    /// Start counting again with a full timeout
    pub fn resume(&self) {
        let _ = self.tx.send(WatchdogSignal::Resume);
    }
}

/// Background thread that calls [`SessionHandle::quit`] after `idle_timeout`
/// without a ping
///
/// Fires at most once, then exits. Dropping the watchdog stops and joins the
/// thread.
#[derive(Debug)]
pub struct InactivityWatchdog {
    control: WatchdogControl,
    join: Option<JoinHandle<()>>,
}

impl InactivityWatchdog {
    /// Start the watchdog thread; the timer starts immediately
    pub fn spawn(handle: SessionHandle, idle_timeout: Duration) -> io::Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let join = thread::Builder::new()
            .name("zscan-watchdog".to_string())
            .spawn(move || run_watchdog(handle, rx, idle_timeout))?;

        Ok(Self {
            control: WatchdogControl { tx },
            join: Some(join),
        })
    }

    /// Remote that can ping, pause and resume this watchdog
    pub fn control(&self) -> WatchdogControl {
        self.control.clone()
    }

    /// Reset the idle timer
    pub fn ping(&self) {
        self.control.ping();
    }

    /// Stop counting
    pub fn pause(&self) {
        self.control.pause();
    }

    /// Start counting again
    pub fn resume(&self) {
        self.control.resume();
    }

    /// Stop the thread without quitting the session
    pub fn shutdown(&mut self) {
        if let Some(join) = self.join.take() {
            let _ = self.control.tx.send(WatchdogSignal::Shutdown);
            let _ = join.join();
        }
    }

    /// Turn this watchdog into a feedback sink that pings on every activity
    /// and forwards everything to `inner`
    pub fn wrap(self, inner: Box<dyn FeedbackSink>) -> WatchdogFeedback {
        WatchdogFeedback {
            watchdog: self,
            inner,
        }
    }
}

impl Drop for InactivityWatchdog {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_watchdog(handle: SessionHandle, rx: Receiver<WatchdogSignal>, idle_timeout: Duration) {
    let mut paused = false;
    loop {
        let signal = if paused {
            rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
        } else {
            rx.recv_timeout(idle_timeout)
        };

        match signal {
            Ok(WatchdogSignal::Activity) => {}
            Ok(WatchdogSignal::Pause) => paused = true,
            Ok(WatchdogSignal::Resume) => paused = false,
            Ok(WatchdogSignal::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                info!(
                    idle_secs = idle_timeout.as_secs_f64(),
                    "no scan activity, quitting session"
                );
                handle.quit();
                break;
            }
        }
    }
    debug!("watchdog exiting");
}

/// [`FeedbackSink`] that feeds an [`InactivityWatchdog`]
pub struct WatchdogFeedback {
    watchdog: InactivityWatchdog,
    inner: Box<dyn FeedbackSink>,
}

impl WatchdogFeedback {
    /// The wrapped watchdog
    pub fn watchdog(&self) -> &InactivityWatchdog {
        &self.watchdog
    }
}

impl FeedbackSink for WatchdogFeedback {
    fn on_activity(&mut self) {
        self.watchdog.ping();
        self.inner.on_activity();
    }

    fn play_feedback(&mut self) {
        self.inner.play_feedback();
    }
}
