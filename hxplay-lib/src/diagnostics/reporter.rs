//! Periodic playback status reporter for UI updates.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::JoinHandle,
    time::Duration,
};

use crate::playback::session::{lock_session, SharedSession};
use crate::playback::PlaybackStatus;

/// Callback receiving status snapshots.
pub type ReportFn = Arc<Mutex<dyn Fn(PlaybackStatus) + Send>>;

/// Background reporter that polls a session at fixed intervals.
///
/// The callback only fires when the snapshot differs from the previous one.
#[derive(Clone)]
pub struct Reporter {
    session: SharedSession,
    report: ReportFn,
    interval: Duration,
    finish: Arc<AtomicBool>,
    thread_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Reporter {
    pub fn new(session: SharedSession, report: ReportFn, interval: Duration) -> Self {
        Self {
            session,
            report,
            interval,
            finish: Arc::new(AtomicBool::new(false)),
            thread_handle: Arc::new(Mutex::new(None)),
        }
    }

    fn run(&self) {
        let mut last_report: Option<PlaybackStatus> = None;

        loop {
            let report = lock_session(&self.session).status();

            if last_report.as_ref() != Some(&report) {
                let callback = self
                    .report
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                (*callback)(report.clone());
                last_report = Some(report);
            }

            if self.finish.load(Ordering::Relaxed) {
                break;
            }

            std::thread::sleep(self.interval);
        }
    }

    /// Start the background reporting thread.
    pub fn start(&self) {
        self.stop();
        self.finish.store(false, Ordering::Relaxed);
        let this = self.clone();
        let handle = std::thread::spawn(move || this.run());
        *self
            .thread_handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handle);
    }

    /// Stop the background reporting thread.
    pub fn stop(&self) {
        self.finish.store(true, Ordering::Relaxed);
        let handle = self
            .thread_handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            if handle.thread().id() == std::thread::current().id() {
                log::warn!("reporter stop called from reporter thread; skipping join");
            } else if handle.join().is_err() {
                log::warn!("reporter thread panicked during join");
            }
        }
    }
}
