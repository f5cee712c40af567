//! High-level playback controller.
//!
//! `Player` owns the shared session, the output device handle and the
//! converter. All control operations run on the caller's thread; only the
//! device's callback thread touches the session concurrently.

mod controls;
mod load;

use std::sync::Arc;

use log::error;

use crate::audio::convert::{CodecConverter, Converter};
use crate::diagnostics::{LogBuffer, LogEntry, LogSink};
use crate::error::PlaybackError;
use crate::graph::Cuuid;

use super::device::{OutputBackend, OutputDevice, RodioBackend};
use super::session::{Session, SharedSession};
use super::PlaybackSettings;

/// Primary playback controller.
pub struct Player {
    session: SharedSession,
    backend: Box<dyn OutputBackend>,
    converter: Arc<dyn Converter>,
    device: Option<Box<dyn OutputDevice>>,
    settings: PlaybackSettings,
    log: Arc<dyn LogSink>,
    current: Option<Cuuid>,
}

impl Player {
    /// Create a player on the default rodio output.
    pub fn new(settings: PlaybackSettings) -> Self {
        let backend = RodioBackend::new(&settings);
        Self::with_backend(settings, Box::new(backend))
    }

    /// Create a player on a custom output backend.
    pub fn with_backend(settings: PlaybackSettings, backend: Box<dyn OutputBackend>) -> Self {
        let session = Session::new(settings.gain, settings.repeat).shared();
        Self {
            session,
            backend,
            converter: Arc::new(CodecConverter),
            device: None,
            settings,
            log: Arc::new(LogBuffer::new()),
            current: None,
        }
    }

    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = converter;
        self
    }

    /// Route user-facing events to `log`.
    pub fn with_log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    /// Session handle, for reporters and status polling.
    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    /// Event most recently queued through the graph.
    pub fn current_event(&self) -> Option<Cuuid> {
        self.current
    }

    fn emit(&self, entry: LogEntry) {
        self.log.push(entry);
    }

    /// Log an error and hand it back for propagation.
    fn fail(&self, err: PlaybackError) -> PlaybackError {
        error!("{}", err);
        self.emit(LogEntry::error(err.to_string()));
        err
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::error::PlaybackError;
    use crate::playback::device::{DeviceSpec, OutputBackend, OutputDevice};
    use crate::playback::session::SharedSession;

    /// Output backend that records what it was asked to open.
    ///
    /// Nothing drives the callback; tests call `Session::fill` themselves.
    #[derive(Clone, Default)]
    pub struct MockBackend {
        pub opened: Arc<Mutex<Vec<DeviceSpec>>>,
        pub paused: Arc<AtomicBool>,
        pub open_devices: Arc<Mutex<usize>>,
        pub fail: bool,
    }

    impl MockBackend {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn open_count(&self) -> usize {
            self.opened.lock().unwrap().len()
        }

        pub fn live_devices(&self) -> usize {
            *self.open_devices.lock().unwrap()
        }
    }

    struct MockDevice {
        paused: Arc<AtomicBool>,
        open_devices: Arc<Mutex<usize>>,
    }

    impl OutputDevice for MockDevice {
        fn pause(&self) {
            self.paused.store(true, Ordering::SeqCst);
        }

        fn resume(&self) {
            self.paused.store(false, Ordering::SeqCst);
        }
    }

    impl Drop for MockDevice {
        fn drop(&mut self) {
            *self.open_devices.lock().unwrap() -= 1;
        }
    }

    impl OutputBackend for MockBackend {
        fn open(
            &self,
            spec: DeviceSpec,
            _session: SharedSession,
        ) -> Result<Box<dyn OutputDevice>, PlaybackError> {
            self.opened.lock().unwrap().push(spec);
            if self.fail {
                return Err(PlaybackError::DeviceOpen("no such device".to_string()));
            }
            *self.open_devices.lock().unwrap() += 1;
            Ok(Box::new(MockDevice {
                paused: self.paused.clone(),
                open_devices: self.open_devices.clone(),
            }))
        }
    }
}
