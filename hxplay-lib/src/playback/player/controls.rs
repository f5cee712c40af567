//! Transport operations for `Player`.
//!
//! Every transition takes the session lock only for the state change itself.
//! Device handles are dropped after the lock is released, since closing a
//! device waits for its callback thread.

use log::{debug, info};

use crate::audio::stream::Format;
use crate::diagnostics::LogEntry;
use crate::error::PlaybackError;
use crate::playback::device::DeviceSpec;
use crate::playback::session::lock_session;
use crate::playback::{PlaybackState, PlaybackStatus};

use super::Player;

impl Player {
    /// Start playback of the loaded queue.
    ///
    /// While playing this stops and clears instead. While paused it resumes.
    /// A device that fails to open leaves the queue loaded.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        let (state, info) = {
            let session = lock_session(&self.session);
            (session.state(), session.info())
        };

        match (state, info) {
            (PlaybackState::Playing, _) => {
                self.clear();
                Ok(())
            }
            (PlaybackState::Paused, _) => {
                self.resume();
                Ok(())
            }
            (PlaybackState::Loaded, Some(info)) => {
                let spec = DeviceSpec {
                    sample_rate: info.sample_rate,
                    channels: info.channels,
                    sample_format: Format::Pcm,
                    period_frames: self.settings.period_frames,
                };
                let device = self
                    .backend
                    .open(spec, self.session.clone())
                    .map_err(|err| self.fail(err))?;
                lock_session(&self.session).set_state(PlaybackState::Playing);
                self.device = Some(device);
                info!(
                    "playing {} Hz / {} ch, period {} frames",
                    spec.sample_rate, spec.channels, spec.period_frames
                );
                self.emit(LogEntry::status("playing"));
                Ok(())
            }
            (PlaybackState::Loaded, None) | (PlaybackState::Empty, _) => {
                Err(self.fail(PlaybackError::NothingQueued))
            }
        }
    }

    /// Pause playback. Does nothing unless playing.
    pub fn pause(&mut self) {
        {
            let mut session = lock_session(&self.session);
            if session.state() != PlaybackState::Playing {
                return;
            }
            session.set_state(PlaybackState::Paused);
        }
        if let Some(device) = &self.device {
            device.pause();
        }
        debug!("playback paused");
        self.emit(LogEntry::status("paused"));
    }

    /// Resume paused playback. Does nothing unless paused.
    pub fn resume(&mut self) {
        {
            let mut session = lock_session(&self.session);
            if session.state() != PlaybackState::Paused {
                return;
            }
            session.set_state(PlaybackState::Playing);
        }
        if let Some(device) = &self.device {
            device.resume();
        }
        debug!("playback resumed");
        self.emit(LogEntry::status("playing"));
    }

    /// Toggle between playing and paused.
    pub fn toggle_pause(&mut self) {
        match self.state() {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.resume(),
            PlaybackState::Empty | PlaybackState::Loaded => {}
        }
    }

    /// Close the device and release every queued stream. Safe to repeat.
    pub fn clear(&mut self) {
        let had_content = lock_session(&self.session).clear();
        let device = self.device.take();
        drop(device);
        if had_content {
            info!("playback stopped, queue cleared");
            self.emit(LogEntry::status("stopped"));
        }
    }

    /// Set the mix gain. Values outside `[0, 1]` are clamped on the next mix.
    pub fn set_gain(&mut self, gain: f32) {
        lock_session(&self.session).set_gain(gain);
    }

    /// Effective mix gain.
    pub fn gain(&self) -> f32 {
        lock_session(&self.session).gain()
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        lock_session(&self.session).set_repeat(repeat);
        self.emit(LogEntry::info(format!(
            "repeat {}",
            if repeat { "on" } else { "off" }
        )));
    }

    pub fn repeat(&self) -> bool {
        lock_session(&self.session).repeat()
    }

    pub fn state(&self) -> PlaybackState {
        lock_session(&self.session).state()
    }

    pub fn status(&self) -> PlaybackStatus {
        lock_session(&self.session).status()
    }

    /// Return true once nothing is queued.
    pub fn is_finished(&self) -> bool {
        self.state() == PlaybackState::Empty
    }

    /// Release the device once the callback has drained the queue.
    ///
    /// Returns `true` on the call that noticed the end of playback.
    pub fn poll(&mut self) -> bool {
        if self.device.is_none() || self.state() != PlaybackState::Empty {
            return false;
        }
        let device = self.device.take();
        drop(device);
        info!("playback finished");
        self.emit(LogEntry::status("finished"));
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use super::super::testing::MockBackend;
    use super::*;
    use crate::audio::stream::{Stream, StreamInfo};
    use crate::diagnostics::{LogBuffer, LogKind};
    use crate::graph::Cuuid;
    use crate::playback::{FillOutcome, PlaybackSettings};

    fn pcm(id: u64, bytes: usize) -> Stream {
        Stream::new(
            Cuuid(id),
            StreamInfo::new(Format::Pcm, 22_050, 1),
            vec![1; bytes],
        )
    }

    fn loaded_player(backend: MockBackend) -> Player {
        let mut player = Player::with_backend(PlaybackSettings::default(), Box::new(backend));
        player.load(vec![pcm(1, 100), pcm(2, 50)]).unwrap();
        player
    }

    #[test]
    fn play_opens_device_with_queue_layout() {
        let backend = MockBackend::default();
        let mut player = loaded_player(backend.clone());

        player.play().unwrap();
        assert_eq!(player.state(), PlaybackState::Playing);
        let opened = backend.opened.lock().unwrap().clone();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].sample_rate, 22_050);
        assert_eq!(opened[0].channels, 1);
        assert_eq!(opened[0].sample_format, Format::Pcm);
        assert_eq!(opened[0].period_frames, 1024);
    }

    #[test]
    fn play_while_playing_stops_and_clears() {
        let backend = MockBackend::default();
        let mut player = loaded_player(backend.clone());
        player.play().unwrap();
        assert_eq!(backend.live_devices(), 1);

        player.play().unwrap();
        assert_eq!(player.state(), PlaybackState::Empty);
        assert_eq!(backend.live_devices(), 0);
        assert_eq!(player.status().queue_count, 0);
    }

    #[test]
    fn play_with_nothing_loaded_fails() {
        let mut player =
            Player::with_backend(PlaybackSettings::default(), Box::new(MockBackend::default()));
        assert!(matches!(player.play(), Err(PlaybackError::NothingQueued)));
    }

    #[test]
    fn device_failure_keeps_queue_loaded() {
        let log = LogBuffer::new();
        let backend = MockBackend::failing();
        let mut player = loaded_player(backend.clone()).with_log_sink(Arc::new(log.clone()));

        let err = player.play().unwrap_err();
        assert!(matches!(err, PlaybackError::DeviceOpen(_)));
        assert_eq!(err.to_string(), "failed to open audio: no such device");
        assert_eq!(player.state(), PlaybackState::Loaded);
        assert_eq!(player.status().total_length, 150);
        assert!(log.snapshot().iter().any(|e| e.kind == LogKind::Error));
    }

    #[test]
    fn pause_and_resume_reach_the_device() {
        let backend = MockBackend::default();
        let mut player = loaded_player(backend.clone());
        player.play().unwrap();

        player.pause();
        assert_eq!(player.state(), PlaybackState::Paused);
        assert!(backend.paused.load(Ordering::SeqCst));

        let session = player.session();
        let mut out = [0u8; 16];
        assert_eq!(lock_session(&session).fill(&mut out), FillOutcome::Idle);
        assert_eq!(player.status().total_position, 0);

        player.play().unwrap();
        assert_eq!(player.state(), PlaybackState::Playing);
        assert!(!backend.paused.load(Ordering::SeqCst));
        assert_eq!(backend.open_count(), 1);
    }

    #[test]
    fn pause_is_ignored_when_not_playing() {
        let mut player = loaded_player(MockBackend::default());
        player.pause();
        assert_eq!(player.state(), PlaybackState::Loaded);
        player.resume();
        assert_eq!(player.state(), PlaybackState::Loaded);
    }

    #[test]
    fn clear_is_idempotent() {
        let backend = MockBackend::default();
        let mut player = loaded_player(backend.clone());
        player.play().unwrap();

        player.clear();
        player.clear();
        assert_eq!(player.state(), PlaybackState::Empty);
        assert_eq!(backend.live_devices(), 0);
    }

    #[test]
    fn poll_releases_device_after_queue_drains() {
        let backend = MockBackend::default();
        let mut player = loaded_player(backend.clone());
        player.play().unwrap();
        assert!(!player.poll());

        let session = player.session();
        let mut out = [0u8; 200];
        assert_eq!(lock_session(&session).fill(&mut out), FillOutcome::Finished(150));

        assert!(player.poll());
        assert!(!player.poll());
        assert!(player.is_finished());
        assert_eq!(backend.live_devices(), 0);
    }

    #[test]
    fn gain_and_repeat_are_shared_with_the_callback() {
        let mut player = loaded_player(MockBackend::default());
        player.set_gain(3.0);
        assert_eq!(player.gain(), 1.0);
        player.set_repeat(true);
        assert!(player.repeat());
        assert!(lock_session(&player.session()).repeat());
    }
}
