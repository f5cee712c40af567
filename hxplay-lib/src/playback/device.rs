//! Output devices that drive the session's real-time callback.
//!
//! A device is opened with a [`DeviceSpec`] and a [`SharedSession`]; from then
//! on it calls [`Session::fill`] once per period on its own thread. Closing a
//! device is dropping its handle.
//!
//! [`Session::fill`]: super::Session::fill

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, warn};
use rodio::source::{SeekError, Source};
use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::audio::mix::s16le_to_f32;
use crate::audio::stream::{Format, PCM_SAMPLE_BYTES};
use crate::error::PlaybackError;

use super::session::{lock_session, FillOutcome, SharedSession};
use super::settings::clamp_period_frames;
use super::PlaybackSettings;

/// Parameters an output device is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSpec {
    pub sample_rate: u32,
    pub channels: u16,
    /// Always canonical PCM.
    pub sample_format: Format,
    /// Frames requested per callback. Clamped to `1..=MAX_PERIOD_FRAMES`
    /// wherever it is used.
    pub period_frames: usize,
}

impl DeviceSpec {
    fn frames(&self) -> usize {
        clamp_period_frames(self.period_frames)
    }

    /// Bytes requested per callback.
    pub fn period_bytes(&self) -> usize {
        self.frames() * self.channels.max(1) as usize * PCM_SAMPLE_BYTES
    }

    /// Wall-clock length of one period.
    pub fn period_duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.frames() as u64 * 1_000_000_000 / self.sample_rate as u64)
    }
}

/// Handle to an open output device.
pub trait OutputDevice {
    fn pause(&self);
    fn resume(&self);
}

/// Opens output devices.
pub trait OutputBackend {
    fn open(
        &self,
        spec: DeviceSpec,
        session: SharedSession,
    ) -> Result<Box<dyn OutputDevice>, PlaybackError>;
}

/// Rodio source pulling one period at a time from the session.
///
/// The period buffer is allocated once; refills only lock the session and
/// mix. The source ends when the queue runs out or when the session it was
/// opened for has been cleared.
pub struct SessionSource {
    session: SharedSession,
    generation: u64,
    period: Vec<u8>,
    cursor: usize,
    finished: bool,
    sample_rate: u32,
    channels: u16,
}

impl SessionSource {
    pub fn new(spec: DeviceSpec, session: SharedSession) -> Self {
        let generation = lock_session(&session).generation();
        let period = vec![0u8; spec.period_bytes()];
        let cursor = period.len();
        Self {
            session,
            generation,
            period,
            cursor,
            finished: false,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        }
    }

    fn refill(&mut self) -> bool {
        if self.finished {
            return false;
        }
        let mut session = lock_session(&self.session);
        if session.generation() != self.generation {
            return false;
        }
        if let FillOutcome::Finished(written) = session.fill(&mut self.period) {
            debug!("queue exhausted after {} bytes in final period", written);
            self.finished = true;
        }
        self.cursor = 0;
        true
    }
}

impl Iterator for SessionSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.cursor + PCM_SAMPLE_BYTES > self.period.len() && !self.refill() {
            return None;
        }
        let sample = s16le_to_f32([self.period[self.cursor], self.period[self.cursor + 1]]);
        self.cursor += PCM_SAMPLE_BYTES;
        Some(sample)
    }
}

impl Source for SessionSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }

    fn try_seek(&mut self, _pos: Duration) -> Result<(), SeekError> {
        Err(SeekError::NotSupported {
            underlying_source: "SessionSource",
        })
    }
}

/// Default system output through rodio.
#[derive(Debug, Clone)]
pub struct RodioBackend {
    open_retries: usize,
    open_retry_ms: u64,
}

impl RodioBackend {
    pub fn new(settings: &PlaybackSettings) -> Self {
        Self {
            open_retries: settings.open_retries.max(1),
            open_retry_ms: settings.open_retry_ms,
        }
    }

    fn open_stream_with_retry(&self) -> Result<OutputStream, PlaybackError> {
        let mut attempt = 1;
        loop {
            match OutputStreamBuilder::open_default_stream() {
                Ok(stream) => return Ok(stream),
                Err(err) if attempt >= self.open_retries => {
                    error!(
                        "failed to open default output stream after {} attempts: {}",
                        self.open_retries, err
                    );
                    return Err(PlaybackError::DeviceOpen(err.to_string()));
                }
                Err(err) => {
                    warn!(
                        "open_default_stream attempt {}/{} failed: {}",
                        attempt, self.open_retries, err
                    );
                    thread::sleep(Duration::from_millis(self.open_retry_ms));
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new(&PlaybackSettings::default())
    }
}

struct RodioDevice {
    sink: Sink,
    _stream: OutputStream,
}

impl OutputDevice for RodioDevice {
    fn pause(&self) {
        self.sink.pause();
    }

    fn resume(&self) {
        self.sink.play();
    }
}

impl Drop for RodioDevice {
    fn drop(&mut self) {
        self.sink.stop();
    }
}

impl OutputBackend for RodioBackend {
    fn open(
        &self,
        spec: DeviceSpec,
        session: SharedSession,
    ) -> Result<Box<dyn OutputDevice>, PlaybackError> {
        let stream = self.open_stream_with_retry()?;
        let sink = Sink::connect_new(stream.mixer());
        sink.append(SessionSource::new(spec, session));
        sink.play();
        Ok(Box::new(RodioDevice {
            sink,
            _stream: stream,
        }))
    }
}

/// Output device that discards audio, pacing callbacks with a timer.
///
/// Useful for headless runs: the queue advances in real time with no sound
/// card involved.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClockBackend;

struct ClockDevice {
    paused: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl OutputDevice for ClockDevice {
    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }
}

impl Drop for ClockDevice {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("clock device thread panicked during join");
            }
        }
    }
}

impl OutputBackend for ClockBackend {
    fn open(
        &self,
        spec: DeviceSpec,
        session: SharedSession,
    ) -> Result<Box<dyn OutputDevice>, PlaybackError> {
        let paused = Arc::new(AtomicBool::new(false));
        let stop = Arc::new(AtomicBool::new(false));
        let generation = lock_session(&session).generation();
        let interval = spec.period_duration();

        let thread_paused = paused.clone();
        let thread_stop = stop.clone();
        let handle = thread::Builder::new()
            .name("hxplay-clock".to_string())
            .spawn(move || {
                let mut period = vec![0u8; spec.period_bytes()];
                while !thread_stop.load(Ordering::SeqCst) {
                    thread::sleep(interval);
                    if thread_paused.load(Ordering::SeqCst) {
                        continue;
                    }
                    let mut session = lock_session(&session);
                    if session.generation() != generation {
                        break;
                    }
                    if let FillOutcome::Finished(_) = session.fill(&mut period) {
                        break;
                    }
                }
            })
            .map_err(|err| PlaybackError::DeviceOpen(err.to_string()))?;

        Ok(Box::new(ClockDevice {
            paused,
            stop,
            handle: Some(handle),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::stream::{Stream, StreamInfo};
    use crate::graph::Cuuid;
    use crate::playback::{PlaybackState, Session};

    fn spec() -> DeviceSpec {
        DeviceSpec {
            sample_rate: 8_000,
            channels: 1,
            sample_format: Format::Pcm,
            period_frames: 4,
        }
    }

    fn playing_session(samples: &[i16]) -> SharedSession {
        let info = StreamInfo::new(Format::Pcm, 8_000, 1);
        let data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let mut session = Session::new(1.0, false);
        session.replace_queue(vec![Stream::new(Cuuid(1), info, data)], info);
        session.set_state(PlaybackState::Playing);
        session.shared()
    }

    #[test]
    fn period_sizes_follow_layout() {
        let mut spec = spec();
        spec.channels = 2;
        assert_eq!(spec.period_bytes(), 16);
        assert_eq!(spec.period_duration(), Duration::from_micros(500));
    }

    #[test]
    fn oversized_periods_are_clamped() {
        let mut spec = spec();
        spec.channels = u16::MAX;
        spec.period_frames = usize::MAX;
        assert_eq!(
            spec.period_bytes(),
            crate::playback::MAX_PERIOD_FRAMES * u16::MAX as usize * PCM_SAMPLE_BYTES
        );
        assert_eq!(spec.period_duration(), Duration::from_nanos(8_192_000_000));

        spec.period_frames = 0;
        assert_eq!(spec.period_bytes(), u16::MAX as usize * PCM_SAMPLE_BYTES);
    }

    #[test]
    fn source_plays_queue_then_ends_after_final_period() {
        let session = playing_session(&[16_384, -16_384, 16_384, -16_384, 16_384, -16_384]);
        let source = SessionSource::new(spec(), session.clone());
        let samples: Vec<f32> = source.collect();

        // Two full periods; the second is padded with silence.
        assert_eq!(samples.len(), 8);
        assert_eq!(&samples[..6], &[0.5, -0.5, 0.5, -0.5, 0.5, -0.5]);
        assert_eq!(&samples[6..], &[0.0, 0.0]);
        assert_eq!(lock_session(&session).state(), PlaybackState::Empty);
    }

    #[test]
    fn source_ends_when_session_is_cleared() {
        let session = playing_session(&[1; 64]);
        let mut source = SessionSource::new(spec(), session.clone());
        assert!(source.next().is_some());

        lock_session(&session).clear();
        for _ in 0..3 {
            source.next();
        }
        assert_eq!(source.next(), None);
    }
}
