//! Shared playback session: the queue, its counters, and the mixing callback.
//!
//! One `Session` is shared between the control path ([`Player`]) and the
//! output device's real-time thread. Every access goes through the same
//! mutex, and the lock is only held for queue and counter manipulation.
//!
//! [`Player`]: super::Player

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::audio::mix::{clamp_gain, mix_s16le};
use crate::audio::stream::{Stream, StreamInfo};
use crate::graph::Cuuid;

use super::PlaybackState;

/// Session handle shared with the output device.
pub type SharedSession = Arc<Mutex<Session>>;

/// Lock a shared session, recovering from a poisoned mutex.
pub fn lock_session(session: &SharedSession) -> MutexGuard<'_, Session> {
    session
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Result of one callback invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// Not playing; the buffer is silence.
    Idle,
    /// The whole buffer was mixed from the queue.
    Playing(usize),
    /// The queue ran out after the given number of bytes. The rest of the
    /// buffer is silence and the session is now empty.
    Finished(usize),
}

/// Snapshot of the session for presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub total_position: usize,
    pub total_length: usize,
    pub position: usize,
    /// Size of the stream currently at the front of the queue.
    pub front_size: usize,
    pub queue_index: usize,
    pub queue_count: usize,
    pub gain: f32,
    pub repeat: bool,
    pub info: Option<StreamInfo>,
    /// Origins of the queued streams in play order.
    pub queued: Vec<Cuuid>,
}

impl PlaybackStatus {
    /// Seconds of audio left before the queue runs out.
    pub fn remaining_seconds(&self) -> f64 {
        let Some(info) = self.info else {
            return 0.0;
        };
        let rate = info.pcm_bytes_per_second();
        if rate == 0 {
            return 0.0;
        }
        self.total_length.saturating_sub(self.total_position) as f64 / rate as f64
    }

    /// Progress through the front stream in `[0, 1]`.
    pub fn front_progress(&self) -> f32 {
        if self.front_size == 0 {
            return 0.0;
        }
        (self.position as f32 / self.front_size as f32).min(1.0)
    }
}

/// Queue and playback counters.
#[derive(Debug)]
pub struct Session {
    state: PlaybackState,
    queue: VecDeque<Stream>,
    swap: VecDeque<Stream>,
    position: usize,
    total_position: usize,
    total_length: usize,
    queue_index: usize,
    repeat: bool,
    gain: f32,
    info: Option<StreamInfo>,
    generation: u64,
}

impl Session {
    pub fn new(gain: f32, repeat: bool) -> Self {
        Self {
            state: PlaybackState::Empty,
            queue: VecDeque::new(),
            swap: VecDeque::new(),
            position: 0,
            total_position: 0,
            total_length: 0,
            queue_index: 0,
            repeat,
            gain,
            info: None,
            generation: 0,
        }
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Mix gain, clamped to `[0, 1]`.
    pub fn gain(&self) -> f32 {
        clamp_gain(self.gain)
    }

    /// Store a gain value. It is clamped whenever it is read.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn total_position(&self) -> usize {
        self.total_position
    }

    pub fn total_length(&self) -> usize {
        self.total_length
    }

    pub fn queue_index(&self) -> usize {
        self.queue_index
    }

    /// Streams held by the session, played or not.
    pub fn queue_count(&self) -> usize {
        self.queue.len() + self.swap.len()
    }

    /// Format shared by every queued stream.
    pub fn info(&self) -> Option<StreamInfo> {
        self.info
    }

    /// Changes every time the queue is replaced or cleared.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Origins of the queued streams in play order.
    pub fn queue_order(&self) -> Vec<Cuuid> {
        self.swap
            .iter()
            .chain(self.queue.iter())
            .map(|stream| stream.origin)
            .collect()
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            state: self.state,
            total_position: self.total_position,
            total_length: self.total_length,
            position: self.position,
            front_size: self.queue.front().map(Stream::size).unwrap_or(0),
            queue_index: self.queue_index,
            queue_count: self.queue_count(),
            gain: self.gain(),
            repeat: self.repeat,
            info: self.info,
            queued: self.queue_order(),
        }
    }

    /// Replace the queue with already converted streams.
    ///
    /// Leaves the session `Loaded`, or `Empty` when `streams` is empty.
    pub fn replace_queue(&mut self, streams: Vec<Stream>, info: StreamInfo) {
        self.clear();
        if streams.is_empty() {
            return;
        }
        self.total_length = streams.iter().map(Stream::size).sum();
        self.swap = VecDeque::with_capacity(streams.len());
        self.queue = VecDeque::from(streams);
        self.info = Some(info);
        self.state = PlaybackState::Loaded;
    }

    /// Release every stream and reset all counters. Returns `false` when the
    /// session was already empty.
    pub fn clear(&mut self) -> bool {
        let had_content = self.state != PlaybackState::Empty || self.queue_count() > 0;
        self.queue.clear();
        self.swap.clear();
        self.position = 0;
        self.total_position = 0;
        self.total_length = 0;
        self.queue_index = 0;
        self.info = None;
        self.state = PlaybackState::Empty;
        self.generation = self.generation.wrapping_add(1);
        had_content
    }

    pub(crate) fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
    }

    /// Real-time callback: fill `out` from the queue.
    ///
    /// `out` is zeroed first. While playing, bytes are mixed from the front
    /// stream and the fill crosses as many stream boundaries as needed. When
    /// the queue is exhausted the session either rewinds (repeat) or empties
    /// itself and leaves the remainder silent. Never allocates.
    pub fn fill(&mut self, out: &mut [u8]) -> FillOutcome {
        out.fill(0);
        if self.state != PlaybackState::Playing {
            return FillOutcome::Idle;
        }

        let gain = self.gain();
        let mut written = 0;
        while written < out.len() {
            let remaining_total = self.total_length - self.total_position;
            if remaining_total == 0 {
                if self.repeat && self.total_length > 0 {
                    self.rewind();
                    continue;
                }
                self.finish();
                return FillOutcome::Finished(written);
            }

            let Some(front) = self.queue.front() else {
                // Counters say there is more audio than the queue holds.
                self.finish();
                return FillOutcome::Finished(written);
            };

            let front_remaining = front.size() - self.position;
            let take = (out.len() - written)
                .min(remaining_total)
                .min(front_remaining);
            mix_s16le(
                &mut out[written..written + take],
                &front.data()[self.position..self.position + take],
                gain,
            );
            written += take;
            self.position += take;
            self.total_position += take;

            if self.position >= front.size() {
                if let Some(done) = self.queue.pop_front() {
                    self.swap.push_back(done);
                }
                self.queue_index += 1;
                self.position = 0;
            }
        }

        FillOutcome::Playing(written)
    }

    /// Restore the original queue order and reset every counter to the start.
    fn rewind(&mut self) {
        while let Some(stream) = self.queue.pop_front() {
            self.swap.push_back(stream);
        }
        std::mem::swap(&mut self.queue, &mut self.swap);
        self.position = 0;
        self.total_position = 0;
        self.queue_index = 0;
    }

    fn finish(&mut self) {
        self.clear();
    }
}
