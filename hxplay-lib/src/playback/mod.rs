//! Streaming playback engine.

pub mod device;
mod player;
pub mod session;
mod settings;

use std::fmt::{Display, Formatter};

pub use device::{ClockBackend, DeviceSpec, OutputBackend, OutputDevice, RodioBackend};
pub use player::Player;
pub use session::{FillOutcome, PlaybackStatus, Session, SharedSession};
pub use settings::{PlaybackSettings, MAX_PERIOD_FRAMES};

/// Playback state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Empty,
    Loaded,
    Playing,
    Paused,
}

impl Display for PlaybackState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Empty => "empty",
            Self::Loaded => "loaded",
            Self::Playing => "playing",
            Self::Paused => "paused",
        };
        f.write_str(label)
    }
}
