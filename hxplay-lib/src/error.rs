use std::fmt::{Display, Formatter};

use crate::audio::convert::ConvertError;
use crate::audio::stream::StreamInfo;
use crate::graph::Cuuid;

/// Error type for the playback control path.
#[derive(Debug)]
pub enum PlaybackError {
    /// No playable stream could be resolved for an entry.
    Unresolved(Cuuid),
    /// A stream could not be converted to canonical PCM; nothing was loaded.
    Conversion { origin: Cuuid, source: ConvertError },
    /// A stream disagrees with the queue's rate or channel count.
    MixedFormat {
        origin: Cuuid,
        expected: StreamInfo,
        found: StreamInfo,
    },
    /// Stream bytes could not be read.
    Io { origin: Cuuid, source: std::io::Error },
    /// The output device could not be opened.
    DeviceOpen(String),
    /// Play was requested with nothing loaded.
    NothingQueued,
}

impl Display for PlaybackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unresolved(id) => write!(f, "no playable stream found for {}", id),
            Self::Conversion { origin, source } => {
                write!(f, "failed to load audio stream {}: {}", origin, source)
            }
            Self::MixedFormat {
                origin,
                expected,
                found,
            } => write!(
                f,
                "stream {} is {} Hz / {} ch, queue is {} Hz / {} ch",
                origin, found.sample_rate, found.channels, expected.sample_rate, expected.channels
            ),
            Self::Io { origin, source } => {
                write!(f, "failed to load audio stream {}: {}", origin, source)
            }
            Self::DeviceOpen(err) => write!(f, "failed to open audio: {}", err),
            Self::NothingQueued => write!(f, "the audio queue is empty"),
        }
    }
}

impl std::error::Error for PlaybackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Conversion { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
