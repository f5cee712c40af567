//! Sample streams and their format metadata.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::graph::Cuuid;

/// Bytes per canonical PCM sample (signed 16-bit little-endian).
pub const PCM_SAMPLE_BYTES: usize = 2;

/// Storage format tag of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Canonical PCM: signed 16-bit little-endian, interleaved.
    Pcm,
    Ubi,
    Psx,
    Dsp,
    Ima,
    Mp3,
}

impl Format {
    pub fn is_canonical(self) -> bool {
        self == Format::Pcm
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Pcm => "PCM",
            Self::Ubi => "UBI",
            Self::Psx => "PSX",
            Self::Dsp => "DSP",
            Self::Ima => "IMA",
            Self::Mp3 => "MP3",
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Format, rate and channel layout of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub format: Format,
    pub sample_rate: u32,
    pub channels: u16,
}

impl StreamInfo {
    pub fn new(format: Format, sample_rate: u32, channels: u16) -> Self {
        Self {
            format,
            sample_rate,
            channels,
        }
    }

    /// Canonical PCM info with the same rate and channel count.
    pub fn as_canonical(self) -> Self {
        Self {
            format: Format::Pcm,
            ..self
        }
    }

    /// Byte rate of this layout once in canonical PCM.
    pub fn pcm_bytes_per_second(&self) -> u64 {
        self.sample_rate as u64 * self.channels as u64 * PCM_SAMPLE_BYTES as u64
    }

    /// True when rate and channel count match, regardless of format.
    pub fn same_layout(&self, other: &StreamInfo) -> bool {
        self.sample_rate == other.sample_rate && self.channels == other.channels
    }
}

/// A buffer of sample bytes, decoded or still encoded.
///
/// The declared size is always `data.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub info: StreamInfo,
    /// Id of the file object the bytes came from.
    pub origin: Cuuid,
    data: Vec<u8>,
}

impl Stream {
    pub fn new(origin: Cuuid, info: StreamInfo, data: Vec<u8>) -> Self {
        Self { info, origin, data }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes per frame once in canonical PCM.
    pub fn frame_bytes(&self) -> usize {
        self.info.channels.max(1) as usize * PCM_SAMPLE_BYTES
    }

    /// Drop a trailing partial frame. Returns the number of bytes removed.
    pub fn trim_to_frames(&mut self) -> usize {
        let excess = self.data.len() % self.frame_bytes();
        self.data.truncate(self.data.len() - excess);
        excess
    }

    /// Playback length in seconds, when the stream is canonical PCM.
    pub fn duration_seconds(&self) -> Option<f64> {
        if !self.info.format.is_canonical() {
            return None;
        }
        let rate = self.info.pcm_bytes_per_second();
        if rate == 0 {
            return None;
        }
        Some(self.data.len() as f64 / rate as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_duration_uses_byte_rate() {
        let info = StreamInfo::new(Format::Pcm, 22_050, 2);
        let stream = Stream::new(Cuuid(1), info, vec![0; 22_050 * 4]);
        assert_eq!(stream.duration_seconds(), Some(1.0));
    }

    #[test]
    fn encoded_stream_has_no_duration() {
        let info = StreamInfo::new(Format::Dsp, 22_050, 1);
        let stream = Stream::new(Cuuid(1), info, vec![0; 64]);
        assert_eq!(stream.duration_seconds(), None);
        assert_eq!(stream.size(), 64);
    }

    #[test]
    fn trimming_drops_partial_frames_only() {
        let info = StreamInfo::new(Format::Pcm, 22_050, 2);
        let mut stream = Stream::new(Cuuid(1), info, vec![1; 11]);
        assert_eq!(stream.trim_to_frames(), 3);
        assert_eq!(stream.size(), 8);
        assert_eq!(stream.trim_to_frames(), 0);
        assert_eq!(stream.size(), 8);
    }
}
