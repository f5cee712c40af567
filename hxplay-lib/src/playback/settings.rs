use serde::{Deserialize, Deserializer, Serialize};

const DEFAULT_PERIOD_FRAMES: usize = 1024;
const DEFAULT_GAIN: f32 = 0.5;
const DEFAULT_OPEN_RETRIES: usize = 20;
const DEFAULT_OPEN_RETRY_MS: u64 = 100;

/// Largest device period accepted, in frames.
pub const MAX_PERIOD_FRAMES: usize = 65_536;

/// Clamp a period length into `1..=MAX_PERIOD_FRAMES`.
pub fn clamp_period_frames(frames: usize) -> usize {
    frames.clamp(1, MAX_PERIOD_FRAMES)
}

fn deserialize_period_frames<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let frames = u64::deserialize(deserializer)?;
    Ok(clamp_period_frames(
        usize::try_from(frames).unwrap_or(MAX_PERIOD_FRAMES),
    ))
}

/// Runtime settings for a [`Player`](super::Player).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Frames pulled from the session per device callback.
    #[serde(deserialize_with = "deserialize_period_frames")]
    pub period_frames: usize,
    /// Initial mix gain.
    pub gain: f32,
    /// Loop the queue when it runs out.
    pub repeat: bool,
    /// Attempts at opening the output device before giving up.
    pub open_retries: usize,
    /// Delay between output device open attempts.
    pub open_retry_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            period_frames: DEFAULT_PERIOD_FRAMES,
            gain: DEFAULT_GAIN,
            repeat: false,
            open_retries: DEFAULT_OPEN_RETRIES,
            open_retry_ms: DEFAULT_OPEN_RETRY_MS,
        }
    }
}

impl PlaybackSettings {
    /// Parse settings from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set the device period in frames, clamped to `1..=MAX_PERIOD_FRAMES`.
    pub fn set_period_frames(&mut self, frames: usize) {
        self.period_frames = clamp_period_frames(frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = PlaybackSettings::from_json(r#"{"repeat": true}"#).unwrap();
        assert!(settings.repeat);
        assert_eq!(settings.period_frames, DEFAULT_PERIOD_FRAMES);
        assert_eq!(settings.gain, DEFAULT_GAIN);
    }

    #[test]
    fn period_is_clamped_from_setter_and_json() {
        let mut settings = PlaybackSettings::default();
        settings.set_period_frames(0);
        assert_eq!(settings.period_frames, 1);
        settings.set_period_frames(usize::MAX);
        assert_eq!(settings.period_frames, MAX_PERIOD_FRAMES);

        let settings =
            PlaybackSettings::from_json(r#"{"period_frames": 18446744073709551615}"#).unwrap();
        assert_eq!(settings.period_frames, MAX_PERIOD_FRAMES);
        let settings = PlaybackSettings::from_json(r#"{"period_frames": 0}"#).unwrap();
        assert_eq!(settings.period_frames, 1);
    }
}
