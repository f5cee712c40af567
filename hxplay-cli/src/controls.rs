use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use hxplay_lib::graph::ResourceGraph;
use hxplay_lib::playback::{PlaybackState, PlaybackStatus, Player};
use log::warn;

const GAIN_STEP: f32 = 0.05;

pub struct StatusSnapshot {
    pub text: String,
}

/// Event name plus queue counters, e.g. `B:4096/88200 Q:1/3`.
pub fn status_text(title: &str, status: &PlaybackStatus) -> StatusSnapshot {
    if status.state == PlaybackState::Empty {
        return StatusSnapshot {
            text: format!("{}\nThe audio queue is empty.", title),
        };
    }

    let state = match status.state {
        PlaybackState::Playing => "▶ Playing",
        PlaybackState::Paused => "⏸ Paused",
        PlaybackState::Loaded | PlaybackState::Empty => "■ Stopped",
    };
    let text = format!(
        "{}   {}\n{}   -{}   gain {:.2}   repeat {}",
        title,
        counters(status),
        state,
        format_remaining(status.remaining_seconds()),
        status.gain,
        if status.repeat { "on" } else { "off" }
    );

    StatusSnapshot { text }
}

pub fn counters(status: &PlaybackStatus) -> String {
    format!(
        "B:{}/{} Q:{}/{}",
        status.total_position,
        status.total_length,
        status.queue_index + 1,
        status.queue_count
    )
}

/// `HH:MM:SS.mmm`, hours always zero.
pub fn format_remaining(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0) as u64 % 60;
    format!("{:02}:{:02}:{:06.3}", 0, minutes, seconds % 60.0)
}

/// Space: replay once finished, retry the device while loaded, otherwise
/// toggle pause.
pub fn on_space(player: &mut Player, graph: &dyn ResourceGraph) {
    match player.state() {
        PlaybackState::Empty => {
            if let Err(err) = player.replay(graph) {
                warn!("replay failed: {}", err);
            }
        }
        PlaybackState::Loaded => {
            if let Err(err) = player.play() {
                warn!("play failed: {}", err);
            }
        }
        PlaybackState::Playing | PlaybackState::Paused => player.toggle_pause(),
    }
}

/// Handle one key press. Returns `false` when the user asked to quit.
pub fn handle_key_event(player: &mut Player, graph: &dyn ResourceGraph) -> bool {
    if event::poll(Duration::from_millis(100)).unwrap_or(false) {
        if let Ok(Event::Key(key)) = event::read() {
            if key.kind != KeyEventKind::Press {
                return true;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    player.clear();
                    return false;
                }
                KeyCode::Char(' ') => on_space(player, graph),
                KeyCode::Char('s') | KeyCode::Char('S') => {
                    player.clear();
                }
                KeyCode::Char('r') | KeyCode::Char('R') => {
                    let repeat = player.repeat();
                    player.set_repeat(!repeat);
                }
                KeyCode::Char('-') => {
                    let next = (player.gain() - GAIN_STEP).max(0.0);
                    player.set_gain(next);
                }
                KeyCode::Char('=') | KeyCode::Char('+') => {
                    let next = (player.gain() + GAIN_STEP).min(1.0);
                    player.set_gain(next);
                }
                _ => {}
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use hxplay_lib::audio::{Format, Stream, StreamInfo};
    use hxplay_lib::graph::{Cuuid, MemoryGraph};
    use hxplay_lib::playback::{
        DeviceSpec, OutputBackend, OutputDevice, PlaybackSettings, SharedSession,
    };
    use hxplay_lib::PlaybackError;

    struct SilentDevice;

    impl OutputDevice for SilentDevice {
        fn pause(&self) {}
        fn resume(&self) {}
    }

    /// Opens silent devices, failing the first `failures` attempts.
    struct FlakyBackend {
        failures: AtomicUsize,
        opened: Arc<AtomicUsize>,
    }

    impl OutputBackend for FlakyBackend {
        fn open(
            &self,
            _spec: DeviceSpec,
            _session: SharedSession,
        ) -> Result<Box<dyn OutputDevice>, PlaybackError> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(PlaybackError::DeviceOpen("busy".to_string()));
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(SilentDevice))
        }
    }

    fn status(state: PlaybackState) -> PlaybackStatus {
        PlaybackStatus {
            state,
            total_position: 22_050,
            total_length: 88_200,
            position: 22_050,
            front_size: 44_100,
            queue_index: 0,
            queue_count: 2,
            gain: 0.5,
            repeat: false,
            info: Some(StreamInfo::new(Format::Pcm, 22_050, 1)),
            queued: Vec::new(),
        }
    }

    #[test]
    fn counters_use_one_based_queue_index() {
        assert_eq!(counters(&status(PlaybackState::Playing)), "B:22050/88200 Q:1/2");
    }

    #[test]
    fn remaining_time_formats_minutes_and_millis() {
        assert_eq!(format_remaining(1.5), "00:00:01.500");
        assert_eq!(format_remaining(75.25), "00:01:15.250");
        assert_eq!(format_remaining(-3.0), "00:00:00.000");
    }

    #[test]
    fn empty_status_says_so() {
        let text = status_text("Play_Ambience", &status(PlaybackState::Empty)).text;
        assert!(text.contains("The audio queue is empty."));
        let text = status_text("Play_Ambience", &status(PlaybackState::Playing)).text;
        assert!(text.contains("-00:00:01.500"));
    }

    #[test]
    fn space_retries_the_device_while_loaded() {
        let opened = Arc::new(AtomicUsize::new(0));
        let backend = FlakyBackend {
            failures: AtomicUsize::new(1),
            opened: opened.clone(),
        };
        let mut player = Player::with_backend(PlaybackSettings::default(), Box::new(backend));
        let info = StreamInfo::new(Format::Pcm, 8_000, 1);
        player
            .load(vec![Stream::new(Cuuid(3), info, vec![0; 64])])
            .unwrap();
        assert!(player.play().is_err());
        assert_eq!(player.state(), PlaybackState::Loaded);

        let graph = MemoryGraph::new();
        on_space(&mut player, &graph);
        assert_eq!(player.state(), PlaybackState::Playing);
        assert_eq!(opened.load(Ordering::SeqCst), 1);

        on_space(&mut player, &graph);
        assert_eq!(player.state(), PlaybackState::Paused);
    }
}
