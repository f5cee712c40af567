//! Loading the queue from streams or from graph entries.

use log::{info, warn};

use crate::audio::stream::{Format, Stream, StreamInfo};
use crate::diagnostics::LogEntry;
use crate::error::PlaybackError;
use crate::graph::{Cuuid, Entry, ResourceGraph};
use crate::playback::session::lock_session;
use crate::resolve::{materialize, Resolver};

use super::Player;

impl Player {
    /// Replace the queue with `streams`, converted to canonical PCM.
    ///
    /// Whatever was queued before is cleared first. Any conversion failure, or
    /// a stream whose rate or channel count differs from the first one,
    /// aborts the load and leaves the engine empty. An empty list leaves the
    /// engine empty as well. Trailing partial frames are dropped so every
    /// stream starts on a frame boundary.
    pub fn load(&mut self, streams: Vec<Stream>) -> Result<(), PlaybackError> {
        self.clear();
        if streams.is_empty() {
            warn!("nothing to load");
            return Ok(());
        }

        let count = streams.len();
        let mut converted = Vec::with_capacity(count);
        let mut layout: Option<StreamInfo> = None;
        for stream in streams {
            let mut stream = self.to_canonical(stream)?;
            let trimmed = stream.trim_to_frames();
            if trimmed > 0 {
                warn!(
                    "stream {} ends in a partial frame; dropped {} byte(s)",
                    stream.origin, trimmed
                );
                self.emit(LogEntry::warning(format!(
                    "stream {} trimmed by {} byte(s)",
                    stream.origin, trimmed
                )));
            }
            match layout {
                None => layout = Some(stream.info),
                Some(expected) if !expected.same_layout(&stream.info) => {
                    return Err(self.fail(PlaybackError::MixedFormat {
                        origin: stream.origin,
                        expected,
                        found: stream.info,
                    }));
                }
                Some(_) => {}
            }
            converted.push(stream);
        }

        let Some(info) = layout else {
            return Ok(());
        };
        let total: usize = converted.iter().map(Stream::size).sum();
        let seconds: f64 = converted.iter().filter_map(Stream::duration_seconds).sum();
        lock_session(&self.session).replace_queue(converted, info);

        info!(
            "loaded {} streams, {} bytes ({:.2}s) at {} Hz / {} ch",
            count, total, seconds, info.sample_rate, info.channels
        );
        self.emit(LogEntry::info(format!(
            "queued {} stream(s), {:.2}s",
            count, seconds
        )));
        Ok(())
    }

    fn to_canonical(&self, stream: Stream) -> Result<Stream, PlaybackError> {
        if stream.info.format.is_canonical() {
            return Ok(stream);
        }
        let origin = stream.origin;
        self.converter
            .convert(&stream, Format::Pcm)
            .map_err(|source| self.fail(PlaybackError::Conversion { origin, source }))
    }

    /// Resolve `entry`, load whatever it reaches and start playing.
    ///
    /// Streams whose bytes cannot be read are skipped with a warning. Returns
    /// the number of streams queued.
    pub fn queue_entry(
        &mut self,
        graph: &dyn ResourceGraph,
        entry: &Entry,
    ) -> Result<usize, PlaybackError> {
        let resolution = Resolver::new(graph).resolve(entry);
        if !resolution.success {
            return Err(self.fail(PlaybackError::Unresolved(entry.cuuid)));
        }

        let mut streams = Vec::with_capacity(resolution.streams.len());
        for stream_ref in &resolution.streams {
            match materialize(graph, stream_ref) {
                Ok(stream) => streams.push(stream),
                Err(source) => {
                    let err = PlaybackError::Io {
                        origin: stream_ref.cuuid,
                        source,
                    };
                    warn!("{}", err);
                    self.emit(LogEntry::warning(err.to_string()));
                }
            }
        }
        if streams.is_empty() {
            return Err(self.fail(PlaybackError::Unresolved(entry.cuuid)));
        }

        let count = streams.len();
        self.load(streams)?;
        self.current = Some(entry.cuuid);
        match entry.event_name() {
            Some(name) => self.emit(LogEntry::status(format!("{} ({})", name, entry.cuuid))),
            None => self.emit(LogEntry::status(entry.cuuid.to_string())),
        }
        self.play()?;
        Ok(count)
    }

    /// Look up `id` in the graph and queue it.
    pub fn queue_id(&mut self, graph: &dyn ResourceGraph, id: Cuuid) -> Result<usize, PlaybackError> {
        let Some(entry) = graph.find(id) else {
            return Err(self.fail(PlaybackError::Unresolved(id)));
        };
        self.queue_entry(graph, entry)
    }

    /// Queue the most recently queued event again from the start.
    pub fn replay(&mut self, graph: &dyn ResourceGraph) -> Result<usize, PlaybackError> {
        match self.current {
            Some(id) => self.queue_id(graph, id),
            None => Err(self.fail(PlaybackError::NothingQueued)),
        }
    }
}
