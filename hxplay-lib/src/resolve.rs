//! Resource link resolution.
//!
//! Walks Event → Wave → File and Event → Program → Wave[] → File chains and
//! collects the file objects that can be played. Broken links never abort the
//! walk; they only lower the result.

use std::collections::HashSet;
use std::io;

use log::{debug, warn};

use crate::audio::stream::Stream;
use crate::graph::{Cuuid, Entry, EntryData, FileObject, ResourceGraph, StreamSource, WaveRecord};

/// A playable file object found by the resolver. Bytes may not be loaded yet.
#[derive(Debug, Clone, Copy)]
pub struct StreamRef<'g> {
    pub cuuid: Cuuid,
    pub file: &'g FileObject,
}

/// Result of resolving one start entry.
#[derive(Debug, Clone, Default)]
pub struct Resolution<'g> {
    pub streams: Vec<StreamRef<'g>>,
    pub success: bool,
}

impl<'g> Resolution<'g> {
    fn failed() -> Self {
        Self {
            streams: Vec::new(),
            success: false,
        }
    }
}

/// Resolves graph entries into playable stream references.
pub struct Resolver<'g> {
    graph: &'g dyn ResourceGraph,
}

impl<'g> Resolver<'g> {
    pub fn new(graph: &'g dyn ResourceGraph) -> Self {
        Self { graph }
    }

    /// Look up `id` and resolve it. A missing entry is a failed resolution.
    pub fn resolve_id(&self, id: Cuuid) -> Resolution<'g> {
        match self.graph.find(id) {
            Some(entry) => self.resolve(entry),
            None => {
                warn!("cannot resolve {}: no such entry", id);
                Resolution::failed()
            }
        }
    }

    /// Resolve a start entry.
    ///
    /// Only events resolve. An event linking a wave yields that wave's file;
    /// an event linking a program yields one file per resolvable wave, in
    /// program order, and succeeds if any of them resolved.
    pub fn resolve(&self, start: &Entry) -> Resolution<'g> {
        let mut path = HashSet::new();
        path.insert(start.cuuid);

        let event = match &start.data {
            EntryData::Event(event) => event,
            EntryData::Wave(_)
            | EntryData::Program(_)
            | EntryData::File(_)
            | EntryData::Other { .. } => {
                debug!(
                    "{} ({}) is not an event; nothing to resolve",
                    start.cuuid,
                    start.data.class_name()
                );
                return Resolution::failed();
            }
        };

        let Some(target) = self.enter(event.link, &mut path) else {
            return Resolution::failed();
        };

        let resolution = match &target.data {
            EntryData::Wave(wave) => self.resolve_wave(target.cuuid, wave, &mut path),
            EntryData::Program(program) => {
                let mut resolution = Resolution::failed();
                for link in &program.links {
                    let Some(entry) = self.enter(*link, &mut path) else {
                        continue;
                    };
                    match &entry.data {
                        EntryData::Wave(wave) => {
                            let wave_result = self.resolve_wave(entry.cuuid, wave, &mut path);
                            resolution.success |= wave_result.success;
                            resolution.streams.extend(wave_result.streams);
                        }
                        other => warn!(
                            "program {} links {} ({}), expected a wave",
                            target.cuuid,
                            entry.cuuid,
                            other.class_name()
                        ),
                    }
                    path.remove(link);
                }
                resolution
            }
            other => {
                warn!(
                    "event {} links {} ({}), expected a wave or program",
                    start.cuuid,
                    target.cuuid,
                    other.class_name()
                );
                Resolution::failed()
            }
        };

        path.remove(&target.cuuid);
        resolution
    }

    /// Follow a wave's default link to its file object.
    fn resolve_wave(
        &self,
        wave_id: Cuuid,
        wave: &WaveRecord,
        path: &mut HashSet<Cuuid>,
    ) -> Resolution<'g> {
        let Some(entry) = self.enter(wave.default, path) else {
            debug!("wave {} has no resolvable default link", wave_id);
            return Resolution::failed();
        };
        path.remove(&entry.cuuid);

        match &entry.data {
            EntryData::File(file) => Resolution {
                streams: vec![StreamRef {
                    cuuid: entry.cuuid,
                    file,
                }],
                success: true,
            },
            other => {
                warn!(
                    "wave {} default link {} is a {}, expected a file",
                    wave_id,
                    entry.cuuid,
                    other.class_name()
                );
                Resolution::failed()
            }
        }
    }

    /// Look up `id` and push it onto the current path.
    ///
    /// Returns `None` for missing entries and for ids already on the path.
    fn enter(&self, id: Cuuid, path: &mut HashSet<Cuuid>) -> Option<&'g Entry> {
        let Some(entry) = self.graph.find(id) else {
            warn!("unresolved link {}", id);
            return None;
        };
        if !path.insert(id) {
            warn!("link cycle through {}", id);
            return None;
        }
        Some(entry)
    }
}

/// Load the bytes behind a stream reference.
///
/// Inline data is copied; external data is read through the graph. A short
/// external read yields a shorter stream rather than padding.
pub fn materialize(graph: &dyn ResourceGraph, stream: &StreamRef<'_>) -> io::Result<Stream> {
    let data = match &stream.file.source {
        StreamSource::Inline(data) => data.clone(),
        StreamSource::External(external) => graph.read_external(external)?,
    };
    Ok(Stream::new(stream.cuuid, stream.file.info, data))
}
