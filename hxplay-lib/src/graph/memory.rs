//! In-memory resource graph backed by a JSON manifest.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{Cuuid, Entry, EntryData, ExternalRef, ResourceGraph};

/// Error type for loading a graph manifest.
#[derive(Debug)]
pub enum ManifestError {
    Io(io::Error),
    Parse(serde_json::Error),
    DuplicateId(Cuuid),
}

impl Display for ManifestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Parse(err) => write!(f, "invalid manifest: {}", err),
            Self::DuplicateId(id) => write!(f, "duplicate entry id {}", id),
        }
    }
}

impl std::error::Error for ManifestError {}

impl From<io::Error> for ManifestError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ManifestError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    entries: Vec<Entry>,
}

/// Resource graph held entirely in memory.
///
/// External streams are read from `base_dir`, using only the file name of the
/// reference.
#[derive(Debug, Default, Clone)]
pub struct MemoryGraph {
    entries: HashMap<Cuuid, Entry>,
    order: Vec<Cuuid>,
    base_dir: Option<PathBuf>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directory external stream files are read from.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Insert an entry, returning the entry it replaced.
    pub fn insert(&mut self, entry: Entry) -> Option<Entry> {
        let id = entry.cuuid;
        let previous = self.entries.insert(id, entry);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    /// Parse a JSON manifest. Duplicate ids are rejected.
    pub fn from_manifest_str(json: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = serde_json::from_str(json)?;
        let mut graph = Self::new();
        for entry in manifest.entries {
            let id = entry.cuuid;
            if graph.insert(entry).is_some() {
                return Err(ManifestError::DuplicateId(id));
            }
        }
        Ok(graph)
    }

    /// Load a manifest file; external streams resolve next to it.
    pub fn load_manifest(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let graph = Self::from_manifest_str(&json)?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        log::info!(
            "loaded {} entries from {}",
            graph.len(),
            path.display()
        );
        Ok(graph.with_base_dir(dir))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Event entries in insertion order.
    pub fn events(&self) -> impl Iterator<Item = &Entry> {
        self.entries()
            .filter(|entry| matches!(entry.data, EntryData::Event(_)))
    }
}

impl ResourceGraph for MemoryGraph {
    fn find(&self, cuuid: Cuuid) -> Option<&Entry> {
        self.entries.get(&cuuid)
    }

    fn read_external(&self, external: &ExternalRef) -> io::Result<Vec<u8>> {
        let Some(base_dir) = &self.base_dir else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no base directory for {}", external.filename),
            ));
        };
        let file_name = Path::new(&external.filename)
            .file_name()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid external file name {:?}", external.filename),
                )
            })?;

        let mut file = File::open(base_dir.join(file_name))?;
        let file_len = file.metadata()?.len();
        let available = file_len.saturating_sub(external.offset);
        let size = external.size.min(available);
        if size < external.size {
            log::warn!(
                "external stream {} truncated: wanted {} bytes at 0x{:X}, found {}",
                external.filename,
                external.size,
                external.offset,
                size
            );
        }

        file.seek(SeekFrom::Start(external.offset))?;
        let mut data = vec![0u8; size as usize];
        file.read_exact(&mut data)?;
        Ok(data)
    }
}
