//! Resource graph model.
//!
//! Entries are content-addressed by a 64-bit [`Cuuid`] and carry one typed
//! payload. The graph itself is owned by whoever parsed the container; this
//! crate only reads it through [`ResourceGraph`].

mod memory;
pub mod tree;

use std::fmt::{Display, Formatter};
use std::io;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::audio::stream::StreamInfo;

pub use memory::{ManifestError, MemoryGraph};

/// 64-bit content identifier of a graph entry.
///
/// Serialized as a 16-digit hex string; deserialized from either a hex string
/// or a plain integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cuuid(pub u64);

impl Cuuid {
    /// Parse a hexadecimal id, with or without a `0x` prefix.
    pub fn parse_hex(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty() || digits.len() > 16 {
            return None;
        }
        u64::from_str_radix(digits, 16).ok().map(Cuuid)
    }
}

impl Display for Cuuid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl Serialize for Cuuid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Cuuid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CuuidVisitor;

        impl<'de> Visitor<'de> for CuuidVisitor {
            type Value = Cuuid;

            fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "a hex string or an unsigned integer")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Cuuid, E> {
                Ok(Cuuid(value))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Cuuid, E> {
                Cuuid::parse_hex(value)
                    .ok_or_else(|| E::custom(format!("invalid cuuid: {}", value)))
            }
        }

        deserializer.deserialize_any(CuuidVisitor)
    }
}

/// Language tag attached to a localized wave link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    De,
    En,
    Es,
    Fr,
    It,
    Other(u32),
}

impl Display for Language {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::De => write!(f, "DE"),
            Self::En => write!(f, "EN"),
            Self::Es => write!(f, "ES"),
            Self::Fr => write!(f, "FR"),
            Self::It => write!(f, "IT"),
            Self::Other(code) => write!(f, "{:08X}", code),
        }
    }
}

/// Event payload: a named trigger pointing at a wave or a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub name: String,
    pub link: Cuuid,
}

/// A localized alternate of a wave.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalizedLink {
    pub link: Cuuid,
    pub language: Language,
}

/// Wave payload: the default file plus localized alternates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveRecord {
    pub default: Cuuid,
    #[serde(default)]
    pub links: Vec<LocalizedLink>,
}

/// Program payload: an ordered list of wave links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRecord {
    pub links: Vec<Cuuid>,
}

/// Location of external stream bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRef {
    pub filename: String,
    pub offset: u64,
    pub size: u64,
}

/// Where a file object's sample bytes live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamSource {
    Inline(Vec<u8>),
    External(ExternalRef),
}

/// A single audio asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileObject {
    pub info: StreamInfo,
    pub source: StreamSource,
}

impl FileObject {
    /// Byte size of the asset, whether loaded or not.
    pub fn size(&self) -> u64 {
        match &self.source {
            StreamSource::Inline(data) => data.len() as u64,
            StreamSource::External(ext) => ext.size,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self.source, StreamSource::External(_))
    }
}

/// Typed payload of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum EntryData {
    Event(EventRecord),
    Wave(WaveRecord),
    Program(ProgramRecord),
    File(FileObject),
    /// Any class this crate does not interpret.
    Other { name: String },
}

impl EntryData {
    /// Display name of the entry class.
    pub fn class_name(&self) -> &str {
        match self {
            Self::Event(_) => "EventResData",
            Self::Wave(_) => "WavResData",
            Self::Program(_) => "ProgramResData",
            Self::File(_) => "WaveFileIdObj",
            Self::Other { name } => name,
        }
    }
}

/// A node of the resource graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub cuuid: Cuuid,
    /// Byte offset in the origin container. Diagnostic only.
    #[serde(default)]
    pub offset: u64,
    #[serde(flatten)]
    pub data: EntryData,
}

impl Entry {
    pub fn new(cuuid: Cuuid, data: EntryData) -> Self {
        Self {
            cuuid,
            offset: 0,
            data,
        }
    }

    /// Event name, if this entry is an event.
    pub fn event_name(&self) -> Option<&str> {
        match &self.data {
            EntryData::Event(event) => Some(event.name.as_str()),
            _ => None,
        }
    }
}

/// Read-only access to a resource graph.
pub trait ResourceGraph {
    /// Look up an entry by id.
    fn find(&self, cuuid: Cuuid) -> Option<&Entry>;

    /// Read the bytes of an external stream.
    ///
    /// Graphs without an external store report every external stream as
    /// missing.
    fn read_external(&self, external: &ExternalRef) -> io::Result<Vec<u8>> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no external store for {}", external.filename),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuuid_parses_and_displays_hex() {
        let id = Cuuid::parse_hex("0x00000000DEADBEEF").unwrap();
        assert_eq!(id, Cuuid(0xDEAD_BEEF));
        assert_eq!(id.to_string(), "00000000DEADBEEF");
        assert_eq!(Cuuid::parse_hex("ff"), Some(Cuuid(0xFF)));
    }

    #[test]
    fn cuuid_rejects_garbage() {
        assert_eq!(Cuuid::parse_hex(""), None);
        assert_eq!(Cuuid::parse_hex("0x"), None);
        assert_eq!(Cuuid::parse_hex("xyz"), None);
        assert_eq!(Cuuid::parse_hex("11112222333344445"), None);
    }

    #[test]
    fn language_tags_display_short_codes() {
        assert_eq!(Language::Fr.to_string(), "FR");
        assert_eq!(Language::Other(0x1234).to_string(), "00001234");
    }
}
