//! Converter adapter between storage formats and canonical PCM.
//!
//! The engine only decides *when* a stream needs converting; the sample-level
//! work lives behind [`Converter`]. [`CodecConverter`] is the default adapter:
//! it passes canonical PCM through and decodes MP3 with Symphonia. The
//! console ADPCM variants have no decoder here and report
//! [`ConvertError::UnsupportedCodec`].

use std::fmt::{Display, Formatter};
use std::io::Cursor;

use log::{debug, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::stream::{Format, Stream, StreamInfo};

/// Error type for stream format conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertError {
    UnsupportedCodec { from: Format, to: Format },
    Decode(String),
}

impl Display for ConvertError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedCodec { from, to } => {
                write!(f, "unsupported codec: {} -> {}", from, to)
            }
            Self::Decode(err) => write!(f, "decode error: {}", err),
        }
    }
}

impl std::error::Error for ConvertError {}

impl From<SymphoniaError> for ConvertError {
    fn from(value: SymphoniaError) -> Self {
        Self::Decode(value.to_string())
    }
}

/// Converts a stream from its storage format into another format.
pub trait Converter: Send + Sync {
    fn convert(&self, src: &Stream, target: Format) -> Result<Stream, ConvertError>;
}

/// Default converter: PCM passthrough plus Symphonia-backed MP3 decode.
#[derive(Debug, Default, Clone, Copy)]
pub struct CodecConverter;

impl Converter for CodecConverter {
    fn convert(&self, src: &Stream, target: Format) -> Result<Stream, ConvertError> {
        match (src.info.format, target) {
            (from, to) if from == to => Ok(src.clone()),
            (Format::Mp3, Format::Pcm) => decode_mp3(src),
            (from, to) => Err(ConvertError::UnsupportedCodec { from, to }),
        }
    }
}

fn decode_mp3(src: &Stream) -> Result<Stream, ConvertError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(src.data().to_vec())), Default::default());
    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let opened = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = opened.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ConvertError::Decode("no audio tracks found".to_string()))?;
    let track_id = track.id;
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut pcm = Vec::with_capacity(src.size() * 8);
    let mut info = src.info.as_canonical();
    let mut sample_buffer: Option<SampleBuffer<i16>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(err) => return Err(err.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(err)) => {
                warn!("skipping corrupt mp3 packet: {}", err);
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let spec = *decoded.spec();
        info = StreamInfo::new(Format::Pcm, spec.rate, spec.channels.count() as u16);

        let needed = decoded.capacity() as u64;
        if sample_buffer
            .as_ref()
            .map_or(true, |buffer| (buffer.capacity() as u64) < needed)
        {
            sample_buffer = Some(SampleBuffer::new(needed, spec));
        }
        let Some(buffer) = sample_buffer.as_mut() else {
            continue;
        };
        buffer.copy_interleaved_ref(decoded);
        for sample in buffer.samples() {
            pcm.extend_from_slice(&sample.to_le_bytes());
        }
    }

    debug!(
        "decoded mp3 stream {}: {} -> {} bytes",
        src.origin,
        src.size(),
        pcm.len()
    );
    Ok(Stream::new(src.origin, info, pcm))
}
