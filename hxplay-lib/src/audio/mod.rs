//! Stream types, format conversion, and PCM mixing.

pub mod convert;
pub mod mix;
pub mod stream;

pub use convert::{CodecConverter, ConvertError, Converter};
pub use stream::{Format, Stream, StreamInfo};
