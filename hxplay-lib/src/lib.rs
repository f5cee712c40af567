//! # hxplay
//!
//! Resource link resolution and streaming playback for .hx audio resource
//! graphs. The [`resolve`] module walks Event → Wave/Program → File chains;
//! the [`playback`] module queues the resulting streams and mixes them into an
//! output device from a real-time callback.

pub mod audio;
pub mod diagnostics;
mod error;
pub mod graph;
pub mod playback;
pub mod resolve;

pub use error::PlaybackError;
