//! Audio I/O modules
//!
//! Decoding with Symphonia, the scoped intermediate WAV file and the mono
//! sample buffer every analysis stage reads from.

pub mod decoder;
pub mod intermediate;
pub mod sample_buffer;

pub use decoder::{decode_file, decode_mono, DecodedAudio};
pub use intermediate::IntermediateWav;
pub use sample_buffer::SampleBuffer;
