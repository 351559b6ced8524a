//! Audio capture, playback and speech sequencing using PipeWire
//!
//! This module provides:
//! - Microphone capture with real-time level metering
//! - Playback of synthesized WAV clips
//! - In-memory WAV encoding/decoding via hound
//! - Sequential playback of speech segments

mod capture;
mod playback;
mod sequencer;
mod wav;

use thiserror::Error;

pub use capture::{AudioCapture, CapturedAudio, Microphone};
pub use playback::{AudioSink, MutedSink, PipeWireSink, PlaybackEnd, PlaybackTicket};
pub use sequencer::SpeechSequencer;
pub use wav::{decode_wav, encode_wav};

/// Failures of the local audio devices
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio device error: {0}")]
    Device(String),

    #[error("playback failed: {0}")]
    Playback(String),

    #[error("invalid audio data: {0}")]
    Encoding(#[from] hound::Error),

    #[error("capture not running")]
    NotRunning,
}
