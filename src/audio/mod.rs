//! Audio playback — payload decode → slot players → speaker.
//!
//! # Pipeline
//!
//! ```text
//! base64 payload → decode_payload → AudioBuffer
//!               → AudioEngine (Narration | SelectionRead | AnalysisLecture)
//!               → AudioOutput (CpalOutput / NullOutput)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use smartread::audio::{decode_payload, AudioEngine, CpalOutput, Slot, SystemClock};
//! use smartread::config::AudioConfig;
//!
//! let mut engine = AudioEngine::new(
//!     Arc::new(CpalOutput::new().unwrap()),
//!     Arc::new(SystemClock::new()),
//! );
//! let buffer = decode_payload("AAAAAAAA", &AudioConfig::default()).unwrap();
//! engine.play(Slot::Narration, buffer, 0.0).unwrap();
//!
//! // Poll from the UI refresh loop.
//! for (slot, progress) in engine.tick() {
//!     println!("{slot:?}: {:.0}%", progress * 100.0);
//! }
//! ```

pub mod decode;
pub mod local;
pub mod output;
pub mod playback;
pub mod resample;
pub mod speak;

pub use decode::{decode_payload, AudioBuffer, AudioError};
pub use local::{LocalSpeech, LogSpeech, NoSpeech};
pub use output::CpalOutput;
pub use playback::{
    AudioEngine, AudioOutput, Clock, NullOutput, PlaybackState, Slot, SlotPlayer, SourceId,
    SystemClock,
};
pub use resample::{downmix_to_mono, remix_channels, resample_linear};
pub use speak::{speak, SpeakError, Spoken};
