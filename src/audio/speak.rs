//! Route a [`SpeechOutcome`] to a playback slot or the local speech path.

use thiserror::Error;

use crate::audio::decode::{decode_payload, AudioError};
use crate::audio::local::LocalSpeech;
use crate::audio::playback::{AudioEngine, Slot};
use crate::config::AudioConfig;
use crate::llm::SpeechOutcome;

/// How the text ended up being spoken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spoken {
    /// Decoded and playing on the slot; carries the duration in seconds.
    Slot(f64),
    /// Handed to the local speech path; the slot is idle.
    Local,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpeakError {
    #[error("speech is unavailable for this text")]
    Unavailable,

    #[error(transparent)]
    Audio(#[from] AudioError),
}

/// Play `outcome` on `slot`, replacing whatever the slot was playing.
///
/// A decode or output failure leaves the slot empty.
pub fn speak(
    engine: &mut AudioEngine,
    slot: Slot,
    outcome: SpeechOutcome,
    local: &dyn LocalSpeech,
    config: &AudioConfig,
) -> Result<Spoken, SpeakError> {
    engine.stop(slot);
    match outcome {
        SpeechOutcome::Audio(payload) => {
            let buffer = decode_payload(&payload, config)?;
            let duration = buffer.duration_secs();
            engine.play(slot, buffer, 0.0)?;
            Ok(Spoken::Slot(duration))
        }
        SpeechOutcome::Local(text) => {
            local.cancel();
            if local.speak(&text) {
                Ok(Spoken::Local)
            } else {
                Err(SpeakError::Unavailable)
            }
        }
        SpeechOutcome::Unavailable => Err(SpeakError::Unavailable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::audio::local::{LogSpeech, NoSpeech};
    use crate::audio::playback::tests::{ManualClock, RecordingOutput};
    use crate::llm::mock::pcm_payload;

    fn engine() -> AudioEngine {
        AudioEngine::new(
            Arc::new(RecordingOutput::default()),
            Arc::new(ManualClock::default()),
        )
    }

    #[test]
    fn audio_outcome_plays_on_slot() {
        let mut engine = engine();
        let outcome = SpeechOutcome::Audio(pcm_payload(24_000));
        let spoken = speak(&mut engine, Slot::SelectionRead, outcome, &NoSpeech, &AudioConfig::default());

        assert_eq!(spoken, Ok(Spoken::Slot(1.0)));
        assert!(engine.slot(Slot::SelectionRead).is_playing());
    }

    #[test]
    fn local_outcome_uses_local_speech() {
        let mut engine = engine();
        let config = AudioConfig::default();

        let ok = speak(&mut engine, Slot::SelectionRead, SpeechOutcome::Local("荷塘".into()), &LogSpeech, &config);
        assert_eq!(ok, Ok(Spoken::Local));

        let missing = speak(&mut engine, Slot::SelectionRead, SpeechOutcome::Local("荷塘".into()), &NoSpeech, &config);
        assert_eq!(missing, Err(SpeakError::Unavailable));
    }

    #[test]
    fn corrupt_payload_leaves_slot_idle() {
        let mut engine = engine();
        let outcome = SpeechOutcome::Audio("%%%".into());
        let result = speak(&mut engine, Slot::AnalysisLecture, outcome, &NoSpeech, &AudioConfig::default());

        assert!(matches!(result, Err(SpeakError::Audio(AudioError::Base64(_)))));
        assert!(!engine.slot(Slot::AnalysisLecture).has_buffer());
    }
}
