//! Local speech path for text too short to synthesise.

/// A platform speech facility (screen reader, OS voice).
///
/// `speak` returns `false` when the text could not be spoken.
pub trait LocalSpeech: Send + Sync {
    fn speak(&self, text: &str) -> bool;
    fn cancel(&self);
}

/// Writes the text to the log instead of speaking it; used headless.
#[derive(Debug, Default)]
pub struct LogSpeech;

impl LocalSpeech for LogSpeech {
    fn speak(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        log::info!("local speech: {text}");
        true
    }

    fn cancel(&self) {}
}

/// No local speech available.
#[derive(Debug, Default)]
pub struct NoSpeech;

impl LocalSpeech for NoSpeech {
    fn speak(&self, _text: &str) -> bool {
        false
    }

    fn cancel(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_speech_rejects_blank_text() {
        assert!(LogSpeech.speak("荷塘"));
        assert!(!LogSpeech.speak("   "));
        assert!(!NoSpeech.speak("荷塘"));
    }
}
