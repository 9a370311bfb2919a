use log::warn;
use std::collections::HashSet;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("speech service unreachable")]
    Network,
    #[error("voice input is not supported here")]
    Unsupported,
    #[error("voice input failed: {0}")]
    Other(String),
}

impl SpeechError {
    fn kind(&self) -> &'static str {
        match self {
            SpeechError::PermissionDenied => "permission_denied",
            SpeechError::Network => "network",
            SpeechError::Unsupported => "unsupported",
            SpeechError::Other(_) => "other",
        }
    }
}

/// External dictation provider. Transcripts are pulled by the UI loop.
pub trait SpeechCapability {
    fn start(&mut self) -> Result<(), SpeechError>;
    fn stop(&mut self);
    fn poll_transcript(&mut self) -> Result<Option<String>, SpeechError>;
    fn is_listening(&self) -> bool;
}

/// Used where no dictation backend exists.
#[derive(Debug, Default)]
pub struct UnavailableSpeech;

impl SpeechCapability for UnavailableSpeech {
    fn start(&mut self) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported)
    }

    fn stop(&mut self) {}

    fn poll_transcript(&mut self) -> Result<Option<String>, SpeechError> {
        Ok(None)
    }

    fn is_listening(&self) -> bool {
        false
    }
}

/// Turns speech failures into user notifications, at most one per error kind
/// for the lifetime of the session.
#[derive(Debug, Default)]
pub struct SpeechNotices {
    shown: HashSet<&'static str>,
}

impl SpeechNotices {
    pub fn report(&mut self, err: &SpeechError) -> Option<String> {
        if !self.shown.insert(err.kind()) {
            return None;
        }
        warn!("event=speech_error kind={}", err.kind());
        Some(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedSpeech {
        listening: bool,
        chunks: Vec<Result<Option<String>, SpeechError>>,
    }

    impl SpeechCapability for ScriptedSpeech {
        fn start(&mut self) -> Result<(), SpeechError> {
            self.listening = true;
            Ok(())
        }

        fn stop(&mut self) {
            self.listening = false;
        }

        fn poll_transcript(&mut self) -> Result<Option<String>, SpeechError> {
            if self.chunks.is_empty() {
                Ok(None)
            } else {
                self.chunks.remove(0)
            }
        }

        fn is_listening(&self) -> bool {
            self.listening
        }
    }

    #[test]
    fn unavailable_backend_reports_unsupported() {
        let mut speech = UnavailableSpeech;
        assert_eq!(speech.start(), Err(SpeechError::Unsupported));
        assert!(!speech.is_listening());
        assert_eq!(speech.poll_transcript(), Ok(None));
    }

    #[test]
    fn notices_are_deduplicated_per_kind() {
        let mut notices = SpeechNotices::default();
        assert!(notices.report(&SpeechError::Unsupported).is_some());
        assert!(notices.report(&SpeechError::Unsupported).is_none());
        assert!(notices.report(&SpeechError::Network).is_some());
        assert!(notices.report(&SpeechError::Other("a".into())).is_some());
        assert!(notices.report(&SpeechError::Other("b".into())).is_none());
    }

    #[test]
    fn scripted_backend_feeds_transcripts_and_errors() {
        let mut speech = ScriptedSpeech {
            listening: false,
            chunks: vec![
                Ok(Some("hello".into())),
                Err(SpeechError::PermissionDenied),
            ],
        };
        let mut notices = SpeechNotices::default();
        speech.start().unwrap();
        assert!(speech.is_listening());
        assert_eq!(speech.poll_transcript(), Ok(Some("hello".into())));
        let err = speech.poll_transcript().unwrap_err();
        assert_eq!(
            notices.report(&err).as_deref(),
            Some("microphone permission denied")
        );
        speech.stop();
        assert!(!speech.is_listening());
        assert_eq!(speech.poll_transcript(), Ok(None));
    }
}
