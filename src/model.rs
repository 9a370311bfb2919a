use chrono::serde::ts_milliseconds;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

pub type NoteId = String;

/// A single thought. Serialized as `{ id, content, createdAt }` with
/// `createdAt` in epoch milliseconds.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub content: String,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Persisted UI flags. The timer drawer and the countdown itself are not
/// part of this and never hit disk.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub blur_enabled: bool,
    pub focus_mode_enabled: bool,
    pub onboarding_completed: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            blur_enabled: true,
            focus_mode_enabled: false,
            onboarding_completed: false,
        }
    }
}

impl Note {
    pub fn new(id: NoteId, content: String, now: DateTime<Utc>) -> Self {
        Note {
            id,
            content,
            // storage keeps millisecond precision only
            created_at: now.trunc_subsecs(3),
        }
    }

    pub fn age_millis(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn note_serializes_with_camel_case_millis() {
        let created = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let note = Note::new("abc".into(), "hello".into(), created);
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["content"], "hello");
        assert_eq!(json["createdAt"], 1_700_000_000_123i64);
    }

    #[test]
    fn note_new_truncates_to_millis() {
        let created = Utc
            .timestamp_opt(1_700_000_000, 123_456_789)
            .single()
            .unwrap();
        let note = Note::new("x".into(), "y".into(), created);
        assert_eq!(note.created_at.timestamp_subsec_nanos(), 123_000_000);
    }

    #[test]
    fn preferences_fill_missing_fields_with_defaults() {
        let prefs: Preferences = serde_json::from_str(r#"{"focusModeEnabled":true}"#).unwrap();
        assert!(prefs.blur_enabled);
        assert!(prefs.focus_mode_enabled);
        assert!(!prefs.onboarding_completed);
    }
}
