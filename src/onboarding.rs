use crate::model::Note;
use chrono::{DateTime, Duration, Utc};

pub const MESSAGES: [(&str, &str); 4] = [
    ("onb-1", "Welcome to Mindflow! This is where your thoughts live."),
    (
        "onb-2",
        "Thoughts automatically blur after 3 seconds to reduce distraction.",
    ),
    ("onb-3", "Move the cursor onto a thought to read it."),
    ("onb-4", "Use the timer to track your focus sessions."),
];

const REVEAL_INTERVAL_SECS: i64 = 5;

/// Staged walkthrough: the first message shows at once, each next one five
/// seconds after the previous, and continuing unlocks five seconds after the
/// last one.
#[derive(Debug, Clone)]
pub struct Onboarding {
    started_at: DateTime<Utc>,
}

impl Onboarding {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Onboarding { started_at }
    }

    fn reveal_at(&self, index: usize) -> DateTime<Utc> {
        self.started_at + Duration::seconds(REVEAL_INTERVAL_SECS * index as i64)
    }

    pub fn visible_count(&self, now: DateTime<Utc>) -> usize {
        (0..MESSAGES.len())
            .take_while(|idx| self.reveal_at(*idx) <= now)
            .count()
    }

    /// Messages revealed so far, newest last, stamped with their reveal time
    /// so they blur like ordinary thoughts.
    pub fn visible_notes(&self, now: DateTime<Utc>) -> Vec<Note> {
        MESSAGES
            .iter()
            .take(self.visible_count(now))
            .enumerate()
            .map(|(idx, (id, content))| {
                Note::new(id.to_string(), content.to_string(), self.reveal_at(idx))
            })
            .collect()
    }

    pub fn can_continue(&self, now: DateTime<Utc>) -> bool {
        now >= self.reveal_at(MESSAGES.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 15, 8, 0, 0).unwrap()
    }

    #[test]
    fn first_message_is_immediate() {
        let onboarding = Onboarding::new(t0());
        assert_eq!(onboarding.visible_count(t0()), 1);
        assert_eq!(onboarding.visible_notes(t0())[0].id, "onb-1");
        assert!(!onboarding.can_continue(t0()));
    }

    #[test]
    fn messages_reveal_every_five_seconds() {
        let onboarding = Onboarding::new(t0());
        assert_eq!(onboarding.visible_count(t0() + Duration::seconds(4)), 1);
        assert_eq!(onboarding.visible_count(t0() + Duration::seconds(5)), 2);
        assert_eq!(onboarding.visible_count(t0() + Duration::seconds(15)), 4);
        assert_eq!(onboarding.visible_count(t0() + Duration::hours(1)), 4);

        let notes = onboarding.visible_notes(t0() + Duration::seconds(11));
        let ids: Vec<_> = notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["onb-1", "onb-2", "onb-3"]);
        assert_eq!(notes[2].created_at, t0() + Duration::seconds(10));
    }

    #[test]
    fn continue_unlocks_after_last_message() {
        let onboarding = Onboarding::new(t0());
        assert!(!onboarding.can_continue(t0() + Duration::seconds(19)));
        assert!(onboarding.can_continue(t0() + Duration::seconds(20)));
    }
}
