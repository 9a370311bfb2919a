use crate::model::Note;
use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_BLUR_DELAY_SECS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Clear,
    Blurred,
}

/// What the user is doing with a rendered row right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Interaction {
    pub hovered: bool,
    pub editing: bool,
    pub menu_open: bool,
}

impl Interaction {
    pub fn any(&self) -> bool {
        self.hovered || self.editing || self.menu_open
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BlurPolicy {
    pub enabled: bool,
    pub delay: Duration,
}

impl BlurPolicy {
    pub fn new(enabled: bool, delay: Duration) -> Self {
        BlurPolicy { enabled, delay }
    }

    pub fn with_default_delay(enabled: bool) -> Self {
        BlurPolicy::new(enabled, Duration::seconds(DEFAULT_BLUR_DELAY_SECS))
    }

    pub fn visibility(&self, note: &Note, now: DateTime<Utc>, interaction: Interaction) -> Visibility {
        if !self.enabled || interaction.any() {
            return Visibility::Clear;
        }
        if note.age_millis(now) < self.delay.num_milliseconds() {
            Visibility::Clear
        } else {
            Visibility::Blurred
        }
    }

    /// Earliest instant at which any of `notes` will flip to blurred, so the
    /// render loop knows when it must redraw.
    pub fn next_flip<'a, I>(&self, notes: I, now: DateTime<Utc>) -> Option<DateTime<Utc>>
    where
        I: IntoIterator<Item = &'a Note>,
    {
        if !self.enabled {
            return None;
        }
        notes
            .into_iter()
            .map(|n| n.created_at + self.delay)
            .filter(|at| *at > now)
            .min()
    }
}

/// Replaces visible characters with a shade glyph, keeping whitespace so the
/// shape of the text is still recognisable.
pub fn mask(content: &str) -> String {
    content
        .chars()
        .map(|c| if c.is_whitespace() { c } else { '░' })
        .collect()
}
