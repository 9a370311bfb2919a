use crate::model::Note;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;

pub const TODAY_LABEL: &str = "Today";
pub const YESTERDAY_LABEL: &str = "Yesterday";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup<'a> {
    pub label: String,
    pub notes: Vec<&'a Note>,
}

/// Buckets notes by calendar day in the time zone of `now`.
///
/// Order is Today, Yesterday, then older days newest first. Notes keep their
/// input order inside a bucket, and empty buckets are never emitted.
pub fn group_by_day<'a, Tz: TimeZone>(notes: &'a [Note], now: &DateTime<Tz>) -> Vec<DayGroup<'a>> {
    let tz = now.timezone();
    let today = now.date_naive();
    let yesterday = today.pred_opt();

    let mut today_notes = Vec::new();
    let mut yesterday_notes = Vec::new();
    let mut older: BTreeMap<NaiveDate, Vec<&'a Note>> = BTreeMap::new();

    for note in notes {
        let day = note.created_at.with_timezone(&tz).date_naive();
        if day == today {
            today_notes.push(note);
        } else if Some(day) == yesterday {
            yesterday_notes.push(note);
        } else {
            older.entry(day).or_default().push(note);
        }
    }

    let mut groups = Vec::new();
    if !today_notes.is_empty() {
        groups.push(DayGroup {
            label: TODAY_LABEL.to_string(),
            notes: today_notes,
        });
    }
    if !yesterday_notes.is_empty() {
        groups.push(DayGroup {
            label: YESTERDAY_LABEL.to_string(),
            notes: yesterday_notes,
        });
    }
    for (day, notes) in older.into_iter().rev() {
        groups.push(DayGroup {
            label: day_label(day, today),
            notes,
        });
    }
    groups
}

/// `Oct 3` within the current year, `Oct 3, 2024` otherwise.
pub fn day_label(day: NaiveDate, today: NaiveDate) -> String {
    if day.year() == today.year() {
        day.format("%b %-d").to_string()
    } else {
        day.format("%b %-d, %Y").to_string()
    }
}

/// Strict distance between two instants, e.g. `3 minutes ago`.
pub fn relative_age(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now - created;
    let future = delta < Duration::zero();
    let secs = delta.num_seconds().abs();

    let (value, unit) = if secs < 60 {
        (secs, "second")
    } else if secs < 3_600 {
        (secs / 60, "minute")
    } else if secs < 86_400 {
        (secs / 3_600, "hour")
    } else if secs < 86_400 * 30 {
        (secs / 86_400, "day")
    } else if secs < 86_400 * 365 {
        (secs / (86_400 * 30), "month")
    } else {
        (secs / (86_400 * 365), "year")
    };
    let plural = if value == 1 { "" } else { "s" };
    if future {
        format!("in {} {}{}", value, unit, plural)
    } else {
        format!("{} {}{} ago", value, unit, plural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn note_at(id: &str, at: DateTime<Utc>) -> Note {
        Note::new(id.into(), format!("thought {}", id), at)
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn ids(group: &DayGroup<'_>) -> Vec<String> {
        group.notes.iter().map(|n| n.id.clone()).collect()
    }

    #[test]
    fn empty_input_yields_no_groups() {
        let now = utc(2026, 10, 15, 12, 0);
        assert!(group_by_day(&[], &now).is_empty());
    }

    #[test]
    fn labels_today_and_yesterday_against_reference_clock() {
        let now = utc(2026, 10, 15, 9, 30);
        let notes = vec![
            note_at("t2", utc(2026, 10, 15, 9, 0)),
            note_at("y1", utc(2026, 10, 14, 23, 59)),
            note_at("t1", utc(2026, 10, 15, 0, 0)),
            note_at("y2", utc(2026, 10, 14, 0, 1)),
        ];
        let groups = group_by_day(&notes, &now);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "Today");
        assert_eq!(ids(&groups[0]), vec!["t2", "t1"]);
        assert_eq!(groups[1].label, "Yesterday");
        assert_eq!(ids(&groups[1]), vec!["y1", "y2"]);
    }

    #[test]
    fn older_groups_sorted_newest_first() {
        let now = utc(2026, 10, 15, 12, 0);
        let notes = vec![
            note_at("sep", utc(2026, 9, 1, 8, 0)),
            note_at("old", utc(2025, 12, 31, 8, 0)),
            note_at("oct3a", utc(2026, 10, 3, 8, 0)),
            note_at("today", utc(2026, 10, 15, 8, 0)),
            note_at("oct3b", utc(2026, 10, 3, 20, 0)),
        ];
        let groups = group_by_day(&notes, &now);
        let labels: Vec<_> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Today", "Oct 3", "Sep 1", "Dec 31, 2025"]);
        assert_eq!(ids(&groups[1]), vec!["oct3a", "oct3b"]);
    }

    #[test]
    fn uses_time_zone_of_reference_clock() {
        // 02:00 UTC on the 15th is still the 14th in UTC-5
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = utc(2026, 10, 15, 6, 0).with_timezone(&offset);
        let notes = vec![
            note_at("late", utc(2026, 10, 15, 2, 0)),
            note_at("early", utc(2026, 10, 15, 5, 30)),
        ];
        let groups = group_by_day(&notes, &now);
        assert_eq!(groups[0].label, "Today");
        assert_eq!(ids(&groups[0]), vec!["early"]);
        assert_eq!(groups[1].label, "Yesterday");
        assert_eq!(ids(&groups[1]), vec!["late"]);
    }

    #[test]
    fn yesterday_across_year_boundary() {
        let now = utc(2027, 1, 1, 10, 0);
        let notes = vec![
            note_at("nye", utc(2026, 12, 31, 22, 0)),
            note_at("xmas", utc(2026, 12, 25, 22, 0)),
        ];
        let groups = group_by_day(&notes, &now);
        assert_eq!(groups[0].label, "Yesterday");
        assert_eq!(groups[1].label, "Dec 25, 2026");
    }

    #[test]
    fn relative_age_is_strict() {
        let now = utc(2026, 10, 15, 12, 0);
        assert_eq!(relative_age(now, now), "0 seconds ago");
        assert_eq!(relative_age(now - Duration::seconds(1), now), "1 second ago");
        assert_eq!(relative_age(now - Duration::seconds(125), now), "2 minutes ago");
        assert_eq!(relative_age(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(relative_age(now - Duration::days(1), now), "1 day ago");
        assert_eq!(relative_age(now - Duration::days(400), now), "1 year ago");
        assert_eq!(relative_age(now + Duration::minutes(3), now), "in 3 minutes");
    }
}
